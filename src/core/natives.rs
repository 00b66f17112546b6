// ─── Natives ───
// One-time extraction of the native-library archive into offline/<version>/natives.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::core::api::RemoteMetadata;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativesState {
    AlreadyExtracted,
    /// Number of files written.
    Extracted(usize),
    /// The archive is listed but not on disk.
    ArchiveMissing(PathBuf),
    /// The metadata lists no `NATIVES` artifact.
    NotListed,
}

/// Extracts the natives archive of `version` unless its directory already exists.
pub async fn ensure_natives(
    layout: &InstallLayout,
    version: &str,
    metadata: &RemoteMetadata,
) -> LauncherResult<NativesState> {
    let Some(artifact) = metadata.natives_artifact() else {
        warn!("Metadata lists no natives artifact");
        return Ok(NativesState::NotListed);
    };

    let archive = layout.version_dir(version).join(&artifact.name);
    if !tokio::fs::try_exists(&archive).await.unwrap_or(false) {
        error!("Natives not found at {:?}", archive);
        return Ok(NativesState::ArchiveMissing(archive));
    }

    let natives_dir = layout.natives_dir(version);
    if tokio::fs::try_exists(&natives_dir).await.unwrap_or(false) {
        debug!("Natives already extracted");
        return Ok(NativesState::AlreadyExtracted);
    }

    let written = extract_archive(&archive, &natives_dir).await?;
    info!("Extracted {} native files to {:?}", written, natives_dir);
    Ok(NativesState::Extracted(written))
}

/// Unpacks every entry of `archive` into `dest`.
///
/// Entries are written to a sibling `.partial` directory that is renamed into
/// place at the end, so `dest` only ever appears complete. Entries whose name
/// would land outside `dest` are skipped.
pub async fn extract_archive(archive: &Path, dest: &Path) -> LauncherResult<usize> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
        .await
        .map_err(|e| LauncherError::Other(format!("Natives extraction task failed: {e}")))?
}

fn extract_blocking(archive: &Path, dest: &Path) -> LauncherResult<usize> {
    let staging = partial_dir(dest);
    if staging.exists() {
        std::fs::remove_dir_all(&staging).map_err(|e| LauncherError::io(&staging, e))?;
    }
    std::fs::create_dir_all(&staging).map_err(|e| LauncherError::io(&staging, e))?;

    let result = unpack_into(archive, &staging)
        .and_then(|written| {
            std::fs::rename(&staging, dest).map_err(|e| LauncherError::io(dest, e))?;
            Ok(written)
        });
    if result.is_err() {
        let _ = std::fs::remove_dir_all(&staging);
    }
    result
}

fn unpack_into(archive: &Path, staging: &Path) -> LauncherResult<usize> {
    let file = File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let out_path = staging.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
        written += 1;
    }

    Ok(written)
}

fn partial_dir(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}
