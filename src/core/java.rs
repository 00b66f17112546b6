// ─── Java Runtime ───
// JRE validation before launch, plus the downloadable JRE manager.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::api::node_arch;
use crate::core::downloader::{DigestAlgorithm, Fetch, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{JreResolution, LaunchFrontend};
use crate::core::natives::extract_archive;
use crate::core::paths::{java_exe, InstallLayout};
use crate::core::provision::ensure_dir;
use crate::core::settings::{SettingsStore, KEY_JRE_PATH};

// ── Validation ──────────────────────────────────────────

/// `true` when `bin_dir` exists and holds the java executable.
pub fn jre_is_valid(bin_dir: &Path) -> bool {
    bin_dir.is_dir() && bin_dir.join(java_exe()).is_file()
}

/// Checks the configured JRE and, while it is invalid, asks the front end
/// for a replacement. A selected folder is persisted as `jrePath` and
/// checked again; cancelling fails with [`LauncherError::JreNotFound`].
pub async fn ensure_jre(
    settings: &mut SettingsStore,
    frontend: &dyn LaunchFrontend,
) -> LauncherResult<PathBuf> {
    loop {
        let jre_path: PathBuf = settings.get(KEY_JRE_PATH)?.unwrap_or_default();
        if jre_is_valid(&jre_path) {
            debug!("Using JRE at {:?}", jre_path);
            return Ok(jre_path);
        }

        warn!("JRE not found at {:?}, asking for a new one", jre_path);
        match frontend.resolve_missing_jre(&jre_path).await {
            JreResolution::Select(selected) => {
                info!("JRE path changed to {:?}", selected);
                settings.set(KEY_JRE_PATH, &selected)?;
            }
            JreResolution::Cancel => return Err(LauncherError::JreNotFound(jre_path)),
        }
    }
}

/// Warns when the requested heap exceeds the machine's physical memory.
pub fn check_heap_size(ram_mb: u32) -> bool {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let fits = heap_fits(ram_mb, system.total_memory());
    if !fits {
        warn!(
            "Configured RAM ({} MB) exceeds total system memory ({} MB)",
            ram_mb,
            system.total_memory() / 1024 / 1024
        );
    }
    fits
}

fn heap_fits(ram_mb: u32, total_bytes: u64) -> bool {
    total_bytes == 0 || u64::from(ram_mb) * 1024 * 1024 <= total_bytes
}

// ── Downloadable JREs ───────────────────────────────────

/// Entry of the JRE catalogue offered for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JreDescriptor {
    pub name: String,
    #[serde(rename = "64")]
    pub x64: JreVariant,
    #[serde(rename = "32", default)]
    pub x86: Option<JreVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JreVariant {
    pub url: String,
    /// sha256 of the archive.
    pub checksum: String,
    /// Top-level folder inside the archive.
    pub folder: String,
}

impl JreDescriptor {
    /// Variant matching the host architecture.
    pub fn variant_for(&self, arch: &str) -> LauncherResult<&JreVariant> {
        if arch == "x64" {
            return Ok(&self.x64);
        }
        self.x86.as_ref().ok_or_else(|| {
            LauncherError::Other(format!("JRE {} has no 32-bit build", self.name))
        })
    }
}

/// Downloads, verifies and unpacks a JRE into `solartweaks/jres/<name>`.
/// Returns the installed directory.
pub async fn install_jre(
    fetcher: &dyn Fetch,
    layout: &InstallLayout,
    descriptor: &JreDescriptor,
) -> LauncherResult<PathBuf> {
    validate_jre_name(&descriptor.name)?;
    let variant = descriptor.variant_for(node_arch())?;

    let jres_dir = layout.jres_dir();
    ensure_dir(&jres_dir).await;

    let target = jres_dir.join(&descriptor.name);
    let archive = jres_dir.join(format!("{}.zip", descriptor.name));
    let temp = jres_dir.join(format!("{}_temp", descriptor.name));

    info!("Downloading JRE {}...", descriptor.name);
    let request = FetchRequest::binary(&variant.url, &archive)
        .with_digest(&variant.checksum, DigestAlgorithm::Sha256)
        .parent_exists();
    fetcher.fetch(&request).await?;

    remove_dir_if_present(&temp).await?;
    extract_archive(&archive, &temp).await?;

    let inner = temp.join(&variant.folder);
    if !inner.is_dir() {
        return Err(LauncherError::Other(format!(
            "JRE archive has no folder named {}",
            variant.folder
        )));
    }

    remove_dir_if_present(&target).await?;
    tokio::fs::rename(&inner, &target)
        .await
        .map_err(|e| LauncherError::io(&target, e))?;

    remove_dir_if_present(&temp).await?;
    if let Err(err) = tokio::fs::remove_file(&archive).await {
        warn!("Cannot remove {:?}: {}", archive, err);
    }

    info!("Installed JRE {} to {:?}", descriptor.name, target);
    Ok(target)
}

/// Deletes a downloaded JRE. Removing a JRE that is not installed is not an error.
pub async fn remove_jre(layout: &InstallLayout, name: &str) -> LauncherResult<()> {
    validate_jre_name(name)?;
    remove_dir_if_present(&layout.jres_dir().join(name)).await?;
    info!("Removed JRE {}", name);
    Ok(())
}

fn validate_jre_name(name: &str) -> LauncherResult<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(LauncherError::Other(format!("Invalid JRE name: {name:?}")))
    }
}

async fn remove_dir_if_present(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(LauncherError::io(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::core::testing::{RecordingFetcher, RecordingFrontend};

    fn fake_jre(root: &Path) -> PathBuf {
        let bin = root.join("jre").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join(java_exe()), b"").unwrap();
        bin
    }

    #[test]
    fn jre_requires_bin_folder_and_binary() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        assert!(!jre_is_valid(&bin));
        std::fs::create_dir_all(&bin).unwrap();
        assert!(!jre_is_valid(&bin));
        std::fs::write(bin.join(java_exe()), b"").unwrap();
        assert!(jre_is_valid(&bin));
    }

    #[tokio::test]
    async fn selected_jre_is_persisted_and_rechecked() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::load(temp.path().join("settings.json"));
        settings.set(KEY_JRE_PATH, temp.path().join("missing")).unwrap();
        let good = fake_jre(temp.path());
        let frontend = RecordingFrontend::answering([
            JreResolution::Select(temp.path().join("still-missing")),
            JreResolution::Select(good.clone()),
        ]);

        let resolved = ensure_jre(&mut settings, &frontend).await.unwrap();

        assert_eq!(resolved, good);
        assert_eq!(frontend.prompts(), 2);
        let reloaded = SettingsStore::load(temp.path().join("settings.json"));
        assert_eq!(reloaded.get::<PathBuf>(KEY_JRE_PATH).unwrap(), Some(good));
    }

    #[tokio::test]
    async fn cancelling_the_prompt_aborts() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::load(temp.path().join("settings.json"));
        let frontend = RecordingFrontend::answering([JreResolution::Cancel]);

        let err = ensure_jre(&mut settings, &frontend).await.unwrap_err();
        assert!(matches!(err, LauncherError::JreNotFound(_)));
    }

    #[tokio::test]
    async fn valid_jre_needs_no_prompt() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = SettingsStore::load(temp.path().join("settings.json"));
        settings.set(KEY_JRE_PATH, fake_jre(temp.path())).unwrap();
        let frontend = RecordingFrontend::new();

        ensure_jre(&mut settings, &frontend).await.unwrap();
        assert_eq!(frontend.prompts(), 0);
    }

    #[test]
    fn heap_larger_than_memory_does_not_fit() {
        let gib = 1024 * 1024 * 1024;
        assert!(heap_fits(4000, 8 * gib));
        assert!(!heap_fits(16000, 8 * gib));
        assert!(heap_fits(16000, 0));
    }

    #[test]
    fn descriptor_picks_architecture_variant() {
        let descriptor: JreDescriptor = serde_json::from_value(serde_json::json!({
            "name": "zulu17",
            "64": { "url": "https://cdn.test/64.zip", "checksum": "ab", "folder": "zulu17-x64" }
        }))
        .unwrap();

        assert_eq!(descriptor.variant_for("x64").unwrap().folder, "zulu17-x64");
        assert!(descriptor.variant_for("ia32").is_err());
    }

    #[tokio::test]
    async fn install_then_remove_jre() {
        let temp = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(temp.path());

        let mut zip_bytes = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_bytes));
            let name = format!("zulu-jre/bin/{}", java_exe());
            zip.start_file(name.as_str(), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"binary").unwrap();
            zip.finish().unwrap();
        }

        let variant = JreVariant {
            url: "https://cdn.test/jre.zip".into(),
            checksum: "00".into(),
            folder: "zulu-jre".into(),
        };
        let descriptor = JreDescriptor {
            name: "zulu17".into(),
            x64: variant.clone(),
            x86: Some(variant),
        };
        let fetcher = RecordingFetcher::new().with_body("https://cdn.test/jre.zip", zip_bytes);

        let installed = install_jre(&fetcher, &layout, &descriptor).await.unwrap();

        assert_eq!(installed, layout.jres_dir().join("zulu17"));
        assert!(jre_is_valid(&installed.join("bin")));
        assert!(!layout.jres_dir().join("zulu17_temp").exists());
        assert!(!layout.jres_dir().join("zulu17.zip").exists());
        assert_eq!(fetcher.requests()[0].algorithm, DigestAlgorithm::Sha256);

        remove_jre(&layout, "zulu17").await.unwrap();
        assert!(!installed.exists());
        remove_jre(&layout, "zulu17").await.unwrap();
        assert!(remove_jre(&layout, "../escape").await.is_err());
    }
}
