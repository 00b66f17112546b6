// ─── Shortcut Wrappers ───
// Shell scripts that start one version (optionally joining a server)
// without going through the launcher.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::api::RemoteMetadata;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{build_arguments, ArgumentContext, Platform};
use crate::core::paths::{javaw_exe, InstallLayout};
use crate::core::provision::ensure_dir;
use crate::core::settings::LaunchSettings;

/// `wrapper-<version>-<ip|null>.<sh|cmd>`
pub fn wrapper_file_name(version: &str, server_ip: Option<&str>, platform: Platform) -> String {
    let extension = match platform {
        Platform::Windows => "cmd",
        Platform::Unix => "sh",
    };
    format!("wrapper-{}-{}.{}", version, server_ip.unwrap_or("null"), extension)
}

/// Script body: change into the version folder, then run `javaw` with the
/// quoted shortcut arguments.
pub fn render_wrapper(
    version_dir: &Path,
    jre_path: &Path,
    args: &[String],
    platform: Platform,
) -> String {
    let mut script = String::new();
    if platform == Platform::Unix {
        script.push_str("#!/bin/sh\n");
    }
    script.push_str(&format!("cd \"{}\"\n", version_dir.display()));
    if platform == Platform::Windows {
        script.push_str("start \"\" ");
    }
    script.push_str(&format!(
        "\"{}\" {}",
        jre_path.join(javaw_exe()).display(),
        args.join(" ")
    ));
    script
}

/// Writes the wrapper for `version` unless it already exists, and returns its path.
pub async fn create_wrapper(
    layout: &InstallLayout,
    settings: &LaunchSettings,
    metadata: &RemoteMetadata,
    version: &str,
    server_ip: Option<&str>,
) -> LauncherResult<PathBuf> {
    let platform = Platform::current();
    let dir = layout.wrappers_dir();
    ensure_dir(&dir).await;

    let path = dir.join(wrapper_file_name(version, server_ip, platform));
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        debug!("Wrapper already exists");
        return Ok(path);
    }

    let args = build_arguments(&ArgumentContext {
        layout,
        metadata,
        settings,
        patcher_present: layout.patcher_jar().is_file(),
        server_ip,
        override_version: Some(version),
        for_shortcut: true,
        platform,
    });
    let script = render_wrapper(&layout.version_dir(version), &settings.jre_path, &args, platform);

    tokio::fs::write(&path, script)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    make_executable(&path).await?;
    debug!("Wrapper created at {:?}", path);
    Ok(path)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| LauncherError::io(path, e))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> LauncherResult<()> {
    Ok(())
}
