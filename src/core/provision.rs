// ─── Directory Provisioner ───
// Idempotent creation of the fixed installation tree.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error};

use crate::core::paths::InstallLayout;

/// Make sure `path` exists as a directory.
///
/// "Already exists" counts as success. Any other failure is logged and
/// swallowed so the caller's flow continues; the return value only reports
/// whether the directory is known to be there.
pub async fn ensure_dir(path: &Path) -> bool {
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => {
            debug!("Directory ready: {:?}", path);
            true
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => true,
        Err(err) => {
            error!("Can't create directory {:?}: {}", path, err);
            false
        }
    }
}

/// Ensure the base directory, its required subdirectories and the tool
/// directory tree. Each directory is handled independently so a partially
/// provisioned installation is completed rather than rejected.
///
/// `progress` receives `(current, total)` before each directory is checked.
/// Returns the number of directories that could not be created.
pub async fn provision_installation(
    layout: &InstallLayout,
    progress: impl Fn(usize, usize),
) -> usize {
    let required = [
        layout.base_dir().to_path_buf(),
        layout.licenses_dir(),
        layout.offline_dir(),
        layout.jre_dir(),
        layout.tool_dir(),
        layout.logs_dir(),
    ];

    let mut failures = 0;
    for (index, dir) in required.iter().enumerate() {
        progress(index + 1, required.len());
        debug!("Checking directory {}/{}: {:?}", index + 1, required.len(), dir);
        if !ensure_dir(dir).await {
            failures += 1;
        }
    }

    failures
}
