use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::core::error::{LauncherError, LauncherResult};

/// Hash algorithm used to verify a downloaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    /// Hex length of a digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 40,
            DigestAlgorithm::Sha256 => 64,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase hex digest of an in-memory buffer.
pub fn digest_bytes(bytes: &[u8], algorithm: DigestAlgorithm) -> String {
    match algorithm {
        DigestAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
    }
}

pub async fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> LauncherResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    Ok(digest_bytes(&bytes, algorithm))
}

/// Compare the digest of the file at `path` with `expected`, ignoring case.
pub async fn check_digest(
    path: &Path,
    expected: &str,
    algorithm: DigestAlgorithm,
) -> LauncherResult<bool> {
    debug!("Checking {} of {:?}", algorithm, path);

    let actual = digest_file(path, algorithm).await?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        debug!("Digest matches for {:?}", path);
        Ok(true)
    } else {
        error!(
            "Digest mismatch for {:?}: expected {}, got {} ({})",
            path, expected, actual, algorithm
        );
        Ok(false)
    }
}

/// `true` when `value` is exactly 40 hexadecimal characters.
pub fn is_sha1_hex(value: &str) -> bool {
    value.len() == DigestAlgorithm::Sha1.hex_len() && value.bytes().all(|b| b.is_ascii_hexdigit())
}
