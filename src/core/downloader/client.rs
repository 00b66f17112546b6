use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::digest::{digest_file, DigestAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{build_http_client, ensure_success};

/// How the response body is decoded before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Binary,
}

/// What to do when a written file does not match its expected digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestPolicy {
    /// Log the mismatch and keep the file.
    #[default]
    Warn,
    /// Delete the file and fail.
    Reject,
    /// Download once more; delete and fail if it still mismatches.
    Refetch,
}

/// A single file to download with an optional digest for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub dest: PathBuf,
    pub kind: FileKind,
    pub expected_digest: Option<String>,
    pub algorithm: DigestAlgorithm,
    /// Caller guarantees the parent directory exists.
    pub parent_exists: bool,
}

impl FetchRequest {
    pub fn binary(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            kind: FileKind::Binary,
            expected_digest: None,
            algorithm: DigestAlgorithm::Sha1,
            parent_exists: false,
        }
    }

    pub fn text(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            kind: FileKind::Text,
            ..Self::binary(url, dest)
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>, algorithm: DigestAlgorithm) -> Self {
        self.expected_digest = Some(digest.into());
        self.algorithm = algorithm;
        self
    }

    pub fn parent_exists(mut self) -> Self {
        self.parent_exists = true;
        self
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Digest supplied and matched.
    Verified,
    /// No digest supplied.
    Unverified,
    /// Digest mismatched but the policy kept the file.
    Mismatched { expected: String, actual: String },
}

/// File acquisition seam used by every pipeline step.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> LauncherResult<FetchOutcome>;
}

/// Digest-verifying HTTP downloader.
pub struct Downloader {
    client: Client,
    policy: DigestPolicy,
}

impl Downloader {
    pub fn new(policy: DigestPolicy) -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            policy,
        })
    }

    // ── Single file download ────────────────────────────

    /// Download the whole body of `request.url` and write it to `request.dest`.
    ///
    /// The body is fully buffered before the destination is touched, so an
    /// interrupted transfer never leaves a partial file behind.
    async fn download_once(&self, request: &FetchRequest) -> LauncherResult<()> {
        info!("Downloading {}...", request.url);

        let response = ensure_success(self.client.get(&request.url).send().await?, &request.url)?;

        let body: Vec<u8> = match request.kind {
            FileKind::Text => response.text().await?.into_bytes(),
            FileKind::Binary => response.bytes().await?.to_vec(),
        };
        debug!("Downloaded {} ({} bytes)", request.url, body.len());

        if !request.parent_exists {
            if let Some(parent) = request.dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| LauncherError::io(parent, e))?;
            }
        }

        write_file(&request.dest, &body).await?;
        debug!("Saved to {:?}", request.dest);
        Ok(())
    }
}

#[async_trait]
impl Fetch for Downloader {
    async fn fetch(&self, request: &FetchRequest) -> LauncherResult<FetchOutcome> {
        fetch_with_policy(request, self.policy, || self.download_once(request)).await
    }
}

// ── Digest policy ───────────────────────────────────────

/// Runs `download` and checks the written file against the expected digest.
///
/// `download` is called a second time only under [`DigestPolicy::Refetch`].
/// A rejected file is deleted before the mismatch is returned.
async fn fetch_with_policy<F, Fut>(
    request: &FetchRequest,
    policy: DigestPolicy,
    download: F,
) -> LauncherResult<FetchOutcome>
where
    F: Fn() -> Fut,
    Fut: Future<Output = LauncherResult<()>>,
{
    download().await?;

    let Some(expected) = request.expected_digest.as_deref() else {
        return Ok(FetchOutcome::Unverified);
    };

    let actual = match verify(request, expected).await? {
        Ok(()) => return Ok(FetchOutcome::Verified),
        Err(actual) => actual,
    };

    error!(
        "Hash mismatch for {:?}: expected {}, got {} ({})",
        request.dest, expected, actual, request.algorithm
    );

    match policy {
        DigestPolicy::Warn => Ok(FetchOutcome::Mismatched {
            expected: expected.to_string(),
            actual,
        }),
        DigestPolicy::Reject => Err(reject(request, expected, actual).await),
        DigestPolicy::Refetch => {
            warn!("Re-downloading {} after digest mismatch", request.url);
            download().await?;
            match verify(request, expected).await? {
                Ok(()) => Ok(FetchOutcome::Verified),
                Err(actual) => Err(reject(request, expected, actual).await),
            }
        }
    }
}

/// `Ok(Err(actual))` when the file on disk does not match `expected`.
async fn verify(request: &FetchRequest, expected: &str) -> LauncherResult<Result<(), String>> {
    let actual = digest_file(&request.dest, request.algorithm).await?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        debug!("Digest matches for {:?}", request.dest);
        Ok(Ok(()))
    } else {
        Ok(Err(actual))
    }
}

async fn reject(request: &FetchRequest, expected: &str, actual: String) -> LauncherError {
    if let Err(err) = tokio::fs::remove_file(&request.dest).await {
        warn!("Cannot remove corrupted file {:?}: {}", request.dest, err);
    }
    LauncherError::DigestMismatch {
        path: request.dest.clone(),
        algorithm: request.algorithm.name(),
        expected: expected.to_string(),
        actual,
    }
}

/// Truncates `dest` and writes `bytes`, flushed before the digest is read back.
async fn write_file(dest: &Path, bytes: &[u8]) -> LauncherResult<()> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| LauncherError::io(dest, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| LauncherError::io(dest, e))?;
    file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
    Ok(())
}
