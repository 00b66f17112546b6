// ─── Asset Synchronizer ───
// Reconciles the remote texture manifest against the local texture cache.

use std::path::{Component, Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::core::api::TextureSource;
use crate::core::downloader::{check_digest, is_sha1_hex, DigestAlgorithm, Fetch, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::InstallLayout;
use crate::core::provision::ensure_dir;

/// One `<relativePath> <sha1>` line of the texture manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIndexEntry {
    pub relative_path: String,
    pub sha1: String,
}

/// Parses the manifest line by line. Blank lines are ignored; lines whose
/// digest is not 40 hex characters, or whose path escapes the cache, are
/// skipped with a warning.
pub fn parse_manifest(text: &str) -> Vec<AssetIndexEntry> {
    let mut entries = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((path, digest)) = line.split_once(' ') else {
            warn!("Invalid line in index file (line {})\n{}", index + 1, line);
            continue;
        };
        let path = path.trim();
        if !is_sha1_hex(digest) || !is_cache_relative(path) {
            warn!("Invalid line in index file (line {})\n{}", index + 1, line);
            continue;
        }

        entries.push(AssetIndexEntry {
            relative_path: path.to_string(),
            sha1: digest.to_ascii_lowercase(),
        });
    }

    entries
}

fn is_cache_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Totals of one synchronisation run. Failures never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSyncReport {
    pub total: usize,
    pub cached: usize,
    pub fetched: usize,
    pub failed: Vec<(String, String)>,
}

enum EntryOutcome {
    Cached,
    Fetched,
    Failed(String),
}

pub struct AssetSynchronizer<'a> {
    fetcher: &'a dyn Fetch,
    layout: &'a InstallLayout,
    concurrency: usize,
}

impl<'a> AssetSynchronizer<'a> {
    pub fn new(fetcher: &'a dyn Fetch, layout: &'a InstallLayout, concurrency: usize) -> Self {
        Self {
            fetcher,
            layout,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch the manifest, then check every entry with at most
    /// `concurrency` checks in flight.
    pub async fn sync(&self, textures: &TextureSource) -> LauncherResult<AssetSyncReport> {
        let textures_dir = self.layout.textures_dir();
        ensure_dir(&textures_dir).await;

        let index_path = self.layout.texture_index_path();
        let request = FetchRequest::binary(&textures.index_url, &index_path)
            .with_digest(&textures.index_sha1, DigestAlgorithm::Sha1)
            .parent_exists();
        self.fetcher.fetch(&request).await?;

        let raw = tokio::fs::read(&index_path)
            .await
            .map_err(|e| LauncherError::io(&index_path, e))?;
        let entries = parse_manifest(&String::from_utf8_lossy(&raw));
        info!("Checking {} texture assets", entries.len());

        let outcomes: Vec<(String, EntryOutcome)> = stream::iter(entries)
            .map(|entry| {
                let dest = textures_dir.join(&entry.relative_path);
                let url = format!("{}{}", textures.base_url, entry.sha1);
                async move {
                    let outcome = self.check_entry(&entry, dest, url).await;
                    (entry.relative_path, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = AssetSyncReport {
            total: outcomes.len(),
            ..AssetSyncReport::default()
        };
        for (path, outcome) in outcomes {
            match outcome {
                EntryOutcome::Cached => report.cached += 1,
                EntryOutcome::Fetched => report.fetched += 1,
                EntryOutcome::Failed(reason) => {
                    warn!("Failed to sync texture {}: {}", path, reason);
                    report.failed.push((path, reason));
                }
            }
        }

        info!(
            "Textures synced: {} cached, {} fetched, {} failed",
            report.cached,
            report.fetched,
            report.failed.len()
        );
        Ok(report)
    }

    async fn check_entry(
        &self,
        entry: &AssetIndexEntry,
        dest: PathBuf,
        url: String,
    ) -> EntryOutcome {
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            match check_digest(&dest, &entry.sha1, DigestAlgorithm::Sha1).await {
                Ok(true) => return EntryOutcome::Cached,
                Ok(false) => debug!("Re-fetching corrupt texture {}", entry.relative_path),
                Err(err) => debug!("Cannot read {:?}, re-fetching: {}", dest, err),
            }
        }

        let request =
            FetchRequest::binary(url, dest).with_digest(&entry.sha1, DigestAlgorithm::Sha1);
        match self.fetcher.fetch(&request).await {
            Ok(_) => EntryOutcome::Fetched,
            Err(err) => EntryOutcome::Failed(err.to_string()),
        }
    }
}
