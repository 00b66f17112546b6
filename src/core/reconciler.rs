// ─── Installation Reconciler ───
// Brings the local installation in line with the launch metadata. Every step
// is idempotent and only acts on what is missing.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::core::api::{LaunchApi, RemoteMetadata};
use crate::core::assets::{AssetSyncReport, AssetSynchronizer};
use crate::core::downloader::{DigestAlgorithm, Fetch, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LaunchFrontend, LaunchStatus};
use crate::core::java::ensure_jre;
use crate::core::natives::{ensure_natives, NativesState};
use crate::core::paths::InstallLayout;
use crate::core::patcher::{merge_remote, PatcherConfig};
use crate::core::provision::{ensure_dir, provision_installation};
use crate::core::settings::{SettingsStore, KEY_PATCHER_VERSION};

/// What happened to the patcher jar during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatcherUpdate {
    /// Jar was missing and the stable version was installed.
    Installed(String),
    UpToDate(String),
    /// Jar was replaced and the config merged with the remote example.
    Updated { from: Option<String>, to: String },
}

/// Outcome of every step; failed steps are listed in `failures`.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub jre_path: PathBuf,
    pub licenses_fetched: usize,
    pub artifacts_fetched: usize,
    pub natives: Option<NativesState>,
    pub assets: Option<AssetSyncReport>,
    pub patcher: Option<PatcherUpdate>,
    pub config_created: bool,
    pub failures: Vec<String>,
}

/// Files fetched by a per-item step and the items that could not be fetched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileCheck {
    pub fetched: usize,
    pub failures: Vec<String>,
}

pub struct Reconciler<'a> {
    layout: &'a InstallLayout,
    fetcher: &'a dyn Fetch,
    api: &'a dyn LaunchApi,
    frontend: &'a dyn LaunchFrontend,
    asset_concurrency: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        layout: &'a InstallLayout,
        fetcher: &'a dyn Fetch,
        api: &'a dyn LaunchApi,
        frontend: &'a dyn LaunchFrontend,
        asset_concurrency: usize,
    ) -> Self {
        Self {
            layout,
            fetcher,
            api,
            frontend,
            asset_concurrency,
        }
    }

    /// Runs every step for `version`. Only a missing JRE the user refuses to
    /// replace is fatal; other step failures are logged and recorded.
    pub async fn run(
        &self,
        settings: &mut SettingsStore,
        version: &str,
        metadata: &RemoteMetadata,
    ) -> LauncherResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        self.check_folders().await;

        self.frontend.status(LaunchStatus::CheckingJre);
        report.jre_path = ensure_jre(settings, self.frontend).await?;

        match self.check_licenses(metadata).await {
            Ok(check) => {
                report.licenses_fetched = check.fetched;
                report.failures.extend(check.failures);
            }
            Err(err) => record(&mut report, "licenses", err),
        }

        match self.check_game_files(version, metadata).await {
            Ok(check) => {
                report.artifacts_fetched = check.fetched;
                report.failures.extend(check.failures);
            }
            Err(err) => record(&mut report, "game files", err),
        }

        self.frontend.status(LaunchStatus::CheckingNatives);
        match ensure_natives(self.layout, version, metadata).await {
            Ok(state) => report.natives = Some(state),
            Err(err) => record(&mut report, "natives", err),
        }

        self.frontend.status(LaunchStatus::CheckingAssets);
        let assets = AssetSynchronizer::new(self.fetcher, self.layout, self.asset_concurrency);
        match assets.sync(&metadata.textures).await {
            Ok(sync) => report.assets = Some(sync),
            Err(err) => record(&mut report, "assets", err),
        }

        match self.check_patcher(settings).await {
            Ok(update) => report.patcher = Some(update),
            Err(err) => record(&mut report, "patcher", err),
        }

        match self.check_patcher_config().await {
            Ok(created) => report.config_created = created,
            Err(err) => record(&mut report, "patcher config", err),
        }

        Ok(report)
    }

    // ── Steps ───────────────────────────────────────────

    pub async fn check_folders(&self) {
        info!("Checking .lunarclient folder...");
        self.frontend.status(LaunchStatus::CheckingFolders);
        let failures = provision_installation(self.layout, |current, total| {
            self.frontend
                .status(LaunchStatus::CheckingSubfolders { current, total })
        })
        .await;
        if failures > 0 {
            warn!("{} directories could not be created", failures);
        }
    }

    /// Downloads every license that is not on disk yet.
    pub async fn check_licenses(&self, metadata: &RemoteMetadata) -> LauncherResult<FileCheck> {
        info!("Checking licenses...");
        let total = metadata.licenses.len();
        self.frontend
            .status(LaunchStatus::CheckingLicenses { count: total });

        let mut check = FileCheck::default();
        for (index, license) in metadata.licenses.iter().enumerate() {
            debug!("Checking license {}/{}", index + 1, total);
            let dest = self.layout.licenses_dir().join(&license.file);
            if exists(&dest).await {
                continue;
            }

            let mut request = FetchRequest::text(&license.url, dest);
            if let Some(sha1) = &license.sha1 {
                request = request.with_digest(sha1, DigestAlgorithm::Sha1);
            }
            match self.fetcher.fetch(&request).await {
                Ok(_) => check.fetched += 1,
                Err(err) => {
                    error!("Failed to download {}: {}", license.file, err);
                    check.failures.push(format!("license {}: {err}", license.file));
                }
            }
        }
        Ok(check)
    }

    /// Downloads every artifact missing from `offline/<version>/`.
    pub async fn check_game_files(
        &self,
        version: &str,
        metadata: &RemoteMetadata,
    ) -> LauncherResult<FileCheck> {
        info!("Checking game files (MC {})...", version);
        let artifacts = &metadata.launch_type_data.artifacts;
        self.frontend.status(LaunchStatus::CheckingGameFiles {
            count: artifacts.len(),
        });

        let version_dir = self.layout.version_dir(version);
        ensure_dir(&version_dir).await;

        let mut check = FileCheck::default();
        for (index, artifact) in artifacts.iter().enumerate() {
            debug!("Checking game file {}/{}", index + 1, artifacts.len());
            let dest = version_dir.join(&artifact.name);
            if exists(&dest).await {
                continue;
            }

            let mut request = FetchRequest::binary(&artifact.url, dest);
            if let Some(sha1) = &artifact.sha1 {
                request = request.with_digest(sha1, DigestAlgorithm::Sha1);
            }
            match self.fetcher.fetch(&request).await {
                Ok(_) => check.fetched += 1,
                Err(err) => {
                    error!("Failed to download {}: {}", artifact.name, err);
                    check.failures.push(format!("artifact {}: {err}", artifact.name));
                }
            }
        }
        Ok(check)
    }

    /// Installs or updates the patcher jar to the stable version of the updater index.
    pub async fn check_patcher(
        &self,
        settings: &mut SettingsStore,
    ) -> LauncherResult<PatcherUpdate> {
        info!("Checking patcher...");
        self.frontend.status(LaunchStatus::CheckingPatcher);

        let index = self.api.fetch_updater_index().await?;
        let latest = index.stable_patcher().to_string();
        let jar = self.layout.patcher_jar();

        if !exists(&jar).await {
            self.download_patcher(&latest).await?;
            settings.set(KEY_PATCHER_VERSION, &latest)?;
            return Ok(PatcherUpdate::Installed(latest));
        }

        let persisted = persisted_patcher_version(settings);
        if persisted.as_deref() == Some(latest.as_str()) {
            info!("Patcher is up to date {}", latest);
            return Ok(PatcherUpdate::UpToDate(latest));
        }

        self.download_patcher(&latest).await?;
        info!("Patcher updated to {}", latest);
        settings.set(KEY_PATCHER_VERSION, &latest)?;

        debug!("Updating config.json file to match new patcher config...");
        self.merge_config_with_example().await?;

        Ok(PatcherUpdate::Updated {
            from: persisted,
            to: latest,
        })
    }

    /// Seeds the patcher config from the remote example when it is missing.
    pub async fn check_patcher_config(&self) -> LauncherResult<bool> {
        let path = self.layout.patcher_config();
        if exists(&path).await {
            return Ok(false);
        }

        info!("Creating patcher config file");
        let request = FetchRequest::text(self.api.config_example_url(), path).parent_exists();
        self.fetcher.fetch(&request).await?;
        info!("Created default patcher config");
        Ok(true)
    }

    async fn download_patcher(&self, version: &str) -> LauncherResult<()> {
        let request = FetchRequest::binary(
            self.api.patcher_download_url(version),
            self.layout.patcher_jar(),
        );
        self.fetcher.fetch(&request).await?;
        Ok(())
    }

    async fn merge_config_with_example(&self) -> LauncherResult<()> {
        let path = self.layout.patcher_config();
        if !exists(&path).await {
            debug!("No patcher config to merge yet");
            return Ok(());
        }

        let remote = self.api.fetch_config_example().await?;
        let user = PatcherConfig::load(&path).await?.into_value();
        let merged = PatcherConfig::from_value(merge_remote(&remote, &user))?;
        merged.save(&path).await
    }
}

fn record(report: &mut ReconcileReport, step: &str, err: LauncherError) {
    error!("Step '{}' failed: {}", step, err);
    report.failures.push(format!("{step}: {err}"));
}

async fn exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// The stored tag may be a string or, from older settings files, a number.
fn persisted_patcher_version(settings: &SettingsStore) -> Option<String> {
    match settings.get::<Value>(KEY_PATCHER_VERSION) {
        Ok(Some(Value::String(version))) => Some(version),
        Ok(Some(Value::Number(version))) => Some(version.to_string()),
        _ => None,
    }
}
