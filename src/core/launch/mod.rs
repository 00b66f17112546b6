// ─── Launch Pipeline ───
// metadata → reconcile → patch → arguments → spawn → tracking.

pub mod args;
pub mod process;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::core::api::{LaunchApi, MetadataRequest, RemoteMetadata};
use crate::core::config::LauncherConfig;
use crate::core::downloader::Fetch;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LaunchEvent, LaunchFrontend, LaunchStatus};
use crate::core::java::check_heap_size;
use crate::core::paths::{java_exe, InstallLayout};
use crate::core::patcher::patch_game;
use crate::core::provision::ensure_dir;
use crate::core::reconciler::Reconciler;
use crate::core::settings::SettingsStore;

pub use args::{build_arguments, ArgumentContext, Platform};
pub use process::{commit_launch, launch_game, GameLaunch, LaunchOutcome};

/// Optional overrides for one launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub server_ip: Option<String>,
    pub override_version: Option<String>,
}

/// Owns the collaborators of a launch attempt.
pub struct Launcher {
    layout: InstallLayout,
    config: LauncherConfig,
    fetcher: Arc<dyn Fetch>,
    api: Arc<dyn LaunchApi>,
    frontend: Arc<dyn LaunchFrontend>,
}

impl Launcher {
    pub fn new(
        layout: InstallLayout,
        config: LauncherConfig,
        fetcher: Arc<dyn Fetch>,
        api: Arc<dyn LaunchApi>,
        frontend: Arc<dyn LaunchFrontend>,
    ) -> Self {
        Self {
            layout,
            config,
            fetcher,
            api,
            frontend,
        }
    }

    /// Requests launch metadata for `version` with the persisted hardware id.
    pub async fn fetch_metadata(
        &self,
        settings: &mut SettingsStore,
        version: &str,
    ) -> LauncherResult<RemoteMetadata> {
        let hwid = settings.hardware_id()?;
        self.api
            .fetch_metadata(&MetadataRequest::new(hwid, version))
            .await
    }

    /// Full launch: fetch metadata, reconcile the installation unless
    /// `skipChecks` is set, patch the config, then spawn the game.
    ///
    /// Unreadable settings, a metadata failure or a refused JRE prompt abort
    /// the attempt and restore the idle state before the error is returned.
    pub async fn check_and_launch(
        &self,
        settings: &mut SettingsStore,
        request: &LaunchRequest,
    ) -> LauncherResult<LaunchOutcome> {
        self.frontend.emit(LaunchEvent::Launching { active: true });
        self.frontend.status(LaunchStatus::FetchingMetadata);

        let snapshot = match settings.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.abort(request.override_version.as_deref().unwrap_or_default(), &err);
                return Err(err);
            }
        };
        let version = request
            .override_version
            .clone()
            .unwrap_or_else(|| snapshot.version.clone());

        let metadata = match self.fetch_metadata(settings, &version).await {
            Ok(metadata) => metadata,
            Err(err) => {
                error!("Failed to fetch metadata: {}", err);
                self.frontend.status(LaunchStatus::Error {
                    message: format!("Failed to fetch metadata: {err}"),
                });
                self.frontend.emit(LaunchEvent::Launching { active: false });
                return Err(err);
            }
        };

        if snapshot.skip_checks {
            info!("Skipping installation checks");
        } else {
            let reconciler = Reconciler::new(
                &self.layout,
                self.fetcher.as_ref(),
                self.api.as_ref(),
                self.frontend.as_ref(),
                self.config.asset_concurrency,
            );
            match reconciler.run(settings, &version, &metadata).await {
                Ok(report) if !report.failures.is_empty() => {
                    warn!("Installation checks finished with {} failures", report.failures.len());
                }
                Ok(_) => {}
                Err(err) => {
                    self.abort(&version, &err);
                    return Err(err);
                }
            }
        }

        // re-read: the reconciler may have changed jrePath or patcherVersion
        let snapshot = match settings.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.abort(&version, &err);
                return Err(err);
            }
        };

        self.frontend.status(LaunchStatus::PatchingGame);
        if let Err(err) = patch_game(&self.layout.patcher_config(), &snapshot.customizations).await {
            error!("Failed to patch game: {}", err);
        }

        check_heap_size(snapshot.ram);

        let args = build_arguments(&ArgumentContext {
            layout: &self.layout,
            metadata: &metadata,
            settings: &snapshot,
            patcher_present: self.layout.patcher_jar().is_file(),
            server_ip: request.server_ip.as_deref(),
            override_version: Some(&version),
            for_shortcut: false,
            platform: Platform::current(),
        });

        ensure_dir(&self.layout.logs_dir()).await;
        ensure_dir(&self.layout.version_dir(&version)).await;
        let launch = GameLaunch {
            java: snapshot.jre_path.join(java_exe()),
            args,
            working_dir: self.layout.version_dir(&version),
            log_path: self.layout.game_log(&version),
            version: version.clone(),
            action: snapshot.action_after_launch,
            debug_mode: snapshot.debug_mode,
            commit_delay: Duration::from_millis(self.config.post_launch_delay_ms),
        };
        let outcome = launch_game(launch, Arc::clone(&self.frontend)).await;

        if !matches!(outcome, LaunchOutcome::SpawnFailed(_)) {
            if let Err(err) = self.api.track_launch(&version).await {
                warn!("Failed to track launch: {}", err);
            }
        }

        Ok(outcome)
    }

    fn abort(&self, version: &str, err: &LauncherError) {
        match err {
            LauncherError::JreNotFound(path) => {
                warn!("Launch cancelled, no JRE at {:?}", path);
                commit_launch(self.frontend.as_ref(), version);
            }
            other => {
                error!("Launch aborted: {}", other);
                self.frontend.status(LaunchStatus::Error {
                    message: other.to_string(),
                });
                self.frontend.emit(LaunchEvent::Launching { active: false });
            }
        }
    }
}
