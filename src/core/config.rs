use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::downloader::DigestPolicy;

pub const DEFAULT_API_URL: &str = "https://server.solartweaks.com/api";
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://api.lunarclientprod.com/launcher/launch";
pub const DEFAULT_PATCHER_CONFIG_EXAMPLE_URL: &str =
    "https://raw.githubusercontent.com/Solar-Tweaks/SolarPatcher/main/config.example.json";

/// Launcher-level configuration persisted as `launcher.json` in the tool directory.
///
/// Every field is optional on disk; missing keys take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Solar Tweaks API base (updater index, patcher downloads, launch tracking).
    pub api_url: String,
    /// Launch-metadata endpoint of the game client.
    pub metadata_endpoint: String,
    pub patcher_config_example_url: String,
    /// Maximum number of texture assets checked/downloaded at once.
    pub asset_concurrency: usize,
    /// What to do when a downloaded file does not match its digest.
    pub digest_policy: DigestPolicy,
    /// Delay between the game's first output and the launch commit.
    pub post_launch_delay_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            patcher_config_example_url: DEFAULT_PATCHER_CONFIG_EXAMPLE_URL.to_string(),
            asset_concurrency: 8,
            digest_policy: DigestPolicy::Warn,
            post_launch_delay_ms: 1500,
        }
    }
}

impl LauncherConfig {
    /// Reads `path`, falling back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No launcher config at {:?}, using defaults", path);
                return Self::default();
            }
        };

        match serde_json::from_str::<LauncherConfig>(&raw) {
            Ok(mut config) => {
                if config.asset_concurrency == 0 {
                    config.asset_concurrency = 1;
                }
                config
            }
            Err(err) => {
                warn!("Ignoring invalid launcher config {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn updater_index_url(&self) -> String {
        format!("{}/updater/index", self.api_url)
    }

    pub fn patcher_download_url(&self, version: &str) -> String {
        format!("{}/updater/?item=patcher&version={}", self.api_url, version)
    }

    pub fn launch_tracking_url(&self) -> String {
        format!("{}/launch", self.api_url)
    }
}
