// ─── Launch API ───
// Remote endpoints the launch pipeline talks to: the client's launch
// metadata, the updater index, the patcher config example and launch tracking.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::http::{build_http_client, ensure_success};

// ── Metadata ────────────────────────────────────────────

/// Launch descriptor returned by the metadata endpoint. Scoped to one launch attempt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    #[serde(default)]
    pub jre: JreTemplate,
    pub launch_type_data: LaunchTypeData,
    #[serde(default)]
    pub licenses: Vec<License>,
    pub textures: TextureSource,
}

impl RemoteMetadata {
    /// The archive holding the platform's native libraries, if the descriptor lists one.
    pub fn natives_artifact(&self) -> Option<&Artifact> {
        self.launch_type_data
            .artifacts
            .iter()
            .find(|artifact| artifact.kind == ArtifactType::Natives)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JreTemplate {
    #[serde(default)]
    pub extra_arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTypeData {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    pub main_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ArtifactType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    Natives,
    ClassPath,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct License {
    pub file: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureSource {
    pub index_url: String,
    pub index_sha1: String,
    pub base_url: String,
}

/// Body posted to the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRequest {
    pub hwid: String,
    pub os: String,
    pub arch: String,
    pub version: String,
    pub branch: String,
    pub launch_type: String,
    pub classifier: String,
}

impl MetadataRequest {
    pub fn new(hwid: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            hwid: hwid.into(),
            os: node_platform().to_string(),
            arch: node_arch().to_string(),
            version: version.into(),
            branch: "master".to_string(),
            launch_type: "OFFLINE".to_string(),
            classifier: "optifine".to_string(),
        }
    }
}

/// Platform name as the metadata endpoint expects it.
pub fn node_platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

/// CPU architecture name as the metadata endpoint expects it.
pub fn node_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        other => other,
    }
}

// ── Updater ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdaterIndex {
    pub index: ReleaseChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseChannels {
    pub stable: Release,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub launcher: String,
    pub patcher: String,
}

impl UpdaterIndex {
    pub fn stable_patcher(&self) -> &str {
        &self.index.stable.patcher
    }
}

#[derive(Debug, Serialize)]
struct LaunchTracking<'a> {
    item: &'a str,
    version: String,
}

/// Version string reported to launch tracking.
pub fn tracked_version(version: &str) -> String {
    if version == "1.18" {
        "1.18.1".to_string()
    } else {
        version.to_string()
    }
}

// ── Trait seam ──────────────────────────────────────────

#[async_trait]
pub trait LaunchApi: Send + Sync {
    async fn fetch_metadata(&self, request: &MetadataRequest) -> LauncherResult<RemoteMetadata>;

    async fn fetch_updater_index(&self) -> LauncherResult<UpdaterIndex>;

    async fn fetch_config_example(&self) -> LauncherResult<Value>;

    async fn track_launch(&self, version: &str) -> LauncherResult<()>;

    fn patcher_download_url(&self, version: &str) -> String;

    fn config_example_url(&self) -> String;
}

/// `LaunchApi` over HTTP, with endpoints taken from `launcher.json`.
pub struct HttpLaunchApi {
    client: Client,
    config: LauncherConfig,
}

impl HttpLaunchApi {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            config,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> LauncherResult<T> {
        debug!("GET {}", url);
        let response = ensure_success(self.client.get(url).send().await?, url)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LaunchApi for HttpLaunchApi {
    async fn fetch_metadata(&self, request: &MetadataRequest) -> LauncherResult<RemoteMetadata> {
        info!("Fetching metadata...");
        let url = &self.config.metadata_endpoint;
        let response = ensure_success(self.client.post(url).json(request).send().await?, url)?;
        let metadata: RemoteMetadata = response.json().await?;
        debug!(
            "Fetched metadata ({} artifacts, {} licenses)",
            metadata.launch_type_data.artifacts.len(),
            metadata.licenses.len()
        );
        Ok(metadata)
    }

    async fn fetch_updater_index(&self) -> LauncherResult<UpdaterIndex> {
        self.get_json(&self.config.updater_index_url()).await
    }

    async fn fetch_config_example(&self) -> LauncherResult<Value> {
        self.get_json(&self.config.patcher_config_example_url).await
    }

    async fn track_launch(&self, version: &str) -> LauncherResult<()> {
        let body = LaunchTracking {
            item: "launcher",
            version: tracked_version(version),
        };
        let url = self.config.launch_tracking_url();
        let response = self.client.post(&url).json(&body).send().await?;
        ensure_success(response, &url)?;
        Ok(())
    }

    fn patcher_download_url(&self, version: &str) -> String {
        self.config.patcher_download_url(version)
    }

    fn config_example_url(&self) -> String {
        self.config.patcher_config_example_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"{
        "jre": { "extraArguments": ["-Djna.tmpdir=natives", "-Dfoo=bar"] },
        "launchTypeData": {
            "mainClass": "com.moonsworth.lunar.patcher.LunarMain",
            "artifacts": [
                { "name": "lunar-libs.jar", "url": "https://cdn.test/libs", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "type": "CLASS_PATH" },
                { "name": "natives-linux.zip", "url": "https://cdn.test/natives", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "type": "NATIVES" },
                { "name": "readme.txt", "url": "https://cdn.test/readme", "type": "JAVAAGENT" }
            ]
        },
        "licenses": [ { "file": "LICENSE-lwjgl.txt", "url": "https://cdn.test/lic", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d" } ],
        "textures": { "indexUrl": "https://cdn.test/index", "indexSha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "baseUrl": "https://textures.test/" }
    }"#;

    #[test]
    fn deserialize_metadata() {
        let metadata: RemoteMetadata = serde_json::from_str(METADATA).unwrap();

        assert_eq!(metadata.jre.extra_arguments.len(), 2);
        assert_eq!(metadata.launch_type_data.artifacts.len(), 3);
        assert_eq!(metadata.launch_type_data.artifacts[2].kind, ArtifactType::Other);
        assert!(metadata.launch_type_data.artifacts[2].sha1.is_none());
        assert_eq!(metadata.licenses[0].file, "LICENSE-lwjgl.txt");
        assert_eq!(metadata.textures.base_url, "https://textures.test/");
        assert_eq!(
            metadata.natives_artifact().map(|a| a.name.as_str()),
            Some("natives-linux.zip")
        );
    }

    #[test]
    fn metadata_request_uses_fixed_channel_values() {
        let request = MetadataRequest::new("hw-1", "1.8");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["hwid"], "hw-1");
        assert_eq!(json["version"], "1.8");
        assert_eq!(json["branch"], "master");
        assert_eq!(json["launch_type"], "OFFLINE");
        assert_eq!(json["classifier"], "optifine");
        assert_ne!(json["os"], "windows");
    }

    #[test]
    fn deserialize_updater_index() {
        let index: UpdaterIndex = serde_json::from_str(
            r#"{ "index": { "stable": { "launcher": "4.2.0", "patcher": "12" } } }"#,
        )
        .unwrap();
        assert_eq!(index.stable_patcher(), "12");
    }

    #[test]
    fn tracking_reports_full_1_18_version() {
        assert_eq!(tracked_version("1.18"), "1.18.1");
        assert_eq!(tracked_version("1.8"), "1.8");
    }
}
