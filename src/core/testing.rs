// Test doubles for the network and UI seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::api::{LaunchApi, MetadataRequest, RemoteMetadata, UpdaterIndex};
use crate::core::downloader::{Fetch, FetchOutcome, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{JreResolution, LaunchEvent, LaunchFrontend, LaunchStatus};

/// Writes canned content instead of downloading and records every request.
#[derive(Default)]
pub struct RecordingFetcher {
    requests: Mutex<Vec<FetchRequest>>,
    bodies: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Fetch for RecordingFetcher {
    async fn fetch(&self, request: &FetchRequest) -> LauncherResult<FetchOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.contains(&request.url) {
            return Err(LauncherError::DownloadFailed {
                url: request.url.clone(),
                status: 500,
            });
        }

        let body = self
            .bodies
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| request.url.as_bytes().to_vec());
        if let Some(parent) = request.dest.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(&request.dest, body).await.unwrap();
        Ok(FetchOutcome::Unverified)
    }
}

/// In-memory `LaunchApi` with call counters.
pub struct FakeApi {
    pub metadata: Option<RemoteMetadata>,
    pub stable_patcher: String,
    pub config_example: Value,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new(metadata: RemoteMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            stable_patcher: "12".to_string(),
            config_example: json!({ "metadata": { "isEnabled": true, "removeCalls": [] } }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl LaunchApi for FakeApi {
    async fn fetch_metadata(&self, _request: &MetadataRequest) -> LauncherResult<RemoteMetadata> {
        self.record("metadata");
        self.metadata
            .clone()
            .ok_or_else(|| LauncherError::Other("metadata endpoint unavailable".into()))
    }

    async fn fetch_updater_index(&self) -> LauncherResult<UpdaterIndex> {
        self.record("index");
        Ok(serde_json::from_value(json!({
            "index": { "stable": { "launcher": "4.0.0", "patcher": self.stable_patcher } }
        }))
        .unwrap())
    }

    async fn fetch_config_example(&self) -> LauncherResult<Value> {
        self.record("config_example");
        Ok(self.config_example.clone())
    }

    async fn track_launch(&self, _version: &str) -> LauncherResult<()> {
        self.record("track");
        Ok(())
    }

    fn patcher_download_url(&self, version: &str) -> String {
        format!("https://api.test/updater/?item=patcher&version={version}")
    }

    fn config_example_url(&self) -> String {
        "https://api.test/config.example.json".to_string()
    }
}

/// Frontend that records events and answers the JRE prompt from a queue.
#[derive(Default)]
pub struct RecordingFrontend {
    events: Mutex<Vec<LaunchEvent>>,
    answers: Mutex<VecDeque<JreResolution>>,
    prompts: Mutex<usize>,
}

impl RecordingFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: impl IntoIterator<Item = JreResolution>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<LaunchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<LaunchStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LaunchEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> usize {
        *self.prompts.lock().unwrap()
    }
}

#[async_trait]
impl LaunchFrontend for RecordingFrontend {
    fn emit(&self, event: LaunchEvent) {
        self.events.lock().unwrap().push(event);
    }

    async fn resolve_missing_jre(&self, _current: &Path) -> JreResolution {
        *self.prompts.lock().unwrap() += 1;
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(JreResolution::Cancel)
    }
}

/// Metadata with one class-path jar, one natives archive and one license.
pub fn sample_metadata() -> RemoteMetadata {
    serde_json::from_value(json!({
        "jre": { "extraArguments": ["-Djava.library.path=natives", "-XX:+UseG1GC"] },
        "launchTypeData": {
            "mainClass": "com.moonsworth.lunar.patcher.LunarMain",
            "artifacts": [
                { "name": "lunar-prod-optifine.jar", "url": "https://cdn.test/lunar-prod-optifine.jar", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "type": "CLASS_PATH" },
                { "name": "natives.zip", "url": "https://cdn.test/natives.zip", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d", "type": "NATIVES" }
            ]
        },
        "licenses": [
            { "file": "LICENSE.txt", "url": "https://cdn.test/LICENSE.txt", "sha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d" }
        ],
        "textures": {
            "indexUrl": "https://cdn.test/textures/index.txt",
            "indexSha1": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d",
            "baseUrl": "https://textures.test/"
        }
    }))
    .unwrap()
}
