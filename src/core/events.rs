// ─── Launch Events ───
// Progress reporting from the core to whatever front end drives it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::core::settings::ActionAfterLaunch;

/// Stage of a launch attempt, rendered by the front end as title/message/icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum LaunchStatus {
    FetchingMetadata,
    CheckingFolders,
    CheckingSubfolders { current: usize, total: usize },
    CheckingJre,
    CheckingLicenses { count: usize },
    CheckingGameFiles { count: usize },
    CheckingNatives,
    CheckingAssets,
    CheckingPatcher,
    PatchingGame,
    StartingJvm,
    Ready { version: String },
    Error { message: String },
}

impl LaunchStatus {
    pub fn title(&self) -> String {
        match self {
            LaunchStatus::Ready { version } => format!("LAUNCH {version}"),
            LaunchStatus::Error { .. } => "Error".to_string(),
            _ => "LAUNCHING...".to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            LaunchStatus::FetchingMetadata => "FETCHING METADATA...".into(),
            LaunchStatus::CheckingFolders => "CHECKING LC FOLDER...".into(),
            LaunchStatus::CheckingSubfolders { current, total } => {
                format!("CHECKING SUBFOLDERS {current}/{total}")
            }
            LaunchStatus::CheckingJre => "CHECKING JRE...".into(),
            LaunchStatus::CheckingLicenses { count } => format!("CHECKING {count} LICENSES ..."),
            LaunchStatus::CheckingGameFiles { count } => format!("CHECKING GAMEFILES ({count})..."),
            LaunchStatus::CheckingNatives => "CHECKING NATIVES...".into(),
            LaunchStatus::CheckingAssets => "CHECKING LC ASSETS...".into(),
            LaunchStatus::CheckingPatcher => "CHECKING PATCHER...".into(),
            LaunchStatus::PatchingGame => "PATCHING GAME...".into(),
            LaunchStatus::StartingJvm => "STARTING JVM...".into(),
            LaunchStatus::Ready { .. } => "READY TO LAUNCH".into(),
            LaunchStatus::Error { message } => message.clone(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LaunchStatus::FetchingMetadata => "fa-solid fa-download",
            LaunchStatus::CheckingLicenses { .. } => "fa-solid fa-gavel",
            LaunchStatus::CheckingGameFiles { .. }
            | LaunchStatus::CheckingNatives
            | LaunchStatus::CheckingPatcher => "fa-solid fa-file",
            LaunchStatus::PatchingGame => "fa-solid fa-cog",
            LaunchStatus::StartingJvm | LaunchStatus::Ready { .. } => "fa-solid fa-gamepad",
            LaunchStatus::Error { .. } => "fa-solid fa-exclamation-triangle",
            _ => "fa-solid fa-folder",
        }
    }
}

/// Everything the core reports while a launch attempt runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LaunchEvent {
    Status(LaunchStatus),
    /// Mirrors the front end's "launching" flag that guards against concurrent launches.
    Launching { active: bool },
    /// The game produced its first output; the front end applies `action` to its window.
    GameStarted { action: ActionAfterLaunch },
    /// The game's output stream ended; the front end restores its window.
    GameClosed,
}

/// Answer to the blocking "JRE not found" question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JreResolution {
    Select(PathBuf),
    Cancel,
}

/// UI collaborator driven by the core.
#[async_trait]
pub trait LaunchFrontend: Send + Sync {
    fn emit(&self, event: LaunchEvent);

    /// Ask the user for a new JRE `bin` folder, or to cancel the launch.
    async fn resolve_missing_jre(&self, current: &Path) -> JreResolution;

    fn status(&self, status: LaunchStatus) {
        self.emit(LaunchEvent::Status(status));
    }
}
