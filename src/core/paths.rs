// ─── Installation Layout ───
// Fixed directory tree shared by the launcher and the game client.

use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

const BASE_DIR_NAME: &str = ".lunarclient";
const TOOL_DIR_NAME: &str = "solartweaks";

pub const PATCHER_JAR: &str = "solar-patcher.jar";
pub const PATCHER_CONFIG: &str = "config.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LAUNCHER_CONFIG_FILE: &str = "launcher.json";
pub const TEXTURE_INDEX_FILE: &str = "index.txt";

/// Every path the pipeline touches, derived from one base directory.
///
/// ```text
/// <base>/textures/                  texture cache + index.txt
/// <base>/licenses/
/// <base>/offline/<version>/         game artifacts
/// <base>/offline/<version>/natives/
/// <base>/jre/
/// <base>/solartweaks/               patcher jar, config.json, settings, logs/, wrappers/, jres/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    base_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Layout rooted at `~/.lunarclient`.
    pub fn from_home() -> LauncherResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| LauncherError::Other("Cannot resolve the home directory".into()))?;
        Ok(Self::new(home.join(BASE_DIR_NAME)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.base_dir.join("textures")
    }

    pub fn texture_index_path(&self) -> PathBuf {
        self.textures_dir().join(TEXTURE_INDEX_FILE)
    }

    pub fn licenses_dir(&self) -> PathBuf {
        self.base_dir.join("licenses")
    }

    pub fn offline_dir(&self) -> PathBuf {
        self.base_dir.join("offline")
    }

    /// Directory holding the artifacts of one game version.
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.offline_dir().join(version)
    }

    pub fn natives_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("natives")
    }

    pub fn jre_dir(&self) -> PathBuf {
        self.base_dir.join("jre")
    }

    pub fn tool_dir(&self) -> PathBuf {
        self.base_dir.join(TOOL_DIR_NAME)
    }

    pub fn patcher_jar(&self) -> PathBuf {
        self.tool_dir().join(PATCHER_JAR)
    }

    pub fn patcher_config(&self) -> PathBuf {
        self.tool_dir().join(PATCHER_CONFIG)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.tool_dir().join(SETTINGS_FILE)
    }

    pub fn launcher_config_file(&self) -> PathBuf {
        self.tool_dir().join(LAUNCHER_CONFIG_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.tool_dir().join("logs")
    }

    pub fn launcher_log(&self) -> PathBuf {
        self.logs_dir().join("launcher-latest.log")
    }

    /// Per-version game log, truncated on every launch.
    pub fn game_log(&self, version: &str) -> PathBuf {
        self.logs_dir().join(format!("{version}-latest.log"))
    }

    pub fn wrappers_dir(&self) -> PathBuf {
        self.tool_dir().join("wrappers")
    }

    pub fn jres_dir(&self) -> PathBuf {
        self.tool_dir().join("jres")
    }
}

/// The vanilla game directory used as the default `--gameDir`.
pub fn default_minecraft_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library")
            .join("Application Support")
            .join("minecraft")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    }
}

/// Name of the java executable inside a JRE `bin` folder.
pub fn java_exe() -> &'static str {
    if cfg!(target_os = "windows") {
        "java.exe"
    } else {
        "java"
    }
}

/// Windowless java launcher used by shortcut wrappers.
pub fn javaw_exe() -> &'static str {
    if cfg!(target_os = "windows") {
        "javaw.exe"
    } else {
        "java"
    }
}
