// ─── Launch Settings ───
// Persisted key/value store (settings.json) and the typed snapshot the
// launch pipeline reads from it.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::{default_minecraft_dir, InstallLayout};

pub const KEY_VERSION: &str = "version";
pub const KEY_JRE_PATH: &str = "jrePath";
pub const KEY_PATCHER_VERSION: &str = "patcherVersion";
pub const KEY_HARDWARE_ID: &str = "hardwareId";
pub const KEY_DOWNLOADED_JRES: &str = "downloadedJres";

const DEFAULT_JRE_FOLDER: &str = "zulu17.30.15-ca-fx-jre17.0.1-win_x64";
const DEFAULT_VERSIONS: [&str; 6] = ["1.7", "1.8", "1.12", "1.16", "1.17", "1.18"];

// ── Store ───────────────────────────────────────────────

/// JSON object on disk with `get`/`set`/`has`. Every `set` is written through.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!("Ignoring invalid settings file {:?}: {}", path, err);
                    Map::new()
                }
            },
            Err(_) => {
                debug!("No settings file at {:?}", path);
                Map::new()
            }
        };

        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Typed read; `Ok(None)` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> LauncherResult<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| LauncherError::Settings {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> LauncherResult<()> {
        let value = serde_json::to_value(value)?;
        debug!("Setting {} = {}", key, value);
        self.values.insert(key.to_string(), value);
        self.save()
    }

    pub fn save(&self) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::io(&self.path, e))
    }

    /// Fills every key missing from the store with its default and persists
    /// once if anything changed. Existing values are never touched.
    pub fn ensure_defaults(&mut self, defaults: Map<String, Value>) -> LauncherResult<usize> {
        info!("Setting up settings...");
        let mut added = 0;
        for (key, value) in defaults {
            if !self.values.contains_key(&key) {
                debug!("Using default for {}", key);
                self.values.insert(key, value);
                added += 1;
            }
        }
        if added > 0 {
            self.save()?;
        }
        info!("Settings setup ({} defaults applied)", added);
        Ok(added)
    }

    /// Stable id sent with metadata requests, generated on first use.
    pub fn hardware_id(&mut self) -> LauncherResult<String> {
        if let Some(id) = self.get::<String>(KEY_HARDWARE_ID)? {
            if !id.is_empty() {
                return Ok(id);
            }
        }
        let id = uuid::Uuid::new_v4().to_string();
        info!("Generated hardware id {}", id);
        self.set(KEY_HARDWARE_ID, &id)?;
        Ok(id)
    }

    /// Typed view of the settings the pipeline reads.
    pub fn snapshot(&self) -> LauncherResult<LaunchSettings> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            LauncherError::Settings {
                key: "settings.json".to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Default values written on first start.
pub fn default_settings(layout: &InstallLayout) -> Map<String, Value> {
    let minecraft = default_minecraft_dir().to_string_lossy().into_owned();
    let jre_path = layout
        .jre_dir()
        .join(DEFAULT_JRE_FOLDER)
        .join("bin")
        .to_string_lossy()
        .into_owned();
    let launch_directories: Vec<Value> = DEFAULT_VERSIONS
        .iter()
        .map(|version| json!({ "version": version, "path": minecraft }))
        .collect();

    let defaults = json!({
        "servers": [
            { "name": "Hypixel", "ip": "hypixel.net", "background": 7 },
            { "name": "Minemen Club", "ip": "na.minemen.club", "background": 3 },
            { "name": "Lunar Network", "ip": "lunar.gg", "background": 1 },
            { "name": "ViperMC", "ip": "play.vipermc.net", "background": 5 },
            { "name": "BWHub", "ip": "bwhub.net", "background": 4 },
        ],
        "customizations": [],
        "version": "1.8",
        "launchDirectories": launch_directories,
        "ram": 4000,
        "resolution": { "width": 854, "height": 480 },
        "actionAfterLaunch": "close",
        "jvmArguments": "-XX:+DisableAttachMechanism",
        "jrePath": jre_path,
        "debugMode": false,
        "skipChecks": false,
        "downloadedJres": [],
    });

    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ── Typed snapshot ──────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionAfterLaunch {
    #[default]
    Close,
    Hide,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 854,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDirectory {
    pub version: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSettings {
    pub version: String,
    /// Maximum heap in megabytes.
    pub ram: u32,
    #[serde(default)]
    pub resolution: Resolution,
    /// The JRE `bin` folder.
    pub jre_path: PathBuf,
    #[serde(default)]
    pub jvm_arguments: String,
    #[serde(default)]
    pub launch_directories: Vec<LaunchDirectory>,
    #[serde(default)]
    pub action_after_launch: ActionAfterLaunch,
    #[serde(default)]
    pub skip_checks: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default, deserialize_with = "lenient_customizations")]
    pub customizations: Vec<Customization>,
}

impl LaunchSettings {
    /// `--gameDir` for `version`, falling back to the vanilla directory.
    pub fn launch_directory(&self, version: &str) -> PathBuf {
        self.launch_directories
            .iter()
            .find(|dir| dir.version == version)
            .map(|dir| dir.path.clone())
            .unwrap_or_else(default_minecraft_dir)
    }
}

// ── Customizations ──────────────────────────────────────

/// A user-selected patch, decided once when settings are read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCustomization")]
pub enum Customization {
    /// Sets `isEnabled` on each named module.
    PrivacyToggle { modules: Vec<String>, enabled: bool },
    /// Sets `isEnabled` on one module and copies `values` onto it.
    ModuleToggle {
        internal: String,
        enabled: bool,
        values: Map<String, Value>,
    },
    /// Appends `call` to `metadata.removeCalls`.
    MetadataRemoveCall { call: String },
}

/// Shape the settings UI stores; extra descriptive keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCustomization {
    #[serde(default)]
    privacy_modules: Option<Vec<String>>,
    #[serde(default)]
    internal: Option<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    values: Option<Map<String, Value>>,
    #[serde(default)]
    call: Option<String>,
}

impl TryFrom<RawCustomization> for Customization {
    type Error = String;

    fn try_from(raw: RawCustomization) -> Result<Self, Self::Error> {
        if let Some(modules) = raw.privacy_modules {
            return Ok(Customization::PrivacyToggle {
                modules,
                enabled: raw.enabled,
            });
        }

        let internal = raw
            .internal
            .ok_or_else(|| "customization has neither privacyModules nor internal".to_string())?;

        if internal == "metadata" {
            let call = raw
                .call
                .ok_or_else(|| "metadata customization without call".to_string())?;
            return Ok(Customization::MetadataRemoveCall { call });
        }

        Ok(Customization::ModuleToggle {
            internal,
            enabled: raw.enabled,
            values: raw.values.unwrap_or_default(),
        })
    }
}

/// Drops entries that cannot be decided instead of failing the whole snapshot.
fn lenient_customizations<'de, D>(deserializer: D) -> Result<Vec<Customization>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Customization>(value) {
            Ok(customization) => Some(customization),
            Err(err) => {
                warn!("Skipping invalid customization: {}", err);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SettingsStore {
        SettingsStore::load(dir.join("settings.json"))
    }

    #[test]
    fn set_is_persisted_and_reloaded() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store_in(temp.path());
        assert!(!store.has(KEY_PATCHER_VERSION));

        store.set(KEY_PATCHER_VERSION, "12").unwrap();

        let reloaded = store_in(temp.path());
        assert!(reloaded.has(KEY_PATCHER_VERSION));
        assert_eq!(
            reloaded.get::<String>(KEY_PATCHER_VERSION).unwrap().as_deref(),
            Some("12")
        );
    }

    #[test]
    fn defaults_never_overwrite_existing_values() {
        let temp = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(temp.path());
        let mut store = store_in(temp.path());
        store.set("ram", 2048).unwrap();

        let added = store.ensure_defaults(default_settings(&layout)).unwrap();
        assert!(added > 0);
        assert_eq!(store.get::<u32>("ram").unwrap(), Some(2048));
        assert_eq!(store.ensure_defaults(default_settings(&layout)).unwrap(), 0);

        let settings = store.snapshot().unwrap();
        assert_eq!(settings.version, "1.8");
        assert_eq!(settings.resolution, Resolution::default());
        assert_eq!(settings.action_after_launch, ActionAfterLaunch::Close);
        assert_eq!(settings.jvm_arguments, "-XX:+DisableAttachMechanism");
        assert!(settings.jre_path.ends_with("bin"));
        assert_eq!(settings.launch_directories.len(), 6);
        assert!(!settings.skip_checks);
    }

    #[test]
    fn hardware_id_is_generated_once() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store_in(temp.path());

        let first = store.hardware_id().unwrap();
        let second = store_in(temp.path()).hardware_id().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn wrong_type_is_a_settings_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store_in(temp.path());
        store.set("ram", "lots").unwrap();

        let err = store.get::<u32>("ram").unwrap_err();
        assert!(matches!(err, LauncherError::Settings { ref key, .. } if key == "ram"));
    }

    #[test]
    fn customizations_are_decided_on_read() {
        let parsed: Vec<Customization> = serde_json::from_value(json!([
            { "name": "Hide tracking", "privacyModules": ["analytics", "telemetry"], "enabled": true },
            { "internal": "metadata", "call": "pinnedServers" },
            { "internal": "fpsLimit", "enabled": true, "values": { "limit": 240 } },
            { "internal": "toggleSprint", "enabled": false }
        ]))
        .unwrap();

        assert_eq!(
            parsed[0],
            Customization::PrivacyToggle {
                modules: vec!["analytics".into(), "telemetry".into()],
                enabled: true
            }
        );
        assert_eq!(
            parsed[1],
            Customization::MetadataRemoveCall {
                call: "pinnedServers".into()
            }
        );
        match &parsed[2] {
            Customization::ModuleToggle {
                internal,
                enabled,
                values,
            } => {
                assert_eq!(internal, "fpsLimit");
                assert!(*enabled);
                assert_eq!(values["limit"], 240);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            &parsed[3],
            Customization::ModuleToggle { values, .. } if values.is_empty()
        ));
    }

    #[test]
    fn undecidable_customizations_are_skipped_in_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store_in(temp.path());
        store.set("version", "1.8").unwrap();
        store.set("ram", 3000).unwrap();
        store.set("jrePath", "/opt/jre/bin").unwrap();
        store
            .set(
                "customizations",
                json!([{ "enabled": true }, { "internal": "zoom", "enabled": true }]),
            )
            .unwrap();

        let settings = store.snapshot().unwrap();
        assert_eq!(settings.customizations.len(), 1);
        assert_eq!(settings.ram, 3000);
    }

    #[test]
    fn launch_directory_falls_back_to_vanilla_dir() {
        let settings = LaunchSettings {
            version: "1.8".into(),
            ram: 4000,
            resolution: Resolution::default(),
            jre_path: PathBuf::from("/jre/bin"),
            jvm_arguments: String::new(),
            launch_directories: vec![LaunchDirectory {
                version: "1.8".into(),
                path: PathBuf::from("/games/pvp"),
            }],
            action_after_launch: ActionAfterLaunch::Keep,
            skip_checks: false,
            debug_mode: false,
            customizations: Vec::new(),
        };

        assert_eq!(settings.launch_directory("1.8"), PathBuf::from("/games/pvp"));
        assert_eq!(settings.launch_directory("1.12"), default_minecraft_dir());
    }
}
