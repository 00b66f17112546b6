// ─── Patcher Config ───
// The agent's config.json: customization patching and merging with the
// remote example after a patcher update.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::settings::Customization;

const METADATA_MODULE: &str = "metadata";
const IS_ENABLED: &str = "isEnabled";
const REMOVE_CALLS: &str = "removeCalls";

/// Module entries keyed by internal module name.
#[derive(Debug, Clone, PartialEq)]
pub struct PatcherConfig {
    modules: Map<String, Value>,
}

impl PatcherConfig {
    pub fn from_value(value: Value) -> LauncherResult<Self> {
        match value {
            Value::Object(modules) => Ok(Self { modules }),
            other => Err(LauncherError::Other(format!(
                "Patcher config must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub async fn load(path: &Path) -> LauncherResult<Self> {
        debug!("Reading {:?}", path);
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        Self::from_value(serde_json::from_str(&raw)?)
    }

    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        debug!("Writing {:?}", path);
        let json = serde_json::to_string_pretty(&self.modules)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    pub fn module(&self, name: &str) -> Option<&Map<String, Value>> {
        self.modules.get(name).and_then(Value::as_object)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.modules)
    }

    /// Applies `customizations` in order on top of a reset `metadata` entry.
    ///
    /// `metadata.removeCalls` is cleared and `metadata.isEnabled` forced on
    /// first, so applying the same list twice yields the same document.
    /// Customizations naming modules absent from the config are ignored.
    pub fn apply(&mut self, customizations: &[Customization]) {
        let metadata = self
            .modules
            .entry(METADATA_MODULE)
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Some(metadata) = metadata.as_object_mut() {
            metadata.insert(REMOVE_CALLS.to_string(), Value::Array(Vec::new()));
            metadata.insert(IS_ENABLED.to_string(), Value::Bool(true));
        }

        for customization in customizations {
            match customization {
                Customization::PrivacyToggle { modules, enabled } => {
                    for name in modules {
                        if let Some(module) = self.module_mut(name) {
                            module.insert(IS_ENABLED.to_string(), Value::Bool(*enabled));
                        }
                    }
                }
                Customization::MetadataRemoveCall { call } => {
                    if let Some(Value::Array(calls)) = self
                        .module_mut(METADATA_MODULE)
                        .and_then(|metadata| metadata.get_mut(REMOVE_CALLS))
                    {
                        calls.push(Value::String(call.clone()));
                    }
                }
                Customization::ModuleToggle {
                    internal,
                    enabled,
                    values,
                } => {
                    let Some(module) = self.module_mut(internal) else {
                        debug!("Skipping unknown module {}", internal);
                        continue;
                    };
                    module.insert(IS_ENABLED.to_string(), Value::Bool(*enabled));
                    for (key, value) in values {
                        module.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    fn module_mut(&mut self, name: &str) -> Option<&mut Map<String, Value>> {
        self.modules.get_mut(name).and_then(Value::as_object_mut)
    }
}

/// Rewrites the config at `path` with `customizations` applied.
pub async fn patch_game(path: &Path, customizations: &[Customization]) -> LauncherResult<()> {
    info!("Patching game...");
    let mut config = PatcherConfig::load(path).await?;
    config.apply(customizations);
    config.save(path).await?;
    debug!("Successfully wrote {:?}", path);
    Ok(())
}

/// Deep union of the remote example and the user's config.
///
/// Keys only in `remote` are added, keys in both keep the user's value, and
/// where both sides hold objects the merge recurses.
pub fn merge_remote(remote: &Value, user: &Value) -> Value {
    match (remote, user) {
        (Value::Object(remote), Value::Object(user)) => {
            let mut merged = remote.clone();
            for (key, user_value) in user {
                let value = match remote.get(key) {
                    Some(remote_value) => merge_remote(remote_value, user_value),
                    None => user_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (_, user) => user.clone(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
