// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime settings and listener files.
//!
//! Both are RON documents carrying a format version. Files written by a newer
//! format are refused instead of being half understood.

use crate::invoke::InvocationPolicy;
use crate::listener::EventListener;
use crate::scene::ObjectId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Current listener file format version
pub const LISTENER_FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing configuration files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for the expected shape
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The value could not be written as RON
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// The file was written by a newer format
    #[error("format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}

fn check_version(found: u32, supported: u32) -> Result<(), ConfigError> {
    if found > supported {
        return Err(ConfigError::UnsupportedVersion { found, supported });
    }
    Ok(())
}

fn write_ron<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    let config = ron::ser::PrettyConfig::default()
        .struct_names(true)
        .enumerate_arrays(false);
    let content = ron::ser::to_string_pretty(value, config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "saved");
    Ok(())
}

/// Runtime behaviour of the binding layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Settings format version
    pub version: u32,
    /// What happens when a called method fails
    #[serde(default)]
    pub invocation_policy: InvocationPolicy,
    /// Leave lifecycle method names out of catalogs
    #[serde(default = "default_true")]
    pub filter_reserved_names: bool,
    /// List instance methods in catalogs, not only static ones
    #[serde(default = "default_true")]
    pub include_instance_methods: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            invocation_policy: InvocationPolicy::default(),
            filter_reserved_names: true,
            include_instance_methods: true,
        }
    }
}

impl RuntimeSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let settings: RuntimeSettings = ron::from_str(text)?;
        check_version(settings.version, SETTINGS_FORMAT_VERSION)?;
        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Self::from_ron(&std::fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), policy = ?settings.invocation_policy, "loaded runtime settings");
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_ron(self, path)
    }
}

/// A listener and the object it is attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedListener {
    /// Owning object
    pub owner: ObjectId,
    /// Listener configuration
    pub listener: EventListener,
}

/// Authored listeners of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerFile {
    /// File format version
    pub version: u32,
    /// Listeners in attachment order
    #[serde(default)]
    pub listeners: Vec<AttachedListener>,
}

impl Default for ListenerFile {
    fn default() -> Self {
        Self {
            version: LISTENER_FORMAT_VERSION,
            listeners: Vec::new(),
        }
    }
}

impl ListenerFile {
    /// Append a listener
    pub fn push(&mut self, owner: ObjectId, listener: EventListener) {
        self.listeners.push(AttachedListener { owner, listener });
    }

    /// Parse a listener file from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let file: ListenerFile = ron::from_str(text)?;
        check_version(file.version, LISTENER_FORMAT_VERSION)?;
        Ok(file)
    }

    /// Load a listener file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = Self::from_ron(&std::fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), listeners = file.listeners.len(), "loaded listeners");
        Ok(file)
    }

    /// Save a listener file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_ron(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{EventKind, StoredArgument, StoredBinding};

    #[test]
    fn test_default_settings() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.invocation_policy, InvocationPolicy::Propagate);
        assert!(settings.filter_reserved_names);
    }

    #[test]
    fn test_settings_fields_default_when_absent() {
        let settings = RuntimeSettings::from_ron("(version: 1, invocation_policy: Report)").unwrap();
        assert_eq!(settings.invocation_policy, InvocationPolicy::Report);
        assert!(settings.filter_reserved_names);
        assert!(settings.include_instance_methods);
    }

    #[test]
    fn test_newer_version_refused() {
        let result = RuntimeSettings::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 99, supported: SETTINGS_FORMAT_VERSION })
        ));
        assert!(matches!(ListenerFile::from_ron("(version: 1, listeners: ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_listener_file_save_load() {
        let owner = ObjectId::new();
        let mut file = ListenerFile::default();
        file.push(
            owner,
            EventListener::new(EventKind::OnTriggerEnter).with_tag("Player").with_callback(StoredBinding::new(
                Some(owner),
                "Game.Door,Game",
                "SetOpen",
                vec![StoredArgument::Bool(true)],
            )),
        );

        let path = std::env::temp_dir().join(format!("hookwire-listeners-{}.ron", uuid::Uuid::new_v4()));
        file.save(&path).unwrap();
        let loaded = ListenerFile::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, file);
    }
}
