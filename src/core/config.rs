use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::simulation::{UnknownIdPolicy, DEFAULT_MAX_SHOTS};

/// Calculator settings: defaults for new timeline events and engine policy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Weapon for new shots when the timeline has none yet.
    pub default_weapon: String,
    pub default_heal_item: String,
    pub default_shield_item: String,
    /// Shield type equipped on a fresh calculator, `None` for no shield.
    pub default_shield_type: Option<String>,
    pub unknown_ids: UnknownIdPolicy,
    /// Give up on shots-to-kill after this many shots.
    pub max_shots_to_kill: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_weapon: "ferro".to_string(),
            default_heal_item: "bandage".to_string(),
            default_shield_item: "shield_recharger".to_string(),
            default_shield_type: Some("light_shield".to_string()),
            unknown_ids: UnknownIdPolicy::Reject,
            max_shots_to_kill: DEFAULT_MAX_SHOTS,
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("settings.json"),
        }
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!("Ignoring invalid settings {:?}: {}", self.config_path, e),
                },
                Err(e) => log::warn!("Could not read settings {:?}: {}", self.config_path, e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("calc"));

        let default = manager.load();
        assert_eq!(default, Settings::default());

        let new_settings = Settings {
            default_weapon: "kettle".to_string(),
            default_shield_type: None,
            unknown_ids: UnknownIdPolicy::Lenient,
            ..Settings::default()
        };

        manager.save(&new_settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded.default_weapon, "kettle");
        assert_eq!(loaded.default_shield_type, None);
        assert_eq!(loaded.unknown_ids, UnknownIdPolicy::Lenient);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), r#"{ "unknown_ids": "lenient" }"#).unwrap();

        let loaded = ConfigManager::new(dir.path().to_path_buf()).load();
        assert_eq!(loaded.unknown_ids, UnknownIdPolicy::Lenient);
        assert_eq!(loaded.default_weapon, "ferro");
        assert_eq!(loaded.max_shots_to_kill, DEFAULT_MAX_SHOTS);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "not json").unwrap();

        let loaded = ConfigManager::new(dir.path().to_path_buf()).load();
        assert_eq!(loaded, Settings::default());
    }
}
