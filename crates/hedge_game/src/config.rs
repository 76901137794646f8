use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_level_path")]
    pub level_path: PathBuf,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_bindings_path")]
    pub bindings_path: PathBuf,
    #[serde(default = "default_true")]
    pub start_paused: bool,
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    #[serde(default = "default_starting_health")]
    pub starting_health: i32,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DebugConfig {
    #[serde(default)]
    pub show_overlay: bool,
    #[serde(default)]
    pub show_collision_skins: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            level_path: default_level_path(),
            manifest_path: default_manifest_path(),
            bindings_path: default_bindings_path(),
            start_paused: true,
            mouse_sensitivity: default_mouse_sensitivity(),
            starting_health: default_starting_health(),
            debug: DebugConfig::default(),
        }
    }
}

/// Reads the config, falling back to defaults when the file does not exist.
/// A file that exists but fails to parse or validate is an error.
pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found, using built-in defaults",
            path.display()
        );
        return Ok(GameConfig::default());
    }
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.width == 0 || config.height == 0 {
        return Err("Config validation failed: width and height must be > 0".to_string());
    }
    if config.starting_health <= 0 {
        return Err("Config validation failed: starting_health must be > 0".to_string());
    }
    if config.mouse_sensitivity <= 0.0 {
        return Err("Config validation failed: mouse_sensitivity must be > 0".to_string());
    }
    if config.mouse_sensitivity > 10.0 {
        log::warn!(
            "Config mouse_sensitivity {} is very high; mouse-look will be twitchy",
            config.mouse_sensitivity
        );
    }
    Ok(())
}

fn default_title() -> String {
    "Hedge Maze".to_string()
}

const fn default_width() -> u32 {
    1280
}

const fn default_height() -> u32 {
    720
}

fn default_level_path() -> PathBuf {
    PathBuf::from("assets/levels/level1.json")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("assets/manifest.json")
}

fn default_bindings_path() -> PathBuf {
    PathBuf::from("assets/config/bindings.json")
}

const fn default_true() -> bool {
    true
}

const fn default_mouse_sensitivity() -> f32 {
    1.0
}

const fn default_starting_health() -> i32 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hedge_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = temp_file_path("missing");
        let config = load_config_from_path(&path).expect("missing config falls back");
        assert_eq!(config, GameConfig::default());
        assert!(config.start_paused);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "title": "Test Maze", "debug": { "show_overlay": true } }"#)
            .expect("write config");
        let config = load_config_from_path(&path).expect("partial config loads");
        assert_eq!(config.title, "Test Maze");
        assert_eq!(config.width, 1280);
        assert!(config.debug.show_overlay);
        assert!(!config.debug.show_collision_skins);
        assert_eq!(config.level_path, PathBuf::from("assets/levels/level1.json"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write config");
        let err = load_config_from_path(&path).expect_err("malformed config should fail");
        assert!(err.contains("Failed to parse config JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let path = temp_file_path("zero");
        fs::write(&path, r#"{ "width": 0 }"#).expect("write config");
        let err = load_config_from_path(&path).expect_err("zero width should fail");
        assert!(err.contains("width and height"));
        let _ = fs::remove_file(path);
    }
}
