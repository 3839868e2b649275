//! Game-wide settings from `GameConfig.xml`.

use std::path::{Path, PathBuf};

use crate::error::DefinitionError;
use crate::model::xml::parse_attribute;

pub const GAME_CONFIG_FILE: &str = "GameConfig.xml";
pub const DATA_DIR_ENV: &str = "RUNNER_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "Data";

/// Root directory for definitions, config and assets
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub window_title: String,
    /// Width over height of the initial window
    pub window_aspect: f32,
    pub game_music: String,
    pub button_click_sound: String,
    pub music_volume: f32,
    /// Level names in play order; empty means file order
    pub level_order: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_title: "Runner".to_string(),
            window_aspect: 2.0,
            game_music: "Data/Audio/GameMusic.mp3".to_string(),
            button_click_sound: "Data/Audio/ButtonClick.mp3".to_string(),
            music_volume: 0.5,
            level_order: Vec::new(),
        }
    }
}

impl GameConfig {
    /// Reads the config file, falling back to defaults with a warning
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Could not read {}: {}; using default config", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_xml_str(&text, path) {
            Ok(config) => {
                tracing::info!("Loaded game config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}; using default config", e);
                Self::default()
            }
        }
    }

    pub fn from_xml_str(text: &str, path: &Path) -> Result<Self, DefinitionError> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|source| DefinitionError::Xml { path: path.to_path_buf(), source })?;
        let root = doc.root_element();
        let defaults = Self::default();

        let level_order: String = parse_attribute(root, "levelOrder", String::new())?;
        Ok(Self {
            window_title: parse_attribute(root, "windowTitle", defaults.window_title)?,
            window_aspect: parse_attribute(root, "windowAspect", defaults.window_aspect)?,
            game_music: parse_attribute(root, "gameMusic", defaults.game_music)?,
            button_click_sound: parse_attribute(root, "buttonClickSound", defaults.button_click_sound)?,
            music_volume: parse_attribute(root, "musicVolume", defaults.music_volume)?,
            level_order: level_order
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}
