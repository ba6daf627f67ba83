use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{model::DEFAULT_CURSOR_DIVISOR, time::DEFAULT_BPM};

pub const CONFIG_FILE_NAME: &str = "beatline.config.toml";
pub const CONFIG_PATH_ENV: &str = "BEATLINE_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatlineConfig {
    pub editor: EditorConfig,
    pub playback: PlaybackConfig,
    pub diagnostics: DiagnosticsConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub default_chart_name: String,
    pub default_bpm: f64,
    pub cursor_divisor: i64,
    pub note_length: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed: f64,
    pub queue_capacity: usize,
    pub first_key_note: i32,
    pub key_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub rust_log_filter: String,
    pub trace_file_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub charts_dir: PathBuf,
    pub autosave_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_chart_name: "Untitled".to_string(),
            default_bpm: DEFAULT_BPM,
            cursor_divisor: DEFAULT_CURSOR_DIVISOR,
            note_length: 1,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            queue_capacity: 64,
            first_key_note: 48,
            key_count: 37,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rust_log_filter: "info,beatline_core=trace".to_string(),
            trace_file_prefix: "beatline".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            charts_dir: PathBuf::from("data/charts"),
            autosave_dir: PathBuf::from("data/autosave"),
        }
    }
}

impl BeatlineConfig {
    pub fn load() -> Result<Self> {
        let config_path = discover_config_path().with_context(|| {
            format!("failed to locate {CONFIG_FILE_NAME}; looked in cwd and parent directory")
        })?;
        Self::load_from(&config_path)
    }

    /// Like [`Self::load`], but falls back to defaults when no file exists.
    pub fn load_or_default() -> Result<Self> {
        match discover_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let candidates = [
        cwd.join(CONFIG_FILE_NAME),
        cwd.join("..").join(CONFIG_FILE_NAME),
    ];

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE_NAME} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_section_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[playback]\nspeed = 0.5\n\n[editor]\ncursor_divisor = 8\n",
        )
        .expect("config should be written");

        let config = BeatlineConfig::load_from(&path).expect("config should parse");
        assert_eq!(config.playback.speed, 0.5);
        assert_eq!(config.playback.queue_capacity, 64);
        assert_eq!(config.editor.cursor_divisor, 8);
        assert_eq!(config.editor.note_length, 1);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn malformed_toml_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[playback\nspeed = ").expect("config should be written");

        let error = BeatlineConfig::load_from(&path).expect_err("parse should fail");
        assert!(format!("{error:#}").contains(CONFIG_FILE_NAME));
    }
}
