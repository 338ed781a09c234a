use crate::error::{JournalError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FILE_PLACEHOLDER: &str = "{file}";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "moodbook", "moodbook")
}

fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("MOODBOOK_DATA_DIR") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".moodbook")
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("MOODBOOK_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    default_data_dir().join("config.toml")
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub export_dir: PathBuf,
    pub min_password_len: usize,
    pub top_tags: usize,
    pub audio: AudioConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Config {
            log_dir: data_dir.join("logs"),
            export_dir: data_dir.join("exports"),
            data_dir,
            min_password_len: 4,
            top_tags: 5,
            audio: AudioConfig::default(),
        }
    }
}

/// External commands used for voice notes. `{file}` is replaced by the
/// recording path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    pub record_command: Vec<String>,
    pub play_command: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// A missing file gives the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Config>(&content).map_err(|e| JournalError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(JournalError::storage(path, e)),
        };
        config.normalize_paths();
        Ok(config)
    }

    // Relative log and export paths live under the data dir.
    fn normalize_paths(&mut self) {
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = default_data_dir();
        }
        for dir in [&mut self.log_dir, &mut self.export_dir] {
            if dir.is_relative() {
                *dir = self.data_dir.join(&*dir);
            }
        }
        if self.min_password_len == 0 {
            self.min_password_len = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("none.toml")).unwrap();
        assert_eq!(config.min_password_len, 4);
        assert_eq!(config.top_tags, 5);
        assert!(config.audio.record_command.is_empty());
    }

    #[test]
    fn relative_dirs_resolve_under_data_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let data = temp.path().join("data");
        fs::write(
            &path,
            format!(
                "data_dir = {:?}\nlog_dir = \"logs\"\ntop_tags = 3\n\n[audio]\nplay_command = [\"aplay\", \"{{file}}\"]\n",
                data.display().to_string()
            ),
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log_dir, data.join("logs"));
        assert_eq!(config.top_tags, 3);
        assert_eq!(config.audio.play_command, vec!["aplay", FILE_PLACEHOLDER]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "top_tags = \"many\"").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(JournalError::Config { .. })
        ));
    }
}
