use crate::settings::GameSettings;
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub trait ConfigStore {
    fn load(&self) -> GameSettings;
    fn save(&self, settings: &GameSettings) -> io::Result<()>;
}

/// Settings persisted as pretty JSON, `config.json` in the user config dir.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "fastmath") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("fastmath_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing, unreadable or invalid files yield the defaults.
    fn load(&self) -> GameSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return GameSettings::default();
        };
        match serde_json::from_slice::<GameSettings>(&bytes) {
            Ok(settings) if settings.validate().is_ok() => settings,
            Ok(settings) => {
                warn!(
                    path = %self.path.display(),
                    ?settings,
                    "stored settings out of range, using defaults"
                );
                GameSettings::default()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable settings file, using defaults"
                );
                GameSettings::default()
            }
        }
    }

    fn save(&self, settings: &GameSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DigitCount;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let settings = GameSettings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let settings = GameSettings {
            digit_count: DigitCount::Four,
            sequence_length: 20,
            time_on_screen: 250,
            time_between: 100,
            sound_enabled: false,
            voice_enabled: true,
            audio_only_mode: true,
            voice_uri: "Samantha".into(),
            ..GameSettings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), GameSettings::default());
    }

    #[test]
    fn corrupt_or_invalid_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), GameSettings::default());

        fs::write(&path, br#"{"sequenceLength": 1}"#).unwrap();
        assert_eq!(store.load(), GameSettings::default());
    }

    #[test]
    fn saved_file_uses_camel_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        FileConfigStore::with_path(&path)
            .save(&GameSettings::default())
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"timeOnScreen\""));
        assert!(text.contains("\"voiceURI\""));
        assert!(text.contains("\"digitCount\": 2"));
    }
}
