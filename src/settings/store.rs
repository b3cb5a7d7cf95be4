//! JSON-file persistence for server settings.
//!
//! The store mirrors the client's preference storage: a single JSON document
//! holding the server URL and API key, loaded once at startup. A missing file
//! is the first-run signal that gates the app behind the configure-server
//! step.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ServerSettings, SettingsError};

/// File name of the persisted settings document inside the config directory.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Directory name under the user config root.
const CONFIG_DIR_NAME: &str = "covercache";

/// Loads and persists [`ServerSettings`] as a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location:
    /// `$XDG_CONFIG_HOME/covercache/settings.json`, falling back to
    /// `$HOME/.config/covercache/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoConfigDir`] when neither `XDG_CONFIG_HOME`
    /// nor `HOME` is set.
    pub fn default_location() -> Result<Self, SettingsError> {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| {
                env::var_os("HOME")
                    .map(PathBuf::from)
                    .filter(|path| !path.as_os_str().is_empty())
                    .map(|home| home.join(".config"))
            })
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(
            base.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME),
        ))
    }

    /// Returns the file path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true when no settings have ever been saved.
    ///
    /// The app treats this as first run and blocks behind the
    /// configure-server step until a valid save happens.
    #[must_use]
    pub fn is_first_run(&self) -> bool {
        !self.path.exists()
    }

    /// Loads persisted settings, or `None` when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] on read failure and
    /// [`SettingsError::Parse`] when the file is not a valid settings
    /// document.
    pub fn load(&self) -> Result<Option<ServerSettings>, SettingsError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file; first run");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let settings =
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(settings))
    }

    /// Validates and persists settings, creating parent directories as needed.
    ///
    /// Invalid settings are rejected before anything touches disk, so a bad
    /// save can never clobber a previously-valid file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when validation fails, or
    /// [`SettingsError::Io`] on write failure.
    pub fn save(&self, settings: &ServerSettings) -> Result<(), SettingsError> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Removes persisted settings, returning the store to first-run state.
    ///
    /// Removing a file that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when an existing file cannot be removed.
    pub fn reset(&self) -> Result<(), SettingsError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SettingsError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> SettingsStore {
        SettingsStore::new(temp.path().join("settings.json"))
    }

    fn valid_settings() -> ServerSettings {
        ServerSettings::new(
            Some("https://host:8787".to_string()),
            Some("XYZ".to_string()),
        )
    }

    #[test]
    fn test_load_returns_none_on_first_run() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert!(store.is_first_run());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let settings = valid_settings();

        store.save(&settings).unwrap();
        assert!(!store.is_first_run());
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_save_rejects_invalid_settings_without_touching_disk() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let result = store.save(&ServerSettings::default());
        assert!(matches!(result, Err(SettingsError::Invalid { .. })));
        assert!(store.is_first_run(), "failed save must not create a file");
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nested/dir/settings.json"));
        store.save(&valid_settings()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_load_reports_malformed_file_as_parse_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(store.path(), "{ not json").unwrap();

        let result = store.load();
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_reset_removes_file_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.save(&valid_settings()).unwrap();

        store.reset().unwrap();
        assert!(store.is_first_run());
        store.reset().unwrap();
    }
}
