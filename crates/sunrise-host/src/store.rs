//! Settings persisted to a file as postcard bytes.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::debug;

use sunrise_core::config::{ConfigError, ConfigStore, PersistedSettings};

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&mut self) -> Result<PersistedSettings, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(err) => {
                return Err(ConfigError::Storage(format!(
                    "read {}: {}",
                    self.path.display(),
                    err
                )));
            }
        };
        debug!("read {} bytes from {}", bytes.len(), self.path.display());
        PersistedSettings::from_bytes(&bytes)
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), ConfigError> {
        let bytes = settings.to_bytes()?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|err| {
                ConfigError::Storage(format!("write {}: {}", self.path.display(), err))
            })?;
        debug!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}
