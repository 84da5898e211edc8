//! The [`Config`] trait, YAML serialization for configuration objects.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::error;
use serde::{de::DeserializeOwned, Serialize};

/// A configuration object that can be loaded from and saved to a YAML file.
pub trait Config: Serialize + Sized {
    /// Save the configuration to `path`. Refuses to save an invalid
    /// configuration.
    fn save(&self, path: &Path) -> Result<(), Vec<String>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let s = serde_yaml::to_string(&self)
            .map_err(|e| vec![format!("Cannot serialize configuration: {e}")])?;
        let mut f = File::create(path)
            .map_err(|e| vec![format!("Cannot create configuration file: {e}")])?;
        f.write_all(s.as_bytes())
            .map_err(|e| vec![format!("Cannot write configuration to file: {e}")])?;
        Ok(())
    }

    /// Load a configuration from `path`.
    fn load<A>(path: &Path) -> Result<A, Vec<String>>
    where
        A: Config + DeserializeOwned,
    {
        let mut f = File::open(path)
            .map_err(|e| vec![format!("Cannot open configuration file: {e}")])?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .map_err(|e| vec![format!("Cannot read configuration file: {e}")])?;
        let config: A = serde_yaml::from_str(&s)
            .map_err(|e| vec![format!("Cannot deserialize configuration: {e}")])?;
        let errors = config.validate();
        if !errors.is_empty() {
            for e in &errors {
                error!("Configuration error: {e}");
            }
            return Err(errors);
        }
        Ok(config)
    }

    /// Validate the configuration, returning all errors found.
    fn validate(&self) -> Vec<String>;
}
