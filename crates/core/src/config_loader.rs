use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

use crate::config::AppConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging the TOML file with `OTM_`-prefixed
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("OTM_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ConfigLoader::load("does/not/exist.toml").unwrap();
        assert_eq!(config.tracker.monthly_budget, 1000);
    }
}
