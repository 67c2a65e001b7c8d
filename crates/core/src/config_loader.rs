use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from defaults, `config/Config.toml` and `PINAKA_*`
    /// environment variables, later sources winning.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged values are invalid.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml", None)
    }

    /// Loads configuration with a profile overlay (`config/Config.{profile}.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged values are invalid.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::load_from("config/Config.toml", Some(profile))
    }

    /// Loads configuration rooted at an explicit file.
    ///
    /// Missing files are skipped; environment variables use `__` as the
    /// nesting separator (`PINAKA_VIEWS__LADDER_DEPTH=5`).
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged values are invalid.
    pub fn load_from(path: impl AsRef<Path>, profile: Option<&str>) -> Result<AppConfig> {
        let path = path.as_ref();
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path));

        if let Some(profile) = profile {
            let overlay = path.with_file_name(format!("Config.{profile}.toml"));
            figment = figment.merge(Toml::file(overlay));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed("PINAKA_").split("__"))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }
}
