//! Layered settings: built-in defaults, an optional TOML file, then
//! `REFERRAL_TIERS_*` environment variables.

use std::path::Path;

use ::config::builder::DefaultState;
use ::config::ConfigBuilder;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::tier::{FixedThresholds, PercentileThresholds};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub percentile: PercentileThresholds,
    pub fixed: FixedThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            percentile: PercentileThresholds::default(),
            fixed: FixedThresholds::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_sources(
            file_source(path).add_source(
                ::config::Environment::with_prefix("REFERRAL_TIERS")
                    .prefix_separator("_")
                    .separator("__"),
            ),
        )
    }

    fn from_sources(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;

        settings.percentile.validate()?;
        if settings.max_connections == 0 {
            return Err(Error::InvalidArgument(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    /// The configured URL, falling back to `DATABASE_URL`.
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

fn file_source(path: &Path) -> ConfigBuilder<DefaultState> {
    ::config::Config::builder().add_source(::config::File::from(path).required(false))
}
