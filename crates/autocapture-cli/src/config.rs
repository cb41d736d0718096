//! Settings file.
//!
//! ```toml
//! token = "..."
//! round_duration_secs = 120
//! strategy = ["TopDown", "MostDifficultAreasFirst"]
//! override_area = "4"
//! enable_automation = true
//! ```
//!
//! Every field is optional. Command-line flags win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use autocapture_core::domain::{AreaId, StrategyError, StrategyFlag};
use autocapture_core::{EngineConfig, Strategy};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub token: Option<String>,
    pub round_duration_secs: Option<u64>,
    pub strategy: Option<Vec<StrategyFlag>>,
    pub override_area: Option<String>,
    pub enable_automation: Option<bool>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Whether automation starts right away (default: yes).
    pub fn starts_enabled(&self) -> bool {
        self.enable_automation.unwrap_or(true)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = EngineConfig::default();
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(secs) = self.round_duration_secs {
            config.round_duration = Duration::from_secs(secs);
        }
        if let Some(flags) = &self.strategy {
            config.strategy = Strategy::from_flags(flags.iter().copied())?;
        }
        config.override_area = AreaId::parse_active(self.override_area.as_deref());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocapture_core::domain::TierOrder;

    #[test]
    fn empty_file_means_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.starts_enabled());
        assert_eq!(settings.engine_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn full_file() {
        let settings = Settings::parse(
            r#"
            token = "abc"
            round_duration_secs = 90
            strategy = ["bottom-up", "LeastDifficultAreasFirst"]
            override_area = "4"
            enable_automation = false
            "#,
        )
        .unwrap();
        assert!(!settings.starts_enabled());

        let config = settings.engine_config().unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.round_duration, Duration::from_secs(90));
        assert_eq!(config.strategy.areas.position, TierOrder::Descending);
        assert_eq!(config.strategy.areas.difficulty, TierOrder::Ascending);
        assert_eq!(config.override_area, Some(AreaId::new("4")));
    }

    #[test]
    fn placeholder_override_means_none() {
        let settings = Settings::parse(r#"override_area = "0""#).unwrap();
        assert_eq!(settings.engine_config().unwrap().override_area, None);
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        let settings = Settings::parse(r#"strategy = ["TopDown", "BottomUp"]"#).unwrap();
        assert!(matches!(
            settings.engine_config(),
            Err(ConfigError::Strategy(StrategyError::Conflict(..)))
        ));
    }

    #[test]
    fn unknown_keys_and_flags_fail_to_parse() {
        assert!(Settings::parse("tokn = \"x\"").is_err());
        assert!(Settings::parse(r#"strategy = ["Sideways"]"#).is_err());
    }
}
