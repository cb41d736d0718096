//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{AreaId, MAX_ROUND_DURATION, Strategy};

/// Fixed intervals of the automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Full area list + detail refresh.
    pub area_refresh: Duration,
    /// Player status refresh.
    pub player_refresh: Duration,
    /// How long before round completion the active-only refresh fires.
    pub pre_completion_lead: Duration,
    /// Pause after a failed initialization or a recovered loop error.
    pub retry_backoff: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            area_refresh: Duration::from_secs(10 * 60),
            player_refresh: Duration::from_secs(5 * 60),
            pre_completion_lead: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(10),
        }
    }
}

/// Mutable configuration of the automation.
///
/// Held in a `watch` channel by [`Automation`](super::Automation); the loop
/// reads the latest value at the top of every iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub token: String,
    /// Time to stay in a joined subarea before reporting.
    pub round_duration: Duration,
    pub strategy: Strategy,
    /// Forced target area, used while it is in the area list.
    pub override_area: Option<AreaId>,
    pub timings: Timings,
}

impl EngineConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            round_duration: MAX_ROUND_DURATION,
            strategy: Strategy::default(),
            override_area: None,
            timings: Timings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_event_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.round_duration, Duration::from_secs(120));
        assert_eq!(config.timings.area_refresh, Duration::from_secs(600));
        assert_eq!(config.timings.player_refresh, Duration::from_secs(300));
        assert_eq!(config.timings.pre_completion_lead, Duration::from_secs(5));
        assert_eq!(config.timings.retry_backoff, Duration::from_secs(10));
        assert!(!config.has_token());
        assert!(EngineConfig::new("abc").has_token());
    }
}
