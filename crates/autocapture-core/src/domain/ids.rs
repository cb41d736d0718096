//! Domain identifiers.
//!
//! The remote service addresses areas by an opaque string id. In practice the
//! ids are small decimal numbers ("1", "2", ..., "10"), so ordering compares
//! numerically when both sides parse and falls back to plain string order
//! otherwise. This keeps `TopDown` from placing "10" before "2".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of an area.
///
/// `""` and `"0"` are what the service reports for "no active area"; see
/// [`AreaId::parse_active`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(String);

impl AreaId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret an "active area" field from the player status payload.
    ///
    /// Returns `None` for blank values and the `"0"` placeholder.
    pub fn parse_active(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() || raw == "0" {
            return None;
        }
        Some(Self::new(raw))
    }
}

impl From<&str> for AreaId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AreaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialOrd for AreaId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AreaId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_order_naturally() {
        let mut ids = vec![AreaId::new("10"), AreaId::new("2"), AreaId::new("1")];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(AreaId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn non_numeric_ids_fall_back_to_string_order() {
        assert!(AreaId::new("alpha") < AreaId::new("beta"));
        assert!(AreaId::new("9") < AreaId::new("alpha"));
    }

    #[test]
    fn placeholder_active_area_is_none() {
        assert_eq!(AreaId::parse_active(None), None);
        assert_eq!(AreaId::parse_active(Some("")), None);
        assert_eq!(AreaId::parse_active(Some("0")), None);
        assert_eq!(AreaId::parse_active(Some(" 7 ")), Some(AreaId::new("7")));
    }
}
