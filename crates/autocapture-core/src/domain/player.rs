//! Player status and score report payloads.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ids::AreaId;
use super::session::JoinState;

/// Snapshot of the player as reported by the game service.
///
/// `active_area` and `active_subarea_position` mirror the remote payload.
/// The engine keeps its own [`JoinState`]; these fields are a projection of
/// it, refreshed from the service or rewritten with [`PlayerStatus::project`]
/// right after a join/leave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub active_area: Option<String>,
    /// String-encoded integer, as on the wire.
    #[serde(default)]
    pub active_subarea_position: Option<String>,
    #[serde(default, with = "secs")]
    pub time_in_subarea: Duration,
    #[serde(default, with = "secs")]
    pub time_in_area: Duration,
    #[serde(deserialize_with = "de_u64")]
    pub score: u64,
    pub level: u32,
    #[serde(deserialize_with = "de_u64")]
    pub next_level_score: u64,
}

impl PlayerStatus {
    pub fn new(score: u64, level: u32, next_level_score: u64) -> Self {
        Self {
            active_area: None,
            active_subarea_position: None,
            time_in_subarea: Duration::ZERO,
            time_in_area: Duration::ZERO,
            score,
            level,
            next_level_score,
        }
    }

    pub fn active_area_id(&self) -> Option<AreaId> {
        AreaId::parse_active(self.active_area.as_deref())
    }

    /// Active subarea position. A value that does not parse is treated as absent.
    pub fn active_subarea(&self) -> Option<u32> {
        self.active_subarea_position
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
    }

    /// Rewrite the joined fields from the engine's join state.
    pub fn project(&mut self, join: &JoinState) {
        self.active_area = join.area().map(|id| id.to_string());
        self.active_subarea_position = join.subarea_position().map(|p| p.to_string());
    }
}

/// Result of a score submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(deserialize_with = "de_u64")]
    pub old_score: u64,
    #[serde(deserialize_with = "de_u64")]
    pub new_score: u64,
    #[serde(deserialize_with = "de_u64")]
    pub next_level_score: u64,
    pub old_level: u32,
    pub new_level: u32,
}

impl ScoreReport {
    pub fn leveled_up(&self) -> bool {
        self.new_level != self.old_level
    }
}

/// Accepts either a JSON number or a decimal string.
fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

mod secs {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_payload_with_string_numbers() {
        let json = r#"{
            "active_area": "12",
            "active_subarea_position": "41",
            "time_in_subarea": 35,
            "time_in_area": 600,
            "score": "152340",
            "level": 9,
            "next_level_score": "200000"
        }"#;
        let status: PlayerStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.active_area_id(), Some(AreaId::new("12")));
        assert_eq!(status.active_subarea(), Some(41));
        assert_eq!(status.time_in_subarea, Duration::from_secs(35));
        assert_eq!(status.score, 152_340);
        assert_eq!(status.next_level_score, 200_000);
    }

    #[test]
    fn garbage_subarea_position_reads_as_absent() {
        let mut status = PlayerStatus::new(0, 1, 100);
        status.active_subarea_position = Some("n/a".to_string());
        assert_eq!(status.active_subarea(), None);
    }

    #[test]
    fn projection_follows_join_state() {
        let mut status = PlayerStatus::new(0, 1, 100);
        let join = JoinState::Idle
            .enter_area(AreaId::new("3"))
            .enter_subarea(7, Some("s7".into()), tokio::time::Instant::now());
        status.project(&join);
        assert_eq!(status.active_area.as_deref(), Some("3"));
        assert_eq!(status.active_subarea_position.as_deref(), Some("7"));

        status.project(&JoinState::Idle);
        assert_eq!(status.active_area, None);
        assert_eq!(status.active_subarea_position, None);
    }
}
