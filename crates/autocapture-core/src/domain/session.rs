//! Join state: where the player currently is.
//!
//! This is the engine's source of truth. Joined subarea implies joined area,
//! which the enum makes unrepresentable otherwise.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::ids::AreaId;
use super::player::PlayerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JoinState {
    #[default]
    Idle,
    InArea {
        area: AreaId,
    },
    InSubarea {
        area: AreaId,
        position: u32,
        /// Known when the join went through this engine; `None` after
        /// reconciling from a remote status, looked up lazily instead.
        session_id: Option<String>,
        started_at: Instant,
    },
}

impl JoinState {
    /// Rebuild from a remote player status.
    ///
    /// The subarea start is back-dated by the time the service says the
    /// player already spent in it.
    pub fn from_status(status: &PlayerStatus, now: Instant) -> Self {
        let Some(area) = status.active_area_id() else {
            return JoinState::Idle;
        };
        match status.active_subarea() {
            Some(position) => JoinState::InSubarea {
                area,
                position,
                session_id: None,
                started_at: now.checked_sub(status.time_in_subarea).unwrap_or(now),
            },
            None => JoinState::InArea { area },
        }
    }

    pub fn area(&self) -> Option<&AreaId> {
        match self {
            JoinState::Idle => None,
            JoinState::InArea { area } | JoinState::InSubarea { area, .. } => Some(area),
        }
    }

    pub fn subarea_position(&self) -> Option<u32> {
        match self {
            JoinState::InSubarea { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn started_at(&self) -> Option<Instant> {
        match self {
            JoinState::InSubarea { started_at, .. } => Some(*started_at),
            _ => None,
        }
    }

    pub fn is_in_subarea(&self) -> bool {
        matches!(self, JoinState::InSubarea { .. })
    }

    pub fn enter_area(self, area: AreaId) -> Self {
        JoinState::InArea { area }
    }

    /// Enter a subarea of the joined area. From `Idle` this is a no-op,
    /// a subarea cannot be joined without an area.
    pub fn enter_subarea(self, position: u32, session_id: Option<String>, started_at: Instant) -> Self {
        match self {
            JoinState::Idle => JoinState::Idle,
            JoinState::InArea { area } | JoinState::InSubarea { area, .. } => JoinState::InSubarea {
                area,
                position,
                session_id,
                started_at,
            },
        }
    }

    /// Drop the subarea, keep the area.
    pub fn leave_subarea(self) -> Self {
        match self {
            JoinState::InSubarea { area, .. } => JoinState::InArea { area },
            other => other,
        }
    }

    /// Time left until the configured round duration has elapsed.
    pub fn remaining(&self, round: Duration, now: Instant) -> Option<Duration> {
        self.started_at()
            .map(|start| (start + round).saturating_duration_since(now))
    }

    pub fn view(&self, now: Instant) -> JoinView {
        JoinView {
            area: self.area().cloned(),
            subarea: self.subarea_position(),
            seconds_in_subarea: self
                .started_at()
                .map(|start| now.saturating_duration_since(start).as_secs()),
        }
    }
}

/// Serializable view of [`JoinState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinView {
    pub area: Option<AreaId>,
    pub subarea: Option<u32>,
    pub seconds_in_subarea: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reconciles_subarea_with_backdated_start() {
        tokio::time::advance(Duration::from_secs(600)).await;
        let now = Instant::now();

        let mut status = PlayerStatus::new(0, 1, 100);
        status.active_area = Some("4".into());
        status.active_subarea_position = Some("12".into());
        status.time_in_subarea = Duration::from_secs(30);

        let join = JoinState::from_status(&status, now);
        assert_eq!(join.area(), Some(&AreaId::new("4")));
        assert_eq!(join.subarea_position(), Some(12));
        assert_eq!(
            join.remaining(Duration::from_secs(120), now),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn placeholder_area_reconciles_to_idle() {
        let mut status = PlayerStatus::new(0, 1, 100);
        status.active_area = Some("0".into());
        status.active_subarea_position = Some("3".into());
        assert_eq!(JoinState::from_status(&status, Instant::now()), JoinState::Idle);
    }

    #[test]
    fn subarea_requires_area() {
        let now = Instant::now();
        assert_eq!(JoinState::Idle.enter_subarea(1, None, now), JoinState::Idle);

        let join = JoinState::Idle
            .enter_area(AreaId::new("1"))
            .enter_subarea(1, None, now)
            .leave_subarea();
        assert_eq!(join, JoinState::InArea { area: AreaId::new("1") });
    }
}
