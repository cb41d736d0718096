//! Status - エンジンの現在地
//!
//! The engine publishes its phase and join state through a `watch` channel;
//! callers read the latest value without touching the loop.

use serde::Serialize;
use tokio::time::Instant;

use crate::domain::{JoinState, JoinView};

/// Where the automation loop currently is.
///
/// Main cycle:
/// - Idle -> Initializing -> SelectingArea -> (JoiningArea) -> SelectingSubarea
///   -> JoiningSubarea -> WaitingForCompletion -> ReportingScore -> LeavingArea
///   -> SelectingArea ...
/// - any phase -> RecoveringFromError -> SelectingArea (after backoff)
/// - any phase -> Stopped (stop only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Initializing,
    SelectingArea,
    JoiningArea,
    SelectingSubarea,
    JoiningSubarea,
    WaitingForCompletion,
    ReportingScore,
    LeavingArea,
    RecoveringFromError,
    Stopped,
}

/// Latest phase and join state of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub phase: Phase,
    pub join: JoinState,
}

impl EngineStatus {
    pub fn view(&self, now: Instant) -> StatusView {
        StatusView {
            phase: self.phase,
            join: self.join.view(now),
        }
    }
}

/// Serializable view of [`EngineStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub phase: Phase,
    pub join: JoinView,
}
