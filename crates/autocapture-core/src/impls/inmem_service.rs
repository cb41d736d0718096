//! InMemoryGameService - 開発用のゲームサービス
//!
//! Keeps a whole game world in memory and answers the [`GameService`] port
//! from it. Every call is recorded with its (tokio) timestamp, and failures
//! can be scripted per operation, which is what the engine tests lean on.
//! With progress simulation on, accepted score reports advance the joined
//! subarea so the demo binary has something to capture.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::{Area, AreaId, PlayerStatus, Rejection, ScoreReport, ServiceError};
use crate::ports::GameService;

/// Progress added to a subarea per accepted score report.
const PROGRESS_PER_REPORT: f64 = 0.25;

/// Default number of calls kept in the log; older ones are dropped first.
const CALL_LOG_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListAreas,
    AreaDetail,
    PlayerStatus,
    JoinArea,
    JoinSubarea,
    ReportScore,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    ListAreas { active_only: bool },
    AreaDetail(AreaId),
    PlayerStatus,
    JoinArea(AreaId),
    JoinSubarea(u32),
    ReportScore(u64),
    Leave(String),
}

impl ServiceCall {
    pub fn kind(&self) -> CallKind {
        match self {
            ServiceCall::ListAreas { .. } => CallKind::ListAreas,
            ServiceCall::AreaDetail(_) => CallKind::AreaDetail,
            ServiceCall::PlayerStatus => CallKind::PlayerStatus,
            ServiceCall::JoinArea(_) => CallKind::JoinArea,
            ServiceCall::JoinSubarea(_) => CallKind::JoinSubarea,
            ServiceCall::ReportScore(_) => CallKind::ReportScore,
            ServiceCall::Leave(_) => CallKind::Leave,
        }
    }

    /// Calls that change remote state (as opposed to reads/refreshes).
    pub fn is_action(&self) -> bool {
        matches!(
            self.kind(),
            CallKind::JoinArea | CallKind::JoinSubarea | CallKind::ReportScore | CallKind::Leave
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub call: ServiceCall,
    pub at: Instant,
}

struct World {
    areas: Vec<Area>,
    player: PlayerStatus,
    area_joined_at: Option<Instant>,
    subarea_joined_at: Option<Instant>,
    calls: VecDeque<RecordedCall>,
    call_limit: usize,
    scripted: Vec<(CallKind, ServiceError)>,
    simulate_progress: bool,
    points_per_level: u64,
}

impl World {
    /// Record the call, then hand out a scripted failure if one is queued.
    fn enter(&mut self, call: ServiceCall) -> Result<(), ServiceError> {
        let kind = call.kind();
        if self.call_limit == 0 {
            self.calls.clear();
        } else {
            while self.calls.len() >= self.call_limit {
                self.calls.pop_front();
            }
            self.calls.push_back(RecordedCall {
                call,
                at: Instant::now(),
            });
        }
        match self.scripted.iter().position(|(k, _)| *k == kind) {
            Some(index) => Err(self.scripted.remove(index).1),
            None => Ok(()),
        }
    }

    fn area_mut(&mut self, id: &AreaId) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| &a.id == id)
    }

    fn clear_subarea(&mut self) {
        self.player.active_subarea_position = None;
        self.subarea_joined_at = None;
    }

    fn clear_area(&mut self) {
        self.clear_subarea();
        self.player.active_area = None;
        self.area_joined_at = None;
    }

    fn advance_progress(&mut self) {
        let (Some(area_id), Some(position)) =
            (self.player.active_area_id(), self.player.active_subarea())
        else {
            return;
        };
        let Some(area) = self.area_mut(&area_id) else {
            return;
        };
        if let Some(subarea) = area.subareas.iter_mut().find(|s| s.position == position) {
            subarea.capture_progress = (subarea.capture_progress + PROGRESS_PER_REPORT).min(1.0);
            if subarea.capture_progress >= 1.0 {
                subarea.captured = true;
            }
        }
        if !area.subareas.is_empty() {
            let total: f64 = area.subareas.iter().map(|s| s.capture_progress).sum();
            area.state.capture_progress = total / area.subareas.len() as f64;
            if area.subareas.iter().all(|s| s.captured) {
                area.state.captured = true;
                area.state.active = false;
                area.state.running = false;
            }
        }
    }
}

/// In-memory [`GameService`].
///
/// The auth token is accepted as-is.
#[derive(Clone)]
pub struct InMemoryGameService {
    world: Arc<Mutex<World>>,
}

impl InMemoryGameService {
    pub fn new(areas: Vec<Area>, player: PlayerStatus) -> Self {
        Self {
            world: Arc::new(Mutex::new(World {
                areas,
                player,
                area_joined_at: None,
                subarea_joined_at: None,
                calls: VecDeque::new(),
                call_limit: CALL_LOG_LIMIT,
                scripted: Vec::new(),
                simulate_progress: false,
                points_per_level: 10_000,
            })),
        }
    }

    /// Advance subarea capture progress on every accepted score report.
    pub async fn simulate_progress(&self, enabled: bool) {
        self.world.lock().await.simulate_progress = enabled;
    }

    /// Keep at most `limit` calls in the log. `0` turns recording off.
    pub async fn limit_call_log(&self, limit: usize) {
        let mut world = self.world.lock().await;
        world.call_limit = limit;
        let excess = world.calls.len().saturating_sub(limit);
        world.calls.drain(..excess);
    }

    /// Queue a failure for the next call of `kind`.
    pub async fn fail_next(&self, kind: CallKind, error: ServiceError) {
        self.world.lock().await.scripted.push((kind, error));
    }

    pub async fn calls(&self) -> Vec<ServiceCall> {
        let world = self.world.lock().await;
        world.calls.iter().map(|c| c.call.clone()).collect()
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.world.lock().await.calls.iter().cloned().collect()
    }

    pub async fn areas(&self) -> Vec<Area> {
        self.world.lock().await.areas.clone()
    }

    pub async fn replace_areas(&self, areas: Vec<Area>) {
        self.world.lock().await.areas = areas;
    }

    pub async fn player(&self) -> PlayerStatus {
        self.world.lock().await.player.clone()
    }
}

#[async_trait]
impl GameService for InMemoryGameService {
    async fn list_areas(&self, active_only: bool) -> Result<Vec<Area>, ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::ListAreas { active_only })?;
        Ok(world
            .areas
            .iter()
            .filter(|a| !active_only || a.state.active)
            .map(Area::summary_form)
            .collect())
    }

    async fn area_detail(&self, id: &AreaId) -> Result<Area, ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::AreaDetail(id.clone()))?;
        world
            .areas
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or(ServiceError::Rejected(Rejection::InvalidState))
    }

    async fn player_status(&self, _token: &str) -> Result<PlayerStatus, ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::PlayerStatus)?;
        let now = Instant::now();
        let mut status = world.player.clone();
        status.time_in_area = world
            .area_joined_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        status.time_in_subarea = world
            .subarea_joined_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        Ok(status)
    }

    async fn join_area(&self, _token: &str, area: &AreaId) -> Result<(), ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::JoinArea(area.clone()))?;
        if world.player.active_area_id().is_some_and(|current| &current != area) {
            return Err(Rejection::InvalidState.into());
        }
        let joinable = world
            .areas
            .iter()
            .any(|a| &a.id == area && a.state.running && !a.state.captured);
        if !joinable {
            return Err(Rejection::InvalidState.into());
        }
        world.clear_subarea();
        world.player.active_area = Some(area.to_string());
        world.area_joined_at = Some(Instant::now());
        Ok(())
    }

    async fn join_subarea(&self, _token: &str, position: u32) -> Result<(), ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::JoinSubarea(position))?;
        let Some(area_id) = world.player.active_area_id() else {
            return Err(Rejection::InvalidState.into());
        };
        let open = world
            .areas
            .iter()
            .find(|a| a.id == area_id)
            .and_then(|a| a.subarea(position))
            .is_some_and(|s| !s.captured);
        if !open {
            return Err(Rejection::NoMatch.into());
        }
        world.player.active_subarea_position = Some(position.to_string());
        world.subarea_joined_at = Some(Instant::now());
        Ok(())
    }

    async fn report_score(&self, _token: &str, score: u64) -> Result<ScoreReport, ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::ReportScore(score))?;
        if world.player.active_subarea().is_none() {
            return Err(Rejection::Expired.into());
        }

        let old_score = world.player.score;
        let old_level = world.player.level;
        let new_score = old_score + score;
        while new_score >= world.player.next_level_score {
            world.player.level += 1;
            world.player.next_level_score += world.points_per_level;
        }
        world.player.score = new_score;
        if world.simulate_progress {
            world.advance_progress();
        }

        Ok(ScoreReport {
            old_score,
            new_score,
            next_level_score: world.player.next_level_score,
            old_level,
            new_level: world.player.level,
        })
    }

    async fn leave(&self, _token: &str, session_id: &str) -> Result<(), ServiceError> {
        let mut world = self.world.lock().await;
        world.enter(ServiceCall::Leave(session_id.to_string()))?;

        let Some(area_id) = world.player.active_area_id() else {
            return Ok(());
        };
        if area_id.as_str() == session_id {
            world.clear_area();
            return Ok(());
        }
        let in_round = world
            .player
            .active_subarea()
            .and_then(|p| {
                world
                    .areas
                    .iter()
                    .find(|a| a.id == area_id)
                    .and_then(|a| a.subarea(p))
            })
            .is_some_and(|s| s.session_id == session_id);
        if in_round {
            world.clear_subarea();
        }
        Ok(())
    }
}
