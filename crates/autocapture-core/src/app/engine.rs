//! Engine - 自動化ループ本体
//!
//! One run of the automation: initialize, then cycle through area selection,
//! area join, subarea join, round wait, score report and round leave until
//! stopped. A stale rejection is corrected locally and the loop goes on at
//! once; any other failure goes through recovery and a backoff. The loop never
//! ends on its own, only through stop.

use std::future::Future;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::refresh::{Refresher, spawn_active_refresh};
use super::selector;
use super::status::{EngineStatus, Phase};
use super::store::WorldStore;
use crate::domain::{Area, AreaId, Difficulty, EngineError, EngineEvent, JoinState, round_score};
use crate::ports::{EventSink, GameService};

/// Everything a run shares with its controller.
pub struct EngineContext {
    pub service: Arc<dyn GameService>,
    pub store: Arc<WorldStore>,
    pub sink: Arc<dyn EventSink>,
    pub refresher: Arc<Refresher>,
    pub config: watch::Receiver<EngineConfig>,
    pub status: watch::Sender<EngineStatus>,
    pub active: Arc<AtomicBool>,
    pub cancel: CancellationToken,
}

pub struct Engine {
    service: Arc<dyn GameService>,
    store: Arc<WorldStore>,
    sink: Arc<dyn EventSink>,
    refresher: Arc<Refresher>,
    config: watch::Receiver<EngineConfig>,
    status: watch::Sender<EngineStatus>,
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
    phase: Phase,
    join: JoinState,
    rng: StdRng,
    pending_refresh: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(ctx: EngineContext, rng: StdRng) -> Self {
        let EngineContext {
            service,
            store,
            sink,
            refresher,
            config,
            status,
            active,
            cancel,
        } = ctx;
        Self {
            service,
            store,
            sink,
            refresher,
            config,
            status,
            active,
            cancel,
            phase: Phase::Idle,
            join: JoinState::Idle,
            rng,
            pending_refresh: None,
        }
    }

    /// Drive the loop until stopped. Ends in [`Phase::Stopped`].
    pub async fn run(mut self) {
        info!("automation loop started");
        if self.initialize().await.is_ok() {
            while self.is_running() {
                match self.step().await {
                    Ok(()) => {}
                    Err(EngineError::Cancelled) => break,
                    Err(err) => {
                        if self.recover(err).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        if let Some(pending) = self.pending_refresh.take() {
            pending.abort();
        }
        self.set_phase(Phase::Stopped);
        self.sink.emit(EngineEvent::Stopped);
        info!("automation loop stopped");
    }

    fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }

    /// Race `fut` against stop. Stop wins ties.
    async fn guarded<T, E>(&self, fut: impl Future<Output = Result<T, E>>) -> Result<T, EngineError>
    where
        E: Into<EngineError>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            result = fut => result.map_err(Into::into),
        }
    }

    async fn pause(&self, duration: Duration) -> Result<(), EngineError> {
        self.guarded(async {
            tokio::time::sleep(duration).await;
            Ok::<_, EngineError>(())
        })
        .await
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status.send_replace(EngineStatus {
            phase: self.phase,
            join: self.join.clone(),
        });
    }

    async fn update_join(&mut self, join: JoinState) {
        self.join = join;
        self.store.project_join(&self.join).await;
        self.publish_status();
    }

    /// 初回リフレッシュ（成功するまでリトライ）と join 状態の復元
    async fn initialize(&mut self) -> Result<(), EngineError> {
        self.set_phase(Phase::Initializing);
        loop {
            let result = self.guarded(self.refresher.refresh_all()).await;
            match result {
                Ok(()) => break,
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(err) => {
                    let backoff = self.config.borrow().timings.retry_backoff;
                    warn!(error = %err, ?backoff, "initial refresh failed, retrying");
                    self.sink.emit(EngineEvent::Failure {
                        message: err.to_string(),
                    });
                    self.sink.emit(EngineEvent::Restarting { backoff });
                    self.pause(backoff).await?;
                }
            }
        }

        if let Some(player) = self.store.player().await {
            self.update_join(JoinState::from_status(&player, Instant::now()))
                .await;
            debug!(join = ?self.join, "join state reconciled");
        }
        Ok(())
    }

    /// One iteration of the main cycle.
    async fn step(&mut self) -> Result<(), EngineError> {
        // setters apply from the next iteration on
        let config = self.config.borrow().clone();

        if self.join.is_in_subarea() {
            self.finish_round(&config).await?;
        }

        let target = self.select_area(&config).await?;
        self.enter_area(&config, &target).await?;
        self.enter_subarea(&config, &target).await
    }

    async fn finish_round(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let JoinState::InSubarea {
            area,
            position,
            session_id,
            started_at,
        } = self.join.clone()
        else {
            return Ok(());
        };

        let remaining = self
            .join
            .remaining(config.round_duration, Instant::now())
            .unwrap_or_default();
        if !remaining.is_zero() {
            self.set_phase(Phase::WaitingForCompletion);
            self.sink.emit(EngineEvent::WaitingForRound { remaining });
            let lead = config.timings.pre_completion_lead;
            if remaining > lead {
                self.schedule_refresh(remaining - lead);
            }
            self.pause(remaining).await?;
        }

        self.set_phase(Phase::ReportingScore);
        let subarea = self
            .store
            .area(&area)
            .await
            .and_then(|a| a.subarea(position).cloned());
        let difficulty = subarea.as_ref().map_or(Difficulty::Low, |s| s.difficulty);
        let score = round_score(difficulty, started_at.elapsed());

        let result = self
            .guarded(self.service.report_score(&config.token, score))
            .await;
        match accept_stale(result)? {
            Some(report) => {
                info!(
                    score,
                    total = report.new_score,
                    level = report.new_level,
                    "score reported"
                );
                self.sink
                    .emit(EngineEvent::ScoreReported { score, report });
            }
            None => {
                warn!(score, "score report rejected, round already over");
                self.sink.emit(EngineEvent::ScoreRejected { score });
            }
        }

        // 成功しても必ず抜ける
        self.set_phase(Phase::LeavingArea);
        let session = session_id.or_else(|| subarea.map(|s| s.session_id));
        self.leave_round(config, position, session).await
    }

    fn schedule_refresh(&mut self, delay: Duration) {
        if let Some(previous) = self.pending_refresh.take() {
            previous.abort();
        }
        debug!(?delay, "pre-completion refresh scheduled");
        self.pending_refresh = Some(spawn_active_refresh(
            Arc::clone(&self.refresher),
            delay,
            self.cancel.clone(),
        ));
    }

    async fn select_area(&mut self, config: &EngineConfig) -> Result<Area, EngineError> {
        self.set_phase(Phase::SelectingArea);
        let areas = self.store.areas().await;
        let target = selector::pick_area(
            &areas,
            &config.strategy,
            self.join.area(),
            config.override_area.as_ref(),
            &mut self.rng,
        )
        .cloned()
        .ok_or(EngineError::NoRunningAreas)?;

        self.sink.emit(EngineEvent::AreaChosen {
            area: target.id.clone(),
            summary: target.summary(),
        });
        Ok(target)
    }

    /// Leave the joined area when it is captured or not the target, then
    /// join the target unless already in it.
    async fn enter_area(&mut self, config: &EngineConfig, target: &Area) -> Result<(), EngineError> {
        if let Some(joined) = self.join.area().cloned() {
            let current = self.store.area(&joined).await;
            let captured = current.as_ref().is_some_and(|a| a.state.captured);
            if captured {
                let name = current.map(|a| a.state.name).unwrap_or_default();
                info!(area = %joined, name = %name, "joined area captured");
                self.sink.emit(EngineEvent::AreaCaptured {
                    area: joined.clone(),
                    name,
                });
            }
            if captured || joined != target.id {
                self.set_phase(Phase::LeavingArea);
                self.leave_area(config, &joined).await?;
            }
        }

        if self.join.area() == Some(&target.id) {
            return Ok(());
        }

        self.set_phase(Phase::JoiningArea);
        self.guarded(self.service.join_area(&config.token, &target.id))
            .await?;
        let next = mem::take(&mut self.join).enter_area(target.id.clone());
        self.update_join(next).await;
        info!(area = %target.id, name = target.name(), "area joined");
        self.sink.emit(EngineEvent::AreaJoined {
            area: target.id.clone(),
            name: target.name().to_string(),
        });
        Ok(())
    }

    async fn enter_subarea(&mut self, config: &EngineConfig, target: &Area) -> Result<(), EngineError> {
        self.set_phase(Phase::SelectingSubarea);
        // the list entry has no subareas; prefer the freshest detail
        let area = self
            .store
            .area(&target.id)
            .await
            .unwrap_or_else(|| target.clone());
        let subarea = selector::pick_subarea(&area, &config.strategy)
            .cloned()
            .ok_or_else(|| EngineError::NoOpenSubareas(area.id.clone()))?;
        let position = subarea.position;
        self.sink.emit(EngineEvent::SubareaChosen {
            position,
            summary: subarea.summary(),
        });

        self.set_phase(Phase::JoiningSubarea);
        let result = self
            .guarded(self.service.join_subarea(&config.token, position))
            .await;
        if accept_stale(result)?.is_none() {
            info!(area = %area.id, position, "subarea no longer available");
            self.store.mark_subarea_captured(&area.id, position).await;
            let next = mem::take(&mut self.join).leave_subarea();
            self.update_join(next).await;
            self.sink.emit(EngineEvent::SubareaUnavailable { position });
            return Ok(());
        }

        let next = mem::take(&mut self.join).enter_subarea(
            position,
            Some(subarea.session_id),
            Instant::now(),
        );
        self.update_join(next).await;
        info!(area = %area.id, position, "subarea joined");
        self.sink.emit(EngineEvent::SubareaJoined { position });
        Ok(())
    }

    async fn leave_area(&mut self, config: &EngineConfig, area: &AreaId) -> Result<(), EngineError> {
        // the area itself doubles as its session id
        let result = self
            .guarded(self.service.leave(&config.token, area.as_str()))
            .await;
        accept_stale(result)?;
        self.update_join(JoinState::Idle).await;
        info!(area = %area, "area left");
        self.sink.emit(EngineEvent::AreaLeft { area: area.clone() });
        Ok(())
    }

    async fn leave_round(
        &mut self,
        config: &EngineConfig,
        position: u32,
        session: Option<String>,
    ) -> Result<(), EngineError> {
        match session {
            Some(session_id) => {
                let result = self
                    .guarded(self.service.leave(&config.token, &session_id))
                    .await;
                accept_stale(result)?;
                let next = mem::take(&mut self.join).leave_subarea();
                self.update_join(next).await;
                debug!(position, session_id = %session_id, "round left");
                self.sink.emit(EngineEvent::SubareaLeft {
                    position,
                    session_id,
                });
            }
            None => {
                warn!(position, "session of the joined subarea unknown, clearing it locally");
                let next = mem::take(&mut self.join).leave_subarea();
                self.update_join(next).await;
            }
        }
        Ok(())
    }

    /// エラーからの復帰
    ///
    /// Best effort: leave whatever is joined, then refresh the player. The local join
    /// state is cleared whether or not that worked, then the loop backs off.
    async fn recover(&mut self, err: EngineError) -> Result<(), EngineError> {
        self.set_phase(Phase::RecoveringFromError);
        warn!(error = %err, "automation step failed, recovering");
        self.sink.emit(EngineEvent::Failure {
            message: err.to_string(),
        });

        let config = self.config.borrow().clone();
        match self.reset_remote(&config).await {
            Ok(()) => {}
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(cleanup) => {
                warn!(error = %cleanup, "recovery cleanup failed");
                self.sink.emit(EngineEvent::Failure {
                    message: format!("recovery failed: {cleanup}"),
                });
            }
        }
        self.update_join(JoinState::Idle).await;

        let backoff = config.timings.retry_backoff;
        self.sink.emit(EngineEvent::Restarting { backoff });
        self.pause(backoff).await
    }

    async fn reset_remote(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        if let JoinState::InSubarea {
            area,
            position,
            session_id,
            ..
        } = self.join.clone()
        {
            let session = match session_id {
                Some(id) => Some(id),
                None => self
                    .store
                    .area(&area)
                    .await
                    .and_then(|a| a.subarea(position).map(|s| s.session_id.clone())),
            };
            self.leave_round(config, position, session).await?;
        }
        if let Some(area) = self.join.area().cloned() {
            self.leave_area(config, &area).await?;
        }
        self.guarded(self.refresher.refresh_player()).await
    }
}

/// `Ok(None)` for a stale rejection, which the caller corrects locally.
fn accept_stale<T>(result: Result<T, EngineError>) -> Result<Option<T>, EngineError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::Service(err)) if err.is_stale_rejection() => {
            debug!(error = %err, "stale rejection");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
