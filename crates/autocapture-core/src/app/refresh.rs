//! Refresh coordination.
//!
//! [`Refresher`] fetches area/player data and publishes it to the
//! [`WorldStore`]. [`RefreshTasks`] runs it in the background on two
//! intervals, plus a one-shot active-only refresh shortly before a round
//! completes. Background refreshes never block the main loop; their failures
//! are reported and otherwise ignored until the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::{EngineConfig, Timings};
use super::store::WorldStore;
use crate::domain::{EngineEvent, ServiceError};
use crate::ports::{EventSink, GameService};

pub struct Refresher {
    service: Arc<dyn GameService>,
    store: Arc<WorldStore>,
    sink: Arc<dyn EventSink>,
    config: watch::Receiver<EngineConfig>,
}

impl Refresher {
    pub fn new(
        service: Arc<dyn GameService>,
        store: Arc<WorldStore>,
        sink: Arc<dyn EventSink>,
        config: watch::Receiver<EngineConfig>,
    ) -> Self {
        Self {
            service,
            store,
            sink,
            config,
        }
    }

    /// Refresh the area list and the details of its running areas.
    ///
    /// With `active_only`, only the active list is fetched and merged into
    /// the current one instead of replacing it.
    pub async fn refresh_areas(&self, active_only: bool) -> Result<(), ServiceError> {
        let list = self.service.list_areas(active_only).await?;
        let details = try_join_all(
            list.iter()
                .filter(|a| a.state.running)
                .map(|a| self.service.area_detail(&a.id)),
        )
        .await?;

        let summaries: Vec<String> = details.iter().map(|a| a.summary()).collect();
        let running = details.len();
        if active_only {
            self.store.publish_active(details).await;
        } else {
            let total = list.len();
            self.store.publish_full(list, details).await;
            self.sink.emit(EngineEvent::AreasRefreshed { total, running });
        }
        debug!(active_only, running, "areas refreshed");
        self.sink
            .emit(EngineEvent::ActiveAreasRefreshed { running, summaries });
        Ok(())
    }

    /// Refresh the player status. Without a token there is nothing to fetch.
    pub async fn refresh_player(&self) -> Result<(), ServiceError> {
        let token = self.config.borrow().token.clone();
        if token.trim().is_empty() {
            debug!("no token configured, skipping player refresh");
            return Ok(());
        }

        let status = self.service.player_status(&token).await?;
        self.sink.emit(EngineEvent::PlayerRefreshed {
            level: status.level,
            score: status.score,
            next_level_score: status.next_level_score,
            active_area: status.active_area_id(),
            time_in_area: status.time_in_area,
            active_subarea: status.active_subarea(),
            time_in_subarea: status.time_in_subarea,
        });
        self.store.publish_player(status).await;
        Ok(())
    }

    /// Full area refresh and player refresh, concurrently.
    pub async fn refresh_all(&self) -> Result<(), ServiceError> {
        tokio::try_join!(self.refresh_areas(false), self.refresh_player())?;
        Ok(())
    }

    fn report_failure(&self, what: &'static str, err: &ServiceError) {
        warn!(refresh = what, error = %err, "background refresh failed");
        self.sink.emit(EngineEvent::Failure {
            message: format!("{what} refresh failed: {err}"),
        });
    }
}

/// Handles of the background refresh tasks of one run.
#[derive(Default)]
pub struct RefreshTasks {
    handles: Vec<JoinHandle<()>>,
}

impl RefreshTasks {
    /// Start the area and player interval refreshes.
    ///
    /// The first refresh of each fires one full interval after start; the
    /// engine's own initialization covers time zero.
    pub fn spawn(refresher: Arc<Refresher>, timings: Timings, cancel: CancellationToken) -> Self {
        let areas = {
            let refresher = Arc::clone(&refresher);
            spawn_periodic("area", timings.area_refresh, cancel.clone(), refresher, |r| async move {
                r.refresh_areas(false).await
            })
        };
        let player = spawn_periodic("player", timings.player_refresh, cancel, refresher, |r| async move {
            r.refresh_player().await
        });
        Self {
            handles: vec![areas, player],
        }
    }

    pub fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for RefreshTasks {
    fn drop(&mut self) {
        self.abort_all();
    }
}

fn spawn_periodic<F, Fut>(
    what: &'static str,
    every: Duration,
    cancel: CancellationToken,
    refresher: Arc<Refresher>,
    refresh: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<Refresher>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = refresh(Arc::clone(&refresher)) => result,
            };
            if let Err(err) = result {
                refresher.report_failure(what, &err);
            }
        }
        debug!(refresh = what, "periodic refresh stopped");
    })
}

/// Fire an active-only area refresh after `delay`, unless cancelled first.
pub fn spawn_active_refresh(
    refresher: Arc<Refresher>,
    delay: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = async {
                tokio::time::sleep(delay).await;
                refresher.refresh_areas(true).await
            } => result,
        };
        if let Err(err) = result {
            refresher.report_failure("pre-completion area", &err);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Area, Difficulty, PlayerStatus, Subarea};
    use crate::impls::{CallKind, ChannelEventSink, InMemoryGameService, ServiceCall};

    fn world() -> InMemoryGameService {
        InMemoryGameService::new(
            vec![
                Area::new("1", "Vega", Difficulty::High)
                    .with_subareas(vec![Subarea::new(0, Difficulty::High, "s0")]),
                Area::new("2", "Rigel", Difficulty::Low).stopped(),
            ],
            PlayerStatus::new(500, 2, 1_000),
        )
    }

    fn refresher(
        service: &InMemoryGameService,
        token: &str,
    ) -> (Arc<Refresher>, Arc<WorldStore>, tokio::sync::mpsc::UnboundedReceiver<EngineEvent>) {
        let store = Arc::new(WorldStore::new());
        let (sink, events) = ChannelEventSink::new();
        let (_tx, config) = watch::channel(EngineConfig::new(token));
        let refresher = Refresher::new(Arc::new(service.clone()), Arc::clone(&store), Arc::new(sink), config);
        (Arc::new(refresher), store, events)
    }

    #[tokio::test]
    async fn full_refresh_fetches_details_of_running_areas_only() {
        let service = world();
        let (refresher, store, _events) = refresher(&service, "t");
        refresher.refresh_all().await.unwrap();

        let areas = store.areas().await;
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].subareas.len(), 1);
        assert!(store.player().await.is_some());

        let details: Vec<ServiceCall> = service
            .calls()
            .await
            .into_iter()
            .filter(|c| c.kind() == CallKind::AreaDetail)
            .collect();
        assert_eq!(details, vec![ServiceCall::AreaDetail("1".into())]);
    }

    #[tokio::test]
    async fn player_refresh_without_token_makes_no_call() {
        let service = world();
        let (refresher, store, _events) = refresher(&service, "  ");
        refresher.refresh_player().await.unwrap();
        assert!(service.calls().await.is_empty());
        assert!(store.player().await.is_none());
    }

    #[tokio::test]
    async fn failed_detail_fetch_publishes_nothing() {
        let service = world();
        let (refresher, store, _events) = refresher(&service, "t");
        service
            .fail_next(CallKind::AreaDetail, ServiceError::transport("reset"))
            .await;
        assert!(refresher.refresh_areas(false).await.is_err());
        assert!(store.areas().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_waits_a_full_interval_and_survives_failures() {
        let service = world();
        let (refresher, _store, mut events) = refresher(&service, "t");
        let timings = Timings::default();
        let cancel = CancellationToken::new();
        service
            .fail_next(CallKind::PlayerStatus, ServiceError::transport("timeout"))
            .await;

        let mut tasks = RefreshTasks::spawn(refresher, timings, cancel.clone());
        tokio::task::yield_now().await;
        assert!(service.calls().await.is_empty());

        // first player tick fails, second succeeds
        tokio::time::sleep(timings.player_refresh * 2 + Duration::from_secs(1)).await;
        let player_calls = service
            .calls()
            .await
            .iter()
            .filter(|c| c.kind() == CallKind::PlayerStatus)
            .count();
        assert_eq!(player_calls, 2);
        assert!(matches!(events.recv().await, Some(EngineEvent::Failure { .. })));

        cancel.cancel();
        tasks.abort_all();
    }

    #[tokio::test(start_paused = true)]
    async fn pre_completion_refresh_is_cancellable() {
        let service = world();
        let (refresher, _store, _events) = refresher(&service, "t");
        let cancel = CancellationToken::new();

        let handle = spawn_active_refresh(Arc::clone(&refresher), Duration::from_secs(30), cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
        assert!(service.calls().await.is_empty());

        let handle = spawn_active_refresh(refresher, Duration::from_secs(30), CancellationToken::new());
        handle.await.unwrap();
        assert_eq!(
            service.calls().await.first(),
            Some(&ServiceCall::ListAreas { active_only: true })
        );
    }
}
