//! Automation - 外部から操作するコントローラ
//!
//! Owns the configuration and at most one run. Every start builds a fresh
//! run (store, status, cancellation token, join state); stop cancels it. The
//! setters write to a `watch` channel the running loop reads each iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::EngineConfig;
use super::engine::{Engine, EngineContext};
use super::refresh::{RefreshTasks, Refresher};
use super::status::EngineStatus;
use super::store::WorldStore;
use crate::domain::{Area, AreaId, EngineEvent, PlayerStatus, Strategy};
use crate::ports::{EventSink, GameService};

struct Run {
    active: Arc<AtomicBool>,
    cancel: CancellationToken,
    store: Arc<WorldStore>,
    status: watch::Receiver<EngineStatus>,
    engine: Option<JoinHandle<()>>,
    refresh: RefreshTasks,
}

impl Run {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.cancel.cancel();
        self.refresh.abort_all();
    }
}

pub struct Automation {
    service: Arc<dyn GameService>,
    sink: Arc<dyn EventSink>,
    config: watch::Sender<EngineConfig>,
    seed: Option<u64>,
    run: Option<Run>,
}

impl Automation {
    pub fn new(service: Arc<dyn GameService>, sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        let (config, _) = watch::channel(config);
        Self {
            service,
            sink,
            config,
            seed: None,
            run: None,
        }
    }

    /// Seed the generator behind `FocusRandomArea`, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start a fresh run. Returns `false` if one is already active.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        if let Some(mut previous) = self.run.take() {
            previous.stop();
        }

        let config = self.config.subscribe();
        if !config.borrow().has_token() {
            warn!("no token configured, player refresh is disabled");
        }
        let timings = config.borrow().timings;

        let store = Arc::new(WorldStore::new());
        let active = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();
        let (status_tx, status) = watch::channel(EngineStatus::default());
        let refresher = Arc::new(Refresher::new(
            Arc::clone(&self.service),
            Arc::clone(&store),
            Arc::clone(&self.sink),
            config.clone(),
        ));
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let engine = Engine::new(
            EngineContext {
                service: Arc::clone(&self.service),
                store: Arc::clone(&store),
                sink: Arc::clone(&self.sink),
                refresher: Arc::clone(&refresher),
                config,
                status: status_tx,
                active: Arc::clone(&active),
                cancel: cancel.clone(),
            },
            rng,
        );

        self.sink.emit(EngineEvent::Started);
        info!("automation started");
        let engine = tokio::spawn(engine.run());
        let refresh = RefreshTasks::spawn(refresher, timings, cancel.clone());
        self.run = Some(Run {
            active,
            cancel,
            store,
            status,
            engine: Some(engine),
            refresh,
        });
        true
    }

    /// Stop the current run. Repeated calls are no-ops.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.as_mut()
            && run.is_active()
        {
            run.stop();
            info!("automation stop requested");
        }
    }

    /// Stop and wait until the loop has unwound.
    pub async fn stop_and_wait(&mut self) {
        self.stop();
        let Some(handle) = self.run.as_mut().and_then(|run| run.engine.take()) else {
            return;
        };
        if let Err(err) = handle.await {
            warn!(error = %err, "automation loop ended abnormally");
        }
    }

    pub fn is_active(&self) -> bool {
        self.run.as_ref().is_some_and(Run::is_active)
    }

    /// Latest phase and join state of the current (or last) run.
    pub fn status(&self) -> EngineStatus {
        self.run
            .as_ref()
            .map(|run| run.status.borrow().clone())
            .unwrap_or_default()
    }

    /// Change notifications for the status of the current run.
    pub fn subscribe(&self) -> Option<watch::Receiver<EngineStatus>> {
        self.run.as_ref().map(|run| run.status.clone())
    }

    pub async fn areas(&self) -> Arc<Vec<Area>> {
        match &self.run {
            Some(run) => run.store.areas().await,
            None => Arc::default(),
        }
    }

    pub async fn player(&self) -> Option<Arc<PlayerStatus>> {
        match &self.run {
            Some(run) => run.store.player().await,
            None => None,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config.borrow().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.config.send_modify(|c| c.token = token);
    }

    pub fn set_round_duration(&self, duration: Duration) {
        self.config.send_modify(|c| c.round_duration = duration);
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        info!(%strategy, "strategy changed");
        self.config.send_modify(|c| c.strategy = strategy);
    }

    /// Force the target area; `None` returns to strategy-based selection.
    pub fn set_override_area(&self, area: Option<AreaId>) {
        self.config.send_modify(|c| c.override_area = area);
    }
}

impl Drop for Automation {
    fn drop(&mut self) {
        if let Some(run) = self.run.as_mut() {
            run.stop();
        }
    }
}
