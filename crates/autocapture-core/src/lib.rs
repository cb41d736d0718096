//! autocapture-core
//!
//! Unattended automation for the area capture event: pick an area and a
//! subarea by strategy, join, sit out the round, report the score, repeat.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, area, player, session, score, strategy, errors, events）
//! - **ports**: 抽象化レイヤー（GameService, EventSink）
//! - **app**: アプリケーションロジック（automation, engine, refresh, selector, store, status）
//! - **impls**: 実装（InMemoryGameService など開発用, tracing/channel の EventSink）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::{Automation, EngineConfig, EngineStatus, Phase, Timings};
pub use self::domain::{EngineError, EngineEvent, ServiceError, Strategy, StrategyFlag};
