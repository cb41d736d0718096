//! Impls - ports の実装
//!
//! - `InMemoryGameService`: 開発・テスト用のゲームサービス
//! - `TracingEventSink` / `ChannelEventSink`: 進捗通知の出力先

pub mod event_sinks;
pub mod inmem_service;

pub use self::event_sinks::{ChannelEventSink, TracingEventSink};
pub use self::inmem_service::{CallKind, InMemoryGameService, RecordedCall, ServiceCall};
