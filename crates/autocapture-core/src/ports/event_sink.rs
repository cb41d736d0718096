//! EventSink port - 進捗通知の出力先
//!
//! # 実装
//! - `TracingEventSink`: tracing に流す（CLI のデフォルト）
//! - `ChannelEventSink`: mpsc に流す（テスト、組み込み用）

use crate::domain::EngineEvent;

/// EventSink receives a notification at each meaningful engine transition.
///
/// Implementations must not block; the engine calls `emit` inline.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}
