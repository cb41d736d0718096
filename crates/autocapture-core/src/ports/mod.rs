//! Ports - 抽象化レイヤー
//!
//! 外部コラボレーター（ゲームサービス、表示先）へのインターフェース。
//! エンジンはこの trait 越しにしか外界に触れない。

pub mod event_sink;
pub mod game_service;

pub use self::event_sink::EventSink;
pub use self::game_service::GameService;
