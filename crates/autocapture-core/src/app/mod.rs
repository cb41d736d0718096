//! App - アプリケーション層
//!
//! ports を組み合わせて自動化ループを構成します。
//!
//! # 主要コンポーネント
//! - **Automation**: start/stop と設定変更の窓口
//! - **Engine**: 1 回分の実行ループ（選択→参加→待機→報告→離脱）
//! - **Refresher / RefreshTasks**: エリア・プレイヤー情報の定期更新
//! - **WorldStore**: ループと定期更新が共有するスナップショット
//! - **selector**: 戦略に基づく純粋な順位付け

pub mod automation;
pub mod config;
pub mod engine;
pub mod refresh;
pub mod selector;
pub mod status;
pub mod store;

// 主要な型を再エクスポート
pub use self::automation::Automation;
pub use self::config::{EngineConfig, Timings};
pub use self::engine::{Engine, EngineContext};
pub use self::refresh::{RefreshTasks, Refresher};
pub use self::status::{EngineStatus, Phase, StatusView};
pub use self::store::WorldStore;
