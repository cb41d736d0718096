//! Domain model (areas, player status, strategy, score, join state, events).
//!
//! 副作用なし。ネットワークや時間待ちは `app` 側の責務。

pub mod area;
pub mod errors;
pub mod events;
pub mod ids;
pub mod player;
pub mod score;
pub mod session;
pub mod strategy;

pub use self::area::{Area, AreaState, Difficulty, Subarea};
pub use self::errors::{EngineError, Rejection, ServiceError};
pub use self::events::EngineEvent;
pub use self::ids::AreaId;
pub use self::player::{PlayerStatus, ScoreReport};
pub use self::score::{MAX_ROUND_DURATION, points_per_second, round_score};
pub use self::session::{JoinState, JoinView};
pub use self::strategy::{FocusMode, RankingTiers, Strategy, StrategyError, StrategyFlag, TierOrder};
