//! GameService port - リモートのゲームサービス
//!
//! Transport, serialization and auth live behind this trait. The engine only
//! sees domain types and [`ServiceError`].

use async_trait::async_trait;

use crate::domain::{Area, AreaId, PlayerStatus, ScoreReport, ServiceError};

/// Operations the engine consumes from the remote game service.
///
/// # Rejections
/// `join_area`, `join_subarea` and `report_score` may fail with
/// `ServiceError::Rejected`; `Expired` and `NoMatch` mean the target is no
/// longer valid (already captured, round over).
#[async_trait]
pub trait GameService: Send + Sync {
    /// Area list. Subareas are not included in this form.
    async fn list_areas(&self, active_only: bool) -> Result<Vec<Area>, ServiceError>;

    /// Full area record including subareas.
    async fn area_detail(&self, id: &AreaId) -> Result<Area, ServiceError>;

    async fn player_status(&self, token: &str) -> Result<PlayerStatus, ServiceError>;

    async fn join_area(&self, token: &str, area: &AreaId) -> Result<(), ServiceError>;

    async fn join_subarea(&self, token: &str, position: u32) -> Result<(), ServiceError>;

    async fn report_score(&self, token: &str, score: u64) -> Result<ScoreReport, ServiceError>;

    /// Leave a round (subarea session id) or an area (area id).
    async fn leave(&self, token: &str, session_id: &str) -> Result<(), ServiceError>;
}
