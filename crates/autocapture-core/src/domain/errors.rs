//! Errors and their classification.
//!
//! - `ServiceError::Rejected` with a stale rejection: local state drifted from
//!   the remote one. Corrected locally, no backoff.
//! - everything else from the service: transient, goes through recovery.
//! - `EngineError::Cancelled`: raised by stop, unwinds silently.

use thiserror::Error;

use super::ids::AreaId;

/// Coded refusal from the game service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("expired")]
    Expired,

    #[error("no match")]
    NoMatch,

    #[error("invalid state")]
    InvalidState,

    #[error("{0}")]
    Other(String),
}

impl Rejection {
    /// The target is no longer valid (already captured, round over).
    pub fn is_stale(&self) -> bool {
        matches!(self, Rejection::Expired | Rejection::NoMatch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("rejected by game service: {0}")]
    Rejected(Rejection),

    #[error("game service unreachable: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport(message.into())
    }

    pub fn is_stale_rejection(&self) -> bool {
        matches!(self, ServiceError::Rejected(r) if r.is_stale())
    }
}

impl From<Rejection> for ServiceError {
    fn from(rejection: Rejection) -> Self {
        ServiceError::Rejected(rejection)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("no running area to join")]
    NoRunningAreas,

    #[error("area {0} has no uncaptured subarea")]
    NoOpenSubareas(AreaId),

    #[error("automation stopped")]
    Cancelled,
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_expired_and_no_match_are_stale() {
        assert!(ServiceError::from(Rejection::Expired).is_stale_rejection());
        assert!(ServiceError::from(Rejection::NoMatch).is_stale_rejection());
        assert!(!ServiceError::from(Rejection::InvalidState).is_stale_rejection());
        assert!(!ServiceError::transport("timeout").is_stale_rejection());
    }

    #[test]
    fn service_errors_convert_into_engine_errors() {
        let err: EngineError = ServiceError::transport("connection reset").into();
        assert_eq!(err.to_string(), "game service unreachable: connection reset");
        assert!(!err.is_cancelled());
    }
}
