//! Engine error codes and the rejection string format.
//!
//! Errors are data, never panics. Every user-visible rejection string is
//! rendered as `"[CODE] message"`; the code is the stable contract, the
//! message text is advisory.

use serde::{Deserialize, Serialize};

/// Closed set of machine-readable rejection codes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidAction,
    OutOfRange,
    BlockedCell,
    NotYourTurn,
    DeadEntity,
    SchemaInvalid,
    InvariantFailed,
    PostInvariantFailed,
    EntityNotFound,
    Overlap,
    DiagonalMove,
    CombatNotActive,
    CombatAlreadyActive,
    NoParticipants,
    SelfAttack,
    TargetDead,
    PathEmpty,
    BudgetExhausted,
}

/// A single rejection reason carrying a stable code and an advisory message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_renders_with_bracketed_code() {
        let err = EngineError::new(ErrorCode::NotYourTurn, "pc-02 is not the active entity");
        assert_eq!(err.to_string(), "[NOT_YOUR_TURN] pc-02 is not the active entity");
    }

    #[test]
    fn code_round_trips_through_display() {
        use std::str::FromStr;
        let code = ErrorCode::BudgetExhausted;
        assert_eq!(code.to_string(), "BUDGET_EXHAUSTED");
        assert_eq!(ErrorCode::from_str("BUDGET_EXHAUSTED").ok(), Some(code));
    }
}
