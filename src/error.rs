use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    state::{ApplyError, InvalidTransition},
};

/// Errors raised by the game engine and its components.
///
/// Every command validates before it commits, so returning one of these
/// guarantees that the game state and the scores were left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Malformed question bank or roster (too many teams/members, even tie-break count...).
    #[error("configuration error: {0}")]
    Config(String),
    /// The command is not allowed in the current game state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A question, team or controller index is out of range.
    #[error("out of range: {0}")]
    OutOfRange(String),
}

impl From<InvalidTransition> for GameError {
    fn from(err: InvalidTransition) -> Self {
        GameError::InvalidOperation(err.to_string())
    }
}

impl From<ApplyError> for GameError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::VersionMismatch { expected, actual } => GameError::InvalidOperation(
                format!("state version mismatch during transition (expected {expected}, got {actual})"),
            ),
        }
    }
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Save storage is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Saves are disabled in the configuration.
    #[error("saves are disabled")]
    SavesDisabled,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => ServiceError::NotFound(format!("save `{id}` not found")),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Config(message) | GameError::OutOfRange(message) => {
                ServiceError::InvalidInput(message)
            }
            GameError::InvalidOperation(message) => ServiceError::InvalidState(message),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::SavesDisabled => AppError::ServiceUnavailable("saves are disabled".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::{GameEvent, GamePhase};

    #[test]
    fn game_errors_map_to_http_statuses() {
        let bad: AppError = ServiceError::from(GameError::OutOfRange("question 12".into())).into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let conflict: AppError =
            ServiceError::from(GameError::InvalidOperation("mid game".into())).into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let missing: AppError = ServiceError::from(StorageError::NotFound(7)).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_transition_becomes_invalid_operation() {
        let err: GameError = InvalidTransition {
            from: GamePhase::Over,
            event: GameEvent::TeamsSet,
        }
        .into();
        assert!(matches!(err, GameError::InvalidOperation(_)));
    }
}
