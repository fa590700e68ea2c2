// src/error.rs
// Error taxonomy and the uniform result shape returned by every operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{log_error, log_warning};

#[derive(Error, Debug)]
pub enum BingoError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    LimitReached(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BingoError {
    pub fn validation(message: impl Into<String>) -> Self {
        BingoError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        BingoError::NotFound(message.into())
    }

    pub fn limit(message: impl Into<String>) -> Self {
        BingoError::LimitReached(message.into())
    }

    /// Internal failures must not leak their detail to the caller
    pub fn is_internal(&self) -> bool {
        matches!(self, BingoError::Persistence(_) | BingoError::Serialization(_) | BingoError::Task(_))
    }
}

pub type BingoResult<T> = Result<T, BingoError>;

/// Uniform result of a server operation: a success flag, a human-readable
/// message and, on success, the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionState<T> {
    pub is_success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionState<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            is_success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Settle an operation result at the request boundary. Internal failures
    /// are logged in full and reported with `failure_message` only.
    pub fn from_result(
        result: BingoResult<T>,
        success_message: impl FnOnce(&T) -> String,
        failure_message: &str,
    ) -> Self {
        match result {
            Ok(data) => Self::success(success_message(&data), data),
            Err(e) if e.is_internal() => {
                log_error(&format!("{failure_message}: {e}"));
                Self::failure(failure_message)
            }
            Err(e) => {
                log_warning(&format!("{failure_message}: {e}"));
                Self::failure(e.to_string())
            }
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.is_success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(format!("Response carried no data: {}", self.message)),
            (false, _) => Err(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_state_wire_shape() {
        let ok = ActionState::success("Bingo items retrieved", vec![1, 2]);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["isSuccess"], true);
        assert_eq!(json["message"], "Bingo items retrieved");
        assert_eq!(json["data"], serde_json::json!([1, 2]));

        let failed: ActionState<()> = ActionState::failure("Game not found");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["isSuccess"], false);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ActionState::success("ok", 5).into_result(), Ok(5));
        let failed: ActionState<i32> = ActionState::failure("Item limit reached");
        assert_eq!(failed.into_result(), Err("Item limit reached".to_string()));
    }

    #[test]
    fn test_from_result_hides_internal_detail() {
        let failed: ActionState<u8> = ActionState::from_result(
            Err(BingoError::Persistence(rusqlite::Error::InvalidQuery)),
            |_| "unused".to_string(),
            "Failed to create bingo items",
        );
        assert!(!failed.is_success);
        assert_eq!(failed.message, "Failed to create bingo items");

        let rejected: ActionState<u8> = ActionState::from_result(
            Err(BingoError::limit("Item limit reached")),
            |_| "unused".to_string(),
            "Failed to create bingo items",
        );
        assert_eq!(rejected.message, "Item limit reached");

        let ok = ActionState::from_result(Ok(3u8), |n| format!("Created {n} cards"), "Failed");
        assert_eq!(ok.message, "Created 3 cards");
        assert_eq!(ok.data, Some(3));
    }

    #[test]
    fn test_internal_classification() {
        assert!(!BingoError::validation("x").is_internal());
        assert!(!BingoError::not_found("x").is_internal());
        assert!(BingoError::Persistence(rusqlite::Error::InvalidQuery).is_internal());
    }
}
