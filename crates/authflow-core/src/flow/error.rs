use thiserror::Error;

use super::{FlowState, IntentKind};
use crate::provider::AuthError;

/// Reasons the controller rejects an intent or reports a failed operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("another operation is already in progress")]
    Busy,
    #[error("'{intent}' is not available while {state}")]
    InvalidTransition { state: FlowState, intent: IntentKind },
    #[error("no async runtime is available to run the operation")]
    NoRuntime,
    #[error(transparent)]
    OperationFailed(#[from] AuthError),
}

/// Required field missing or malformed; detected before any operation starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("verification code must be {expected} characters")]
    CodeLength { expected: usize },
}
