use std::time::Duration;

use thiserror::Error;

use crate::schema::Domain;

/// Errors surfaced by the assistant runtime
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message is empty")]
    EmptyInput,

    #[error("Required field `{key}` missing for {domain} prediction")]
    MissingRequired { domain: Domain, key: String },

    #[error("Field `{key}` is not part of the {domain} schema")]
    UnknownField { domain: Domain, key: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Turn did not complete: {0}")]
    TurnAborted(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Why a prediction request did not produce a usable result.
///
/// Every variant is recoverable: the dialogue reports it to the user and
/// keeps the collected data for a retry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("Unable to reach the prediction service: {0}")]
    Network(String),

    #[error("Prediction service did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Prediction failed: {message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("Prediction service returned an unexpected response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
