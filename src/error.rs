use thiserror::Error;

use crate::extraction::ExtractionFailure;

/// Failure reported by a responder or search implementation before any
/// content could be inspected (network, protocol, provider error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Outcome of a failed [`ResponderGateway`](crate::gateway::ResponderGateway) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The exchange completed but extraction produced nothing usable.
    #[error("no usable content ({0})")]
    NoUsableContent(ExtractionFailure),
}

impl From<TransportError> for CallError {
    fn from(err: TransportError) -> Self {
        CallError::TransportFailure(err.0)
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("unknown category '{0}', expected one of: sights, food, lodging, insights, images, synthesis")]
    UnknownCategory(String),

    #[error("workflow error: {0}")]
    Workflow(String),

    #[error("travel plan {0} not found")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
