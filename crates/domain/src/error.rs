//! Orchestration error taxonomy.

use thiserror::Error;

/// Errors observed by the orchestrator.
///
/// Downstream transport failures are classified into one of these kinds at the
/// client boundary, so workflows never see raw HTTP or bus errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    /// Malformed or absent identifier, or a downstream bad-request.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing product, or a downstream not-found on the mandatory dependency.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The event publisher queue is saturated.
    #[error("Backpressure: {0}")]
    Backpressure(String),

    /// Opaque downstream failure, preserved for diagnostics.
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl OrchestrationError {
    /// Returns true for a downstream not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestrationError::NotFound(_))
    }

    /// Short kind name used as a metrics label and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationError::InvalidInput(_) => "invalid_input",
            OrchestrationError::NotFound(_) => "not_found",
            OrchestrationError::Backpressure(_) => "backpressure",
            OrchestrationError::Upstream { .. } => "upstream",
        }
    }
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, OrchestrationError>;
