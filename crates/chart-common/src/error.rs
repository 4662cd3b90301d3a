//! Error types for chart rendering.

use thiserror::Error;

/// Result type alias using ChartError.
pub type ChartResult<T> = Result<T, ChartError>;

/// Primary error type for chart operations.
#[derive(Debug, Error)]
pub enum ChartError {
    // === Input Errors ===
    #[error("No fields supplied for chart '{0}'")]
    NoFields(String),

    #[error("Field '{field}' is missing required attribute '{attribute}'")]
    MissingAttribute { field: String, attribute: String },

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Field '{0}' has an empty time axis")]
    EmptyTimeAxis(String),

    #[error("Animation needs {needed} time steps, field has {found}")]
    InsufficientSteps { needed: usize, found: usize },

    #[error("Invalid map extent: {0}")]
    InvalidExtent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Rendering Errors ===
    #[error("Font error: {0}")]
    Font(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChartError {
    /// Shorthand for a missing attribute on a named field.
    pub fn missing(field: impl Into<String>, attribute: impl Into<String>) -> Self {
        ChartError::MissingAttribute {
            field: field.into(),
            attribute: attribute.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than rendering or I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ChartError::NoFields(_)
                | ChartError::MissingAttribute { .. }
                | ChartError::ShapeMismatch(_)
                | ChartError::EmptyTimeAxis(_)
                | ChartError::InsufficientSteps { .. }
                | ChartError::InvalidExtent(_)
        )
    }
}
