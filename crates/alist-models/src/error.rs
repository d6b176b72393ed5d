//! Error types for the `alist-models` crate.

/// Errors produced when validating model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An `alist://` link did not decode to a usable absolute path.
    #[error("invalid link path \"{value}\": {reason}")]
    InvalidLinkPath {
        /// The encoded value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A required field was missing from a backend payload.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}
