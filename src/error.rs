//! Error types for the `html_sanitize` crate.

/// All errors that can occur while sanitizing markup.
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    /// The policy (or a custom transformer plugged into it) is malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// The call was made with input that can never produce valid output,
    /// e.g. sanitizing a document whose `<html>` element is not allowed.
    #[error("Precondition failed: {0}")]
    Precondition(String),
}

/// A type alias for `Result<T, SanitizeError>`.
pub type Result<T> = std::result::Result<T, SanitizeError>;
