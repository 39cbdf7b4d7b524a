//! # Error Types
//!
//! Errors raised while reading notation. The engine is fail-soft: callers of
//! these fallible helpers log the error and recover (keep the previous value,
//! skip the token or line), so no `ScoreError` ever escapes `parse_score`.
//!
//! ## Error Types
//! - `ParseError` - unrecognized body token or malformed legacy line, with location
//! - `MetadataError` - header field whose value cannot be interpreted

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Parse error with location information.
    ///
    /// # Example
    /// ```
    /// # use tunescore::ScoreError;
    /// let err = ScoreError::ParseError {
    ///     line: 3,
    ///     column: 7,
    ///     message: "Unexpected character '&'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error at line 3, column 7: Unexpected character '&'");
    /// ```
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid metadata field.
    ///
    /// # Example
    /// ```
    /// # use tunescore::ScoreError;
    /// let err = ScoreError::MetadataError("Invalid tempo: fast".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: Invalid tempo: fast");
    /// ```
    #[error("Invalid metadata: {0}")]
    MetadataError(String),
}
