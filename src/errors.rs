//! Error types for alignment.
//!
//! [`AlignError`] covers the structural failures that abort a whole
//! document. [`SpanError`] covers per-span failures, which never abort a
//! batch and end up in [`Diagnostics`](crate::Diagnostics) instead.

use serde::Serialize;
use thiserror::Error;

/// Errors that abort processing of a document.
#[derive(Debug, Error)]
pub enum AlignError {
    /// Malformed CoNLL-U input.
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// The `# text` of a sentence cannot accommodate its tokens.
    #[error(
        "alignment error in sentence {sentence}: token {token_id} '{form}' not found at or after character {cursor}"
    )]
    Alignment {
        /// Sentence index (0-based)
        sentence: usize,
        /// The CoNLL-U identifier of the unaligned surface unit
        token_id: String,
        form: String,
        /// Character position within the sentence text where the search began
        cursor: usize,
    },

    /// The `# text` of a sentence holds text after its last token.
    #[error(
        "alignment error in sentence {sentence}: text '{text}' at character {cursor} belongs to no token"
    )]
    UnalignedText {
        sentence: usize,
        text: String,
        cursor: usize,
    },

    /// Configuration could not be read or parsed.
    #[error("failed to load config: {path}: {message}")]
    Config { path: String, message: String },

    /// Span input could not be decoded.
    #[error("invalid span input: {message}")]
    Spans { message: String },

    /// The oracle failed to produce spans.
    #[error("oracle failed: {message}")]
    Oracle { message: String },

    /// A resolved span points at a token the document does not have.
    #[error("no token at sentence {sentence}, index {token}")]
    UnknownToken { sentence: usize, token: usize },
}

impl AlignError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        AlignError::Format {
            line,
            message: message.into(),
        }
    }
}

/// Result type for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

/// Why a single span could not be mapped onto tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanError {
    /// Nothing left after clamping, or the range covers only gap characters.
    #[error("span [{start}, {end}) covers no token")]
    EmptySpan { start: i64, end: i64 },

    /// The first resolved token lies after the last one.
    #[error("span [{start}, {end}) resolves to an inverted token range")]
    InvalidRange { start: i64, end: i64 },

    /// The span carries an empty label.
    #[error("span [{start}, {end}) has an empty label")]
    EmptyLabel { start: i64, end: i64 },
}
