//! Mapping character spans onto token ranges.

use crate::document::{TokenPosition, TokenRange};
use crate::errors::SpanError;
use crate::offsets::{OffsetEntry, OffsetTable, Owner};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A labelled `[start, end)` character span as produced by the oracle.
///
/// Offsets are signed because oracle output is not trusted to be in range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
    pub label: String,
}

impl Span {
    pub fn new(start: i64, end: i64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Clamp both ends into `[0, len]`.
    pub fn clamp(&self, len: usize) -> Range<usize> {
        let clamp = |pos: i64| pos.max(0).min(len as i64) as usize;
        clamp(self.start)..clamp(self.end)
    }

    fn empty(&self) -> SpanError {
        SpanError::EmptySpan {
            start: self.start,
            end: self.end,
        }
    }
}

/// A span mapped onto the first and last token it overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSpan {
    pub label: String,
    pub tokens: TokenRange,
    /// The clamped character range
    pub chars: Range<usize>,
}

fn first_word_position(entry: &OffsetEntry) -> Option<TokenPosition> {
    match entry.owner {
        Owner::Word {
            sentence, first, ..
        } => Some(TokenPosition::new(sentence, first)),
        Owner::Gap => None,
    }
}

fn last_word_position(entry: &OffsetEntry) -> Option<TokenPosition> {
    match entry.owner {
        Owner::Word { sentence, last, .. } => Some(TokenPosition::new(sentence, last)),
        Owner::Gap => None,
    }
}

/// Resolve one span against an offset table.
///
/// A start inside a gap attaches forward to the next token, an end inside a
/// gap attaches backward to the previous one. Spans that cover only gap
/// characters, or nothing after clamping, are [`SpanError::EmptySpan`].
pub fn resolve(span: &Span, offsets: &OffsetTable) -> Result<ResolvedSpan, SpanError> {
    let chars = span.clamp(offsets.len());
    if chars.start >= chars.end {
        return Err(span.empty());
    }

    let entries = offsets.entries();
    let first_idx = offsets.index_at(chars.start).ok_or_else(|| span.empty())?;
    let last_idx = offsets.index_at(chars.end - 1).ok_or_else(|| span.empty())?;

    let start = entries[first_idx..]
        .iter()
        .take_while(|e| e.start < chars.end)
        .find_map(first_word_position);
    let end = entries[..=last_idx]
        .iter()
        .rev()
        .take_while(|e| e.end > chars.start)
        .find_map(last_word_position);

    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(ResolvedSpan {
            label: span.label.clone(),
            tokens: TokenRange::new(start, end),
            chars,
        }),
        (Some(_), Some(_)) => Err(SpanError::InvalidRange {
            start: span.start,
            end: span.end,
        }),
        _ => Err(span.empty()),
    }
}
