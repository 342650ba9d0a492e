//! Per-batch diagnostics.
//!
//! Span-level problems never abort a batch. They are collected here and
//! returned next to the annotated document.

use crate::errors::SpanError;
use crate::resolve::Span;
use serde::Serialize;
use std::fmt;

/// A span that was not annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedSpan {
    /// Position in the oracle's output
    pub index: usize,
    pub span: Span,
    pub reason: SpanError,
}

/// A span that was annotated but deserves attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanWarning {
    /// The label is not in the configured vocabulary; it was kept verbatim.
    UnknownLabel { index: usize, label: String },
    /// The label contained reserved characters and was written differently.
    RewrittenLabel {
        index: usize,
        label: String,
        written: String,
    },
}

impl fmt::Display for SpanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanWarning::UnknownLabel { index, label } => {
                write!(f, "span {}: unknown label '{}'", index, label)
            }
            SpanWarning::RewrittenLabel {
                index,
                label,
                written,
            } => write!(f, "span {}: label '{}' written as '{}'", index, label, written),
        }
    }
}

/// Counts and reasons for one batch of spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Spans received from the oracle
    pub received: usize,
    /// Spans written as marker pairs
    pub resolved: usize,
    pub dropped: Vec<DroppedSpan>,
    pub warnings: Vec<SpanWarning>,
}

impl Diagnostics {
    pub fn new(received: usize) -> Self {
        Self {
            received,
            ..Default::default()
        }
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// No drops and no warnings.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.warnings.is_empty()
    }

    pub fn record_resolved(&mut self) {
        self.resolved += 1;
    }

    pub fn record_dropped(&mut self, index: usize, span: &Span, reason: SpanError) {
        log::debug!("dropping span {}: {}", index, reason);
        self.dropped.push(DroppedSpan {
            index,
            span: span.clone(),
            reason,
        });
    }

    pub fn add_warning(&mut self, warning: SpanWarning) {
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received: {}, resolved: {}, dropped: {}",
            self.received,
            self.resolved,
            self.dropped_count()
        )?;
        for dropped in &self.dropped {
            write!(f, "\n  dropped span {}: {}", dropped.index, dropped.reason)?;
        }
        for warning in &self.warnings {
            write!(f, "\n  {}", warning)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_display() {
        let mut diagnostics = Diagnostics::new(3);
        diagnostics.record_resolved();
        diagnostics.record_dropped(
            1,
            &Span::new(20, 30, "A"),
            SpanError::EmptySpan { start: 20, end: 30 },
        );
        diagnostics.add_warning(SpanWarning::UnknownLabel {
            index: 2,
            label: "Z".to_string(),
        });

        assert_eq!(diagnostics.dropped_count(), 1);
        assert!(!diagnostics.is_clean());
        insta::assert_snapshot!(diagnostics.to_string(), @r###"
        received: 3, resolved: 1, dropped: 1
          dropped span 1: span [20, 30) covers no token
          span 2: unknown label 'Z'
        "###);
    }

    #[test]
    fn test_serializes_reasons() {
        let mut diagnostics = Diagnostics::new(1);
        diagnostics.record_dropped(
            0,
            &Span::new(5, 2, "A"),
            SpanError::EmptySpan { start: 5, end: 2 },
        );
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["dropped"][0]["reason"]["kind"], "empty_span");
        assert_eq!(json["dropped"][0]["span"]["label"], "A");
    }
}
