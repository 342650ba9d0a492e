//! Decoding oracle span output.

use crate::errors::{AlignError, AlignResult};
use crate::resolve::Span;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Accepted JSON shapes: a bare array, or an object whose `annotations`
/// holds one of these shapes (the oracle response envelope nests it).
#[derive(Deserialize)]
#[serde(untagged)]
enum SpanPayload {
    List(Vec<Span>),
    Envelope { annotations: Box<SpanPayload> },
}

impl SpanPayload {
    fn into_spans(self) -> Vec<Span> {
        match self {
            SpanPayload::List(spans) => spans,
            SpanPayload::Envelope { annotations } => annotations.into_spans(),
        }
    }
}

/// Parse spans from JSON.
pub fn parse_spans_json(input: &str) -> AlignResult<Vec<Span>> {
    let payload: SpanPayload = serde_json::from_str(input).map_err(|e| AlignError::Spans {
        message: e.to_string(),
    })?;
    Ok(payload.into_spans())
}

/// Read and parse a JSON span file.
pub fn load_spans(path: &Path) -> AlignResult<Vec<Span>> {
    let content = fs::read_to_string(path).map_err(|e| AlignError::Spans {
        message: format!("{}: {}", path.display(), e),
    })?;
    parse_spans_json(&content)
}
