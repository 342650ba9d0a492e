//! Writing span markers into token metadata.
//!
//! Every resolved span becomes a pair of markers,
//! `<namespace>:<label>:<span-id>=start` on its first token and `=end` on its
//! last. Markers are appended after any existing MISC entries, in span order.

use crate::document::{TokenDocument, TokenPosition};
use crate::errors::{AlignError, AlignResult};
use crate::labels::sanitize_label;
use crate::resolve::ResolvedSpan;
use crate::span_id::SpanIdSource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which end of a span a marker denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boundary::Start => "start",
            Boundary::End => "end",
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Boundary {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Boundary::Start),
            "end" => Ok(Boundary::End),
            _ => Err(()),
        }
    }
}

/// One boundary of one span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker {
    pub label: String,
    pub span_id: String,
    pub boundary: Boundary,
}

impl Marker {
    /// The MISC key, `<namespace>:<label>:<span-id>`.
    pub fn key(&self, namespace: &str) -> String {
        format!("{}:{}:{}", namespace, self.label, self.span_id)
    }
}

/// Split a MISC key into `(label, span_id)` when it belongs to `namespace`.
pub fn parse_marker_key<'a>(namespace: &str, key: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = key.strip_prefix(namespace)?.strip_prefix(':')?;
    let (label, span_id) = rest.rsplit_once(':')?;
    if label.is_empty() || span_id.is_empty() {
        return None;
    }
    Some((label, span_id))
}

/// A resolved span together with the id it was written under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedSpan {
    pub span_id: String,
    pub span: ResolvedSpan,
}

impl AppliedSpan {
    pub fn start_marker(&self) -> Marker {
        Marker {
            label: self.span.label.clone(),
            span_id: self.span_id.clone(),
            boundary: Boundary::Start,
        }
    }

    pub fn end_marker(&self) -> Marker {
        Marker {
            label: self.span.label.clone(),
            span_id: self.span_id.clone(),
            boundary: Boundary::End,
        }
    }
}

/// Span ids already written into the document under `namespace`.
fn existing_span_ids(document: &TokenDocument, namespace: &str) -> HashSet<String> {
    document
        .tokens_enumerated()
        .flat_map(|(_, token)| token.misc.entries())
        .filter_map(|entry| parse_marker_key(namespace, &entry.key))
        .map(|(_, span_id)| span_id.to_string())
        .collect()
}

/// Draw ids until one is unused, falling back to a numbered suffix.
fn fresh_id(ids: &mut dyn SpanIdSource, used: &mut HashSet<String>) -> String {
    const MAX_ATTEMPTS: usize = 16;

    let mut candidate = String::new();
    for _ in 0..MAX_ATTEMPTS {
        candidate = ids.next_id();
        candidate = sanitize_label(&candidate).unwrap_or(candidate);
        if !candidate.is_empty() && used.insert(candidate.clone()) {
            return candidate;
        }
    }

    log::warn!("id source keeps repeating '{}', adding a suffix", candidate);
    let mut suffix = used.len();
    loop {
        let id = format!("{}-{}", candidate, suffix);
        if used.insert(id.clone()) {
            return id;
        }
        suffix += 1;
    }
}

fn check_position(document: &TokenDocument, position: TokenPosition) -> AlignResult<()> {
    document
        .token(position)
        .map(|_| ())
        .ok_or(AlignError::UnknownToken {
            sentence: position.sentence,
            token: position.token,
        })
}

/// Append markers for every span to `document`.
///
/// All positions are checked before anything is written, so on error the
/// document is left untouched. Labels with reserved characters are rewritten
/// with `_`.
pub fn merge(
    document: &mut TokenDocument,
    spans: &[ResolvedSpan],
    namespace: &str,
    ids: &mut dyn SpanIdSource,
) -> AlignResult<Vec<AppliedSpan>> {
    for span in spans {
        check_position(document, span.tokens.start)?;
        check_position(document, span.tokens.end)?;
    }

    let mut used = existing_span_ids(document, namespace);
    let mut applied = Vec::with_capacity(spans.len());

    for span in spans {
        let mut span = span.clone();
        if let Some(label) = sanitize_label(&span.label) {
            span.label = label;
        }
        let entry = AppliedSpan {
            span_id: fresh_id(ids, &mut used),
            span,
        };

        for (position, marker) in [
            (entry.span.tokens.start, entry.start_marker()),
            (entry.span.tokens.end, entry.end_marker()),
        ] {
            if let Some(token) = document.token_mut(position) {
                token.misc.append(marker.key(namespace), marker.boundary.as_str());
            }
        }

        applied.push(entry);
    }

    log::debug!("merged {} spans as {} markers", applied.len(), applied.len() * 2);
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Sentence, Token, TokenRange};
    use crate::span_id::SequentialIds;

    fn document() -> TokenDocument {
        let mut first = Token::new(1, "Test");
        first.misc.append("Translit", "test");
        TokenDocument::new(vec![Sentence {
            comments: Vec::new(),
            tokens: vec![first, Token::new(2, "věta"), Token::new(3, ".")],
            extras: Vec::new(),
        }])
    }

    fn span(label: &str, start: usize, end: usize) -> ResolvedSpan {
        ResolvedSpan {
            label: label.to_string(),
            tokens: TokenRange::new(TokenPosition::new(0, start), TokenPosition::new(0, end)),
            chars: 0..1,
        }
    }

    fn misc(doc: &TokenDocument, token: usize) -> String {
        doc.token(TokenPosition::new(0, token)).unwrap().misc.to_string()
    }

    #[test]
    fn test_markers_follow_existing_metadata() {
        let mut doc = document();
        let applied = merge(
            &mut doc,
            &[span("01_Situace", 0, 2)],
            "PonkApp3",
            &mut SequentialIds::default(),
        )
        .unwrap();

        assert_eq!(applied[0].span_id, "s1");
        assert_eq!(misc(&doc, 0), "Translit=test|PonkApp3:01_Situace:s1=start");
        assert_eq!(misc(&doc, 1), "_");
        assert_eq!(misc(&doc, 2), "PonkApp3:01_Situace:s1=end");
    }

    #[test]
    fn test_single_token_span_gets_both_markers() {
        let mut doc = document();
        merge(&mut doc, &[span("X", 1, 1)], "Ns", &mut SequentialIds::default()).unwrap();
        assert_eq!(misc(&doc, 1), "Ns:X:s1=start|Ns:X:s1=end");
    }

    #[test]
    fn test_overlapping_spans_stay_separate() {
        let mut doc = document();
        merge(
            &mut doc,
            &[span("A", 0, 2), span("A", 0, 0), span("B", 1, 2)],
            "Ns",
            &mut SequentialIds::default(),
        )
        .unwrap();
        assert_eq!(
            misc(&doc, 0),
            "Translit=test|Ns:A:s1=start|Ns:A:s2=start|Ns:A:s2=end"
        );
        assert_eq!(misc(&doc, 1), "Ns:B:s3=start");
        assert_eq!(misc(&doc, 2), "Ns:A:s1=end|Ns:B:s3=end");
    }

    #[test]
    fn test_existing_ids_are_not_reused() {
        let mut doc = document();
        merge(&mut doc, &[span("A", 0, 0)], "Ns", &mut SequentialIds::default()).unwrap();
        // A fresh source starts at s1 again; the merger must skip it
        let applied = merge(&mut doc, &[span("A", 2, 2)], "Ns", &mut SequentialIds::default())
            .unwrap();
        assert_eq!(applied[0].span_id, "s2");
    }

    #[test]
    fn test_repeating_source_gets_suffix() {
        struct Constant;
        impl SpanIdSource for Constant {
            fn next_id(&mut self) -> String {
                "same".to_string()
            }
        }

        let mut doc = document();
        let applied = merge(
            &mut doc,
            &[span("A", 0, 0), span("A", 1, 1)],
            "Ns",
            &mut Constant,
        )
        .unwrap();
        assert_eq!(applied[0].span_id, "same");
        assert_ne!(applied[1].span_id, "same");
        assert!(applied[1].span_id.starts_with("same-"));
    }

    #[test]
    fn test_bad_position_leaves_document_untouched() {
        let mut doc = document();
        let before = doc.clone();
        let err = merge(
            &mut doc,
            &[span("A", 0, 1), span("A", 0, 9)],
            "Ns",
            &mut SequentialIds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AlignError::UnknownToken { token: 9, .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_reserved_label_characters_are_rewritten() {
        let mut doc = document();
        let applied =
            merge(&mut doc, &[span("a|b", 0, 0)], "Ns", &mut SequentialIds::default()).unwrap();
        assert_eq!(applied[0].span.label, "a_b");
        assert_eq!(misc(&doc, 0), "Translit=test|Ns:a_b:s1=start|Ns:a_b:s1=end");
    }

    #[test]
    fn test_parse_marker_key() {
        assert_eq!(
            parse_marker_key("PonkApp3", "PonkApp3:01_Situace:ab12cd34"),
            Some(("01_Situace", "ab12cd34"))
        );
        assert_eq!(parse_marker_key("PonkApp3", "SpaceAfter"), None);
        assert_eq!(parse_marker_key("Ponk", "PonkApp3:A:b"), None);
        assert_eq!(parse_marker_key("Ns", "Ns:onlylabel"), None);
    }
}
