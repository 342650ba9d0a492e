//! Reading markers back out of an annotated document.

use crate::document::{TokenDocument, TokenPosition, TokenRange};
use crate::merge::{parse_marker_key, Boundary};
use serde::Serialize;

/// A marker found in a token's MISC column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundMarker {
    pub position: TokenPosition,
    pub label: String,
    pub span_id: String,
    pub boundary: Boundary,
}

/// All markers of one span id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveredSpan {
    pub span_id: String,
    pub label: String,
    pub starts: Vec<TokenPosition>,
    pub ends: Vec<TokenPosition>,
}

impl RecoveredSpan {
    /// The token range when the span has exactly one start and one end in
    /// document order.
    pub fn range(&self) -> Option<TokenRange> {
        match (self.starts.as_slice(), self.ends.as_slice()) {
            ([start], [end]) if start <= end => Some(TokenRange::new(*start, *end)),
            _ => None,
        }
    }
}

/// Markers under `namespace`, in document order.
pub fn find_markers(document: &TokenDocument, namespace: &str) -> Vec<FoundMarker> {
    let mut markers = Vec::new();
    for (position, token) in document.tokens_enumerated() {
        for entry in token.misc.entries() {
            let (label, span_id) = match parse_marker_key(namespace, &entry.key) {
                Some(parts) => parts,
                None => continue,
            };
            let boundary = match entry.value.parse::<Boundary>() {
                Ok(boundary) => boundary,
                Err(()) => continue,
            };
            markers.push(FoundMarker {
                position,
                label: label.to_string(),
                span_id: span_id.to_string(),
                boundary,
            });
        }
    }
    markers
}

/// Group markers by span id, ordered by first appearance.
pub fn recover_spans(document: &TokenDocument, namespace: &str) -> Vec<RecoveredSpan> {
    let mut spans: Vec<RecoveredSpan> = Vec::new();

    for marker in find_markers(document, namespace) {
        let idx = match spans.iter().position(|s| s.span_id == marker.span_id) {
            Some(idx) => idx,
            None => {
                spans.push(RecoveredSpan {
                    span_id: marker.span_id.clone(),
                    label: marker.label.clone(),
                    starts: Vec::new(),
                    ends: Vec::new(),
                });
                spans.len() - 1
            }
        };

        match marker.boundary {
            Boundary::Start => spans[idx].starts.push(marker.position),
            Boundary::End => spans[idx].ends.push(marker.position),
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    const ANNOTATED: &str = "1\tTest\t_\t_\t_\t_\t_\t_\t_\tNs:A:x1=start|Ns:B:x2=start|Ns:B:x2=end
2\tvěta\t_\t_\t_\t_\t_\t_\t_\tSpaceAfter=No|Other:A:zz=start
3\t.\t_\t_\t_\t_\t_\t_\t_\tNs:A:x1=end|Ns:C:x3=middle
";

    #[test]
    fn test_find_markers_skips_foreign_entries() {
        let doc = parse_document(ANNOTATED).unwrap();
        let markers = find_markers(&doc, "Ns");
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[3].position, TokenPosition::new(0, 2));
        assert_eq!(markers[3].boundary, Boundary::End);
    }

    #[test]
    fn test_recover_spans() {
        let doc = parse_document(ANNOTATED).unwrap();
        let spans = recover_spans(&doc, "Ns");
        assert_eq!(spans.len(), 2);

        assert_eq!(spans[0].span_id, "x1");
        assert_eq!(
            spans[0].range(),
            Some(TokenRange::new(
                TokenPosition::new(0, 0),
                TokenPosition::new(0, 2)
            ))
        );
        assert_eq!(spans[1].label, "B");
        assert!(spans[1].range().unwrap().is_single_token());
    }

    #[test]
    fn test_unpaired_span_has_no_range() {
        let doc = parse_document("1\ta\t_\t_\t_\t_\t_\t_\t_\tNs:A:q=end\n").unwrap();
        let spans = recover_spans(&doc, "Ns");
        assert_eq!(spans[0].range(), None);
    }
}
