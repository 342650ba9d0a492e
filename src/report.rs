//! Human-readable summary of an annotated document.

use crate::document::{Sentence, TokenDocument};
use crate::labels::LabelSet;
use crate::projection::{JoinedTokens, SentenceStrategy};
use crate::readback::{find_markers, recover_spans};
use std::collections::BTreeMap;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

fn rule(out: &mut String, title: &str) {
    let line = "=".repeat(RULE_WIDTH);
    writeln!(out, "{}\n{}\n{}\n", line, title, line).unwrap();
}

fn sentence_text(sentence: &Sentence, idx: usize) -> String {
    match sentence.text() {
        Some(text) => text.to_string(),
        None => JoinedTokens
            .layout(sentence, idx)
            .map(|layout| layout.text)
            .unwrap_or_default(),
    }
}

/// Render sentences with their markers, then per-label span counts.
pub fn format_report(document: &TokenDocument, namespace: &str, labels: &LabelSet) -> String {
    let mut out = String::new();
    rule(&mut out, "Annotation Results");

    let markers = find_markers(document, namespace);

    for (s_idx, sentence) in document.sentences.iter().enumerate() {
        writeln!(out, "Sentence {}:", s_idx + 1).unwrap();
        writeln!(out, "  {}\n", sentence_text(sentence, s_idx)).unwrap();

        // span id -> (label, "form (boundary)" entries), in order of appearance
        let mut spans: Vec<(&str, &str, Vec<String>)> = Vec::new();
        for marker in markers.iter().filter(|m| m.position.sentence == s_idx) {
            let form = &sentence.tokens[marker.position.token].form;
            let entry = format!("{} ({})", form, marker.boundary);
            match spans.iter_mut().find(|(id, _, _)| *id == marker.span_id) {
                Some((_, _, entries)) => entries.push(entry),
                None => spans.push((marker.span_id.as_str(), marker.label.as_str(), vec![entry])),
            }
        }

        if !spans.is_empty() {
            writeln!(out, "  Annotations:").unwrap();
            for (_, label, entries) in &spans {
                writeln!(
                    out,
                    "    [{}] {}",
                    labels.display_name(label),
                    entries.join(", ")
                ).unwrap();
            }
            writeln!(out).unwrap();
        }
    }

    rule(&mut out, "Summary");

    let recovered = recover_spans(document, namespace);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for span in &recovered {
        *counts.entry(span.label.as_str()).or_default() += 1;
    }

    for (label, count) in &counts {
        writeln!(
            out,
            "  {} ({}): {} span(s)",
            labels.display_name(label),
            label,
            count
        ).unwrap();
    }

    let unpaired = recovered.iter().filter(|s| s.range().is_none()).count();
    if unpaired > 0 {
        writeln!(
            out,
            "\n  {} span(s) without exactly one start and one end",
            unpaired
        ).unwrap();
    }

    out
}
