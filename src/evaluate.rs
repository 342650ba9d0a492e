//! Character-level evaluation of predicted spans against gold spans.
//!
//! Every character of the raw text gets at most one label per side, then
//! each label is scored by counting characters where gold and prediction
//! agree.

use crate::resolve::Span;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

fn round4<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10_000.0).round() / 10_000.0)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Character counts for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CharCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl CharCounts {
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Intersection over union of the gold and predicted characters.
    pub fn iou(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives + self.false_negatives,
        )
    }

    /// No character carries this label on either side.
    pub fn is_empty(&self) -> bool {
        self.true_positives + self.false_positives + self.false_negatives == 0
    }

    pub fn scores(&self) -> Scores {
        Scores {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
            iou: self.iou(),
        }
    }

    fn add(&mut self, other: &CharCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

/// Scores serialize rounded to four decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scores {
    #[serde(serialize_with = "round4")]
    pub precision: f64,
    #[serde(serialize_with = "round4")]
    pub recall: f64,
    #[serde(serialize_with = "round4")]
    pub f1: f64,
    #[serde(serialize_with = "round4")]
    pub iou: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMetrics {
    #[serde(flatten)]
    pub counts: CharCounts,
    #[serde(flatten)]
    pub scores: Scores,
}

/// Which labels appear on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelCheck {
    pub gold_only: Vec<String>,
    pub predicted_only: Vec<String>,
    pub common: Vec<String>,
    /// Both sides use the same label set
    pub consistent: bool,
}

impl LabelCheck {
    fn new(gold: &BTreeSet<&str>, predicted: &BTreeSet<&str>) -> Self {
        let owned = |labels: Vec<&&str>| -> Vec<String> {
            labels.into_iter().map(|l| l.to_string()).collect()
        };
        Self {
            gold_only: owned(gold.difference(predicted).collect()),
            predicted_only: owned(predicted.difference(gold).collect()),
            common: owned(gold.intersection(predicted).collect()),
            consistent: gold == predicted,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overall {
    /// Scores over the summed counts of all labels
    pub micro: Scores,
    /// Mean of per-label scores, over labels with at least one character
    #[serde(rename = "macro")]
    pub macro_avg: Scores,
}

/// Result of comparing one prediction with its gold standard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub document_length: usize,
    pub gold_span_count: usize,
    pub predicted_span_count: usize,
    pub label_check: LabelCheck,
    pub overall: Overall,
    pub per_label: BTreeMap<String, LabelMetrics>,
}

/// Label of each character in `[0, len)`.
///
/// Spans are clamped half-open ranges. Where spans overlap the later one
/// wins. Spans with an empty label are ignored.
pub fn char_labels(spans: &[Span], len: usize) -> Vec<Option<&str>> {
    let mut labels = vec![None; len];
    for span in spans.iter().filter(|s| !s.label.is_empty()) {
        let range = span.clamp(len);
        if range.start < range.end {
            for slot in &mut labels[range] {
                *slot = Some(span.label.as_str());
            }
        }
    }
    labels
}

fn label_set(spans: &[Span]) -> BTreeSet<&str> {
    spans
        .iter()
        .map(|s| s.label.as_str())
        .filter(|l| !l.is_empty())
        .collect()
}

fn average(metrics: &[&CharCounts]) -> Scores {
    if metrics.is_empty() {
        return Scores::default();
    }
    let n = metrics.len() as f64;
    let mean = |score: fn(&CharCounts) -> f64| {
        metrics.iter().map(|m| score(*m)).sum::<f64>() / n
    };
    Scores {
        precision: mean(CharCounts::precision),
        recall: mean(CharCounts::recall),
        f1: mean(CharCounts::f1),
        iou: mean(CharCounts::iou),
    }
}

/// Score `predicted` against `gold` over a text of `len` characters.
pub fn evaluate(gold: &[Span], predicted: &[Span], len: usize) -> Evaluation {
    let gold_labels = label_set(gold);
    let predicted_labels = label_set(predicted);

    let mut counts: BTreeMap<&str, CharCounts> = gold_labels
        .union(&predicted_labels)
        .map(|label| (*label, CharCounts::default()))
        .collect();

    let gold_chars = char_labels(gold, len);
    let predicted_chars = char_labels(predicted, len);
    for (g, p) in gold_chars.iter().zip(&predicted_chars) {
        match (g, p) {
            (Some(g), Some(p)) if g == p => {
                if let Some(c) = counts.get_mut(g) {
                    c.true_positives += 1;
                }
            }
            _ => {
                if let Some(label) = g {
                    if let Some(c) = counts.get_mut(label) {
                        c.false_negatives += 1;
                    }
                }
                if let Some(label) = p {
                    if let Some(c) = counts.get_mut(label) {
                        c.false_positives += 1;
                    }
                }
            }
        }
    }

    let mut total = CharCounts::default();
    for c in counts.values() {
        total.add(c);
    }
    let non_empty: Vec<&CharCounts> = counts.values().filter(|c| !c.is_empty()).collect();
    let overall = Overall {
        micro: total.scores(),
        macro_avg: average(&non_empty),
    };

    let label_check = LabelCheck::new(&gold_labels, &predicted_labels);
    if !label_check.consistent {
        log::warn!(
            "label mismatch: gold only {:?}, predicted only {:?}",
            label_check.gold_only,
            label_check.predicted_only
        );
    }
    log::info!(
        "evaluated {} predicted against {} gold spans: micro F1 {:.4}, macro F1 {:.4}",
        predicted.len(),
        gold.len(),
        overall.micro.f1,
        overall.macro_avg.f1
    );

    Evaluation {
        document_length: len,
        gold_span_count: gold.len(),
        predicted_span_count: predicted.len(),
        label_check,
        overall,
        per_label: counts
            .into_iter()
            .map(|(label, counts)| {
                let metrics = LabelMetrics {
                    counts,
                    scores: counts.scores(),
                };
                (label.to_string(), metrics)
            })
            .collect(),
    }
}
