//! Label vocabulary.
//!
//! The vocabulary is only used to flag unknown labels; the aligner never
//! interprets label meaning.

use serde::{Deserialize, Serialize};

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Identifier as it appears in oracle output and in markers
    pub id: String,
    /// Human-readable name used in reports
    #[serde(default)]
    pub name: Option<String>,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// An ordered set of labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// The nine speech-act categories of the legal-advice deployment.
    pub fn speech_acts() -> Self {
        Self::new(vec![
            Label::new("01_Situace", "Situation"),
            Label::new("02_Kontext", "Context"),
            Label::new("03_Postup", "Procedure"),
            Label::new("04_Proces", "Process"),
            Label::new("05_Podmínky", "Conditions"),
            Label::new("06_Doporučení", "Recommendations"),
            Label::new("07_Odkazy", "Links"),
            Label::new("08_Prameny", "References"),
            Label::new("09_Nezařaditelné", "Not classified"),
        ])
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.labels.iter().any(|l| l.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    /// Display name, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id)
            .and_then(|l| l.name.as_deref())
            .unwrap_or(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.id.as_str())
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '|' | '=' | ':') || c.is_whitespace()
}

/// Rewrite characters that would break the `ns:label:id=value` syntax.
///
/// Returns `None` when the label is already safe.
pub fn sanitize_label(label: &str) -> Option<String> {
    if label.chars().any(is_reserved) {
        Some(
            label
                .chars()
                .map(|c| if is_reserved(c) { '_' } else { c })
                .collect(),
        )
    } else {
        None
    }
}
