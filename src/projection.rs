//! Raw text projection.
//!
//! Each sentence is laid out by one of two [`SentenceStrategy`]
//! implementations:
//!
//! - [`JoinedTokens`] concatenates surface forms, inserting one space after
//!   every unit that does not carry `SpaceAfter=No`.
//! - [`AuthoritativeText`] uses the sentence's `# text` verbatim and locates
//!   each surface form inside it.
//!
//! The [`Projector`] picks the strategy per sentence and joins sentences with
//! a separator that belongs to no token.

use crate::config::AlignConfig;
use crate::document::{Sentence, SurfaceUnit, TokenDocument};
use crate::errors::{AlignError, AlignResult};
use crate::offsets::{OffsetTable, Owner};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How sentences choose their layout strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// `# text` when present, token concatenation otherwise
    #[default]
    Auto,
    /// Always concatenate tokens, ignoring `# text`
    Tokens,
}

/// One sentence laid out as text plus owner runs relative to its start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceLayout {
    pub text: String,
    /// `(character count, owner)` in text order, covering all of `text`
    pub runs: Vec<(usize, Owner)>,
}

impl SentenceLayout {
    fn push(&mut self, count: usize, owner: Owner) {
        if count > 0 {
            self.runs.push((count, owner));
        }
    }
}

/// A way of producing raw text and ownership for a single sentence.
pub trait SentenceStrategy {
    fn name(&self) -> &'static str;

    fn layout(&self, sentence: &Sentence, sentence_idx: usize) -> AlignResult<SentenceLayout>;
}

fn unit_owner(sentence_idx: usize, unit: &SurfaceUnit<'_>) -> Owner {
    Owner::Word {
        sentence: sentence_idx,
        first: unit.first,
        last: unit.last,
    }
}

fn unit_label(sentence: &Sentence, unit: &SurfaceUnit<'_>) -> String {
    let first = sentence.tokens[unit.first].id;
    let last = sentence.tokens[unit.last].id;
    if first == last {
        first.to_string()
    } else {
        format!("{}-{}", first, last)
    }
}

/// Concatenate surface forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinedTokens;

impl SentenceStrategy for JoinedTokens {
    fn name(&self) -> &'static str {
        "tokens"
    }

    fn layout(&self, sentence: &Sentence, sentence_idx: usize) -> AlignResult<SentenceLayout> {
        let units = sentence.surface_units();
        let mut layout = SentenceLayout::default();

        for (idx, unit) in units.iter().enumerate() {
            layout.text.push_str(unit.form);
            layout.push(unit.form.chars().count(), unit_owner(sentence_idx, unit));

            // No trailing space after the final unit
            if unit.space_after && idx + 1 < units.len() {
                layout.text.push(' ');
                layout.push(1, Owner::Gap);
            }
        }

        Ok(layout)
    }
}

/// Align surface forms against the sentence's `# text`.
#[derive(Debug, Clone, Copy)]
pub struct AuthoritativeText {
    /// How many whitespace characters may be skipped before a form must start
    pub max_lookahead: usize,
}

impl Default for AuthoritativeText {
    fn default() -> Self {
        Self {
            max_lookahead: AlignConfig::DEFAULT_MAX_LOOKAHEAD,
        }
    }
}

fn matches_at(text: &[char], at: usize, form: &[char], fold_case: bool) -> bool {
    text.len() >= at + form.len()
        && text[at..at + form.len()].iter().zip(form).all(|(a, b)| {
            a == b || (fold_case && a.to_lowercase().eq(b.to_lowercase()))
        })
}

/// First position in `window` where `form` matches exactly, else the first
/// case-insensitive match.
fn find_in(text: &[char], window: Range<usize>, form: &[char]) -> Option<usize> {
    let candidates: Vec<usize> = window
        .take_while(|at| at + form.len() <= text.len())
        .collect();
    candidates
        .iter()
        .copied()
        .find(|&at| matches_at(text, at, form, false))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&at| matches_at(text, at, form, true))
        })
}

impl AuthoritativeText {
    /// Positions a form may start at: the cursor and every position reached
    /// by skipping whitespace only, at most `max_lookahead` characters.
    fn window(&self, text: &[char], cursor: usize) -> Range<usize> {
        let furthest = cursor.saturating_add(self.max_lookahead).min(text.len());
        let mut last = cursor;
        while last < furthest && text[last].is_whitespace() {
            last += 1;
        }
        cursor..last + 1
    }

    fn locate(&self, text: &[char], cursor: usize, form: &[char]) -> Option<usize> {
        find_in(text, self.window(text, cursor), form)
    }
}

impl SentenceStrategy for AuthoritativeText {
    fn name(&self) -> &'static str {
        "text"
    }

    /// Fails with [`AlignError::Alignment`] when a form cannot be found past
    /// whitespace, and with [`AlignError::UnalignedText`] when non-whitespace
    /// text is left after the last unit.
    fn layout(&self, sentence: &Sentence, sentence_idx: usize) -> AlignResult<SentenceLayout> {
        let source = sentence.text().unwrap_or_default();
        let text: Vec<char> = source.chars().collect();
        let mut layout = SentenceLayout {
            text: source.to_string(),
            runs: Vec::new(),
        };
        let mut cursor = 0;

        for unit in sentence.surface_units() {
            let form: Vec<char> = unit.form.chars().collect();
            let at = self
                .locate(&text, cursor, &form)
                .ok_or_else(|| AlignError::Alignment {
                    sentence: sentence_idx,
                    token_id: unit_label(sentence, &unit),
                    form: unit.form.to_string(),
                    cursor,
                })?;

            layout.push(at - cursor, Owner::Gap);
            layout.push(form.len(), unit_owner(sentence_idx, &unit));
            cursor = at + form.len();
        }

        if let Some(offset) = text[cursor..].iter().position(|c| !c.is_whitespace()) {
            return Err(AlignError::UnalignedText {
                sentence: sentence_idx,
                text: text[cursor + offset..].iter().collect(),
                cursor: cursor + offset,
            });
        }

        layout.push(text.len() - cursor, Owner::Gap);
        Ok(layout)
    }
}

/// Raw text of a whole document with its offset table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub raw_text: String,
    pub offsets: OffsetTable,
}

impl Projection {
    /// Length of the raw text in characters.
    pub fn char_len(&self) -> usize {
        self.offsets.len()
    }

    /// The raw text between two character positions.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.raw_text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }
}

/// Document-level projection driver.
#[derive(Debug, Clone)]
pub struct Projector {
    pub mode: ProjectionMode,
    pub separator: String,
    joined: JoinedTokens,
    authoritative: AuthoritativeText,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(&AlignConfig::default())
    }
}

impl Projector {
    pub fn new(config: &AlignConfig) -> Self {
        Self {
            mode: config.projection,
            separator: config.sentence_separator.clone(),
            joined: JoinedTokens,
            authoritative: AuthoritativeText {
                max_lookahead: config.max_lookahead,
            },
        }
    }

    /// The strategy used for this sentence.
    pub fn strategy_for(&self, sentence: &Sentence) -> &dyn SentenceStrategy {
        match (self.mode, sentence.text()) {
            (ProjectionMode::Auto, Some(_)) => &self.authoritative,
            _ => &self.joined,
        }
    }

    pub fn project(&self, document: &TokenDocument) -> AlignResult<Projection> {
        let mut projection = Projection::default();
        let separator_len = self.separator.chars().count();

        for (sentence_idx, sentence) in document.sentences.iter().enumerate() {
            if sentence_idx > 0 {
                projection.raw_text.push_str(&self.separator);
                projection.offsets.push(separator_len, Owner::Gap);
            }

            let strategy = self.strategy_for(sentence);
            let layout = strategy.layout(sentence, sentence_idx)?;
            log::debug!(
                "sentence {} projected with '{}' strategy ({} chars)",
                sentence_idx,
                strategy.name(),
                layout.text.chars().count()
            );

            projection.raw_text.push_str(&layout.text);
            for (count, owner) in layout.runs {
                projection.offsets.push(count, owner);
            }
        }

        log::info!(
            "projected {} sentences into {} chars",
            document.sentence_count(),
            projection.char_len()
        );
        Ok(projection)
    }
}

/// Project with the default configuration.
pub fn project(document: &TokenDocument) -> AlignResult<Projection> {
    Projector::default().project(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Token;

    fn token(id: usize, form: &str, no_space: bool) -> Token {
        let mut token = Token::new(id, form);
        if no_space {
            token.misc.append("SpaceAfter", "No");
        }
        token
    }

    fn test_veta(with_text: bool) -> Sentence {
        Sentence {
            comments: if with_text {
                vec!["# text = Test věta.".to_string()]
            } else {
                Vec::new()
            },
            tokens: vec![
                token(1, "Test", false),
                token(2, "věta", true),
                token(3, ".", false),
            ],
            extras: Vec::new(),
        }
    }

    fn owners(layout: &SentenceLayout) -> Vec<(usize, Option<usize>)> {
        layout
            .runs
            .iter()
            .map(|(count, owner)| match owner {
                Owner::Gap => (*count, None),
                Owner::Word { first, .. } => (*count, Some(*first)),
            })
            .collect()
    }

    #[test]
    fn test_joined_layout() {
        let layout = JoinedTokens.layout(&test_veta(false), 0).unwrap();
        assert_eq!(layout.text, "Test věta.");
        assert_eq!(
            owners(&layout),
            vec![(4, Some(0)), (1, None), (4, Some(1)), (1, Some(2))]
        );
    }

    #[test]
    fn test_authoritative_layout_matches_joined() {
        let joined = JoinedTokens.layout(&test_veta(true), 0).unwrap();
        let authoritative = AuthoritativeText::default()
            .layout(&test_veta(true), 0)
            .unwrap();
        assert_eq!(joined, authoritative);
    }

    #[test]
    fn test_authoritative_keeps_extra_whitespace() {
        let mut sentence = test_veta(false);
        sentence.comments = vec!["# text = Test   věta. ".to_string()];
        let layout = AuthoritativeText::default().layout(&sentence, 0).unwrap();
        assert_eq!(layout.text, "Test   věta. ");
        assert_eq!(
            owners(&layout),
            vec![(4, Some(0)), (3, None), (4, Some(1)), (1, Some(2)), (1, None)]
        );
    }

    #[test]
    fn test_authoritative_case_fallback() {
        let mut sentence = test_veta(false);
        sentence.comments = vec!["# text = TEST VĚTA.".to_string()];
        let layout = AuthoritativeText::default().layout(&sentence, 0).unwrap();
        assert_eq!(layout.text, "TEST VĚTA.");
        assert_eq!(layout.runs.len(), 4);
    }

    #[test]
    fn test_authoritative_mismatch_fails() {
        let mut sentence = test_veta(false);
        sentence.comments = vec!["# text = Test slovo.".to_string()];
        let err = AuthoritativeText::default()
            .layout(&sentence, 7)
            .unwrap_err();
        match err {
            AlignError::Alignment {
                sentence,
                token_id,
                form,
                cursor,
            } => {
                assert_eq!(sentence, 7);
                assert_eq!(token_id, "2");
                assert_eq!(form, "věta");
                assert_eq!(cursor, 4);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lookahead_is_bounded() {
        let mut sentence = test_veta(false);
        sentence.comments = vec![format!("# text = Test{}věta.", " ".repeat(10))];
        let strategy = AuthoritativeText { max_lookahead: 4 };
        assert!(strategy.layout(&sentence, 0).is_err());
        let strategy = AuthoritativeText { max_lookahead: 16 };
        assert!(strategy.layout(&sentence, 0).is_ok());
    }

    #[test]
    fn test_skipped_word_is_an_error() {
        // "věta" has no token, so "." cannot be reached over whitespace
        let sentence = Sentence {
            comments: vec!["# text = Test věta.".to_string()],
            tokens: vec![token(1, "Test", false), token(2, ".", false)],
            extras: Vec::new(),
        };
        let err = AuthoritativeText::default()
            .layout(&sentence, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            AlignError::Alignment { ref form, cursor: 4, .. } if form == "."
        ));
    }

    #[test]
    fn test_form_inside_another_word_is_an_error() {
        let sentence = Sentence {
            comments: vec!["# text = bar".to_string()],
            tokens: vec![token(1, "a", false)],
            extras: Vec::new(),
        };
        assert!(matches!(
            AuthoritativeText::default().layout(&sentence, 0),
            Err(AlignError::Alignment { cursor: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_text_is_an_error() {
        let mut sentence = test_veta(false);
        sentence.comments = vec!["# text = Test věta. Konec".to_string()];
        let err = AuthoritativeText::default()
            .layout(&sentence, 2)
            .unwrap_err();
        match err {
            AlignError::UnalignedText {
                sentence,
                text,
                cursor,
            } => {
                assert_eq!(sentence, 2);
                assert_eq!(text, "Konec");
                assert_eq!(cursor, 11);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_exact_match_preferred_over_case_fallback() {
        let text: Vec<char> = "A a".chars().collect();
        let form: Vec<char> = "a".chars().collect();
        assert_eq!(find_in(&text, 0..3, &form), Some(2));

        let upper: Vec<char> = "b".chars().collect();
        let text: Vec<char> = "B b".chars().collect();
        assert_eq!(find_in(&text, 0..1, &upper), Some(0));
    }

    #[test]
    fn test_window_stops_at_first_non_whitespace() {
        let text: Vec<char> = "  ab".chars().collect();
        assert_eq!(AuthoritativeText::default().window(&text, 0), 0..3);
        assert_eq!(AuthoritativeText { max_lookahead: 1 }.window(&text, 0), 0..2);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let doc = TokenDocument::new(vec![test_veta(true), test_veta(false)]);
        let first = project(&doc).unwrap();
        let second = project(&doc).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_document_separator_is_a_gap() {
        let doc = TokenDocument::new(vec![test_veta(true), test_veta(false)]);
        let projection = project(&doc).unwrap();
        assert_eq!(projection.raw_text, "Test věta.\nTest věta.");
        assert_eq!(projection.char_len(), 21);
        let separator = projection.offsets.entry_at(10).unwrap();
        assert!(separator.owner.is_gap());
        assert_eq!(separator.range(), 10..11);
        assert_eq!(projection.slice(11, 15), "Test");
    }

    #[test]
    fn test_tokens_mode_ignores_text() {
        let mut sentence = test_veta(false);
        sentence.comments = vec!["# text = Test   věta.".to_string()];
        let config = AlignConfig {
            projection: ProjectionMode::Tokens,
            sentence_separator: " ".to_string(),
            ..AlignConfig::default()
        };
        let doc = TokenDocument::new(vec![sentence.clone(), sentence]);
        let projection = Projector::new(&config).project(&doc).unwrap();
        assert_eq!(projection.raw_text, "Test věta. Test věta.");
    }
}
