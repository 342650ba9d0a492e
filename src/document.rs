//! The in-memory CoNLL-U model.
//!
//! A [`TokenDocument`] owns sentences, a [`Sentence`] owns its comment lines,
//! word tokens and the multiword/empty-node lines interleaved with them.
//! Only word tokens are addressable by [`TokenPosition`]; the other lines are
//! carried through untouched.

use crate::misc::Misc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static COMMENT_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*([A-Za-z_][\w.\-]*)\s*=\s?(.*)$").unwrap());

/// Number of columns between FORM and MISC (LEMMA .. DEPS).
pub const PASS_THROUGH_COLUMNS: usize = 7;

/// LEMMA, UPOS, XPOS, FEATS, HEAD, DEPREL, DEPS; never interpreted.
pub type Columns = [String; PASS_THROUGH_COLUMNS];

/// Position of a word token within a document.
///
/// Ordering follows document order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenPosition {
    /// Sentence index (0-based)
    pub sentence: usize,
    /// Token index within that sentence (0-based, not the CoNLL-U id)
    pub token: usize,
}

impl TokenPosition {
    pub fn new(sentence: usize, token: usize) -> Self {
        Self { sentence, token }
    }
}

/// A closed range of word tokens that can cross sentence boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRange {
    pub start: TokenPosition,
    pub end: TokenPosition,
}

impl TokenRange {
    pub fn new(start: TokenPosition, end: TokenPosition) -> Self {
        Self { start, end }
    }

    pub fn single_token(position: TokenPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_single_token(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_sentence(&self) -> bool {
        self.start.sentence == self.end.sentence
    }

    /// Returns the number of sentences this range touches.
    pub fn sentence_count(&self) -> usize {
        self.end.sentence - self.start.sentence + 1
    }
}

/// A syntactic word line (integer id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// CoNLL-U id, 1-based within the sentence
    pub id: usize,
    pub form: String,
    pub columns: Columns,
    pub misc: Misc,
}

impl Token {
    /// Create a token with all pass-through columns set to `_`.
    pub fn new(id: usize, form: impl Into<String>) -> Self {
        Self {
            id,
            form: form.into(),
            columns: std::array::from_fn(|_| "_".to_string()),
            misc: Misc::default(),
        }
    }

    pub fn space_after(&self) -> bool {
        self.misc.space_after()
    }

    pub fn no_space_after(&self) -> bool {
        !self.space_after()
    }
}

/// A multiword token line such as `3-4	abych	...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiwordToken {
    pub first_id: usize,
    pub last_id: usize,
    pub form: String,
    pub space_after: bool,
    /// The source line, rendered verbatim
    pub line: String,
}

/// A line that is not a word token but must survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraLine {
    Multiword(MultiwordToken),
    /// Enhanced-graph empty node (`5.1`), kept verbatim
    EmptyNode(String),
}

/// An extra line together with the word token index it precedes.
///
/// `before == tokens.len()` places the line after the last token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interleaved {
    pub before: usize,
    pub line: ExtraLine,
}

/// A unit of surface text: one word, or one multiword token and its words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceUnit<'a> {
    /// First covered token index
    pub first: usize,
    /// Last covered token index (equal to `first` for plain words)
    pub last: usize,
    pub form: &'a str,
    pub space_after: bool,
}

/// A sentence block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Comment lines in source order, including the leading `#`
    pub comments: Vec<String>,
    pub tokens: Vec<Token>,
    pub extras: Vec<Interleaved>,
}

impl Sentence {
    /// Value of a `# key = value` comment.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|line| {
            let caps = COMMENT_ATTRIBUTE.captures(line)?;
            if caps.get(1)?.as_str() == key {
                caps.get(2).map(|m| m.as_str())
            } else {
                None
            }
        })
    }

    /// The authoritative surface text from `# text = ...`.
    pub fn text(&self) -> Option<&str> {
        self.attribute("text")
    }

    pub fn sent_id(&self) -> Option<&str> {
        self.attribute("sent_id")
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Multiword tokens whose covered words start at this token index.
    fn multiword_at(&self, token_idx: usize) -> Option<&MultiwordToken> {
        self.extras.iter().find_map(|extra| match &extra.line {
            ExtraLine::Multiword(mwt)
                if extra.before == token_idx
                    && self.tokens.get(token_idx).map(|t| t.id) == Some(mwt.first_id) =>
            {
                Some(mwt)
            }
            _ => None,
        })
    }

    /// Surface units in order. Every token belongs to exactly one unit.
    pub fn surface_units(&self) -> Vec<SurfaceUnit<'_>> {
        let mut units = Vec::with_capacity(self.tokens.len());
        let mut idx = 0;

        while idx < self.tokens.len() {
            if let Some(mwt) = self.multiword_at(idx) {
                let mut last = idx;
                while last + 1 < self.tokens.len() && self.tokens[last + 1].id <= mwt.last_id {
                    last += 1;
                }
                units.push(SurfaceUnit {
                    first: idx,
                    last,
                    form: &mwt.form,
                    space_after: mwt.space_after,
                });
                idx = last + 1;
            } else {
                let token = &self.tokens[idx];
                units.push(SurfaceUnit {
                    first: idx,
                    last: idx,
                    form: &token.form,
                    space_after: token.space_after(),
                });
                idx += 1;
            }
        }

        units
    }
}

/// A parsed CoNLL-U document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDocument {
    pub sentences: Vec<Sentence>,
}

impl TokenDocument {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Total number of word tokens.
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }

    pub fn token(&self, position: TokenPosition) -> Option<&Token> {
        self.sentences
            .get(position.sentence)
            .and_then(|s| s.tokens.get(position.token))
    }

    pub fn token_mut(&mut self, position: TokenPosition) -> Option<&mut Token> {
        self.sentences
            .get_mut(position.sentence)
            .and_then(|s| s.tokens.get_mut(position.token))
    }

    /// Iterate over all word tokens in document order.
    pub fn tokens_enumerated(&self) -> impl Iterator<Item = (TokenPosition, &Token)> {
        self.sentences.iter().enumerate().flat_map(|(s_idx, sentence)| {
            sentence
                .tokens
                .iter()
                .enumerate()
                .map(move |(t_idx, token)| (TokenPosition::new(s_idx, t_idx), token))
        })
    }
}
