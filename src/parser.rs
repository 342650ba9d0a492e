//! Parser for CoNLL-U text.

use crate::document::{
    Columns, ExtraLine, Interleaved, MultiwordToken, Sentence, Token, TokenDocument,
};
use crate::errors::{AlignError, AlignResult};
use crate::misc::Misc;

const COLUMN_COUNT: usize = 10;

/// Identifier column of a token line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineId {
    Word(usize),
    Range(usize, usize),
    Empty(usize, usize),
}

/// Plain decimal digits without leading zeros, so ids render back unchanged.
fn parse_number(text: &str, line: usize) -> AlignResult<usize> {
    let invalid = || AlignError::format(line, format!("invalid token id '{}'", text));
    if text.is_empty()
        || !text.bytes().all(|b| b.is_ascii_digit())
        || (text.len() > 1 && text.starts_with('0'))
    {
        return Err(invalid());
    }
    text.parse::<usize>().map_err(|_| invalid())
}

fn parse_id(text: &str, line: usize) -> AlignResult<LineId> {
    if let Some((first, last)) = text.split_once('-') {
        let first = parse_number(first, line)?;
        let last = parse_number(last, line)?;
        if first == 0 || last <= first {
            return Err(AlignError::format(
                line,
                format!("invalid multiword range '{}'", text),
            ));
        }
        Ok(LineId::Range(first, last))
    } else if let Some((word, sub)) = text.split_once('.') {
        Ok(LineId::Empty(parse_number(word, line)?, parse_number(sub, line)?))
    } else {
        let id = parse_number(text, line)?;
        if id == 0 {
            return Err(AlignError::format(line, "token ids start at 1"));
        }
        Ok(LineId::Word(id))
    }
}

/// Accumulates one sentence block.
#[derive(Default)]
struct SentenceBuilder {
    /// Line number where the block started
    start_line: usize,
    sentence: Sentence,
    /// Multiword range waiting for its first word: (first id, source line)
    open_range: Option<(usize, usize)>,
}

impl SentenceBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            ..Default::default()
        }
    }

    fn last_word_id(&self) -> usize {
        self.sentence.tokens.last().map_or(0, |t| t.id)
    }

    fn push_comment(&mut self, text: &str, line: usize) -> AlignResult<()> {
        if !self.sentence.tokens.is_empty() || !self.sentence.extras.is_empty() {
            return Err(AlignError::format(line, "comment line after token lines"));
        }
        self.sentence.comments.push(text.to_string());
        Ok(())
    }

    fn push_token_line(&mut self, text: &str, line: usize) -> AlignResult<()> {
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() != COLUMN_COUNT {
            return Err(AlignError::format(
                line,
                format!(
                    "expected {} tab-separated columns, found {}",
                    COLUMN_COUNT,
                    fields.len()
                ),
            ));
        }

        let misc = Misc::parse(fields[9]).map_err(|message| AlignError::format(line, message))?;

        match parse_id(fields[0], line)? {
            LineId::Range(first, last) => {
                if first <= self.last_word_id() {
                    return Err(AlignError::format(
                        line,
                        format!("multiword range '{}' does not follow its words", fields[0]),
                    ));
                }
                self.open_range = Some((first, line));
                self.sentence.extras.push(Interleaved {
                    before: self.sentence.tokens.len(),
                    line: ExtraLine::Multiword(MultiwordToken {
                        first_id: first,
                        last_id: last,
                        form: fields[1].to_string(),
                        space_after: misc.space_after(),
                        line: text.to_string(),
                    }),
                });
            }
            LineId::Empty(..) => {
                self.sentence.extras.push(Interleaved {
                    before: self.sentence.tokens.len(),
                    line: ExtraLine::EmptyNode(text.to_string()),
                });
            }
            LineId::Word(id) => {
                if id <= self.last_word_id() {
                    return Err(AlignError::format(
                        line,
                        format!(
                            "token id {} does not follow id {}",
                            id,
                            self.last_word_id()
                        ),
                    ));
                }
                if let Some((first, range_line)) = self.open_range.take() {
                    if first != id {
                        return Err(AlignError::format(
                            range_line,
                            format!("multiword range starts at {} but next word is {}", first, id),
                        ));
                    }
                }
                if fields[1].is_empty() {
                    return Err(AlignError::format(line, "empty word form"));
                }

                let mut columns: Columns = Default::default();
                for (slot, value) in columns.iter_mut().zip(&fields[2..9]) {
                    *slot = value.to_string();
                }

                self.sentence.tokens.push(Token {
                    id,
                    form: fields[1].to_string(),
                    columns,
                    misc,
                });
            }
        }

        Ok(())
    }

    fn finish(self) -> AlignResult<Sentence> {
        if self.sentence.tokens.is_empty() {
            return Err(AlignError::format(self.start_line, "sentence has no tokens"));
        }
        if let Some((_, range_line)) = self.open_range {
            return Err(AlignError::format(range_line, "multiword range has no words"));
        }

        let ids: Vec<usize> = self.sentence.tokens.iter().map(|t| t.id).collect();
        for extra in &self.sentence.extras {
            if let ExtraLine::Multiword(mwt) = &extra.line {
                if !ids.contains(&mwt.last_id) {
                    return Err(AlignError::format(
                        self.start_line,
                        format!(
                            "multiword range {}-{} ends at a missing word",
                            mwt.first_id, mwt.last_id
                        ),
                    ));
                }
            }
        }

        Ok(self.sentence)
    }
}

/// Parse CoNLL-U text into a [`TokenDocument`].
///
/// Blank lines separate sentence blocks. Comment lines must precede the
/// token lines of their block. Multiword ranges and empty nodes are kept
/// in place for rendering.
pub fn parse_document(input: &str) -> AlignResult<TokenDocument> {
    let mut sentences = Vec::new();
    let mut current: Option<SentenceBuilder> = None;

    for (idx, text) in input.lines().enumerate() {
        let line = idx + 1;

        if text.trim().is_empty() {
            if let Some(builder) = current.take() {
                sentences.push(builder.finish()?);
            }
            continue;
        }

        let builder = current.get_or_insert_with(|| SentenceBuilder::new(line));
        if text.starts_with('#') {
            builder.push_comment(text, line)?;
        } else {
            builder.push_token_line(text, line)?;
        }
    }

    if let Some(builder) = current.take() {
        sentences.push(builder.finish()?);
    }

    let document = TokenDocument::new(sentences);
    log::debug!(
        "parsed {} sentences with {} tokens",
        document.sentence_count(),
        document.token_count()
    );
    Ok(document)
}
