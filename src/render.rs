//! CoNLL-U serialization.
//!
//! Rendering is the inverse of [`parse_document`](crate::parse_document):
//! comments, multiword ranges and empty nodes come back exactly as read, and
//! every sentence block ends with one blank line.

use crate::document::{ExtraLine, Interleaved, Sentence, Token, TokenDocument};
use std::fmt::{self, Write};

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.id, self.form)?;
        for column in self.columns.iter() {
            write!(f, "\t{}", column)?;
        }
        write!(f, "\t{}", self.misc)
    }
}

impl fmt::Display for ExtraLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraLine::Multiword(mwt) => f.write_str(&mwt.line),
            ExtraLine::EmptyNode(line) => f.write_str(line),
        }
    }
}

fn write_extras_before(
    f: &mut fmt::Formatter<'_>,
    extras: &[Interleaved],
    token_idx: usize,
) -> fmt::Result {
    for extra in extras.iter().filter(|e| e.before == token_idx) {
        writeln!(f, "{}", extra.line)?;
    }
    Ok(())
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.comments {
            writeln!(f, "{}", comment)?;
        }
        for (idx, token) in self.tokens.iter().enumerate() {
            write_extras_before(f, &self.extras, idx)?;
            writeln!(f, "{}", token)?;
        }
        write_extras_before(f, &self.extras, self.tokens.len())
    }
}

impl fmt::Display for TokenDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sentence in &self.sentences {
            write!(f, "{}", sentence)?;
            f.write_char('\n')?;
        }
        Ok(())
    }
}

/// Render a document as CoNLL-U text.
pub fn render_document(document: &TokenDocument) -> String {
    document.to_string()
}
