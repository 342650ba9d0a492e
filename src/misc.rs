//! The MISC column: an ordered list of `key=value` entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Written in place of an empty MISC column.
pub const PLACEHOLDER: &str = "_";

/// Separates entries within the MISC column.
pub const ENTRY_SEPARATOR: char = '|';

const SPACE_AFTER_KEY: &str = "SpaceAfter";

/// A single `key=value` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscEntry {
    pub key: String,
    pub value: String,
}

/// Ordered token metadata.
///
/// Entries keep their source order and new entries are always appended.
/// Keys may repeat: a span that starts and ends on the same token writes two
/// entries under one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misc {
    entries: Vec<MiscEntry>,
}

impl Misc {
    /// Parse a MISC column. Returns a message describing the first bad entry.
    pub fn parse(field: &str) -> Result<Self, String> {
        if field == PLACEHOLDER {
            return Ok(Self::default());
        }

        let mut entries = Vec::new();
        for raw in field.split(ENTRY_SEPARATOR) {
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| format!("metadata entry '{}' is not key=value", raw))?;
            if key.is_empty() {
                return Err(format!("metadata entry '{}' has an empty key", raw));
            }
            entries.push(MiscEntry {
                key: key.to_string(),
                value: value.to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[MiscEntry] {
        &self.entries
    }

    /// Value of the first entry with this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Append an entry after all existing ones.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(MiscEntry {
            key: key.into(),
            value: value.into(),
        });
    }

    /// False only when `SpaceAfter=No` is present.
    pub fn space_after(&self) -> bool {
        self.get(SPACE_AFTER_KEY) != Some("No")
    }
}

impl fmt::Display for Misc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str(PLACEHOLDER);
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                write!(f, "{}", ENTRY_SEPARATOR)?;
            }
            write!(f, "{}={}", entry.key, entry.value)?;
        }
        Ok(())
    }
}
