//! The character offset table produced by projection.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Who owns a run of raw-text characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Owner {
    /// Separator characters that belong to no token
    Gap,
    /// A surface unit covering word tokens `first..=last` of one sentence
    Word {
        sentence: usize,
        first: usize,
        last: usize,
    },
}

impl Owner {
    pub fn is_gap(&self) -> bool {
        matches!(self, Owner::Gap)
    }
}

/// A `[start, end)` run of characters in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetEntry {
    pub start: usize,
    pub end: usize,
    pub owner: Owner,
}

impl OffsetEntry {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Ordered, gap-free, non-overlapping cover of `[0, len)`.
///
/// All positions are character (Unicode scalar) indices. Only built by
/// projection, so it serializes but never deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OffsetTable {
    entries: Vec<OffsetEntry>,
    len: usize,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of characters covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    /// Append `count` characters owned by `owner`. Adjacent gaps coalesce.
    pub(crate) fn push(&mut self, count: usize, owner: Owner) {
        if count == 0 {
            return;
        }
        let start = self.len;
        self.len += count;

        if owner.is_gap() {
            if let Some(last) = self.entries.last_mut() {
                if last.owner.is_gap() {
                    last.end = self.len;
                    return;
                }
            }
        }

        self.entries.push(OffsetEntry {
            start,
            end: self.len,
            owner,
        });
    }

    /// Index of the entry containing `pos`, or `None` when out of range.
    pub fn index_at(&self, pos: usize) -> Option<usize> {
        if pos >= self.len {
            return None;
        }
        let idx = self.entries.partition_point(|entry| entry.end <= pos);
        self.entries
            .get(idx)
            .filter(|entry| entry.contains(pos))
            .map(|_| idx)
    }

    pub fn entry_at(&self, pos: usize) -> Option<&OffsetEntry> {
        self.index_at(pos).map(|idx| &self.entries[idx])
    }

    /// Word entries only, in order.
    pub fn words(&self) -> impl Iterator<Item = &OffsetEntry> {
        self.entries.iter().filter(|e| !e.owner.is_gap())
    }
}
