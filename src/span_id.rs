//! Span identifier sources.
//!
//! The merger takes its identifiers from a [`SpanIdSource`] so that tests can
//! use reproducible ids while production uses random ones.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces span identifiers.
///
/// Identifiers must not contain `|`, `=`, `:` or whitespace. The merger
/// retries when an id is already in use, so sources only need to make
/// collisions unlikely.
pub trait SpanIdSource {
    fn next_id(&mut self) -> String;
}

/// Eight hex digits from a random generator.
#[derive(Debug, Clone)]
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanIdSource for RandomIds {
    fn next_id(&mut self) -> String {
        format!("{:08x}", self.rng.gen::<u32>())
    }
}

/// `s1`, `s2`, ... Readable ids for snapshots.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: usize,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("s")
    }
}

impl SpanIdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
