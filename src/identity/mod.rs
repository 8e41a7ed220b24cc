//! Identifier resolution
//!
//! The Qualtrics V3 APIs expose three incompatible identifier conventions at
//! once: stable platform IDs ("SV_xxx", "Q1"), human display text, and recoded
//! numeric values. This module hides that inconsistency behind one lookup
//! contract: an [`Identifier`] plus a candidate sequence resolve to exactly one
//! canonical (id, name) pair, or fail with an error naming the entity kind.

mod resolver;


pub use resolver::{resolve, CandidateKey, FastPath};

use std::fmt;

/// A heterogeneous identifier for a survey entity.
///
/// Integer identifiers match the normalized key exactly; string identifiers
/// are regex-searched against display text, except where an entity kind
/// declares a native-ID fast path (see [`FastPath`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier {
    /// Exact match against the entity's numeric key
    Id(i64),
    /// Regex searched anywhere in the entity's display text
    Pattern(String),
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<i32> for Identifier {
    fn from(id: i32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&str> for Identifier {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for Identifier {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Pattern(p) => write!(f, "{p:?}"),
        }
    }
}

/// The kinds of entity an identifier can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Survey,
    Question,
    SubQuestion,
    Choice,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Survey => "Survey",
            Self::Question => "Question",
            Self::SubQuestion => "SubQuestion",
            Self::Choice => "Choice",
        };
        f.write_str(name)
    }
}
