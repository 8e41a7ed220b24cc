//! The resolution rule shared by all entity kinds
//!
//! Candidates are visited lazily in backing-table order and the first one
//! satisfying the rule wins. There is deliberately no ambiguity detection:
//! the upstream API itself admits ambiguous display text, and the original
//! behavior is first-match-wins.

use super::{EntityKind, Identifier};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of a native survey ID, e.g. "SV_8oVMa3ol1PWgiB7"
pub const SURVEY_ID_PREFIX: &str = "SV_";

/// Shape of a question export tag, e.g. "Q14"
static QUESTION_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Q\d+$").expect("static regex is valid"));

/// Exact-match shortcut applied to string identifiers before regex matching.
///
/// When the identifier looks like a platform-native ID for the entity kind,
/// it is compared against the candidate key with plain equality and the
/// regex engine is never invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPath {
    /// No shortcut; string identifiers always regex-search display text
    None,
    /// Identifiers starting with `SV_` match the survey ID exactly
    SurveyId,
    /// Identifiers of the form `Q<digits>` match the export tag exactly
    QuestionTag,
}

impl FastPath {
    fn applies(self, pattern: &str) -> bool {
        match self {
            Self::None => false,
            Self::SurveyId => pattern.starts_with(SURVEY_ID_PREFIX),
            Self::QuestionTag => QUESTION_TAG_RE.is_match(pattern),
        }
    }
}

/// A candidate's normalized key, matched against the identifier.
///
/// String keys (survey IDs, export tags) only ever match string identifiers
/// via the fast path; integer keys (recoded choice values, sub-question
/// positions) only ever match integer identifiers.
pub trait CandidateKey {
    fn matches_id(&self, id: i64) -> bool;
    fn matches_exact(&self, text: &str) -> bool;
}

impl CandidateKey for i64 {
    fn matches_id(&self, id: i64) -> bool {
        *self == id
    }

    fn matches_exact(&self, _text: &str) -> bool {
        false
    }
}

impl CandidateKey for String {
    fn matches_id(&self, _id: i64) -> bool {
        false
    }

    fn matches_exact(&self, text: &str) -> bool {
        self == text
    }
}

/// Resolve an identifier against a lazy candidate sequence.
///
/// Each candidate is a `(normalized key, display text)` pair; key
/// normalization is fallible (e.g. a malformed recode value), and such
/// failures abort the resolution. The first candidate satisfying the
/// selection rule is returned in the order the sequence supplies them.
///
/// Fails with [`Error::NotFound`] naming `kind` and the identifier when no
/// candidate matches.
pub fn resolve<K, I>(kind: EntityKind, identifier: &Identifier, fast_path: FastPath, candidates: I) -> Result<(K, String)>
where
    K: CandidateKey,
    I: IntoIterator<Item = Result<(K, String)>>,
{
    match identifier {
        Identifier::Id(id) => {
            for candidate in candidates {
                let (key, display) = candidate?;
                if key.matches_id(*id) {
                    return Ok((key, display));
                }
            }
        }
        Identifier::Pattern(pattern) => {
            if fast_path.applies(pattern) {
                for candidate in candidates {
                    let (key, display) = candidate?;
                    if key.matches_exact(pattern) {
                        return Ok((key, display));
                    }
                }
            } else {
                // Compiled only on this branch: the fast path never evaluates
                // a regex, so a native-ID identifier need not even be valid
                // regex syntax.
                let regex = Regex::new(pattern)?;
                for candidate in candidates {
                    let (key, display) = candidate?;
                    if regex.is_match(&display) {
                        return Ok((key, display));
                    }
                }
            }
        }
    }

    Err(Error::not_found(kind, identifier.to_string()))
}
