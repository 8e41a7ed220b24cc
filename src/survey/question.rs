//! Question, SubQuestion and Choice views
//!
//! All three are pure views over metadata already cached on the Survey.
//! The quirks handled here come straight from the metadata format: Matrix
//! questions store their sub-question display texts under `Choices` (with
//! the real answer choices under `Answers`), choice IDs may be remapped
//! through `RecodeValues`, and `ChoiceOrder` entries may be strings or
//! integers inconsistently.

use super::model::Survey;
use crate::decode::{Column, ResponseTable};
use crate::error::{Error, Result};
use crate::identity::{self, EntityKind, FastPath, Identifier};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

/// A question in a survey
#[derive(Debug)]
pub struct Question<'a> {
    survey: &'a Survey<'a>,
    /// The export tag, e.g. "Q1"
    pub id: String,
    /// The question description
    pub name: String,
    definition: Value,
}

impl<'a> Question<'a> {
    pub(crate) fn new(survey: &'a Survey<'a>, id: String, name: String, definition: Value) -> Self {
        Self {
            survey,
            id,
            name,
            definition,
        }
    }

    /// Whichever choice table the definition has.
    /// Usually `Choices`; Matrix questions have both `Answers` and `Choices`,
    /// where matrix `Choices` are really sub-questions.
    fn choice_table(&self) -> Option<&Map<String, Value>> {
        non_empty_object(self.definition.get("Answers"))
            .or_else(|| non_empty_object(self.definition.get("Choices")))
    }

    /// The sub-question table: only present when the definition carries both
    /// `Answers` and `Choices`
    fn sub_question_table(&self) -> Option<&Map<String, Value>> {
        if non_empty_object(self.definition.get("Answers")).is_some() {
            non_empty_object(self.definition.get("Choices"))
        } else {
            None
        }
    }

    /// The externally visible choice ID for an internal storage key: looked
    /// up through `RecodeValues` when the definition declares one, otherwise
    /// the internal key itself.
    fn recoded_choice_id(&self, internal: &str) -> Result<i64> {
        match self.definition.get("RecodeValues").and_then(Value::as_object) {
            Some(recode) => {
                let value = recode.get(internal).ok_or_else(|| {
                    Error::data_shape(format!("no recode value for choice key {internal:?}"))
                })?;
                recode_as_integer(value)
            }
            None => internal.parse::<i64>().map_err(|_| {
                Error::data_shape(format!("choice key {internal:?} is not an integer"))
            }),
        }
    }

    /// The 1-based sub-question ID for an internal key: its position in the
    /// declared `ChoiceOrder`. Entries might be strings or ints, or even
    /// change representation midway through, so both are tried.
    fn sub_question_id(&self, internal: &str) -> Result<i64> {
        let order = self
            .definition
            .get("ChoiceOrder")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::data_shape("question definition missing ChoiceOrder"))?;

        let as_int: Option<i64> = internal.parse().ok();
        let position = order
            .iter()
            .position(|entry| entry.as_str() == Some(internal))
            .or_else(|| {
                as_int.and_then(|n| order.iter().position(|entry| entry.as_i64() == Some(n)))
            })
            .ok_or_else(|| {
                Error::data_shape(format!("choice key {internal:?} not in ChoiceOrder"))
            })?;

        Ok(position as i64 + 1)
    }

    /// Resolve a multiple-choice choice: an integer matches the recoded
    /// choice ID exactly, a string is a regex searched in the choice text.
    pub fn choice(&self, identifier: impl Into<Identifier>) -> Result<Choice> {
        let identifier = identifier.into();
        let table = self.choice_table();
        let candidates = table.into_iter().flat_map(Map::iter).map(
            |(key, item): (&String, &Value)| -> Result<(i64, String)> {
                Ok((self.recoded_choice_id(key)?, display_text(item)?))
            },
        );

        let (id, name) = identity::resolve(EntityKind::Choice, &identifier, FastPath::None, candidates)?;
        Ok(Choice { id, name })
    }

    /// Resolve a sub-question: an integer matches the 1-based sub-question
    /// ID exactly, a string is a regex searched in the sub-question text.
    pub fn sub_question(&self, identifier: impl Into<Identifier>) -> Result<SubQuestion<'_>> {
        let identifier = identifier.into();
        let table = self.sub_question_table();
        let candidates = table.into_iter().flat_map(Map::iter).map(
            |(key, item): (&String, &Value)| -> Result<(i64, String)> {
                Ok((self.sub_question_id(key)?, display_text(item)?))
            },
        );

        let (id, name) =
            identity::resolve(EntityKind::SubQuestion, &identifier, FastPath::None, candidates)?;
        Ok(SubQuestion {
            question: self,
            id,
            name,
        })
    }

    /// All choices for this question, in recoded-ID order
    pub fn choices(&self) -> Result<Vec<Choice>> {
        let mut ids = Vec::new();
        if let Some(table) = self.choice_table() {
            for key in table.keys() {
                ids.push(self.recoded_choice_id(key)?);
            }
        }
        ids.sort_unstable();
        ids.into_iter().map(|id| self.choice(id)).collect()
    }

    /// All sub-questions of this (matrix) question, in table order
    pub fn sub_questions(&self) -> Result<Vec<SubQuestion<'_>>> {
        let mut sub_questions = Vec::new();
        if let Some(table) = self.sub_question_table() {
            for key in table.keys() {
                sub_questions.push(self.sub_question(self.sub_question_id(key)?)?);
            }
        }
        Ok(sub_questions)
    }

    /// Whether this question is a matrix with sub-questions
    pub fn has_sub_questions(&self) -> bool {
        self.sub_question_table().is_some()
    }

    /// The responses to this question, as the single column named by the
    /// export tag.
    ///
    /// Fails when the question has sub-questions: the column choice is
    /// ambiguous and the caller must drill into them instead.
    pub async fn responses(&self) -> Result<Column> {
        if self.has_sub_questions() {
            return Err(Error::data_shape(format!(
                "Question {} has sub-questions",
                self.id
            )));
        }
        let table = self.survey.responses().await?;
        table.column(&self.id)
    }
}

impl fmt::Display for Question<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Question {}: {}}}", self.id, self.name)
    }
}

/// One of the possible multiple-choice responses to a question.
///
/// The ID is the user-visible recoded value, not the internal storage key.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Choice {}: {}}}", self.id, self.name)
    }
}

/// One of the sub-questions of a matrix question
#[derive(Debug)]
pub struct SubQuestion<'a> {
    question: &'a Question<'a>,
    /// 1-based position in the question's declared choice ordering
    pub id: i64,
    /// The sub-question display text
    pub name: String,
}

impl SubQuestion<'_> {
    /// The responses to this sub-question.
    ///
    /// Response columns follow the `Q<id>_<subid>[_...]` naming convention;
    /// a single matching column is answered directly, repeated/grid
    /// sub-items come back as the whole matching sub-table.
    pub async fn responses(&self) -> Result<Responses> {
        let pattern = Regex::new(&format!("^{}_{}($|_)", self.question.id, self.id))?;
        let table = self.question.survey.responses().await?;
        let matching = table.select(&pattern);

        if matching.columns().len() == 1 {
            let name = matching.columns()[0].clone();
            Ok(Responses::Column(matching.column(&name)?))
        } else {
            Ok(Responses::Table(matching))
        }
    }
}

impl fmt::Display for SubQuestion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{SubQuestion {}: {}}}", self.id, self.name)
    }
}

/// Responses to a sub-question: one column, or a sub-table for grid items
#[derive(Debug, Clone, PartialEq)]
pub enum Responses {
    Column(Column),
    Table(ResponseTable),
}

impl Responses {
    /// The single column, when there is exactly one
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Self::Column(column) => Some(column),
            Self::Table(_) => None,
        }
    }

    /// The matching sub-table, when more than one column matched
    pub fn as_table(&self) -> Option<&ResponseTable> {
        match self {
            Self::Column(_) => None,
            Self::Table(table) => Some(table),
        }
    }
}

/// A JSON object with at least one entry. Empty tables count as absent, the
/// way the metadata format treats them.
fn non_empty_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object).filter(|map| !map.is_empty())
}

/// The `Display` text of a choice-table item
fn display_text(item: &Value) -> Result<String> {
    item.get("Display")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::data_shape("choice table entry missing Display text"))
}

/// A recode value may be a JSON number or its string form
fn recode_as_integer(value: &Value) -> Result<i64> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse() {
            return Ok(n);
        }
    }
    Err(Error::data_shape(format!(
        "recode value {value} is not an integer"
    )))
}
