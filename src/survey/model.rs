//! The Survey entity

use super::cache::{SurveyCache, SurveyEntry};
use super::question::Question;
use crate::decode::ResponseTable;
use crate::error::{Error, Result};
use crate::http::Session;
use crate::identity::{self, EntityKind, FastPath, Identifier};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A full Qualtrics survey.
///
/// The response table and the question-definition list are fetched once per
/// instance, on first use, and memoized thereafter.
#[derive(Debug)]
pub struct Survey<'a> {
    session: &'a Session,
    /// The platform survey ID, e.g. "SV_8oVMa3ol1PWgiB7"
    pub id: String,
    /// The survey title; not guaranteed unique within an account
    pub name: String,
    response_params: Map<String, Value>,
    definitions: Mutex<Option<Arc<Vec<Value>>>>,
    responses: Mutex<Option<Arc<ResponseTable>>>,
}

impl<'a> Survey<'a> {
    /// All surveys in the account, via the shared cache
    pub async fn all(session: &'a Session, cache: &SurveyCache) -> Result<Vec<Survey<'a>>> {
        let entries = cache.entries(session).await?;
        Ok(entries
            .iter()
            .map(|entry| Self::from_entry(session, entry))
            .collect())
    }

    /// Resolve a survey by identifier: either the platform ID ("SV_...",
    /// matched exactly) or a regex searched against survey titles.
    pub async fn resolve(
        session: &'a Session,
        cache: &SurveyCache,
        identifier: impl Into<Identifier>,
    ) -> Result<Survey<'a>> {
        let identifier = identifier.into();
        let entries = cache.entries(session).await?;
        let (id, name) = identity::resolve(
            EntityKind::Survey,
            &identifier,
            FastPath::SurveyId,
            entries
                .iter()
                .map(|entry| Ok((entry.id.clone(), entry.name.clone()))),
        )?;

        Ok(Self {
            session,
            id,
            name,
            response_params: Map::new(),
            definitions: Mutex::new(None),
            responses: Mutex::new(None),
        })
    }

    /// Attach parameters for the response-export call, usually to limit the
    /// set of responses returned. Captured once, at construction time.
    pub fn with_response_params(mut self, params: Map<String, Value>) -> Self {
        self.response_params = params;
        self
    }

    fn from_entry(session: &'a Session, entry: &SurveyEntry) -> Survey<'a> {
        Self {
            session,
            id: entry.id.clone(),
            name: entry.name.clone(),
            response_params: Map::new(),
            definitions: Mutex::new(None),
            responses: Mutex::new(None),
        }
    }

    /// The decoded responses for this survey.
    ///
    /// The export runs once per Survey instance; subsequent calls answer the
    /// memoized table (or the subset installed by [`set_response_subset`]).
    ///
    /// [`set_response_subset`]: Survey::set_response_subset
    pub async fn responses(&self) -> Result<Arc<ResponseTable>> {
        {
            let guard = self.responses.lock().expect("responses lock poisoned");
            if let Some(table) = &*guard {
                return Ok(Arc::clone(table));
            }
        }

        let mut parameters = Map::new();
        parameters.insert("format".to_string(), Value::String("csv".to_string()));
        for (key, value) in &self.response_params {
            parameters.insert(key.clone(), value.clone());
        }

        let stream = self
            .session
            .export(
                &format!("surveys/{}/export-responses", self.id),
                &Value::Object(parameters),
            )
            .await?;
        let table = Arc::new(ResponseTable::from_reader(stream)?);

        *self.responses.lock().expect("responses lock poisoned") = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Replace the memoized response table with a caller-supplied subset.
    /// All per-question and per-sub-question views reflect it immediately,
    /// without re-querying.
    pub fn set_response_subset(&self, table: ResponseTable) {
        *self.responses.lock().expect("responses lock poisoned") = Some(Arc::new(table));
    }

    /// The question definitions, in reverse of the order the metadata API
    /// returned them. More than one definition can share an export tag
    /// (revision history) and the most recently defined one must win
    /// first-match resolution.
    pub(crate) async fn question_definitions(&self) -> Result<Arc<Vec<Value>>> {
        {
            let guard = self.definitions.lock().expect("definitions lock poisoned");
            if let Some(definitions) = &*guard {
                return Ok(Arc::clone(definitions));
            }
        }

        let mut definitions = self
            .session
            .get_multiple(&format!("survey-definitions/{}/questions", self.id))
            .await?;
        definitions.reverse();
        let definitions = Arc::new(definitions);

        *self.definitions.lock().expect("definitions lock poisoned") =
            Some(Arc::clone(&definitions));
        Ok(definitions)
    }

    /// Resolve a question by identifier: the export tag ("Q1", matched
    /// exactly) or a regex searched against question descriptions.
    pub async fn question(&self, identifier: impl Into<Identifier>) -> Result<Question<'_>> {
        let identifier = identifier.into();
        let definitions = self.question_definitions().await?;
        let (id, name) = identity::resolve(
            EntityKind::Question,
            &identifier,
            FastPath::QuestionTag,
            definitions.iter().map(question_candidate),
        )?;

        // Recover the matched revision: the first definition in this (reversed)
        // list carrying both the resolved tag and description.
        let definition = definitions
            .iter()
            .find(|def| {
                def.get("DataExportTag").and_then(Value::as_str) == Some(id.as_str())
                    && def.get("QuestionDescription").and_then(Value::as_str)
                        == Some(name.as_str())
            })
            .cloned()
            .ok_or_else(|| {
                Error::data_shape(format!("no question definition with tag {id}"))
            })?;

        Ok(Question::new(self, id, name, definition))
    }

    /// All answerable questions, one per export tag: the latest revision of
    /// each, excluding display-only blocks (`QuestionType == "DB"`), in the
    /// original creation order.
    pub async fn questions(&self) -> Result<Vec<Question<'_>>> {
        let definitions = self.question_definitions().await?;

        // Scan latest-first keeping each tag's first appearance, then flip
        // back to the original order.
        let mut tags: Vec<&str> = Vec::new();
        for def in definitions.iter() {
            if def.get("QuestionType").and_then(Value::as_str) == Some("DB") {
                continue;
            }
            let tag = def
                .get("DataExportTag")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::data_shape("question definition missing DataExportTag"))?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags.reverse();

        let mut questions = Vec::with_capacity(tags.len());
        for tag in tags {
            questions.push(self.question(tag).await?);
        }
        Ok(questions)
    }
}

impl fmt::Display for Survey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Survey {}: {}}}", self.id, self.name)
    }
}

/// The (export tag, description) candidate pair for question resolution
fn question_candidate(def: &Value) -> Result<(String, String)> {
    let tag = def
        .get("DataExportTag")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::data_shape("question definition missing DataExportTag"))?;
    let description = def
        .get("QuestionDescription")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::data_shape("question definition missing QuestionDescription"))?;
    Ok((tag.to_string(), description.to_string()))
}
