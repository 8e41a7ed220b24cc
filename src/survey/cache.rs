//! The account-wide survey list cache
//!
//! An explicit cache object owned by the calling context and injected
//! wherever a survey is resolved. Populated on first access and never
//! invalidated automatically: long-running processes must call [`reset`]
//! themselves when they need fresh data.
//!
//! [`reset`]: SurveyCache::reset

use crate::error::{Error, Result};
use crate::http::Session;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

/// One (id, name) pair from the account's survey list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurveyEntry {
    pub id: String,
    pub name: String,
}

/// Cache of the full `surveys` listing
#[derive(Debug, Default)]
pub struct SurveyCache {
    // Guarded only to keep the type Sync; the guard is never held across an
    // await and cross-thread mutation remains out of scope.
    entries: Mutex<Option<Arc<Vec<SurveyEntry>>>>,
}

impl SurveyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached survey list, fetching it on first access
    pub async fn entries(&self, session: &Session) -> Result<Arc<Vec<SurveyEntry>>> {
        {
            let guard = self.entries.lock().expect("survey cache lock poisoned");
            if let Some(entries) = &*guard {
                return Ok(Arc::clone(entries));
            }
        }

        let elements = session.get_multiple("surveys").await?;
        let mut entries = Vec::with_capacity(elements.len());
        for element in elements {
            let entry: SurveyEntry = serde_json::from_value(element)
                .map_err(|e| Error::data_shape(format!("malformed survey list entry: {e}")))?;
            entries.push(entry);
        }

        let entries = Arc::new(entries);
        *self.entries.lock().expect("survey cache lock poisoned") = Some(Arc::clone(&entries));
        Ok(entries)
    }

    /// Discard the cached list; the next access fetches it again
    pub fn reset(&self) {
        *self.entries.lock().expect("survey cache lock poisoned") = None;
    }

    /// Whether the list has been fetched
    pub fn is_populated(&self) -> bool {
        self.entries
            .lock()
            .expect("survey cache lock poisoned")
            .is_some()
    }
}
