//! The authenticated account

use crate::error::{Error, Result};
use crate::http::Session;
use serde_json::Value;
use std::fmt;

/// The user the session's token belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

impl CurrentUser {
    /// Look up who the session is authenticated as
    pub async fn fetch(session: &Session) -> Result<Self> {
        let payload = session.get("whoami").await?;

        let id = payload
            .get("userId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::data_shape("whoami payload missing userId"))?
            .to_string();

        let first = payload.get("firstName").and_then(Value::as_str).unwrap_or("");
        let last = payload.get("lastName").and_then(Value::as_str).unwrap_or("");
        let name = [first, last]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self { id, name })
    }
}

impl fmt::Display for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{User {}: {}}}", self.id, self.name)
    }
}
