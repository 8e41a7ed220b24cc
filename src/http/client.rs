//! The Qualtrics API session
//!
//! Implements the calling conventions shared by the V3 APIs: the
//! `{"result": ...}` success envelope, the `meta.error.errorMessage` error
//! envelope on statuses in [400, 500], and `nextPage` pagination. There are
//! no automatic retries anywhere: a single failed call is a single failed
//! operation.

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info};

/// Header carrying the opaque bearer token on every request
const API_TOKEN_HEADER: &str = "x-api-token";

/// Result fields recognized as the created-object identifier when the create
/// response has more than one field
const ID_FIELDS: &[&str] = &["progressId"];

/// Longest payload fragment written to the call log
const LOG_PAYLOAD_LIMIT: usize = 200;

/// A credentialed session against one Qualtrics data center
pub struct Session {
    client: Client,
    config: Config,
    base_url: String,
}

impl Session {
    /// Create a session from a validated configuration
    pub fn new(config: Config) -> Self {
        let base_url = config.base_url();
        Self::with_base_url(config, base_url)
    }

    /// Create a session from a YAML credentials file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Config::from_yaml(path)?))
    }

    /// Create a session whose relative paths resolve against `base_url`
    /// instead of the data-center URL derived from the configuration.
    pub fn with_base_url(config: Config, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            client,
            config,
            base_url,
        }
    }

    /// The configuration this session was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    // The basic Qualtrics CRUD API calls. Metadata in the response envelope is
    // ignored, except for error messages.

    /// Make a GET request, answering the `result` payload
    pub async fn get(&self, path: &str) -> Result<Value> {
        let response = self.call(Method::GET, path, None).await?;
        result_payload(response).await
    }

    /// Make a POST request, answering the `result` payload
    pub async fn post(&self, path: &str, parameters: &Value) -> Result<Value> {
        let response = self.call(Method::POST, path, Some(parameters)).await?;
        result_payload(response).await
    }

    /// PUT the given parameters to the given path
    pub async fn put(&self, path: &str, parameters: &Value) -> Result<()> {
        self.call(Method::PUT, path, Some(parameters)).await?;
        Ok(())
    }

    /// DELETE the given path
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.call(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// POST a create request, answering the string ID of the created object.
    ///
    /// The key used for the ID varies across APIs: a single-field result is
    /// taken as the ID whatever its key, otherwise the first recognized
    /// identifier field (`progressId`) is used.
    pub async fn post_create(&self, path: &str, parameters: &Value) -> Result<String> {
        let result = self.post(path, parameters).await?;
        let object = result
            .as_object()
            .ok_or_else(|| Error::data_shape(format!("create result for {path} is not an object")))?;

        let id = if object.len() == 1 {
            object.values().next()
        } else {
            ID_FIELDS.iter().find_map(|field| object.get(*field))
        };

        id.and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::data_shape(format!("no identifier field in create response for {path}"))
            })
    }

    /// Make a GET request against a paginated list endpoint, following the
    /// `nextPage` pointer until absent and concatenating all pages in order.
    /// Page N+1 is requested only after page N completes.
    pub async fn get_multiple(&self, path: &str) -> Result<Vec<Value>> {
        let mut elements = Vec::new();
        let mut next = path.to_string();

        loop {
            let result = self.get(&next).await?;
            let page = result
                .get("elements")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::data_shape(format!("paginated response for {path} missing 'elements'"))
                })?;
            elements.extend(page.iter().cloned());

            // Absent for unpaginated list APIs, null on the last page.
            match result.get("nextPage").and_then(Value::as_str) {
                Some(url) => next = url.to_string(),
                None => break,
            }
        }

        Ok(elements)
    }

    /// The underlying operation used for all calls.
    ///
    /// `path` may be relative to the API base or a full URL. The request
    /// carries the token header and the configured timeout, and is logged
    /// before being issued; classified errors are logged at the point of
    /// detection, exactly once.
    pub async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = self.build_url(path);

        match body {
            Some(payload) => info!(
                "{} {} with payload: {}",
                method,
                url,
                truncate_for_log(&payload.to_string())
            ),
            None => info!("{} {}", method, url),
        }

        let mut request = self
            .client
            .request(method, &url)
            .header(API_TOKEN_HEADER, &self.config.token);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = Error::Http(e);
                error!("{err}");
                return Err(err);
            }
        };

        let status = response.status();
        if (400..=500).contains(&status.as_u16()) {
            // Qualtrics returns its error messages in the JSON envelope.
            let body_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body_text).unwrap_or(body_text);
            let err = Error::api(status.as_u16(), message);
            error!("{err}");
            return Err(err);
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let err = Error::HttpStatus {
                status: status.as_u16(),
                body: body_text,
            };
            error!("{err}");
            return Err(err);
        }

        Ok(response)
    }

    fn build_url(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("data_center", &self.config.data_center)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Unwrap the `{"result": ...}` success envelope
async fn result_payload(response: Response) -> Result<Value> {
    let envelope: Value = response.json().await?;
    envelope
        .get("result")
        .cloned()
        .ok_or_else(|| Error::data_shape("response missing 'result' field"))
}

/// Extract `meta.error.errorMessage` from an error response body, if the
/// body has the documented envelope shape
fn extract_error_message(body: &str) -> Option<String> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    envelope
        .get("meta")?
        .get("error")?
        .get("errorMessage")?
        .as_str()
        .map(str::to_string)
}

fn truncate_for_log(payload: &str) -> String {
    if payload.len() <= LOG_PAYLOAD_LIMIT {
        return payload.to_string();
    }
    let truncated: String = payload.chars().take(LOG_PAYLOAD_LIMIT).collect();
    format!("{truncated}...")
}
