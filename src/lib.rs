// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! # simple-qualtrics
//!
//! A pragmatic client for the Qualtrics survey platform's V3 REST API.
//!
//! Two layers:
//!
//! - **Transport** ([`Session`]): credentialed GET/POST/PUT/DELETE against
//!   the versioned API root, with response-envelope unwrapping, transparent
//!   list pagination, and the asynchronous file-export protocol (create job,
//!   poll, download, unpack).
//! - **Entities** ([`Survey`] → [`Question`] → [`Choice`]/[`SubQuestion`]):
//!   a lazy object graph over survey metadata and decoded responses, with
//!   flexible identifier resolution (platform IDs matched exactly, free text
//!   treated as a regex over display names).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use simple_qualtrics::{Session, Survey, SurveyCache, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Credentials and data center from a YAML file
//!     let session = Session::from_yaml("qualtrics.yaml")?;
//!     let cache = SurveyCache::new();
//!
//!     // Resolve a survey by title pattern, then drill in
//!     let survey = Survey::resolve(&session, &cache, "Customer [Ss]atisfaction").await?;
//!     for question in survey.questions().await? {
//!         println!("{question}");
//!     }
//!
//!     // Decoded responses, fetched and memoized on first use
//!     let responses = survey.responses().await?;
//!     println!("{} responses", responses.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Credentials and connection settings
pub mod config;

/// The credentialed HTTP session
pub mod http;

/// The asynchronous file-export protocol
pub mod export;

/// Identifier resolution shared by all entity kinds
pub mod identity;

/// Response CSV decoding
pub mod decode;

/// The survey entity graph
pub mod survey;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::Config;
pub use decode::{Cell, Column, ResponseTable, Row};
pub use error::{Error, Result};
pub use http::Session;
pub use identity::{EntityKind, Identifier};
pub use survey::{
    Choice, CurrentUser, Question, Responses, SubQuestion, Survey, SurveyCache, SurveyEntry,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
