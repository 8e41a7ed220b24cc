//! Transport and pagination
//!
//! One [`Session`] per set of credentials. All CRUD verbs, the paginated
//! list helper and the export protocol (see [`crate::export`]) go through
//! [`Session::call`], which injects the token header, enforces the call
//! timeout, logs the outgoing request and classifies error responses.

mod client;


pub use client::Session;
