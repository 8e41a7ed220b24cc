//! Asynchronous file-export polling
//!
//! Bulk downloads (survey responses and similar) use a three-step protocol:
//! create an export job, poll its status until complete, then download the
//! resulting zip archive. [`crate::Session::export`] drives the whole
//! protocol and answers the first file inside the archive as a readable,
//! seekable byte stream.

mod poller;
