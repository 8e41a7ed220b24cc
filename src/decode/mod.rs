//! Decoding of exported survey responses
//!
//! The export archive contains a CSV whose first row is the column header and
//! whose next two rows are metadata (question text and internal IDs). The
//! decoder skips the metadata rows and types the two known date columns as
//! timestamps; everything else is kept as text.

mod table;


pub use table::{Cell, Column, ResponseTable, Row};
