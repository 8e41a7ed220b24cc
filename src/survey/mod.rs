//! The survey entity graph
//!
//! Survey → Question → {Choice, SubQuestion}, derived lazily from metadata
//! plus decoded response rows. Child entities are pure views over metadata
//! cached on their Survey; they hold non-owning back-references for lookup,
//! never ownership.

mod cache;
mod model;
mod question;
mod user;


pub use cache::{SurveyCache, SurveyEntry};
pub use model::Survey;
pub use question::{Choice, Question, Responses, SubQuestion};
pub use user::CurrentUser;
