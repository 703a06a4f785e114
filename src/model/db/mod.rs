//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod choice;
pub mod question;

pub use choice::{Choice, ChoiceCore};
pub use question::{Question, QuestionCore};
