//! Domain services

pub mod submission;

pub use submission::{validate_submission, visible_fields, FieldIssue, Responses};
