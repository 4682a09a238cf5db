//! Application layer
//!
//! Builder state machine, builder service and the storage wire records.

pub mod builder;
pub mod commands;
pub mod dto;

pub use builder::{BuilderAction, BuilderMode, BuilderState, DeletePrompt, Notice, NoticeLevel};
pub use commands::{BuilderError, BuilderOptions, TemplateBuilder};
pub use dto::*;
