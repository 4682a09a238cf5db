//! Infrastructure layer
//!
//! Concrete store adapters.

pub mod http;
pub mod persistence;

pub use http::{HttpStoreConfig, HttpTemplateStore};
pub use persistence::InMemoryTemplateStore;
