//! Ports module (Hexagonal Architecture)
//!
//! Interfaces the builder needs from the outside world.

pub mod outbound;

pub use outbound::*;
