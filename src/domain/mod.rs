//! Domain layer: entities and tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod colorizer;
pub mod entities;
pub mod error;
pub mod tree;

pub use colorizer::{color_of, Color, Palette};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use tree::TreeStore;
