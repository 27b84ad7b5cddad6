//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (MapStore, Clock, etc.)
//! but are themselves concrete structs, not traits.

mod maps;

pub use maps::MapService;
