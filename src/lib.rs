//! mindtree: rooted mind-map trees with branch coloring and debounced persistence.
//!
//! Layers, innermost first:
//! - `domain`: tree store, entities, colorizer (no I/O)
//! - `application`: editing sessions and map services
//! - `infrastructure`: filesystem, clock, map stores, DI container
//! - `cli`: argument parsing, dispatch, terminal rendering

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
