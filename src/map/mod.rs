//! Map-side integration
//!
//! - engine configuration with documented defaults, stored as RON
//! - per-map Mode 7 overrides read from map metadata
//! - the `Mode7Map` context owning the camera for one map

mod config;
mod world;

pub use config::*;
pub use world::*;
