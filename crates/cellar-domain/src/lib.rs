//! Extract-mass calculation engine for cellar vessels
//!
//! Converts level and Plato readings into kilograms of dissolved extract
//! and aggregates them per material, vessel class and vessel. The crate does
//! no file I/O: readings and the vessel registry are handed in already parsed.

pub mod model;
pub mod repository;
pub mod service;

pub use model::*;
pub use repository::VesselRegistry;
