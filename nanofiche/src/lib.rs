//! Layout engine that packs an ordered collection of identical image bins into a
//! square, rectangular, circular or elliptical envelope, while keeping clear of reserved zones.
//!
//! This crate holds the geometry, the entities describing a packing run and the
//! predicates deciding whether a tile may occupy a position. The placement strategies and
//! the envelope size search live in the `tiler` crate.

/// Containment and reserve-zone intersection predicates
pub mod collision_detection;

/// Entities describing a packing run: bins, items, envelopes, reserves and results
pub mod entities;

/// Geometric primitives and base algorithms
pub mod geometry;

/// Importing instances into and exporting results out of the engine
pub mod io;

/// Helper functions which do not belong to any specific module
pub mod util;

mod error;

pub use error::{OversizedItem, PackError, PackResult};
