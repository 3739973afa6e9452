/// Envelope containment of points and tiles
pub mod containment;

/// Reserve zones resolved against a concrete envelope
pub mod reserves;

#[doc(inline)]
pub use containment::ShapeContainment;
#[doc(inline)]
pub use reserves::{MAX_RESERVE_ZONES, ReserveHazard, ReserveSet, ZoneOutline};
