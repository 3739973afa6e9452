use std::fmt::{Display, Formatter};

use itertools::Itertools;
use thiserror::Error;

use crate::entities::EnvelopeShape;

/// Every way a packing run can be refused or fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    #[error("{} item(s) exceed the bin dimensions: [{}]", .0.len(), list(.0))]
    OversizedItems(Vec<OversizedItem>),

    #[error(
        "insufficient space: {shape:?} envelope of {width}x{height} px holds {placed} of {required} items"
    )]
    InsufficientSpace {
        shape: EnvelopeShape,
        width: u32,
        height: u32,
        placed: usize,
        required: usize,
    },

    #[error("invalid reserve configuration: {0}")]
    InvalidReserveConfiguration(String),

    #[error("envelope size search did not converge after {iterations} iterations, interval: [{lower}, {upper}]")]
    SearchNonConvergence {
        iterations: usize,
        lower: u32,
        upper: u32,
    },

    #[error("invalid bin: {0}")]
    InvalidBin(String),

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid items: {0}")]
    InvalidItems(String),

    #[error("envelope size search was cancelled before a feasible size was known")]
    Cancelled,
}

pub type PackResult<T> = Result<T, PackError>;

/// An item whose source dimensions do not fit inside the bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedItem {
    pub seq: usize,
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl Display for OversizedItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({}x{})", self.seq, self.source, self.width, self.height)
    }
}

fn list(items: &[OversizedItem]) -> String {
    items.iter().join(", ")
}
