use crate::{PackError, PackResult};

/// The fixed-size cell every item is placed in. Identical for all items of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bin {
    pub width: u32,
    pub height: u32,
}

impl Bin {
    pub fn try_new(width: u32, height: u32) -> PackResult<Self> {
        if width == 0 || height == 0 {
            return Err(PackError::InvalidBin(format!(
                "bin dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Bin { width, height })
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The smaller of both dimensions, used as the radial step of spiral layouts.
    pub fn min_dim(&self) -> u32 {
        u32::min(self.width, self.height)
    }

    /// True if a source image of `width` x `height` pixels fits inside the bin.
    pub fn admits(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}
