use crate::entities::Bin;
use crate::geometry::primitives::Rect;

/// An [`Item`](crate::entities::Item) placed in the envelope: a bin-sized cell at an integer pixel origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub seq: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn new(seq: usize, x: u32, y: u32, bin: Bin) -> Self {
        Tile {
            seq,
            x,
            y,
            width: bin.width,
            height: bin.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.x as i64, self.y as i64, self.width, self.height)
    }
}
