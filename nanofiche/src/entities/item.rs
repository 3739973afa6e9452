/// A single source image to be placed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    /// Position of the item in the output order
    pub seq: usize,
    /// Opaque reference to the source image (usually its file name)
    pub source: String,
    /// Decoded width of the source image, in pixels
    pub width: u32,
    /// Decoded height of the source image, in pixels
    pub height: u32,
}

impl Item {
    pub fn new(seq: usize, source: impl Into<String>, width: u32, height: u32) -> Self {
        Item {
            seq,
            source: source.into(),
            width,
            height,
        }
    }
}
