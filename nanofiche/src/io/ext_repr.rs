use serde::{Deserialize, Serialize};

use crate::entities::EnvelopeShape;

/// External representation of a packing instance.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtInstance {
    /// The name of the instance
    pub name: String,
    /// Dimensions of the cell every item is placed in
    pub bin: ExtBin,
    pub envelope: ExtEnvelope,
    /// Zero, one or two zones no tile may intersect
    #[serde(default)]
    pub reserves: Vec<ExtReserveZone>,
    /// Source images, in output order unless they carry no `index`
    pub items: Vec<ExtItem>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ExtBin {
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ExtEnvelope {
    pub shape: EnvelopeShape,
    /// Width over height, only used by rectangles and ellipses
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    #[serde(default)]
    pub sizing: ExtSizing,
}

fn default_ratio() -> f64 {
    1.0
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtSizing {
    #[default]
    Optimal,
    Fixed { width: u32, height: u32 },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ExtReserveZone {
    pub shape: ExtReserveShape,
    pub anchor: ExtReserveAnchor,
    pub size: ExtReserveSize,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtReserveShape {
    Circle,
    Square,
    Rectangle {
        /// Height over width
        #[serde(default = "default_reserve_aspect")]
        aspect: f64,
    },
}

fn default_reserve_aspect() -> f64 {
    crate::entities::RESERVE_RECT_ASPECT
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtReserveAnchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ExtReserveSize {
    Pixels(u32),
    Percentage(f64),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtItem {
    /// Reference to the source image
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Position in the output order. Derived from the source name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// External representation of a packing result.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtSolution {
    pub envelope: ExtPlacedEnvelope,
    /// Placed tiles, in output order
    pub tiles: Vec<ExtTile>,
    pub unplaced: usize,
    /// (placed items × bin area) / envelope area
    pub efficiency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<ExtGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<ExtSearchReport>,
    /// Time (ms) from the start of the process until the result was exported
    pub run_time_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ExtPlacedEnvelope {
    pub shape: EnvelopeShape,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExtTile {
    pub index: usize,
    pub source: String,
    pub x: u32,
    pub y: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ExtGrid {
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ExtSearchReport {
    pub iterations: usize,
    pub lower_bound: u32,
    pub upper_bound: u32,
    /// Size found by bisection alone, before the downward sweep
    pub bisection_result: u32,
    pub monotonicity_violations: usize,
}
