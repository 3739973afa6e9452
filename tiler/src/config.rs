use nanofiche::io::svg::SvgDrawOptions;
use serde::{Deserialize, Serialize};

/// Configuration of the packing driver
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TilerConfig {
    /// Bounds of the envelope size search
    #[serde(default)]
    pub search: SearchConfig,
    /// Shift the last partially filled grid row against the right/bottom boundary when it frees capacity
    pub bottom_row_pass: bool,
    /// Evaluate grid row eligibility on the rayon thread pool
    pub parallel_rows: bool,
    /// Bounded-memory consumption of large layouts
    #[serde(default)]
    pub batching: BatchConfig,
    /// Optional SVG drawing options
    #[serde(default)]
    pub svg_draw_options: SvgDrawOptions,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            bottom_row_pass: true,
            parallel_rows: true,
            batching: BatchConfig::default(),
            svg_draw_options: SvgDrawOptions::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Maximum number of bisection steps before giving up
    pub max_iterations: usize,
    /// Factor by which the upper bound grows when it turns out to be infeasible
    pub upper_bound_growth: f64,
    /// Maximum number of times the upper bound is grown
    pub max_upper_bound_expansions: usize,
    /// Wall-clock budget of the search in milliseconds. The best feasible size found so far is kept when it runs out.
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            upper_bound_growth: 1.25,
            max_upper_bound_expansions: 32,
            time_limit_ms: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Layouts whose rendered size (items × bin area × bytes per pixel) exceeds this are streamed in batches
    pub memory_threshold_bytes: u64,
    /// Bytes per pixel of the rendered fiche
    pub bytes_per_pixel: u32,
    /// Number of tiles per batch
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            memory_threshold_bytes: 2 * 1024 * 1024 * 1024,
            bytes_per_pixel: 1,
            batch_size: 256,
        }
    }
}
