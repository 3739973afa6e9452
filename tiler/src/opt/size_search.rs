use std::f64::consts::PI;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use nanofiche::collision_detection::ReserveSet;
use nanofiche::entities::{Bin, Envelope, EnvelopeShape, ReserveZone};
use nanofiche::{PackError, PackResult};
use thousands::Separable;

use crate::config::SearchConfig;
use crate::opt::{PlacementMode, Placer};

/// Consecutive infeasible sizes after which the sweeps around the bisection result stop
const MONOTONICITY_WINDOW: u32 = 3;

/// Binary search for the smallest envelope in which all items fit.
///
/// The scalar size `S` is the width of squares and rectangles and the diameter (width) of
/// circles and ellipses. The height follows from the aspect ratio.
pub struct EnvelopeSizeOptimizer<'a, P: Placer> {
    placer: &'a P,
    shape: EnvelopeShape,
    ratio: f64,
    bin: Bin,
    reserves: &'a [ReserveZone],
    config: SearchConfig,
    cancellation_checker: Option<&'a (dyn Fn() -> bool + Send + Sync)>,
}

/// Statistics of a completed search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub iterations: usize,
    pub lower_bound: u32,
    /// The first feasible upper bound, after any expansions
    pub upper_bound: u32,
    /// Sizes above the result that turned out infeasible
    pub monotonicity_violations: usize,
    /// Size returned by the bisection, before the sweep below it
    pub bisection_result: u32,
    /// The search was cancelled or ran out of time and returned the best size known at that point
    pub interrupted: bool,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub envelope: Envelope,
    /// Reserves resolved against `envelope`
    pub reserves: ReserveSet,
    pub report: SearchReport,
}

struct SizeCheck {
    placed: usize,
    fit: Option<(Envelope, ReserveSet)>,
}

impl<'a, P: Placer> EnvelopeSizeOptimizer<'a, P> {
    pub fn new(
        placer: &'a P,
        shape: EnvelopeShape,
        ratio: f64,
        bin: Bin,
        reserves: &'a [ReserveZone],
        config: SearchConfig,
    ) -> Self {
        Self {
            placer,
            shape,
            ratio,
            bin,
            reserves,
            config,
            cancellation_checker: None,
        }
    }

    /// The search stops early, keeping the best feasible size found so far, once `checker` returns true.
    pub fn with_cancellation_checker(
        mut self,
        checker: Option<&'a (dyn Fn() -> bool + Send + Sync)>,
    ) -> Self {
        self.cancellation_checker = checker;
        self
    }

    pub fn find_minimal_envelope(&self, n_items: usize) -> PackResult<SearchOutcome> {
        ReserveSet::validate_config(self.reserves)?;
        let start = Instant::now();

        let lower_bound = self.lower_bound(n_items);
        let mut upper = u32::max(self.naive_upper_bound(n_items), lower_bound);

        //grow the upper bound until it is feasible
        let mut expansions = 0;
        let mut best = loop {
            let check = self.check_size(upper, n_items);
            if let Some(fit) = check.fit {
                break (upper, fit);
            }
            if expansions >= self.config.max_upper_bound_expansions {
                let (width, height) = self.dimensions(upper);
                return Err(PackError::InsufficientSpace {
                    shape: self.shape,
                    width,
                    height,
                    placed: check.placed,
                    required: n_items,
                });
            }
            if self.interrupted(start) {
                return Err(PackError::Cancelled);
            }
            let grown = (upper as f64 * self.config.upper_bound_growth).ceil();
            let grown = grown.min(u32::MAX as f64) as u32;
            debug!(
                "[SEARCH] upper bound {upper} infeasible ({}/{} placed), growing to {grown}",
                check.placed.separate_with_commas(),
                n_items.separate_with_commas()
            );
            upper = u32::max(grown, upper.saturating_add(1));
            expansions += 1;
        };

        let mut report = SearchReport {
            iterations: 0,
            lower_bound,
            upper_bound: best.0,
            monotonicity_violations: 0,
            bisection_result: 0,
            interrupted: false,
        };

        let mut lo = lower_bound;
        if lo < best.0 {
            if let Some(fit) = self.check_size(lo, n_items).fit {
                best = (lo, fit);
            }
        }

        //invariant: `lo` is infeasible (or equal to best), `best` is feasible
        while best.0 - lo > 1 {
            if report.iterations >= self.config.max_iterations {
                return Err(PackError::SearchNonConvergence {
                    iterations: report.iterations,
                    lower: lo,
                    upper: best.0,
                });
            }
            if self.interrupted(start) {
                warn!(
                    "[SEARCH] interrupted after {} iterations, keeping size {} (lower end {lo})",
                    report.iterations, best.0
                );
                report.interrupted = true;
                break;
            }
            let mid = lo + (best.0 - lo) / 2;
            report.iterations += 1;
            match self.check_size(mid, n_items).fit {
                Some(fit) => best = (mid, fit),
                None => lo = mid,
            }
        }

        report.bisection_result = best.0;
        if !report.interrupted {
            //bisection only sees one side of a non-monotonic step, sizes below the result may still fit
            let mut infeasible = vec![];
            let mut size = best.0;
            let mut misses = 0;
            while misses < MONOTONICITY_WINDOW && size > lower_bound {
                if self.interrupted(start) {
                    report.interrupted = true;
                    break;
                }
                size -= 1;
                match self.check_size(size, n_items).fit {
                    Some(fit) => {
                        best = (size, fit);
                        misses = 0;
                    }
                    None => {
                        infeasible.push(size);
                        misses += 1;
                    }
                }
            }
            if best.0 < report.bisection_result {
                debug!(
                    "[SEARCH] sweep below {} found smaller feasible size {}",
                    report.bisection_result, best.0
                );
            }
            let above = (1..=MONOTONICITY_WINDOW)
                .map(|d| report.bisection_result.saturating_add(d))
                .filter(|&s| self.check_size(s, n_items).fit.is_none())
                .count();
            report.monotonicity_violations =
                infeasible.iter().filter(|&&s| s > best.0).count() + above;
            if report.monotonicity_violations > 0 {
                warn!(
                    "[SEARCH] feasibility is not monotonic around size {}: {} larger size(s) do not fit",
                    best.0, report.monotonicity_violations
                );
            }
        }

        let (size, (envelope, reserves)) = best;
        info!(
            "[SEARCH] minimal {:?} envelope: {}x{} (size {size}) after {} iterations, bounds [{}, {}]",
            self.shape,
            envelope.width,
            envelope.height,
            report.iterations,
            report.lower_bound,
            report.upper_bound
        );

        Ok(SearchOutcome {
            envelope,
            reserves,
            report,
        })
    }

    /// No size below this can hold a single bin or the total bin area.
    pub fn lower_bound(&self, n_items: usize) -> u32 {
        let (a, b) = (self.bin.width as f64, self.bin.height as f64);
        let r = self.ratio;
        let total_area = n_items as f64 * a * b;
        let (single, by_area) = match self.shape {
            EnvelopeShape::Square => (a.max(b), total_area.sqrt()),
            EnvelopeShape::Rectangle => (a.max(b * r), (total_area * r).sqrt()),
            EnvelopeShape::Circle => ((a * a + b * b).sqrt(), (4.0 * total_area / PI).sqrt()),
            EnvelopeShape::Ellipse => (
                (a * a + (b * r).powi(2)).sqrt(),
                (4.0 * total_area * r / PI).sqrt(),
            ),
        };
        (f64::max(single, by_area) - 1e-6).ceil().max(1.0) as u32
    }

    /// Size of a plain row-major layout without reserves (circumscribed for circles and ellipses).
    pub fn naive_upper_bound(&self, n_items: usize) -> u32 {
        let (a, b) = (self.bin.width as f64, self.bin.height as f64);
        let r = self.ratio;
        let n = n_items.max(1) as f64;
        let size = match self.shape {
            EnvelopeShape::Square => n.sqrt().ceil() * a.max(b),
            EnvelopeShape::Rectangle => {
                let cols = (n * b * r / a).sqrt().ceil().max(1.0);
                let rows = (n / cols).ceil();
                f64::max(cols * a, rows * b * r + 1.0)
            }
            EnvelopeShape::Circle | EnvelopeShape::Ellipse => {
                let k = n.sqrt().ceil() + 2.0;
                ((k * a).powi(2) + (k * b * r).powi(2)).sqrt() + 2.0
            }
        };
        size.ceil().min(u32::MAX as f64) as u32
    }

    fn check_size(&self, size: u32, n_items: usize) -> SizeCheck {
        let infeasible = SizeCheck {
            placed: 0,
            fit: None,
        };
        let Ok(envelope) = Envelope::from_size(self.shape, size, self.ratio) else {
            return infeasible;
        };
        //reserves which do not fit this envelope make the size infeasible, not the configuration
        let Ok(reserves) = ReserveSet::resolve(self.reserves, &envelope) else {
            return infeasible;
        };
        let placed = self
            .placer
            .place(&envelope, &reserves, n_items, PlacementMode::CapacityCheck)
            .placed;
        SizeCheck {
            placed,
            fit: (placed >= n_items).then_some((envelope, reserves)),
        }
    }

    fn dimensions(&self, size: u32) -> (u32, u32) {
        match self.shape.has_free_ratio() {
            true => (size, (size as f64 / self.ratio).floor() as u32),
            false => (size, size),
        }
    }

    fn interrupted(&self, start: Instant) -> bool {
        let cancelled = self.cancellation_checker.is_some_and(|f| f());
        let out_of_time = self
            .config
            .time_limit_ms
            .is_some_and(|ms| start.elapsed() >= Duration::from_millis(ms));
        cancelled || out_of_time
    }
}
