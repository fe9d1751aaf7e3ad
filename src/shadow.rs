//! Per-cell shadow occlusion sampling.
//!
//! Each sampling tick evaluates every cell afresh against the current sun
//! direction and scene geometry: five visibility rays per cell, a graduated
//! intensity from the blocked count, and a discrete bucket for stable
//! display. No state carries between ticks beyond the previously computed
//! intensity, which is only used when a query is unavailable. Sampling
//! never feeds on its own output, so cells are independent and the pass is
//! safe to parallelise if throughput ever requires it.
use crate::layout::SolarCell;
use crate::scene::{OccluderQuery, OcclusionQueryUnavailable, RayHit};
use crate::sun::SunVector;
use anyhow::{Result, ensure};
use log::debug;
use strum::{Display, EnumIter};

/// Hits closer to a sample point than this are self-intersection noise.
pub const SELF_INTERSECTION_EPSILON: f64 = 0.05;

/// Hits beyond this range cannot cast a meaningful shadow on the roof.
pub const MAX_OCCLUSION_RANGE: f64 = 500.0;

/// Minimum bounding extent, in at least one dimension, for a mesh to count
/// as a blocker. Filters out incidental thin geometry.
pub const MIN_BLOCKER_EXTENT: f64 = 0.3;

/// Sample points per cell: four corners and the center.
pub const SAMPLES_PER_CELL: usize = 5;

/// The discrete shadow classification shown to the user.
///
/// Intensity is bucketed at fixed thresholds so the display reads coarse
/// but stable instead of flickering with continuous values. Colors run
/// from warm amber to deep red; overlay opacity decreases monotonically as
/// intensity rises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ShadeBucket {
    /// No sample blocked.
    Unshaded,
    /// Up to 20 % of samples blocked.
    Faint,
    /// Up to 40 % blocked.
    Light,
    /// Up to 60 % blocked.
    Moderate,
    /// Up to 80 % blocked.
    Heavy,
    /// More than 80 % blocked.
    Full,
}

impl ShadeBucket {
    /// Classify an intensity in [0, 1].
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity <= 0.0 {
            Self::Unshaded
        } else if intensity <= 0.2 {
            Self::Faint
        } else if intensity <= 0.4 {
            Self::Light
        } else if intensity <= 0.6 {
            Self::Moderate
        } else if intensity <= 0.8 {
            Self::Heavy
        } else {
            Self::Full
        }
    }

    /// Display color for cells in this bucket.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Unshaded => "#ffffff",
            Self::Faint => "#fcbf49",
            Self::Light => "#f77f00",
            Self::Moderate => "#d62828",
            Self::Heavy => "#9d0208",
            Self::Full => "#370617",
        }
    }

    /// Display opacity, decreasing monotonically with intensity.
    pub fn opacity(&self) -> f64 {
        match self {
            Self::Unshaded => 1.0,
            Self::Faint => 0.9,
            Self::Light => 0.75,
            Self::Moderate => 0.6,
            Self::Heavy => 0.45,
            Self::Full => 0.3,
        }
    }
}

/// The shade computed for one cell on one sampling tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellShade {
    /// Fraction of sample points blocked from the sun, in [0, 1].
    pub intensity: f64,
    /// The intensity's display bucket.
    pub bucket: ShadeBucket,
}

impl CellShade {
    /// The shade of a fully sunlit cell.
    pub fn unshaded() -> Self {
        Self {
            intensity: 0.0,
            bucket: ShadeBucket::Unshaded,
        }
    }
}

impl Default for CellShade {
    fn default() -> Self {
        Self::unshaded()
    }
}

/// Decides which ticks re-sample occlusion.
///
/// Ray queries against the full scene are the dominant cost of the engine,
/// so sampling runs once every `interval` ticks instead of every tick,
/// trading shadow-update latency for frame-rate stability. The tick counter
/// is passed in explicitly so the scheduler stays decoupled from any
/// particular render-loop API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingScheduler {
    interval: u64,
}

impl SamplingScheduler {
    /// Create a scheduler that samples every `interval` ticks.
    pub fn new(interval: u64) -> Result<Self> {
        ensure!(interval >= 1, "Sampling interval must be at least 1");
        Ok(Self { interval })
    }

    /// Whether the given tick is a sampling tick.
    pub fn is_due(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }
}

/// Whether a hit blocks the sun from the given cell.
fn is_blocker(cell: &SolarCell, hit: &RayHit) -> bool {
    hit.id != cell.panel_ref
        && hit.distance > SELF_INTERSECTION_EPSILON
        && hit.distance < MAX_OCCLUSION_RANGE
        && hit.extent.max_element() > MIN_BLOCKER_EXTENT
}

/// Sample one cell's occlusion against the current sun direction.
///
/// Casts a ray from each of the cell's five sample points toward the sun's
/// world position (effectively parallel rays, since the sun is modelled at
/// a fixed large distance) and counts the points whose ray meets a blocker.
/// When the sun's raw altitude is at or below the horizon, sampling is
/// skipped entirely and the cell is unshaded; there are no shadows without
/// light.
pub fn sample_cell(
    cell: &SolarCell,
    sun: &SunVector,
    query: &impl OccluderQuery,
) -> Result<CellShade, OcclusionQueryUnavailable> {
    if !sun.is_daylight() {
        return Ok(CellShade::unshaded());
    }

    let sun_point = sun.world_position();
    let mut blocked = 0;
    for point in cell.sample_points() {
        let direction = (sun_point - point).normalize();
        let hits = query.cast_ray(point, direction)?;
        if hits.iter().any(|hit| is_blocker(cell, hit)) {
            blocked += 1;
        }
    }

    let intensity = blocked as f64 / SAMPLES_PER_CELL as f64;
    Ok(CellShade {
        intensity,
        bucket: ShadeBucket::from_intensity(intensity),
    })
}

/// Sample every cell for one tick, updating `shades` in place.
///
/// A cell whose query is unavailable keeps its previous shade for the tick;
/// the condition is logged and never interrupts the pass.
///
/// # Panics
///
/// Panics if `shades` is shorter than `cells`.
pub fn sample_cells(
    cells: &[SolarCell],
    sun: &SunVector,
    query: &impl OccluderQuery,
    shades: &mut [CellShade],
) {
    assert!(shades.len() >= cells.len());

    for (cell, shade) in cells.iter().zip(shades.iter_mut()) {
        match sample_cell(cell, sun, query) {
            Ok(fresh) => *shade = fresh,
            Err(err) => {
                debug!(
                    "Keeping previous shade for a cell of installation {}: {err}",
                    cell.installation
                );
            }
        }
    }
}
