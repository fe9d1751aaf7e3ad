//! Scene occluders and the ray-intersection capability.
//!
//! The shadow engine never owns or mutates scene geometry. It receives an
//! [`OccluderQuery`] capability and asks it to cast rays; [`SceneIndex`] is
//! the batch tool's implementation, backed by the model's occluder boxes
//! plus the panels themselves (so rows shade each other). An interactive
//! renderer would substitute its own spatial index behind the same trait.
use crate::geometry::Aabb;
use crate::id::define_id_type;
use crate::layout::PanelPlacement;
use crate::panel::{OrientedPanel, PanelSpec};
use glam::DVec3;
use itertools::Itertools;
use std::error::Error;
use std::fmt;

define_id_type! {OccluderID}

/// Any opaque scene mesh with a bounding extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Occluder {
    /// Unique ID for the mesh
    pub id: OccluderID,
    /// World-space bounds of the mesh.
    pub bounds: Aabb,
}

impl Occluder {
    /// The occluder box for a placed panel.
    ///
    /// The box encloses the tilted slab: all eight corners of the panel are
    /// transformed to world space and wrapped in an axis-aligned box.
    pub fn from_panel(
        placement: &PanelPlacement,
        spec: &PanelSpec,
        oriented: &OrientedPanel,
    ) -> Self {
        let rotation = placement.rotation_quat();
        let half = DVec3::new(oriented.along, oriented.across, spec.thickness) / 2.0;
        let corners = [-1.0, 1.0]
            .into_iter()
            .cartesian_product([-1.0, 1.0])
            .cartesian_product([-1.0, 1.0])
            .map(|((sx, sy), sz)| {
                placement.center + rotation * DVec3::new(sx * half.x, sy * half.y, sz * half.z)
            });

        Self {
            id: panel_occluder_id(placement),
            bounds: Aabb::from_points(corners),
        }
    }
}

/// The scene ID under which a placed panel registers as an occluder.
///
/// Cells use this to recognise (and skip) hits on their own panel.
pub fn panel_occluder_id(placement: &PanelPlacement) -> OccluderID {
    OccluderID::from(format!(
        "panel/{}/r{}c{}",
        placement.installation, placement.row, placement.column
    ))
}

/// One intersection returned by a ray query.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// The intersected mesh.
    pub id: OccluderID,
    /// Distance from the ray origin to the intersection, in meters.
    pub distance: f64,
    /// Bounding extent of the intersected mesh along each axis.
    pub extent: DVec3,
}

/// Indicates that the scene cannot answer a ray query.
///
/// A transient condition (e.g. the scene is still being built), handled by
/// skipping the affected cell's update for the tick rather than failing the
/// run.
#[derive(Debug, Clone)]
pub struct OcclusionQueryUnavailable {
    message: String,
}

impl OcclusionQueryUnavailable {
    /// Create an error with the given reason.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for OcclusionQueryUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Occlusion query unavailable: {}", self.message)
    }
}

impl Error for OcclusionQueryUnavailable {}

/// The ray-intersection capability the shadow engine samples against.
pub trait OccluderQuery {
    /// Cast a ray and return intersections ordered by distance.
    fn cast_ray(
        &self,
        origin: DVec3,
        direction: DVec3,
    ) -> Result<Vec<RayHit>, OcclusionQueryUnavailable>;
}

/// A ray-queryable index over a fixed set of occluder boxes.
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    occluders: Vec<Occluder>,
}

impl SceneIndex {
    /// Build an index over the given occluders.
    pub fn new(occluders: Vec<Occluder>) -> Self {
        Self { occluders }
    }

    /// Number of occluders in the index.
    pub fn len(&self) -> usize {
        self.occluders.len()
    }

    /// Whether the index holds no occluders.
    pub fn is_empty(&self) -> bool {
        self.occluders.is_empty()
    }
}

impl OccluderQuery for SceneIndex {
    fn cast_ray(
        &self,
        origin: DVec3,
        direction: DVec3,
    ) -> Result<Vec<RayHit>, OcclusionQueryUnavailable> {
        let mut hits: Vec<_> = self
            .occluders
            .iter()
            .filter_map(|occluder| {
                let distance = occluder.bounds.ray_distance(origin, direction)?;
                Some(RayHit {
                    id: occluder.id.clone(),
                    distance,
                    extent: occluder.bounds.size(),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(hits)
    }
}
