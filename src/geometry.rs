//! Shared geometry primitives for placement and occlusion queries.
//!
//! All placement math in this crate is expressed in *edge coordinates*:
//! distances measured from a fixed reference edge, which is how installers
//! specify offsets on a roof plan. [`edge_to_center`] is the single
//! conversion from edge coordinates to the center coordinates consumed by
//! the renderer-facing placements. Any inline "edge + half dimension"
//! re-derivation elsewhere is a bug.
//!
//! The world frame is right-handed with x = east, y = north, z = up, in
//! meters.
use glam::DVec3;

/// Convert an edge coordinate to a center coordinate along one axis.
pub fn edge_to_center(edge: f64, dimension: f64) -> f64 {
    edge + dimension / 2.0
}

/// Convert per-axis edge coordinates of a box to its center point.
pub fn edge_to_center_point(edge: DVec3, dimensions: DVec3) -> DVec3 {
    DVec3::new(
        edge_to_center(edge.x, dimensions.x),
        edge_to_center(edge.y, dimensions.y),
        edge_to_center(edge.z, dimensions.z),
    )
}

/// An axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Corner with the smallest coordinate on every axis.
    pub min: DVec3,
    /// Corner with the largest coordinate on every axis.
    pub max: DVec3,
}

impl Aabb {
    /// Create a box from its center point and full size along each axis.
    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Create the tightest box enclosing all of `points`.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut min = DVec3::splat(f64::INFINITY);
        let mut max = DVec3::splat(f64::NEG_INFINITY);
        for point in points {
            min = min.min(point);
            max = max.max(point);
        }
        Self { min, max }
    }

    /// Full size of the box along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Distance along `direction` from `origin` to this box, if the ray
    /// hits it.
    ///
    /// Slab method. An origin inside the box reports the distance to the
    /// exit face, so enclosing geometry still registers as a hit.
    pub fn ray_distance(&self, origin: DVec3, direction: DVec3) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-12 {
                // Ray parallel to this slab; miss unless the origin lies within it
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_far < t_near.max(0.0) {
            return None;
        }

        Some(if t_near > 0.0 { t_near } else { t_far })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_edge_to_center() {
        assert_approx_eq!(f64, edge_to_center(0.0, 2.0), 1.0);
        assert_approx_eq!(f64, edge_to_center(3.5, 1.0), 4.0);
    }

    #[test]
    fn test_edge_to_center_point() {
        let center = edge_to_center_point(DVec3::new(1.0, 2.0, 0.0), DVec3::new(2.0, 4.0, 1.0));
        assert_eq!(center, DVec3::new(2.0, 4.0, 0.5));
    }

    #[test]
    fn test_ray_hits_box_ahead() {
        let bounds = Aabb::from_center_size(DVec3::new(0.0, 10.0, 0.0), DVec3::splat(2.0));
        let distance = bounds
            .ray_distance(DVec3::ZERO, DVec3::Y)
            .expect("ray should hit the box");
        assert_approx_eq!(f64, distance, 9.0);
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let bounds = Aabb::from_center_size(DVec3::new(0.0, -10.0, 0.0), DVec3::splat(2.0));
        assert!(bounds.ray_distance(DVec3::ZERO, DVec3::Y).is_none());
    }

    #[test]
    fn test_ray_misses_box_to_the_side() {
        let bounds = Aabb::from_center_size(DVec3::new(5.0, 10.0, 0.0), DVec3::splat(2.0));
        assert!(bounds.ray_distance(DVec3::ZERO, DVec3::Y).is_none());
    }

    #[test]
    fn test_ray_from_inside_reports_exit_distance() {
        let bounds = Aabb::from_center_size(DVec3::ZERO, DVec3::splat(4.0));
        let distance = bounds
            .ray_distance(DVec3::ZERO, DVec3::Z)
            .expect("ray from inside should hit the exit face");
        assert_approx_eq!(f64, distance, 2.0);
    }

    #[test]
    fn test_ray_parallel_to_slab_inside() {
        let bounds = Aabb::from_center_size(DVec3::new(0.0, 5.0, 0.0), DVec3::splat(2.0));
        // Ray along y at x=0, z=0, which is inside the x and z slabs
        assert!(bounds.ray_distance(DVec3::ZERO, DVec3::Y).is_some());
        // Same ray shifted out of the x slab
        assert!(
            bounds
                .ray_distance(DVec3::new(3.0, 0.0, 0.0), DVec3::Y)
                .is_none()
        );
    }

    #[test]
    fn test_from_points_encloses_all() {
        let bounds = Aabb::from_points([
            DVec3::new(1.0, -2.0, 0.5),
            DVec3::new(-1.0, 4.0, 0.0),
            DVec3::new(0.0, 0.0, 3.0),
        ]);
        assert_eq!(bounds.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, DVec3::new(1.0, 4.0, 3.0));
    }
}
