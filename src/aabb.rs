//! Axis-aligned bounding boxes, used by the BVH build for SAH partitioning
//! and by each node for traversal culling.

use crate::math::{Point3, Ray, Vec3};
use crate::primitive::{intersect_box, Primitive, PrimitiveKind};

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) }
    }

    /// Builds the world-space AABB of a primitive by bounding it in local
    /// space (box/ellipsoid: `[-data, data]`; triangle: the vertex
    /// extents) and then rotating all eight corners of that local box out
    /// to world space, extending to fit each. Rotating corners rather
    /// than transforming the box diagonal is what makes this correct for
    /// a primitive under an arbitrary orientation, not just axis swaps.
    ///
    /// Planes have no finite bound and are never called through this path
    /// — the scene keeps planes out of the BVH entirely.
    pub fn from_primitive(fig: &Primitive) -> Self {
        let (local_min, local_max) = match fig.kind {
            PrimitiveKind::Box | PrimitiveKind::Ellipsoid => (-fig.data, fig.data),
            PrimitiveKind::Triangle => {
                let (a, b, c) = (fig.data3, fig.data2, fig.data);
                (
                    Vec3::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y), a.z.min(b.z).min(c.z)),
                    Vec3::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y), a.z.max(b.z).max(c.z)),
                )
            }
            PrimitiveKind::Plane => (Vec3::zero(), Vec3::zero()),
        };

        let corners = [
            Vec3::new(local_min.x, local_min.y, local_min.z),
            Vec3::new(local_min.x, local_min.y, local_max.z),
            Vec3::new(local_min.x, local_max.y, local_min.z),
            Vec3::new(local_min.x, local_max.y, local_max.z),
            Vec3::new(local_max.x, local_min.y, local_min.z),
            Vec3::new(local_max.x, local_min.y, local_max.z),
            Vec3::new(local_max.x, local_max.y, local_min.z),
            Vec3::new(local_max.x, local_max.y, local_max.z),
        ];

        let mut out = Self::empty();
        for &corner in &corners {
            out.extend_point(fig.rotation.rotate_point(corner) + fig.position);
        }
        out
    }

    pub fn extend_point(&mut self, p: Point3) {
        self.max = self.max.max_elem(p);
        self.min = self.min.min_elem(p);
    }

    pub fn extend(&mut self, other: &Self) {
        self.extend_point(other.min);
        self.extend_point(other.max);
    }

    pub fn union(a: &Self, b: &Self) -> Self {
        let mut out = *a;
        out.extend(b);
        out
    }

    pub fn area(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn centroid(&self) -> Point3 {
        (self.min + self.max) * 0.5
    }

    /// Slab test re-centered on the box midpoint, reusing the same
    /// intersection routine a BOX primitive uses; only the hit distance
    /// matters here, not the surface normal.
    pub fn intersect(&self, ray: Ray) -> Option<f32> {
        let half_extents = (self.max - self.min) * 0.5;
        let center = (self.min + self.max) * 0.5;
        let local = Ray::new(ray.origin - center, ray.direction);
        intersect_box(half_extents, local, false).map(|hit| hit.t)
    }
}
