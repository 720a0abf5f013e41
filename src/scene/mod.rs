//! Scene representation and the two supported loaders: the line-oriented
//! text format and a glTF 2.0 subset.

pub mod gltf_loader;
pub mod text;

use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::math::{Color, Ray};
use crate::primitive::{Intersection, Primitive, PrimitiveKind};
use crate::sampling::{FiguresMix, Mix};

/// A fully loaded, render-ready scene: primitives partitioned so that
/// `[0, bvhable_count)` is covered by `bvh` and `[bvhable_count, len)`
/// holds the (unbounded) planes, scanned linearly on every query.
pub struct Scene {
    pub figures: Vec<Primitive>,
    pub bvhable_count: usize,
    pub bvh: Bvh,
    pub mixture: Mix,
    pub camera: Camera,
    pub bg_color: Color,
    pub ray_depth: u32,
    pub samples: u32,
    pub width: u32,
    pub height: u32,
}

impl Scene {
    /// Partitions `figures` so planes trail the BVH-eligible prefix,
    /// builds the primitive BVH over that prefix, and derives the light
    /// mixture distribution from whichever of those primitives emit.
    pub fn build(
        figures: Vec<Primitive>,
        camera: Camera,
        bg_color: Color,
        ray_depth: u32,
        samples: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let (mut bvhable, planes): (Vec<Primitive>, Vec<Primitive>) =
            figures.into_iter().partition(|f| !matches!(f.kind, PrimitiveKind::Plane));
        let bvhable_count = bvhable.len();
        bvhable.extend(planes);
        let mut figures = bvhable;

        let bvh = Bvh::build(&mut figures, bvhable_count);

        let emissive: Vec<Primitive> = figures[..bvhable_count].iter().filter(|f| f.is_emissive()).copied().collect();
        let mixture = Mix::new(FiguresMix::build(emissive));

        Self { figures, bvhable_count, bvh, mixture, camera, bg_color, ray_depth, samples, width, height }
    }

    /// Scene-level intersect: linear scan the planes first to seed a
    /// best-so-far distance, then let the BVH prune against it.
    pub fn intersect(&self, ray: Ray) -> Option<(Intersection, usize)> {
        let mut best: Option<(Intersection, usize)> = None;
        for i in self.bvhable_count..self.figures.len() {
            if let Some(hit) = self.figures[i].intersect(ray) {
                if best.map_or(true, |(b, _)| hit.t < b.t) {
                    best = Some((hit, i));
                }
            }
        }
        let seed = best.map(|(h, _)| h.t);
        if let Some((hit, idx)) = self.bvh.intersect(&self.figures, ray, seed) {
            if best.map_or(true, |(b, _)| hit.t < b.t) {
                best = Some((hit, idx));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vec3};
    use crate::primitive::Material;

    #[test]
    fn planes_trail_bvhable_primitives_after_build() {
        let figures = vec![
            Primitive::plane(Vec3::unit_y(), Material::diffuse(Color::ones())),
            Primitive::ellipsoid(Vec3::splat(1.0), Material::diffuse(Color::ones())),
            Primitive::plane(Vec3::unit_x(), Material::diffuse(Color::ones())),
        ];
        let scene = Scene::build(figures, Camera::default(), Color::zero(), 4, 1, 16, 16);
        assert_eq!(scene.bvhable_count, 1);
        assert_eq!(scene.figures.len(), 3);
        assert_eq!(scene.figures[0].kind, PrimitiveKind::Ellipsoid);
    }

    #[test]
    fn scene_intersect_prefers_closer_of_plane_and_bvh_hit() {
        let figures = vec![
            Primitive::plane(Vec3::unit_y(), Material::diffuse(Color::ones())),
            {
                let mut e = Primitive::ellipsoid(Vec3::splat(1.0), Material::diffuse(Color::ones()));
                e.position = Point3::new(0.0, 5.0, 0.0);
                e
            },
        ];
        let scene = Scene::build(figures, Camera::default(), Color::zero(), 4, 1, 16, 16);
        let ray = crate::math::Ray::new(Point3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let (hit, _) = scene.intersect(ray).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-3);
    }
}
