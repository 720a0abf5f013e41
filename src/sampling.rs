//! Light and hemisphere sampling distributions, used by the path
//! integrator's multiple-importance-sampled diffuse bounce.
//!
//! Every distribution answers two questions at a shading point `x` with
//! outward normal `n`: which direction to scatter into (`sample`), and
//! how likely a given direction was (`pdf`) — the second is what lets
//! the integrator combine a BSDF-side and a light-side estimator without
//! bias.

use rand::Rng;
use rand_distr::StandardNormal;
use std::f32::consts::PI;

use crate::bvh::Bvh;
use crate::math::{Point3, Ray, Vec3};
use crate::primitive::{Primitive, PrimitiveKind, EPS};

fn gaussian_vec3<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.sample(StandardNormal), rng.sample(StandardNormal), rng.sample(StandardNormal))
}

/// Cosine-weighted hemisphere sampling — the BSDF side of the diffuse
/// mixture.
pub struct Cosine;

impl Cosine {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, n: Vec3) -> Vec3 {
        let d = gaussian_vec3(rng).normalize() + n;
        let len = d.length();
        if len <= 1e-4 || d.dot(n) <= 1e-4 || len.is_nan() {
            // Precision can collapse the candidate onto -n; the normal
            // itself is always a valid, if biased, fallback.
            return n;
        }
        d / len
    }

    pub fn pdf(n: Vec3, d: Vec3) -> f32 {
        d.dot(n).max(0.0) / PI
    }
}

/// Surface-uniform sampling over one emissive BOX primitive.
pub struct BoxLight {
    figure: Primitive,
    half_extents: Vec3,
    surface_area: f32,
    face_weights: Vec3,
}

impl BoxLight {
    pub fn new(figure: Primitive) -> Self {
        let s = figure.data;
        let surface_area = 8.0 * (s.y * s.z + s.x * s.z + s.x * s.y);
        let face_weights = Vec3::new(s.y * s.z, s.x * s.z, s.x * s.y);
        Self { figure, half_extents: s, surface_area, face_weights }
    }

    /// Rejection-samples a face point and re-tests against the box
    /// itself so a grazing direction from a concave corner can't return
    /// a point that the ray wouldn't actually reach.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3) -> Vec3 {
        let s = self.half_extents;
        let w = self.face_weights;
        loop {
            let u = rng.gen::<f32>() * (w.x + w.y + w.z);
            let flip = if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 };
            let point = if u < w.x {
                Vec3::new(flip * s.x, (2.0 * rng.gen::<f32>() - 1.0) * s.y, (2.0 * rng.gen::<f32>() - 1.0) * s.z)
            } else if u < w.x + w.y {
                Vec3::new((2.0 * rng.gen::<f32>() - 1.0) * s.x, flip * s.y, (2.0 * rng.gen::<f32>() - 1.0) * s.z)
            } else {
                Vec3::new((2.0 * rng.gen::<f32>() - 1.0) * s.x, (2.0 * rng.gen::<f32>() - 1.0) * s.y, flip * s.z)
            };

            let world = self.figure.rotation.rotate_point(point) + self.figure.position;
            let dir = (world - x).normalize();
            if self.figure.intersect(Ray::new(x, dir)).is_some() {
                return dir;
            }
        }
    }

    pub fn pdf_one(&self, x: Point3, d: Vec3, y: Point3, y_normal: Vec3) -> f32 {
        (x - y).length_squared() / (self.surface_area * d.dot(y_normal).abs())
    }
}

/// Barycentric-uniform sampling over one emissive TRIANGLE primitive.
pub struct TriangleLight {
    figure: Primitive,
    point_prob: f32,
}

impl TriangleLight {
    pub fn new(figure: Primitive) -> Self {
        let a = figure.data3;
        let b = figure.data - a;
        let c = figure.data2 - a;
        // Same cross-product order as the intersection routine, so the
        // area computed here matches the triangle that routine actually
        // bounds.
        let n = c.cross(b);
        let area_world = 0.5 * n.length();
        Self { figure, point_prob: 1.0 / area_world }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3) -> Vec3 {
        let a = self.figure.data3;
        let b = self.figure.data - a;
        let c = self.figure.data2 - a;
        let (mut u, mut v) = (rng.gen::<f32>(), rng.gen::<f32>());
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let local = a + b * u + c * v;
        let world = self.figure.rotation.rotate_point(local) + self.figure.position;
        (world - x).normalize()
    }

    pub fn pdf_one(&self, x: Point3, d: Vec3, y: Point3, y_normal: Vec3) -> f32 {
        self.point_prob * (x - y).length_squared() / d.dot(y_normal).abs()
    }
}

/// Solid-angle-uniform-in-parameter sampling over one emissive ELLIPSOID.
pub struct EllipsoidLight {
    figure: Primitive,
}

impl EllipsoidLight {
    pub fn new(figure: Primitive) -> Self {
        Self { figure }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3) -> Vec3 {
        let r = self.figure.data;
        loop {
            let point = r.hadamard(gaussian_vec3(rng).normalize());
            let world = self.figure.rotation.rotate_point(point) + self.figure.position;
            let dir = (world - x).normalize();
            if self.figure.intersect(Ray::new(x, dir)).is_some() {
                return dir;
            }
        }
    }

    pub fn pdf_one(&self, x: Point3, d: Vec3, y: Point3, y_normal: Vec3) -> f32 {
        let r = self.figure.data;
        let local_n = self.figure.rotation.conj().rotate_point(y - self.figure.position).component_div(r);
        let jacobian = Vec3::new(local_n.x * r.y * r.z, r.x * local_n.y * r.z, r.x * r.y * local_n.z);
        let point_prob = 1.0 / (4.0 * PI * jacobian.length());
        point_prob * (x - y).length_squared() / d.dot(y_normal).abs()
    }
}

enum FigureLight {
    Box(BoxLight),
    Ellipsoid(EllipsoidLight),
    Triangle(TriangleLight),
}

impl FigureLight {
    fn build(figure: Primitive) -> Self {
        match figure.kind {
            PrimitiveKind::Box => FigureLight::Box(BoxLight::new(figure)),
            PrimitiveKind::Ellipsoid => FigureLight::Ellipsoid(EllipsoidLight::new(figure)),
            _ => FigureLight::Triangle(TriangleLight::new(figure)),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3) -> Vec3 {
        match self {
            FigureLight::Box(b) => b.sample(rng, x),
            FigureLight::Ellipsoid(e) => e.sample(rng, x),
            FigureLight::Triangle(t) => t.sample(rng, x),
        }
    }

    fn pdf_one(&self, x: Point3, d: Vec3, y: Point3, y_normal: Vec3) -> f32 {
        match self {
            FigureLight::Box(b) => b.pdf_one(x, d, y, y_normal),
            FigureLight::Ellipsoid(e) => e.pdf_one(x, d, y, y_normal),
            FigureLight::Triangle(t) => t.pdf_one(x, d, y, y_normal),
        }
    }

    fn is_triangle(&self) -> bool {
        matches!(self, FigureLight::Triangle(_))
    }
}

/// Uniform mixture over every emissive BOX/ELLIPSOID/TRIANGLE in the
/// scene, accelerated by its own BVH so `pdf` doesn't have to test every
/// emitter for every shading point.
pub struct FiguresMix {
    figures: Vec<Primitive>,
    lights: Vec<FigureLight>,
    bvh: Bvh,
}

impl FiguresMix {
    /// `emissive` must already be filtered to `emission != 0` primitives
    /// of an emitting kind; the scene loader owns that partition.
    pub fn build(mut emissive: Vec<Primitive>) -> Self {
        let n = emissive.len();
        let bvh = Bvh::build(&mut emissive, n);
        let lights = emissive.iter().copied().map(FigureLight::build).collect();
        Self { figures: emissive, lights, bvh }
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3) -> Vec3 {
        let i = ((rng.gen::<f32>() * self.lights.len() as f32) as usize).min(self.lights.len() - 1);
        self.lights[i].sample(rng, x)
    }

    pub fn pdf(&self, x: Point3, d: Vec3) -> f32 {
        let ray = Ray::new(x, d);
        let mut total = 0.0f32;
        self.bvh.visit_leaves_on_ray(ray, |first, last| {
            for i in first..last {
                total += self.pdf_one_figure(i, x, d);
            }
        });
        total / self.lights.len() as f32
    }

    /// Sums the single-sample PDF over every intersection of `ray(x, d)`
    /// with emitter `i` — two for box/ellipsoid (entry and exit), one for
    /// a triangle, since those are the primitives a ray can pierce twice.
    fn pdf_one_figure(&self, i: usize, x: Point3, d: Vec3) -> f32 {
        let figure = &self.figures[i];
        let light = &self.lights[i];
        let Some(hit) = figure.intersect(Ray::new(x, d)) else {
            return 0.0;
        };
        if hit.t.is_nan() {
            return f32::INFINITY;
        }
        let y = x + d * hit.t;
        let mut total = light.pdf_one(x, d, y, hit.normal);

        if light.is_triangle() {
            return total;
        }

        let second_origin = x + d * (hit.t + EPS);
        if let Some(hit2) = figure.intersect(Ray::new(second_origin, d)) {
            let y2 = x + d * (hit.t + EPS + hit2.t);
            total += light.pdf_one(x, d, y2, hit2.normal);
        }
        total
    }
}

/// Equal-weight mixture of cosine-hemisphere and light sampling. Degrades
/// to pure cosine sampling when the scene has no emitters, rather than
/// dividing by a zero-length component list.
pub struct Mix {
    lights: Option<FiguresMix>,
}

impl Mix {
    pub fn new(lights: FiguresMix) -> Self {
        Self { lights: if lights.is_empty() { None } else { Some(lights) } }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: Point3, n: Vec3) -> Vec3 {
        match &self.lights {
            None => Cosine::sample(rng, n),
            Some(lights) => {
                if rng.gen::<f32>() < 0.5 {
                    Cosine::sample(rng, n)
                } else {
                    lights.sample(rng, x)
                }
            }
        }
    }

    pub fn pdf(&self, x: Point3, n: Vec3, d: Vec3) -> f32 {
        match &self.lights {
            None => Cosine::pdf(n, d),
            Some(lights) => 0.5 * (Cosine::pdf(n, d) + lights.pdf(x, d)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Material;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn cosine_sample_stays_in_hemisphere() {
        let mut rng = SmallRng::seed_from_u64(1);
        let n = Vec3::unit_y();
        for _ in 0..256 {
            let d = Cosine::sample(&mut rng, n);
            assert!(d.dot(n) >= -1e-4);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cosine_pdf_is_nonnegative_and_zero_below_horizon() {
        let n = Vec3::unit_y();
        assert!(Cosine::pdf(n, Vec3::unit_y()) > 0.0);
        assert_eq!(Cosine::pdf(n, -Vec3::unit_y()), 0.0);
    }

    #[test]
    fn figures_mix_is_empty_without_emitters() {
        let mix = FiguresMix::build(Vec::new());
        assert!(mix.is_empty());
    }

    #[test]
    fn box_light_sample_points_land_on_the_box_surface() {
        let mut p = Primitive::boxy(Vec3::splat(1.0), Material::diffuse(Vec3::ones()));
        p.position = Vec3::new(0.0, 5.0, 0.0);
        let light = BoxLight::new(p);
        let mut rng = SmallRng::seed_from_u64(7);
        let x = Point3::zero();
        for _ in 0..32 {
            let d = light.sample(&mut rng, x);
            assert!((d.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn mix_falls_back_to_cosine_when_scene_has_no_lights() {
        let mix = Mix::new(FiguresMix::build(Vec::new()));
        let mut rng = SmallRng::seed_from_u64(3);
        let n = Vec3::unit_y();
        let d = mix.sample(&mut rng, Point3::zero(), n);
        assert!(d.dot(n) >= -1e-4);
    }
}
