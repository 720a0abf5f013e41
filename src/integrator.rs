//! Recursive path integrator: one MIS-weighted diffuse bounce, perfect
//! mirror reflection, and Schlick-approximated dielectric
//! refraction, each terminating on `depth == 0` rather than Russian
//! roulette — recursion depth is bounded by the scene's configured
//! `ray_depth` and is safe for the stack at the sizes this renderer runs.

use rand::Rng;
use std::f32::consts::PI;

use crate::math::Color;
use crate::primitive::{MaterialKind, EPS};
use crate::scene::Scene;

pub fn trace<R: Rng + ?Sized>(scene: &Scene, ray: crate::math::Ray, depth: u32, rng: &mut R) -> Color {
    if depth == 0 {
        return Color::zero();
    }

    let Some((hit, idx)) = scene.intersect(ray) else {
        return scene.bg_color;
    };

    let figure = &scene.figures[idx];
    let material = figure.material;
    let x = ray.at(hit.t);
    let n = hit.normal;

    match material.kind {
        MaterialKind::Diffuse => {
            let shading_point = x + n * EPS;
            let d = scene.mixture.sample(rng, shading_point, n);
            if d.dot(n) <= 0.0 {
                return material.emission;
            }
            let pdf = scene.mixture.pdf(shading_point, n, d);
            let next = crate::math::Ray::new(x + d * EPS, d);
            let incoming = trace(scene, next, depth - 1, rng);
            material.emission + material.color.hadamard(incoming) * (d.dot(n) / (PI * pdf))
        }
        MaterialKind::Metallic => {
            let incident = ray.direction.normalize();
            let reflected_dir = incident.reflect(n);
            let next = crate::math::Ray::new(x + reflected_dir * EPS, reflected_dir);
            material.emission + material.color.hadamard(trace(scene, next, depth - 1, rng))
        }
        MaterialKind::Dielectric => {
            let incident = ray.direction.normalize();
            let reflected_dir = incident.reflect(n);
            let reflected = crate::math::Ray::new(x + reflected_dir * EPS, reflected_dir);
            let reflected_color = trace(scene, reflected, depth - 1, rng);

            let (eta1, eta2) = if hit.inside { (material.ior, 1.0) } else { (1.0, material.ior) };
            let l = -incident;
            let cos_theta1 = n.dot(l);
            let sin_theta2 = (eta1 / eta2) * (1.0 - cos_theta1 * cos_theta1).max(0.0).sqrt();
            if sin_theta2.abs() > 1.0 {
                // Total internal reflection.
                return material.emission + reflected_color;
            }

            let r0 = ((eta1 - eta2) / (eta1 + eta2)).powi(2);
            let schlick_r = r0 + (1.0 - r0) * (1.0 - cos_theta1).powi(5);
            if rng.gen::<f32>() < schlick_r {
                return material.emission + reflected_color;
            }

            let cos_theta2 = (1.0 - sin_theta2 * sin_theta2).max(0.0).sqrt();
            let refracted_dir = (-l) * (eta1 / eta2) + n * ((eta1 / eta2) * cos_theta1 - cos_theta2);
            let refracted = crate::math::Ray::new(x + refracted_dir * EPS, refracted_dir);
            let mut refracted_color = trace(scene, refracted, depth - 1, rng);
            if !hit.inside {
                refracted_color = refracted_color.hadamard(material.color);
            }
            material.emission + refracted_color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, Ray, Vec3};
    use crate::primitive::{Material, Primitive};
    use crate::sampling::{FiguresMix, Mix};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn empty_scene(bg: Color) -> Scene {
        Scene {
            figures: Vec::new(),
            bvhable_count: 0,
            bvh: crate::bvh::Bvh::build(&mut [], 0),
            mixture: Mix::new(FiguresMix::build(Vec::new())),
            camera: crate::camera::Camera::default(),
            bg_color: bg,
            ray_depth: 4,
            samples: 1,
            width: 16,
            height: 16,
        }
    }

    #[test]
    fn empty_scene_returns_background() {
        let scene = empty_scene(Color::new(0.2, 0.3, 0.4));
        let mut rng = SmallRng::seed_from_u64(1);
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let c = trace(&scene, ray, 4, &mut rng);
        assert_eq!(c, Color::new(0.2, 0.3, 0.4));
    }

    #[test]
    fn zero_depth_is_black_regardless_of_scene() {
        let scene = empty_scene(Color::ones());
        let mut rng = SmallRng::seed_from_u64(1);
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(trace(&scene, ray, 0, &mut rng), Color::zero());
    }

    #[test]
    fn dielectric_plane_at_grazing_exit_angle_hits_total_internal_reflection() {
        // Planes are never BVH-eligible (the scene partition keeps them in
        // the linearly-scanned trailing range), so this mirrors that: an
        // empty BVH prefix and the plane scanned directly.
        let mut figures = vec![Primitive::plane(
            Vec3::unit_z(),
            Material { kind: MaterialKind::Dielectric, color: Color::ones(), emission: Color::zero(), ior: 1.5 },
        )];
        let bvh = crate::bvh::Bvh::build(&mut figures, 0);
        let scene = Scene {
            figures,
            bvhable_count: 0,
            bvh,
            mixture: Mix::new(FiguresMix::build(Vec::new())),
            camera: crate::camera::Camera::default(),
            bg_color: Color::new(0.7, 0.7, 0.7),
            ray_depth: 4,
            samples: 1,
            width: 16,
            height: 16,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        // Ray starts behind the z=0 plane (inside the denser medium) and
        // approaches it at a shallow angle: mostly-x direction with a
        // small +z component, so cos_theta1 is small. Exiting denser
        // (ior=1.5) to less dense (1.0), sin_theta2 = 1.5*sin_theta1
        // exceeds 1 well before grazing, forcing the TIR branch, which
        // returns before the Schlick/refraction math runs at all — the
        // outcome is deterministic regardless of the RNG draw.
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::new(5.0, 0.0, 1.0));
        let c = trace(&scene, ray, 4, &mut rng);
        // The reflected ray heads back into -z, away from the (infinite,
        // single-sided) plane, so it never hits scene geometry again and
        // the traced color is exactly the background with no tint from
        // `material.color` (that tint only applies to refraction, which
        // TIR never reaches).
        assert_eq!(c, Color::new(0.7, 0.7, 0.7));
    }

    #[test]
    fn metallic_sphere_in_empty_scene_sees_background_after_one_bounce() {
        let mut figures = vec![Primitive::ellipsoid(
            Vec3::splat(1.0),
            Material { kind: MaterialKind::Metallic, color: Color::ones(), emission: Color::zero(), ior: 1.0 },
        )];
        let n = figures.len();
        let bvh = crate::bvh::Bvh::build(&mut figures, n);
        let scene = Scene {
            figures,
            bvhable_count: n,
            bvh,
            mixture: Mix::new(FiguresMix::build(Vec::new())),
            camera: crate::camera::Camera::default(),
            bg_color: Color::new(0.5, 0.5, 0.5),
            ray_depth: 4,
            samples: 1,
            width: 16,
            height: 16,
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let c = trace(&scene, ray, 4, &mut rng);
        assert_eq!(c, Color::new(0.5, 0.5, 0.5));
    }
}
