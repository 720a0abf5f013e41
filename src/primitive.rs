//! Primitive intersection: a tagged union over {Plane, Box, Ellipsoid,
//! Triangle}, each placed by a rigid-body transform (position + quaternion
//! rotation) rather than virtual dispatch over a primitive base class —
//! one flat record plus a `match` in `intersect` keeps every primitive the
//! same size and lets the BVH and scene arrays store them by value.

use crate::math::{Color, Point3, Quat, Ray, Vec3};

/// Self-intersection / light-leak epsilon shared by the whole renderer.
/// Too small and floating point error produces acne; too large and thin
/// gaps under-sample direct light.
pub const EPS: f32 = 1e-4;

/// Plane intersection acceptance bound — planes are conceptually
/// infinite, but `t` is capped so they behave like any other finite hit.
const T_MAX: f32 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Diffuse,
    Metallic,
    Dielectric,
}

#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    pub emission: Color,
    pub ior: f32,
}

impl Material {
    pub fn diffuse(color: Color) -> Self {
        Self { kind: MaterialKind::Diffuse, color, emission: Color::zero(), ior: 1.0 }
    }

    /// Maps the glTF/text `(alpha, metallic_factor)` pair to a material
    /// kind: `alpha<1 => DIELECTRIC; else metallicFactor>0 => METALLIC;
    /// else DIFFUSE`. Alpha takes priority over the metallic factor even
    /// though that ordering looks backwards at a glance.
    pub fn from_alpha_metallic(color: Color, emission: Color, alpha: f32, metallic_factor: f32, ior: f32) -> Self {
        let kind = if alpha < 1.0 {
            MaterialKind::Dielectric
        } else if metallic_factor > 0.0 {
            MaterialKind::Metallic
        } else {
            MaterialKind::Diffuse
        };
        Self { kind, color, emission, ior }
    }

    pub fn is_emissive(&self) -> bool {
        !self.emission.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Plane,
    Box,
    Ellipsoid,
    Triangle,
}

/// A ray/surface intersection. `t` is the ray parameter in world
/// coordinates; `normal` is unit-length in world space; `inside` is true
/// when the ray originated inside a closed primitive.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    pub t: f32,
    pub normal: Vec3,
    pub inside: bool,
}

/// A tagged-union primitive. `data`/`data2`/`data3` carry type-dependent
/// local-space payload (see field docs on each constructor) rather than
/// per-variant structs, so the BVH and scene figure arrays can hold these
/// by value in a flat `Vec`.
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub position: Point3,
    pub rotation: Quat,
    pub material: Material,
    /// PLANE: local-space unit normal. BOX: half-extents. ELLIPSOID:
    /// semi-axes. TRIANGLE: vertex C.
    pub data: Vec3,
    /// TRIANGLE: vertex B. Unused by other kinds.
    pub data2: Vec3,
    /// TRIANGLE: vertex A. Unused by other kinds.
    pub data3: Vec3,
}

impl Primitive {
    pub fn plane(normal: Vec3, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Plane,
            position: Point3::zero(),
            rotation: Quat::identity(),
            material,
            data: normal,
            data2: Vec3::zero(),
            data3: Vec3::zero(),
        }
    }

    pub fn boxy(half_extents: Vec3, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Box,
            position: Point3::zero(),
            rotation: Quat::identity(),
            material,
            data: half_extents,
            data2: Vec3::zero(),
            data3: Vec3::zero(),
        }
    }

    pub fn ellipsoid(semi_axes: Vec3, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Ellipsoid,
            position: Point3::zero(),
            rotation: Quat::identity(),
            material,
            data: semi_axes,
            data2: Vec3::zero(),
            data3: Vec3::zero(),
        }
    }

    pub fn triangle(a: Point3, b: Point3, c: Point3, material: Material) -> Self {
        Self {
            kind: PrimitiveKind::Triangle,
            position: Point3::zero(),
            rotation: Quat::identity(),
            material,
            data: c,
            data2: b,
            data3: a,
        }
    }

    #[inline]
    pub fn is_emissive(&self) -> bool {
        matches!(self.kind, PrimitiveKind::Box | PrimitiveKind::Ellipsoid | PrimitiveKind::Triangle)
            && self.material.is_emissive()
    }

    /// Transforms a world-space ray into this primitive's local frame:
    /// `o' = conj(rotation) * (o - position)`, `d' = conj(rotation) * d`.
    fn to_local(&self, ray: Ray) -> Ray {
        let inv = self.rotation.conj();
        Ray::new(inv.rotate_point(ray.origin - self.position), inv.rotate_point(ray.direction))
    }

    pub fn intersect(&self, ray: Ray) -> Option<Intersection> {
        let local = self.to_local(ray);
        let hit = match self.kind {
            PrimitiveKind::Plane => intersect_plane(self.data, local),
            PrimitiveKind::Box => intersect_box(self.data, local, true),
            PrimitiveKind::Ellipsoid => intersect_ellipsoid(self.data, local),
            PrimitiveKind::Triangle => intersect_triangle(self.data3, self.data2, self.data, local),
        }?;
        let world_normal = self.rotation.rotate_point(hit.normal).normalize();
        Some(Intersection { t: hit.t, normal: world_normal, inside: hit.inside })
    }
}

fn intersect_plane(n: Vec3, ray: Ray) -> Option<Intersection> {
    let denom = ray.direction.dot(n);
    let t = -ray.origin.dot(n) / denom;
    if !(t > 0.0 && t < T_MAX) {
        return None;
    }
    if denom > 0.0 {
        Some(Intersection { t, normal: -n, inside: true })
    } else {
        Some(Intersection { t, normal: n, inside: false })
    }
}

/// Slab test against a box with half-extents `s` centered at the origin.
/// `require_normal` is false for the AABB reuse in aabb.rs, which only
/// needs the hit distance.
pub(crate) fn intersect_box(s: Vec3, ray: Ray, require_normal: bool) -> Option<Intersection> {
    let t1 = (-s - ray.origin).component_div(ray.direction);
    let t2 = (s - ray.origin).component_div(ray.direction);
    let tmin = t1.min_elem(t2);
    let tmax = t1.max_elem(t2);
    let tnear = tmin.x.max(tmin.y).max(tmin.z);
    let tfar = tmax.x.min(tmax.y).min(tmax.z);
    if tnear > tfar || tfar < 0.0 {
        return None;
    }

    let (t, inside) = if tnear < 0.0 { (tfar, true) } else { (tnear, false) };

    if !require_normal {
        return Some(Intersection { t, normal: Vec3::zero(), inside });
    }

    let p = ray.at(t);
    let mut n = p.component_div(s);
    let m = n.abs().max_component();
    if n.x.abs() != m {
        n.x = 0.0;
    }
    if n.y.abs() != m {
        n.y = 0.0;
    }
    if n.z.abs() != m {
        n.z = 0.0;
    }
    if inside {
        n = -n;
    }
    Some(Intersection { t, normal: n, inside })
}

fn smallest_positive_root(a: f32, b: f32, c: f32) -> Option<(f32, bool)> {
    let d = b * b - 4.0 * a * c;
    if d <= 0.0 {
        return None;
    }
    let sqrt_d = d.sqrt();
    let mut x1 = (-b - sqrt_d) / (2.0 * a);
    let mut x2 = (-b + sqrt_d) / (2.0 * a);
    if x1 > x2 {
        std::mem::swap(&mut x1, &mut x2);
    }
    if x2 < 0.0 {
        None
    } else if x1 < 0.0 {
        Some((x2, true))
    } else {
        Some((x1, false))
    }
}

fn intersect_ellipsoid(r: Vec3, ray: Ray) -> Option<Intersection> {
    let o2 = ray.origin.component_div(r);
    let d2 = ray.direction.component_div(r);
    let a = d2.length_squared();
    let b = 2.0 * o2.dot(d2);
    let c = o2.length_squared() - 1.0;

    let (t, inside) = smallest_positive_root(a, b, c)?;
    let p = ray.at(t);
    let mut n = p.component_div(r).component_div(r);
    if inside {
        n = -n;
    }
    Some(Intersection { t, normal: n.normalize(), inside })
}

/// Möller–Trumbore-adjacent but plane-test-based intersection, matching
/// the edge-sign convention exactly: the face normal and the three edge
/// cross products all use the *same* operand order (`edge.cross(other_edge)`,
/// not the reverse), which is what keeps the three edge tests
/// self-consistent. Swapping that order flips every sign and turns every
/// hit into a miss.
fn intersect_triangle(a: Point3, b_vertex: Point3, c_vertex: Point3, ray: Ray) -> Option<Intersection> {
    let b = c_vertex - a;
    let c = b_vertex - a;
    let n = b.cross(c);

    let local_origin = ray.origin - a;
    let plane_ray = Ray::new(local_origin, ray.direction);
    let hit = intersect_plane(n, plane_ray)?;

    let p = plane_ray.at(hit.t);
    if p.cross(b).dot(n) < 0.0 {
        return None;
    }
    if c.cross(p).dot(n) < 0.0 {
        return None;
    }
    if (p - b).cross(c - b).dot(n) < 0.0 {
        return None;
    }
    Some(hit)
}
