//! Flat-array SAH BVH.
//!
//! Nodes live in one `Vec`; node 0 is always the root and is never the
//! child of anything else, which is what makes `left == 0` a safe leaf
//! marker without a separate tag. The build permutes the primitive slice
//! in place rather than building an index array, mirroring the idiomatic
//! implementation's in-place partition.

use crate::aabb::Aabb;
use crate::math::Ray;
use crate::primitive::{Intersection, Primitive};

#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub aabb: Aabb,
    pub left: u32,
    pub right: u32,
    pub first: u32,
    pub last: u32,
}

pub struct Bvh {
    nodes: Vec<Node>,
    root: u32,
}

impl Bvh {
    /// Builds over `figures[..n]`, reordering that prefix by centroid as
    /// splits are chosen. Entries at and past `n` (planes) are untouched.
    pub fn build(figures: &mut [Primitive], n: usize) -> Self {
        let mut nodes = Vec::new();
        let root = if n == 0 { 0 } else { build_range(&mut nodes, figures, 0, n) };
        Self { nodes, root }
    }

    /// Traverses starting from `best_so_far` (the closest hit known so
    /// far, e.g. from the scene's plane scan), returning the closest
    /// primitive hit and its index into the same slice passed to `build`.
    pub fn intersect(&self, figures: &[Primitive], ray: Ray, best_so_far: Option<f32>) -> Option<(Intersection, usize)> {
        if self.nodes.is_empty() {
            return None;
        }
        intersect_node(&self.nodes, figures, self.root, ray, best_so_far)
    }

    /// Visits every leaf's `[first, last)` range whose AABB the ray
    /// intersects, with no distance pruning — used by light-sampling PDF
    /// evaluation, which must sum contributions from every emitter along
    /// the ray rather than stop at the closest one.
    pub fn visit_leaves_on_ray(&self, ray: Ray, mut visit: impl FnMut(usize, usize)) {
        if self.nodes.is_empty() {
            return;
        }
        visit_node(&self.nodes, self.root, ray, &mut visit);
    }
}

fn visit_node(nodes: &[Node], pos: u32, ray: Ray, visit: &mut impl FnMut(usize, usize)) {
    let node = &nodes[pos as usize];
    if node.aabb.intersect(ray).is_none() {
        return;
    }
    if node.left == 0 {
        visit(node.first as usize, node.last as usize);
    } else {
        visit_node(nodes, node.left, ray, visit);
        visit_node(nodes, node.right, ray, visit);
    }
}

fn bounds_of(figures: &[Primitive], first: usize, last: usize) -> Aabb {
    let mut aabb = Aabb::from_primitive(&figures[first]);
    for fig in &figures[first + 1..last] {
        aabb.extend(&Aabb::from_primitive(fig));
    }
    aabb
}

fn sort_by_axis(figures: &mut [Primitive], first: usize, last: usize, axis: usize) {
    figures[first..last].sort_by(|a, b| {
        let ca = Aabb::from_primitive(a).centroid();
        let cb = Aabb::from_primitive(b).centroid();
        let ka = match axis {
            0 => ca.x,
            1 => ca.y,
            _ => ca.z,
        };
        let kb = match axis {
            0 => cb.x,
            1 => cb.y,
            _ => cb.z,
        };
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// O(n) SAH cost scan via prefix/suffix AABB area sweeps. Returns the
/// lowest cost and the split index `k` (absolute, in `[first+1, last)`)
/// that achieves it.
fn best_split(figures: &[Primitive], first: usize, last: usize) -> (f32, usize) {
    let n = last - first;
    let mut cost = vec![0.0f32; n];

    let mut prefix = Aabb::from_primitive(&figures[first]);
    for i in 1..n {
        cost[i] = prefix.area() * i as f32;
        prefix.extend(&Aabb::from_primitive(&figures[first + i]));
    }

    let mut suffix = Aabb::from_primitive(&figures[last - 1]);
    for i in (1..n).rev() {
        cost[i] += suffix.area() * (n - i) as f32;
        suffix.extend(&Aabb::from_primitive(&figures[first + i - 1]));
    }

    let mut best_i = 1;
    let mut best_cost = cost[1];
    for i in 2..n {
        if cost[i] < best_cost {
            best_cost = cost[i];
            best_i = i;
        }
    }
    (best_cost, first + best_i)
}

fn build_range(nodes: &mut Vec<Node>, figures: &mut [Primitive], first: usize, last: usize) -> u32 {
    let aabb = bounds_of(figures, first, last);
    let this_pos = nodes.len() as u32;
    nodes.push(Node { aabb, left: 0, right: 0, first: first as u32, last: last as u32 });

    if last - first <= 1 {
        return this_pos;
    }

    for axis in 0..3 {
        sort_by_axis(figures, first, last, axis);
        let (best_cost, mid) = best_split(figures, first, last);
        if best_cost >= aabb.area() * (last - first) as f32 {
            continue;
        }
        let left = build_range(nodes, figures, first, mid);
        let right = build_range(nodes, figures, mid, last);
        nodes[this_pos as usize].left = left;
        nodes[this_pos as usize].right = right;
        return this_pos;
    }

    this_pos
}

fn intersect_node(
    nodes: &[Node],
    figures: &[Primitive],
    pos: u32,
    ray: Ray,
    mut best_so_far: Option<f32>,
) -> Option<(Intersection, usize)> {
    let node = &nodes[pos as usize];
    let t_entry = node.aabb.intersect(ray)?;

    if let Some(best) = best_so_far {
        // An entry distance beyond the current best can still contain a
        // closer hit if the ray origin is already inside the box, since
        // the slab test then reports the exit distance, not the entry.
        let origin_inside = ray.origin.x >= node.aabb.min.x
            && ray.origin.x <= node.aabb.max.x
            && ray.origin.y >= node.aabb.min.y
            && ray.origin.y <= node.aabb.max.y
            && ray.origin.z >= node.aabb.min.z
            && ray.origin.z <= node.aabb.max.z;
        if t_entry > best && !origin_inside {
            return None;
        }
    }

    if node.left == 0 {
        let mut best: Option<(Intersection, usize)> = None;
        for i in node.first as usize..node.last as usize {
            if let Some(hit) = figures[i].intersect(ray) {
                if best.is_none() || hit.t < best.unwrap().0.t {
                    best = Some((hit, i));
                }
            }
        }
        return best;
    }

    let mut best = intersect_node(nodes, figures, node.left, ray, best_so_far);
    if let Some((hit, _)) = &best {
        best_so_far = Some(best_so_far.map_or(hit.t, |b| b.min(hit.t)));
    }
    let right = intersect_node(nodes, figures, node.right, ray, best_so_far);
    match (best.take(), right) {
        (Some(l), Some(r)) => Some(if l.0.t <= r.0.t { l } else { r }),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::primitive::Material;

    fn sphere_at(x: f32) -> Primitive {
        let mut p = Primitive::ellipsoid(Vec3::splat(0.4), Material::diffuse(Vec3::splat(0.5)));
        p.position = Vec3::new(x, 0.0, 0.0);
        p
    }

    fn linear_scan(figures: &[Primitive], ray: Ray) -> Option<(Intersection, usize)> {
        let mut best: Option<(Intersection, usize)> = None;
        for (i, fig) in figures.iter().enumerate() {
            if let Some(hit) = fig.intersect(ray) {
                if best.is_none() || hit.t < best.unwrap().0.t {
                    best = Some((hit, i));
                }
            }
        }
        best
    }

    #[test]
    fn bvh_agrees_with_linear_scan_over_many_spheres() {
        let mut figures: Vec<Primitive> = (0..40).map(|i| sphere_at(i as f32 * 2.0)).collect();
        let reference = figures.clone();
        let bvh = Bvh::build(&mut figures, figures.len());

        for i in 0..80 {
            let z = 10.0 + i as f32 * 0.1;
            let ray = Ray::new(Vec3::new(i as f32 * 1.9, 0.0, z), Vec3::new(0.0, 0.0, -1.0));
            let got = bvh.intersect(&figures, ray, None).map(|(h, _)| h.t);
            let want = linear_scan(&reference, ray).map(|(h, _)| h.t);
            match (got, want) {
                (Some(g), Some(w)) => assert!((g - w).abs() < 1e-3),
                (None, None) => {}
                other => panic!("mismatch at ray {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn single_primitive_builds_a_single_leaf() {
        let mut figures = vec![sphere_at(0.0)];
        let bvh = Bvh::build(&mut figures, 1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(bvh.intersect(&figures, ray, None).is_some());
    }

    #[test]
    fn empty_scene_never_hits() {
        let mut figures: Vec<Primitive> = Vec::new();
        let bvh = Bvh::build(&mut figures, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(bvh.intersect(&figures, ray, None).is_none());
    }
}
