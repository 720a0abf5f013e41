//! glTF 2.0 subset loader: triangle meshes, node transforms,
//! base-color/metallic/emissive materials, and the first camera found in
//! the scene graph.
//!
//! Loaded directly with the `gltf` crate's document/buffer API rather than
//! `gltf::import`'s convenience wrapper, since this crate is pulled in
//! `default-features = false` and the renderer only ever needs triangle
//! positions/indices and node transforms, not the full asset pipeline
//! (textures, skins, animations) that the convenience path drags in.

use std::path::Path;

use gltf::Gltf;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::math::{Color, Point3, Quat, Transform, Vec3};
use crate::primitive::{Material, Primitive};
use crate::scene::Scene;

const DEFAULT_IOR: f32 = 1.5;
const DEFAULT_RAY_DEPTH: u32 = 6;
const DEFAULT_SAMPLES: u32 = 16;

/// Loads a glTF/GLB document and builds a render-ready [`Scene`].
/// `width`/`height` are needed up front to derive the camera's horizontal
/// field of view from the glTF camera's (vertical) `yfov`.
pub fn load(path: &Path, width: u32, height: u32) -> Result<Scene, RenderError> {
    let bytes = std::fs::read(path).map_err(|_| RenderError::InputNotFound(path.to_path_buf()))?;
    let gltf = Gltf::from_slice(&bytes)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let buffers = load_buffers(&gltf, parent)?;

    let scene = gltf.scenes().next().ok_or_else(|| RenderError::MalformedGltf("document has no scenes".into()))?;

    let mut figures = Vec::new();
    let mut camera = None;
    for node in scene.nodes() {
        visit(&node, Transform::identity(), &buffers, &mut figures, &mut camera, width, height)?;
    }

    let camera = camera.unwrap_or_else(|| {
        log::warn!("glTF document has no camera node, falling back to a default camera");
        Camera::default()
    });

    Ok(Scene::build(figures, camera, Color::zero(), DEFAULT_RAY_DEPTH, DEFAULT_SAMPLES, width, height))
}

fn load_buffers(gltf: &Gltf, parent: &Path) -> Result<Vec<Vec<u8>>, RenderError> {
    gltf.buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| RenderError::MalformedGltf("GLB document is missing its binary chunk".into())),
            gltf::buffer::Source::Uri(uri) => std::fs::read(parent.join(uri))
                .map_err(|_| RenderError::MalformedGltf(format!("external buffer not found: {uri}"))),
        })
        .collect()
}

/// Walks the scene graph accumulating world transforms, emitting one
/// [`Primitive::triangle`] per triangle of every mesh primitive and
/// capturing the first camera encountered.
#[allow(clippy::too_many_arguments)]
fn visit(
    node: &gltf::Node,
    parent: Transform,
    buffers: &[Vec<u8>],
    figures: &mut Vec<Primitive>,
    camera: &mut Option<Camera>,
    width: u32,
    height: u32,
) -> Result<(), RenderError> {
    let local = node_transform(node);
    let world = parent.compose(&local);

    if camera.is_none() {
        if let Some(cam) = node.camera() {
            *camera = Some(camera_from_node(&cam, &world, width, height)?);
        }
    }

    if let Some(mesh) = node.mesh() {
        for prim in mesh.primitives() {
            emit_triangles(&prim, &world, buffers, figures)?;
        }
    }

    for child in node.children() {
        visit(&child, world, buffers, figures, camera, width, height)?;
    }
    Ok(())
}

fn node_transform(node: &gltf::Node) -> Transform {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            let mut raw = [0.0f32; 16];
            for (col, c) in matrix.iter().enumerate() {
                for (row, v) in c.iter().enumerate() {
                    raw[col * 4 + row] = *v;
                }
            }
            Transform::from_column_major(&raw)
        }
        gltf::scene::Transform::Decomposed { translation, rotation, scale } => {
            let [x, y, z] = translation;
            let [rx, ry, rz, rw] = rotation;
            let [sx, sy, sz] = scale;
            Transform::from_trs(Vec3::new(x, y, z), Quat::new(rx, ry, rz, rw), Vec3::new(sx, sy, sz))
        }
    }
}

fn emit_triangles(
    prim: &gltf::Primitive,
    world: &Transform,
    buffers: &[Vec<u8>],
    figures: &mut Vec<Primitive>,
) -> Result<(), RenderError> {
    if prim.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("skipping non-triangle primitive topology {:?}", prim.mode());
        return Ok(());
    }

    let reader = prim.reader(|b| buffers.get(b.index()).map(|v| v.as_slice()));
    let positions: Vec<Point3> = reader
        .read_positions()
        .ok_or_else(|| RenderError::MalformedGltf("mesh primitive has no POSITION attribute".into()))?
        .map(|p| world.apply(Vec3::new(p[0], p[1], p[2])))
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(read) => read.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let material = material_from_gltf(prim.material());

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (positions[tri[0] as usize], positions[tri[1] as usize], positions[tri[2] as usize]);
        figures.push(Primitive::triangle(a, b, c, material));
    }
    Ok(())
}

fn material_from_gltf(mat: gltf::Material) -> Material {
    let pbr = mat.pbr_metallic_roughness();
    let [r, g, b, alpha] = pbr.base_color_factor();
    let color = Color::new(r, g, b);
    let metallic_factor = pbr.metallic_factor();

    let [er, eg, eb] = mat.emissive_factor();
    let strength = mat.emissive_strength().unwrap_or(1.0);
    let emission = Color::new(er, eg, eb) * strength;

    Material::from_alpha_metallic(color, emission, alpha, metallic_factor, DEFAULT_IOR)
}

/// Cameras in glTF look down local `-Z` with `+Y` up and `+X` right; only
/// perspective cameras are supported (orthographic projection is out of
/// scope for this renderer). glTF's `yfov` is vertical; the renderer's
/// camera is parameterized by horizontal FOV, so it's converted against
/// the output image's aspect ratio.
fn camera_from_node(cam: &gltf::Camera, world: &Transform, width: u32, height: u32) -> Result<Camera, RenderError> {
    let gltf::camera::Projection::Perspective(persp) = cam.projection() else {
        return Err(RenderError::UnsupportedGltfFeature("orthographic camera".into()));
    };

    let position = world.apply(Point3::zero());
    let right = world.apply_vector(Vec3::unit_x()).normalize();
    let up = world.apply_vector(Vec3::unit_y()).normalize();
    let forward = world.apply_vector(-Vec3::unit_z()).normalize();

    let fov_x = 2.0 * ((persp.yfov() / 2.0).tan() * width as f32 / height as f32).atan();
    Ok(Camera::new(position, right, up, forward, fov_x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_transform_matches_trs_for_identity_decomposed() {
        let t = Transform::from_trs(Vec3::zero(), Quat::identity(), Vec3::ones());
        let p = t.apply(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn material_from_gltf_prefers_dielectric_over_metallic_on_low_alpha() {
        let m = Material::from_alpha_metallic(Color::ones(), Color::zero(), 0.5, 1.0, DEFAULT_IOR);
        assert_eq!(m.kind, crate::primitive::MaterialKind::Dielectric);
    }
}
