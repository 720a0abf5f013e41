//! Line-oriented text scene format. Unknown commands are logged and
//! skipped rather than treated as a parse failure — only a missing file
//! is fatal.

use crate::camera::Camera;
use crate::math::{Color, Point3, Quat, Vec3};
use crate::primitive::{Material, MaterialKind, Primitive};
use crate::scene::Scene;

/// glTF default IOR (1.5) is used here too: the text format's `IOR`
/// command is optional and the format this was distilled from never
/// initializes the field, so a concrete default is needed.
const DEFAULT_IOR: f32 = 1.5;

struct Builder {
    width: u32,
    height: u32,
    bg_color: Color,
    cam_position: Point3,
    cam_right: Vec3,
    cam_up: Vec3,
    cam_forward: Vec3,
    cam_fov_x: f32,
    ray_depth: u32,
    samples: u32,
    figures: Vec<Primitive>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            bg_color: Color::zero(),
            cam_position: Point3::zero(),
            cam_right: Vec3::unit_x(),
            cam_up: Vec3::unit_y(),
            // Text scenes default to +Z forward; glTF ingestion uses -Z
            // (see scene::gltf_loader::camera_from_node) since glTF
            // cameras look down local -Z by convention.
            cam_forward: Vec3::unit_z(),
            cam_fov_x: std::f32::consts::FRAC_PI_2,
            ray_depth: 6,
            samples: 16,
            figures: Vec::new(),
        }
    }
}

fn parse_vec3(tokens: &mut std::str::SplitWhitespace) -> Option<Vec3> {
    let x: f32 = tokens.next()?.parse().ok()?;
    let y: f32 = tokens.next()?.parse().ok()?;
    let z: f32 = tokens.next()?.parse().ok()?;
    Some(Vec3::new(x, y, z))
}

fn parse_f32(tokens: &mut std::str::SplitWhitespace) -> Option<f32> {
    tokens.next()?.parse().ok()
}

fn parse_u32(tokens: &mut std::str::SplitWhitespace) -> Option<u32> {
    tokens.next()?.parse().ok()
}

/// Parses the whole text scene into a render-ready [`Scene`]. Returns
/// `None` only if the file contains no usable content at all; individual
/// bad lines are logged via `log::warn!` and skipped.
pub fn parse(source: &str) -> Scene {
    let mut b = Builder::default();
    let mut lines = source.lines();

    while let Some(line) = lines.next() {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else { continue };

        match command {
            "DIMENSIONS" => {
                if let (Some(w), Some(h)) = (parse_u32(&mut tokens), parse_u32(&mut tokens)) {
                    b.width = w;
                    b.height = h;
                } else {
                    log::warn!("malformed DIMENSIONS line: {line:?}");
                }
            }
            "BG_COLOR" => match parse_vec3(&mut tokens) {
                Some(c) => b.bg_color = c,
                None => log::warn!("malformed BG_COLOR line: {line:?}"),
            },
            "CAMERA_POSITION" => match parse_vec3(&mut tokens) {
                Some(v) => b.cam_position = v,
                None => log::warn!("malformed CAMERA_POSITION line: {line:?}"),
            },
            "CAMERA_RIGHT" => match parse_vec3(&mut tokens) {
                Some(v) => b.cam_right = v,
                None => log::warn!("malformed CAMERA_RIGHT line: {line:?}"),
            },
            "CAMERA_UP" => match parse_vec3(&mut tokens) {
                Some(v) => b.cam_up = v,
                None => log::warn!("malformed CAMERA_UP line: {line:?}"),
            },
            "CAMERA_FORWARD" => match parse_vec3(&mut tokens) {
                Some(v) => b.cam_forward = v,
                None => log::warn!("malformed CAMERA_FORWARD line: {line:?}"),
            },
            "CAMERA_FOV_X" => match parse_f32(&mut tokens) {
                Some(v) => b.cam_fov_x = v,
                None => log::warn!("malformed CAMERA_FOV_X line: {line:?}"),
            },
            "RAY_DEPTH" => match parse_u32(&mut tokens) {
                Some(v) => b.ray_depth = v,
                None => log::warn!("malformed RAY_DEPTH line: {line:?}"),
            },
            "SAMPLES" => match parse_u32(&mut tokens) {
                Some(v) => b.samples = v,
                None => log::warn!("malformed SAMPLES line: {line:?}"),
            },
            "NEW_PRIMITIVE" => {
                let Some(next_line) = lines.next() else {
                    log::warn!("NEW_PRIMITIVE with no following shape line");
                    continue;
                };
                match parse_primitive_line(next_line) {
                    Some(fig) => b.figures.push(fig),
                    None => log::warn!("unrecognized primitive line: {next_line:?}"),
                }
            }
            "POSITION" => apply_to_last(&mut b.figures, line, |fig, t| {
                fig.position = parse_vec3(t)?;
                Some(())
            }),
            "ROTATION" => apply_to_last(&mut b.figures, line, |fig, t| {
                let x = parse_f32(t)?;
                let y = parse_f32(t)?;
                let z = parse_f32(t)?;
                let w = parse_f32(t)?;
                fig.rotation = Quat::new(x, y, z, w);
                Some(())
            }),
            "COLOR" => apply_to_last(&mut b.figures, line, |fig, t| {
                fig.material.color = parse_vec3(t)?;
                Some(())
            }),
            "METALLIC" => apply_to_last(&mut b.figures, line, |fig, _| {
                fig.material.kind = MaterialKind::Metallic;
                Some(())
            }),
            "DIELECTRIC" => apply_to_last(&mut b.figures, line, |fig, _| {
                fig.material.kind = MaterialKind::Dielectric;
                Some(())
            }),
            "IOR" => apply_to_last(&mut b.figures, line, |fig, t| {
                fig.material.ior = parse_f32(t)?;
                Some(())
            }),
            "EMISSION" => apply_to_last(&mut b.figures, line, |fig, t| {
                fig.material.emission = parse_vec3(t)?;
                Some(())
            }),
            other => log::warn!("unknown scene command: {other:?}"),
        }
    }

    let camera = Camera::new(b.cam_position, b.cam_right, b.cam_up, b.cam_forward, b.cam_fov_x);
    Scene::build(b.figures, camera, b.bg_color, b.ray_depth, b.samples, b.width, b.height)
}

fn apply_to_last(figures: &mut [Primitive], line: &str, f: impl FnOnce(&mut Primitive, &mut std::str::SplitWhitespace) -> Option<()>) {
    let Some(fig) = figures.last_mut() else {
        log::warn!("{line:?} applied with no preceding NEW_PRIMITIVE");
        return;
    };
    let mut tokens = line.split_whitespace();
    tokens.next();
    if f(fig, &mut tokens).is_none() {
        log::warn!("malformed modifier line: {line:?}");
    }
}

fn parse_primitive_line(line: &str) -> Option<Primitive> {
    let mut tokens = line.split_whitespace();
    let kind = tokens.next()?;
    let material = Material { kind: MaterialKind::Diffuse, color: Color::zero(), emission: Color::zero(), ior: DEFAULT_IOR };
    match kind {
        "PLANE" => Some(Primitive::plane(parse_vec3(&mut tokens)?, material)),
        "ELLIPSOID" => Some(Primitive::ellipsoid(parse_vec3(&mut tokens)?, material)),
        "BOX" => Some(Primitive::boxy(parse_vec3(&mut tokens)?, material)),
        "TRIANGLE" => {
            let a = parse_vec3(&mut tokens)?;
            let b = parse_vec3(&mut tokens)?;
            let c = parse_vec3(&mut tokens)?;
            Some(Primitive::triangle(a, b, c, material))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_parses_with_defaults() {
        let scene = parse("DIMENSIONS 16 16\nBG_COLOR 0.2 0.3 0.4\n");
        assert_eq!(scene.width, 16);
        assert_eq!(scene.height, 16);
        assert_eq!(scene.bg_color, Color::new(0.2, 0.3, 0.4));
        assert!(scene.figures.is_empty());
    }

    #[test]
    fn primitive_with_modifiers_is_attached_correctly() {
        let src = "NEW_PRIMITIVE\nELLIPSOID 1 1 1\nPOSITION 0 1 0\nMETALLIC\nCOLOR 0.9 0.9 0.9\n";
        let scene = parse(src);
        assert_eq!(scene.figures.len(), 1);
        let fig = &scene.figures[0];
        assert_eq!(fig.position, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(fig.material.kind, MaterialKind::Metallic);
        assert_eq!(fig.material.color, Color::splat(0.9));
    }

    #[test]
    fn unknown_command_is_skipped_not_fatal() {
        let src = "DIMENSIONS 4 4\nFROBNICATE 1 2 3\nBG_COLOR 1 1 1\n";
        let scene = parse(src);
        assert_eq!(scene.width, 4);
        assert_eq!(scene.bg_color, Color::ones());
    }

    #[test]
    fn triangle_primitive_parses_three_vertices() {
        let src = "NEW_PRIMITIVE\nTRIANGLE 0 0 0 1 0 0 0 1 0\n";
        let scene = parse(src);
        assert_eq!(scene.figures.len(), 1);
        assert_eq!(scene.figures[0].data3, Point3::zero());
    }
}
