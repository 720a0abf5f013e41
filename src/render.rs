//! Tile-parallel render driver: partitions the framebuffer into
//! fixed-size tiles, traces each pixel with a per-pixel deterministic RNG,
//! tonemaps, and writes a binary PPM (P6).

use rand::Rng;
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::error::RenderError;
use crate::integrator;
use crate::math::Color;
use crate::rng::Lcg;
use crate::scene::Scene;
use crate::tonemap::to_byte_rgb;

/// Pixels per tile edge. Tiles are the unit of work rayon hands to each
/// thread; 8x8 keeps a tile's rays cache-local without fragmenting the
/// work queue into one job per pixel.
const TILE_PIXELS: u32 = 8;

pub struct RenderStats {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub total_rays: u64,
    pub elapsed: std::time::Duration,
}

impl RenderStats {
    pub fn mrays_per_sec(&self) -> f64 {
        self.total_rays as f64 / self.elapsed.as_secs_f64() / 1e6
    }
}

/// An RGB framebuffer in row-major, top-to-bottom order.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![Color::zero(); (width as usize) * (height as usize)] }
    }

    fn pixel_mut(&mut self, x: u32, y: u32) -> &mut Color {
        &mut self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Writes a binary PPM (P6): header `P6\n<w> <h>\n255\n` followed by
    /// row-major RGB bytes, each channel ACES-tonemapped and gamma-corrected.
    pub fn write_ppm(&self, path: &Path) -> Result<(), RenderError> {
        let map_err = |e: std::io::Error| RenderError::OutputWriteFailed { path: path.to_path_buf(), source: e };
        let mut out = std::io::BufWriter::new(std::fs::File::create(path).map_err(map_err)?);
        write!(out, "P6\n{} {}\n255\n", self.width, self.height).map_err(map_err)?;
        for color in &self.pixels {
            let [r, g, b] = to_byte_rgb(*color);
            out.write_all(&[r, g, b]).map_err(map_err)?;
        }
        out.flush().map_err(map_err)
    }
}

/// Renders `scene` at `scene.width x scene.height` with `scene.samples`
/// samples per pixel, returning the framebuffer and timing stats.
///
/// Tiles are processed in parallel via rayon, but every pixel's RNG is
/// seeded purely from its flat index, so the result is independent of how
/// work is scheduled across threads — two renders of the same scene
/// produce byte-identical PPM output.
pub fn render(scene: &Scene) -> (Framebuffer, RenderStats) {
    let start = Instant::now();
    let width = scene.width;
    let height = scene.height;
    let mut framebuffer = Framebuffer::new(width, height);

    let tiles_x = width.div_ceil(TILE_PIXELS);
    let tiles_y = height.div_ceil(TILE_PIXELS);
    let tile_count = (tiles_x * tiles_y) as usize;

    let mut tile_colors: Vec<Vec<Color>> = (0..tile_count).map(|_| Vec::new()).collect();

    tile_colors.par_iter_mut().enumerate().for_each(|(tile_idx, out)| {
        let tile_idx = tile_idx as u32;
        let tx = tile_idx % tiles_x;
        let ty = tile_idx / tiles_x;
        let x0 = tx * TILE_PIXELS;
        let y0 = ty * TILE_PIXELS;
        let x1 = (x0 + TILE_PIXELS).min(width);
        let y1 = (y0 + TILE_PIXELS).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                let pixel_index = (y as u64) * (width as u64) + x as u64;
                let mut rng = Lcg::new(pixel_index);
                out.push(render_pixel(scene, x, y, &mut rng));
            }
        }
    });

    for (tile_idx, colors) in tile_colors.into_iter().enumerate() {
        let tile_idx = tile_idx as u32;
        let tx = tile_idx % tiles_x;
        let ty = tile_idx / tiles_x;
        let x0 = tx * TILE_PIXELS;
        let y0 = ty * TILE_PIXELS;
        let x1 = (x0 + TILE_PIXELS).min(width);
        let y1 = (y0 + TILE_PIXELS).min(height);

        let mut it = colors.into_iter();
        for y in y0..y1 {
            for x in x0..x1 {
                *framebuffer.pixel_mut(x, y) = it.next().expect("tile produced fewer pixels than its span");
            }
        }
    }

    let total_rays = width as u64 * height as u64 * scene.samples.max(1) as u64;
    let stats = RenderStats { width, height, samples: scene.samples, total_rays, elapsed: start.elapsed() };
    (framebuffer, stats)
}

fn render_pixel<R: Rng + ?Sized>(scene: &Scene, x: u32, y: u32, rng: &mut R) -> Color {
    let mut accum = Color::zero();
    for _ in 0..scene.samples.max(1) {
        let jitter_x = rng.gen::<f32>();
        let jitter_y = rng.gen::<f32>();
        let ray = scene.camera.ray_through(x as f32 + jitter_x, y as f32 + jitter_y, scene.width, scene.height);
        accum += integrator::trace(scene, ray, scene.ray_depth, rng);
    }
    accum / (scene.samples.max(1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::Color;
    use crate::scene::Scene;

    #[test]
    fn rendering_empty_scene_fills_every_pixel_with_background() {
        let scene = Scene::build(Vec::new(), Camera::default(), Color::new(0.1, 0.2, 0.3), 4, 2, 5, 5);
        let (fb, stats) = render(&scene);
        assert_eq!(stats.width, 5);
        assert_eq!(stats.height, 5);
        for color in &fb.pixels {
            assert!((color.x - 0.1).abs() < 1e-3);
        }
    }

    #[test]
    fn two_renders_of_the_same_scene_are_byte_identical() {
        let scene = Scene::build(Vec::new(), Camera::default(), Color::new(0.2, 0.2, 0.2), 4, 4, 9, 7);
        let (a, _) = render(&scene);
        let (b, _) = render(&scene);
        assert_eq!(a.pixels, b.pixels);
    }
}
