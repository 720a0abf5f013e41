//! HDR-to-LDR tone mapping: ACES filmic approximation followed by gamma
//! 2.2, applied once per pixel after sample averaging.

use crate::math::Color;

const ACES_A: f32 = 2.51;
const ACES_B: f32 = 0.03;
const ACES_C: f32 = 2.43;
const ACES_D: f32 = 0.59;
const ACES_E: f32 = 0.14;

/// Narkowicz 2015 ACES filmic curve approximation, applied componentwise
/// and clipped to `[0, 1]`.
pub fn aces(color: Color) -> Color {
    let channel = |x: f32| (x * (ACES_A * x + ACES_B) / (x * (ACES_C * x + ACES_D) + ACES_E)).clamp(0.0, 1.0);
    Color::new(channel(color.x), channel(color.y), channel(color.z))
}

pub fn gamma(color: Color) -> Color {
    let g = 1.0 / 2.2;
    Color::new(color.x.powf(g), color.y.powf(g), color.z.powf(g))
}

/// Full pixel tonemap: ACES then gamma, then 8-bit quantization.
pub fn to_byte_rgb(color: Color) -> [u8; 3] {
    let mapped = gamma(aces(color));
    [
        (255.0 * mapped.x).round().clamp(0.0, 255.0) as u8,
        (255.0 * mapped.y).round().clamp(0.0, 255.0) as u8,
        (255.0 * mapped.z).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aces_clips_to_unit_range() {
        let c = aces(Color::new(100.0, 0.0, -5.0));
        assert!(c.x <= 1.0 && c.x >= 0.0);
        assert!(c.y <= 1.0 && c.y >= 0.0);
        assert!(c.z <= 1.0 && c.z >= 0.0);
    }

    #[test]
    fn tonemap_chain_is_monotone_nondecreasing() {
        let samples = [0.0, 0.01, 0.1, 0.5, 1.0, 2.0, 10.0, 100.0];
        let mut prev = -1.0f32;
        for &x in &samples {
            let mapped = gamma(aces(Color::splat(x))).x;
            assert!(mapped + 1e-6 >= prev, "tonemap decreased at x={x}: {prev} -> {mapped}");
            prev = mapped;
        }
    }

    #[test]
    fn black_maps_to_black() {
        let bytes = to_byte_rgb(Color::zero());
        assert_eq!(bytes, [0, 0, 0]);
    }
}
