use serde::{Deserialize, Serialize};

/// Move `value` toward zero by `amount`, stopping at zero instead of crossing it.
pub fn approach_zero(value: f32, amount: f32) -> f32 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else if value < 0.0 {
        (value + amount).min(0.0)
    } else {
        value
    }
}

/// Sign of `value` as -1, 0 or +1. Unlike `f32::signum`, zero maps to zero.
pub fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Packed `0xRRGGBB` colour, the way scene and config files spell colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Self = Self(0xffffff);
    pub const BLACK: Self = Self(0x000000);

    /// sRGB-encoded RGBA floats in `0.0..=1.0`, alpha always 1.
    pub fn to_rgba(self) -> [f32; 4] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b, 1.0]
    }

    /// Linear-light RGBA for shading into an sRGB render target.
    pub fn to_linear_rgba(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_rgba();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_zero_never_overshoots() {
        assert_eq!(approach_zero(0.005, 0.01), 0.0);
        assert_eq!(approach_zero(-0.005, 0.01), 0.0);
        assert!((approach_zero(0.3, 0.1) - 0.2).abs() < 1e-6);
        assert!((approach_zero(-0.3, 0.1) + 0.2).abs() < 1e-6);
        assert_eq!(approach_zero(0.0, 0.1), 0.0);
    }

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(sign_or_zero(0.0), 0.0);
        assert_eq!(sign_or_zero(-0.0), 0.0);
        assert_eq!(sign_or_zero(2.5), 1.0);
        assert_eq!(sign_or_zero(-1e-9), -1.0);
    }

    #[test]
    fn color_unpacks_channels() {
        assert_eq!(Color(0x00ff00).to_rgba(), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(Color::WHITE.to_rgba(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn linear_darkens_mid_tones() {
        let [bg, ..] = Color(0x202020).to_linear_rgba();
        assert!((bg - 0.0144).abs() < 1e-3);
        let [ground, ..] = Color(0x444444).to_linear_rgba();
        assert!((ground - 0.0578).abs() < 1e-3);
        let [r, g, b, a] = Color(0x030000).to_linear_rgba();
        assert!((r - 3.0 / 255.0 / 12.92).abs() < 1e-7);
        assert_eq!([g, b, a], [0.0, 0.0, 1.0]);
        for c in Color::WHITE.to_linear_rgba() {
            assert!((c - 1.0).abs() < 1e-6);
        }
    }
}
