use serde::{Deserialize, Serialize};

use crate::config::ColorConfig;

/// 8-bit sRGB triple. Serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Alpha-composite `self` over `background`.
    pub fn over(self, background: Rgb, alpha: f32) -> Rgb {
        lerp_rgb(background, self, alpha.clamp(0.0, 1.0))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}

/// Fill color and opacity for one glyph, plus the speed glow that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub color: Rgb,
    pub alpha: f32,
    pub glow: f32,
}

/// `1` at the pointer, fading linearly to `0` at `radius`.
pub fn cursor_intensity(distance: f32, radius: f32) -> f32 {
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Pulse that starts at `1` on a transition and decays to `0` over `duration_ms`.
pub fn flash_intensity(now_ms: u64, flash_at: Option<u64>, duration_ms: u64) -> f32 {
    match flash_at {
        Some(at) if duration_ms > 0 => {
            let elapsed = now_ms.saturating_sub(at) as f32 / duration_ms as f32;
            1.0 - elapsed.clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

pub fn speed_glow(speed: f32, max_speed: f32) -> f32 {
    speed.clamp(0.0, max_speed) / max_speed
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Channel-wise; `t` must be in `[0.0, 1.0]`.
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let channel = |x: u8, y: u8| lerp(x as f32, y as f32, t).round() as u8;

    Rgb {
        r: channel(a.r, b.r),
        g: channel(a.g, b.g),
        b: channel(a.b, b.b),
    }
}

/// Per-frame color state: everything that does not depend on the particle.
pub struct Blender<'a> {
    config: &'a ColorConfig,
    accent: Rgb,
    floor: f32,
}

impl<'a> Blender<'a> {
    pub fn new(config: &'a ColorConfig, accent: Rgb, now_ms: u64, flash_at: Option<u64>) -> Self {
        let flash = flash_intensity(now_ms, flash_at, config.flash_ms);

        Self {
            config,
            accent,
            floor: config.ambient.max(flash),
        }
    }

    /// Intensity before the speed glow is applied.
    pub fn intensity(&self, distance: f32) -> f32 {
        let cursor = cursor_intensity(distance, self.config.radius);
        cursor.max(self.floor).powf(self.config.exponent)
    }

    pub fn tint(&self, distance: f32, speed: f32) -> Tint {
        let mut t = self.intensity(distance);

        let glow = match &self.config.glow {
            Some(g) => speed_glow(speed, g.max_speed),
            None => 0.0,
        };
        t = t.max(glow);

        Tint {
            color: lerp_rgb(self.config.base, self.accent, t),
            alpha: lerp(self.config.base_alpha, self.config.spotlight_alpha, t),
            glow,
        }
    }
}
