use serde::{Deserialize, Serialize};

use crate::blend::Rgb;
use crate::error::SwarmError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub sampler: SamplerConfig,
    pub grid: GridConfig,
    pub forces: ForceConfig,
    pub magnet: MagnetConfig,
    pub idle: IdleConfig,
    pub color: ColorConfig,
    pub cycle: CycleConfig,
    /// Fixes shuffles, idle phases and random accents. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Mask sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Mask pixels between samples, in both axes.
    pub stride: u32,
    /// Fraction of the viewport the fitted mask may occupy.
    pub hero_scale: f32,
    /// Alpha must exceed this to emit an anchor.
    pub alpha_threshold: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stride: 5,
            hero_scale: 0.85,
            alpha_threshold: 40,
        }
    }
}

/// How the vertical cell count of the code grid is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRounding {
    /// Only whole rows inside the margins.
    #[default]
    Floor,
    /// One extra partial row so the grid always reaches the bottom margin.
    Ceil,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub margin_x: f32,
    pub margin_y: f32,
    pub char_width: f32,
    pub line_height: f32,
    pub font_size: f32,
    pub rows: RowRounding,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            margin_x: 20.0,
            margin_y: 30.0,
            char_width: 12.0,
            line_height: 24.0,
            font_size: 14.0,
            rows: RowRounding::Floor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Spring constant toward a shape anchor.
    pub organize: f32,
    /// Spring constant toward a code cell.
    pub organize_code: f32,
    /// Velocity retained per frame, in `(0, 1)`.
    pub damping: f32,
    pub hover_radius: f32,
    pub hover_force: f32,
    /// Push multiplier applied in code mode.
    pub code_hover_multiplier: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            organize: 0.03,
            organize_code: 0.03,
            damping: 0.8,
            hover_radius: 90.0,
            hover_force: 2.2,
            code_hover_multiplier: 2.4,
        }
    }
}

/// Elastic magnet. Band thresholds are fractions of the hover radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnetConfig {
    pub force: f32,
    /// Dead zone around the pointer where no pull applies.
    pub elastic_radius: f32,
    pub core: f32,
    pub mid: f32,
    /// Strength where the mid band meets the outer band.
    pub mid_strength: f32,
    /// Strength at the hover radius.
    pub edge_strength: f32,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            force: 0.2,
            elastic_radius: 18.0,
            core: 0.25,
            mid: 0.6,
            mid_strength: 0.35,
            edge_strength: 0.08,
        }
    }
}

/// Organic drift of shape targets. Zero amplitude disables it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub amplitude: f32,
    /// Radians per millisecond.
    pub speed: f32,
    /// Radians per pixel of target position.
    pub frequency: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.0,
            speed: 0.0004,
            frequency: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentPolicy {
    /// `palette[shape % palette.len()]`.
    #[default]
    ByShape,
    /// A fresh draw from the palette on every transition.
    Random,
}

/// Speed-driven intensity floor and glyph size boost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    pub max_speed: f32,
    /// Extra size at full glow, as a fraction of the font size.
    pub size_boost: f32,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            max_speed: 14.0,
            size_boost: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub base: Rgb,
    pub palette: Vec<Rgb>,
    pub accent: AccentPolicy,
    /// Surface the glyphs are composited over.
    pub background: Rgb,
    pub radius: f32,
    pub base_alpha: f32,
    pub spotlight_alpha: f32,
    /// Intensity floor every particle gets.
    pub ambient: f32,
    pub flash_ms: u64,
    /// Applied to the combined intensity; values above 1 sharpen the spotlight.
    pub exponent: f32,
    pub glow: Option<GlowConfig>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            base: Rgb::new(38, 47, 59),
            palette: vec![
                Rgb::new(22, 106, 234),
                Rgb::new(205, 196, 255),
                Rgb::new(228, 255, 152),
            ],
            accent: AccentPolicy::ByShape,
            background: Rgb::new(255, 255, 255),
            radius: 260.0,
            base_alpha: 0.25,
            spotlight_alpha: 1.0,
            ambient: 0.0,
            flash_ms: 1200,
            exponent: 1.0,
            glow: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Advance the state machine without input once the dwell expires.
    pub auto: bool,
    pub dwell_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            auto: false,
            dwell_ms: 7000,
        }
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl SwarmConfig {
    /// Click toggles, whole rows only, pointer-driven color.
    pub fn classic() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            grid: GridConfig::default(),
            forces: ForceConfig::default(),
            magnet: MagnetConfig::default(),
            idle: IdleConfig::default(),
            color: ColorConfig::default(),
            cycle: CycleConfig::default(),
            seed: None,
        }
    }

    /// Shape targets breathe; the grid always covers the bottom edge.
    pub fn drift() -> Self {
        let mut config = Self::classic();
        config.grid.rows = RowRounding::Ceil;
        config.forces.damping = 0.78;
        config.forces.organize_code = 0.045;
        config.idle.amplitude = 6.0;
        config
    }

    /// Morphing particles brighten and grow with their speed.
    pub fn glow() -> Self {
        let mut config = Self::drift();
        config.color.glow = Some(GlowConfig::default());
        config
    }

    /// Hands-free: timed transitions, random accents, ambient tint and flashes.
    pub fn cycle() -> Self {
        let mut config = Self::glow();
        config.cycle.auto = true;
        config.color.accent = AccentPolicy::Random;
        config.color.ambient = 0.25;
        config.color.exponent = 1.8;
        config.color.palette = vec![
            Rgb::new(22, 106, 234),
            Rgb::new(124, 58, 237),
            Rgb::new(236, 72, 153),
            Rgb::new(16, 185, 129),
            Rgb::new(245, 158, 11),
            Rgb::new(14, 165, 233),
        ];
        config
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "drift" => Some(Self::drift()),
            "glow" => Some(Self::glow()),
            "cycle" => Some(Self::cycle()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), SwarmError> {
        let s = &self.sampler;
        check(s.stride > 0, "sampler.stride", "must be at least 1")?;
        check(positive(s.hero_scale), "sampler.hero_scale", "must be positive")?;

        let g = &self.grid;
        check(non_negative(g.margin_x), "grid.margin_x", "must be non-negative")?;
        check(non_negative(g.margin_y), "grid.margin_y", "must be non-negative")?;
        check(positive(g.char_width), "grid.char_width", "must be positive")?;
        check(positive(g.line_height), "grid.line_height", "must be positive")?;
        check(positive(g.font_size), "grid.font_size", "must be positive")?;

        let f = &self.forces;
        check(non_negative(f.organize), "forces.organize", "must be non-negative")?;
        check(
            non_negative(f.organize_code),
            "forces.organize_code",
            "must be non-negative",
        )?;
        check(
            f.damping > 0.0 && f.damping < 1.0,
            "forces.damping",
            "must lie in (0, 1)",
        )?;
        check(positive(f.hover_radius), "forces.hover_radius", "must be positive")?;
        check(non_negative(f.hover_force), "forces.hover_force", "must be non-negative")?;
        check(
            non_negative(f.code_hover_multiplier),
            "forces.code_hover_multiplier",
            "must be non-negative",
        )?;

        let m = &self.magnet;
        check(non_negative(m.force), "magnet.force", "must be non-negative")?;
        check(
            non_negative(m.elastic_radius) && m.elastic_radius < f.hover_radius,
            "magnet.elastic_radius",
            "must be non-negative and below the hover radius",
        )?;
        check(
            0.0 < m.core && m.core < m.mid && m.mid < 1.0,
            "magnet.core",
            "band thresholds must satisfy 0 < core < mid < 1",
        )?;
        check(
            (0.0..=1.0).contains(&m.mid_strength) && (0.0..=1.0).contains(&m.edge_strength),
            "magnet.mid_strength",
            "band strengths must lie in [0, 1]",
        )?;

        let i = &self.idle;
        check(non_negative(i.amplitude), "idle.amplitude", "must be non-negative")?;
        check(i.speed.is_finite(), "idle.speed", "must be finite")?;
        check(i.frequency.is_finite(), "idle.frequency", "must be finite")?;

        let c = &self.color;
        check(!c.palette.is_empty(), "color.palette", "needs at least one accent")?;
        check(positive(c.radius), "color.radius", "must be positive")?;
        check(unit(c.base_alpha), "color.base_alpha", "must lie in [0, 1]")?;
        check(unit(c.spotlight_alpha), "color.spotlight_alpha", "must lie in [0, 1]")?;
        check(unit(c.ambient), "color.ambient", "must lie in [0, 1]")?;
        check(positive(c.exponent), "color.exponent", "must be positive")?;
        if let Some(glow) = &c.glow {
            check(positive(glow.max_speed), "color.glow.max_speed", "must be positive")?;
            check(
                non_negative(glow.size_boost),
                "color.glow.size_boost",
                "must be non-negative",
            )?;
        }

        check(
            !self.cycle.auto || self.cycle.dwell_ms > 0,
            "cycle.dwell_ms",
            "must be positive when auto-advancing",
        )
    }
}

fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), SwarmError> {
    if ok {
        Ok(())
    } else {
        Err(SwarmError::InvalidConfig { field, reason })
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}
