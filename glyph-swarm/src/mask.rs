use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::SamplerConfig;
use crate::error::SwarmError;
use crate::geometry::{Point, Viewport};

/// Per-pixel alpha of a decoded raster, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct OpacityMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl OpacityMask {
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Result<Self, SwarmError> {
        if width == 0 || height == 0 || alpha.len() != width as usize * height as usize {
            return Err(SwarmError::MalformedMask {
                width,
                height,
                len: alpha.len(),
            });
        }

        Ok(Self {
            width,
            height,
            alpha,
        })
    }

    /// Keeps only the alpha byte of each RGBA pixel.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, SwarmError> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(SwarmError::MalformedMask {
                width,
                height,
                len: rgba.len(),
            });
        }

        let alpha = rgba.chunks_exact(4).map(|px| px[3]).collect();
        Self::from_alpha(width, height, alpha)
    }

    /// Builds a mask from a coverage predicate over pixel coordinates.
    pub fn from_fn(
        width: u32,
        height: u32,
        solid: impl Fn(u32, u32) -> bool,
    ) -> Result<Self, SwarmError> {
        let mut alpha = Vec::with_capacity(width as usize * height as usize);

        for y in 0..height {
            for x in 0..width {
                alpha.push(if solid(x, y) { 255 } else { 0 });
            }
        }

        Self::from_alpha(width, height, alpha)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }
}

/// Fits the mask into the viewport, samples it on a fixed stride and
/// shuffles the result so raster order never leaks into particle identity.
///
/// An empty result is not an error here; the pool builder rejects it.
pub fn sample_anchors(
    mask: &OpacityMask,
    viewport: Viewport,
    config: &SamplerConfig,
    rng: &mut impl Rng,
) -> Vec<Point> {
    let mut anchors = raster_anchors(mask, viewport, config);
    anchors.shuffle(rng);
    anchors
}

/// Anchors in scan order, before shuffling.
fn raster_anchors(mask: &OpacityMask, viewport: Viewport, config: &SamplerConfig) -> Vec<Point> {
    let vw = viewport.width as f32;
    let vh = viewport.height as f32;
    let mw = mask.width as f32;
    let mh = mask.height as f32;

    let scale = (vw / mw).min(vh / mh) * config.hero_scale;
    let ox = (vw - mw * scale) * 0.5;
    let oy = (vh - mh * scale) * 0.5;

    let stride = config.stride.max(1) as usize;
    let mut anchors = Vec::new();

    for y in (0..mask.height).step_by(stride) {
        for x in (0..mask.width).step_by(stride) {
            if mask.alpha(x, y) > config.alpha_threshold {
                anchors.push(Point::new(ox + x as f32 * scale, oy + y as f32 * scale));
            }
        }
    }

    anchors
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn opaque(width: u32, height: u32) -> OpacityMask {
        OpacityMask::from_fn(width, height, |_, _| true).unwrap()
    }

    #[test]
    fn rgba_keeps_alpha_channel() {
        let rgba = [10, 20, 30, 0, 10, 20, 30, 200];
        let mask = OpacityMask::from_rgba(2, 1, &rgba).unwrap();

        assert_eq!(mask.alpha(0, 0), 0);
        assert_eq!(mask.alpha(1, 0), 200);
    }

    #[test]
    fn malformed_buffers_are_rejected() {
        assert!(OpacityMask::from_rgba(2, 2, &[0; 15]).is_err());
        assert!(OpacityMask::from_alpha(0, 3, Vec::new()).is_err());
        assert!(OpacityMask::from_alpha(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn opaque_square_yields_full_stride_grid() {
        let mask = opaque(100, 100);
        let mut rng = StdRng::seed_from_u64(1);
        let config = SamplerConfig::default();
        let anchors = sample_anchors(&mask, Viewport::new(800, 600), &config, &mut rng);

        assert_eq!(anchors.len(), 400);
    }

    #[test]
    fn anchors_are_centered_and_scaled() {
        let mask = opaque(100, 100);
        let anchors = raster_anchors(&mask, Viewport::new(800, 600), &SamplerConfig::default());

        // scale = min(8, 6) * 0.85 = 5.1, leaving (800 - 510) / 2 and (600 - 510) / 2.
        let first = anchors[0];
        assert!((first.x - 145.0).abs() < 1e-3, "{first:?}");
        assert!((first.y - 45.0).abs() < 1e-3, "{first:?}");

        let second = anchors[1];
        assert!((second.x - first.x - 25.5).abs() < 1e-3);
        assert_eq!(second.y, first.y);

        for p in &anchors {
            assert!(p.x >= 145.0 - 1e-3 && p.x < 655.0);
            assert!(p.y >= 45.0 - 1e-3 && p.y < 555.0);
        }
    }

    #[test]
    fn translucent_pixels_are_skipped() {
        let mask = OpacityMask::from_alpha(10, 10, vec![40; 100]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SamplerConfig::default();

        assert!(sample_anchors(&mask, Viewport::new(100, 100), &config, &mut rng).is_empty());

        let mask = OpacityMask::from_alpha(10, 10, vec![41; 100]).unwrap();
        assert_eq!(sample_anchors(&mask, Viewport::new(100, 100), &config, &mut rng).len(), 4);
    }

    #[test]
    fn density_follows_area() {
        // Left half solid: half of the stride columns survive.
        let mask = OpacityMask::from_fn(100, 100, |x, _| x < 50).unwrap();
        let anchors = raster_anchors(&mask, Viewport::new(800, 600), &SamplerConfig::default());

        assert_eq!(anchors.len(), 200);
    }

    #[test]
    fn shuffle_permutes_without_losing_points() {
        let mask = opaque(100, 100);
        let config = SamplerConfig::default();
        let viewport = Viewport::new(800, 600);
        let raster = raster_anchors(&mask, viewport, &config);
        let mut rng = StdRng::seed_from_u64(42);
        let shuffled = sample_anchors(&mask, viewport, &config, &mut rng);

        assert_ne!(raster, shuffled);

        let key = |p: &Point| (p.x.to_bits(), p.y.to_bits());
        let mut a: Vec<_> = raster.iter().map(key).collect();
        let mut b: Vec<_> = shuffled.iter().map(key).collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
