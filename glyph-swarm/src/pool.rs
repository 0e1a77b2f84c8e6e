use std::f32::consts::TAU;

use rand::Rng;

use crate::config::SwarmConfig;
use crate::error::SwarmError;
use crate::geometry::{Point, Viewport};
use crate::grid::{self, CodeCell, CodeText};
use crate::mask::{self, OpacityMask};

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    /// One entry per shape formation.
    targets: Vec<Point>,
    code_target: Point,
    ch: char,
    /// Offset into the idle drift wave.
    phase: f32,
}

impl Particle {
    pub fn shape_target(&self, shape: usize) -> Point {
        self.targets[shape]
    }

    pub fn targets(&self) -> &[Point] {
        &self.targets
    }

    pub fn code_target(&self) -> Point {
        self.code_target
    }

    /// Fixed for the particle's lifetime, whatever formation it is heading for.
    pub fn ch(&self) -> char {
        self.ch
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Fixed-size particle array for one viewport. Rebuilt wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    viewport: Viewport,
    particles: Vec<Particle>,
    anchor_counts: Vec<usize>,
}

impl Pool {
    /// Samples every mask, lays out the code grid and assembles the particles.
    pub fn build(
        masks: &[OpacityMask],
        text: &CodeText,
        viewport: Viewport,
        config: &SwarmConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, SwarmError> {
        if viewport.is_empty() {
            return Err(SwarmError::InvalidViewport(viewport));
        }

        let formations: Vec<Vec<Point>> = masks
            .iter()
            .map(|m| mask::sample_anchors(m, viewport, &config.sampler, rng))
            .collect();
        let cells = grid::generate(text, viewport, &config.grid);

        Self::assemble(viewport, cells, formations, rng)
    }

    /// Particle `i` heads for `formations[s][i % len]` in shape `s` and for
    /// `cells[i]` in code mode, so the grid fixes the particle count.
    pub fn assemble(
        viewport: Viewport,
        cells: Vec<CodeCell>,
        formations: Vec<Vec<Point>>,
        rng: &mut impl Rng,
    ) -> Result<Self, SwarmError> {
        if formations.is_empty() {
            return Err(SwarmError::NoShapes);
        }

        if cells.is_empty() {
            return Err(SwarmError::EmptyCodeGrid(viewport));
        }

        if let Some(shape) = formations.iter().position(|f| f.is_empty()) {
            return Err(SwarmError::EmptyFormation { shape, viewport });
        }

        let particles: Vec<Particle> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let targets: Vec<Point> = formations.iter().map(|f| f[i % f.len()]).collect();

                Particle {
                    position: targets[0],
                    velocity: Point::ZERO,
                    targets,
                    code_target: cell.position,
                    ch: cell.ch,
                    phase: rng.gen_range(0.0..TAU),
                }
            })
            .collect();

        let anchor_counts: Vec<usize> = formations.iter().map(Vec::len).collect();

        tracing::debug!(
            %viewport,
            particles = particles.len(),
            ?anchor_counts,
            "built particle pool"
        );

        Ok(Self {
            viewport,
            particles,
            anchor_counts,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn shape_count(&self) -> usize {
        self.anchor_counts.len()
    }

    /// Distinct anchors sampled for `shape`.
    pub fn anchor_count(&self, shape: usize) -> usize {
        self.anchor_counts[shape]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn square(size: u32) -> OpacityMask {
        OpacityMask::from_fn(size, size, |_, _| true).unwrap()
    }

    fn disc(size: u32) -> OpacityMask {
        let r = size as f32 / 2.0;
        OpacityMask::from_fn(size, size, |x, y| {
            let dx = x as f32 - r;
            let dy = y as f32 - r;
            dx * dx + dy * dy < r * r
        })
        .unwrap()
    }

    fn reference_text() -> CodeText {
        let lines: Vec<String> = (0..10).map(|_| "x".repeat(50)).collect();
        CodeText::from_lines(&lines).unwrap()
    }

    #[test]
    fn reference_scenario_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = Pool::build(
            &[square(100)],
            &reference_text(),
            Viewport::new(800, 600),
            &SwarmConfig::classic(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(pool.len(), 1386);
        assert_eq!(pool.shape_count(), 1);
        assert_eq!(pool.anchor_count(0), 400);
    }

    #[test]
    fn every_particle_targets_an_anchor_of_every_formation() {
        let mut rng = StdRng::seed_from_u64(9);
        let viewport = Viewport::new(800, 600);
        let config = SwarmConfig::classic();
        let masks = [square(100), disc(120), square(7)];

        let formations: Vec<Vec<Point>> = masks
            .iter()
            .map(|m| mask::sample_anchors(m, viewport, &config.sampler, &mut rng))
            .collect();
        let cells = grid::generate(&reference_text(), viewport, &config.grid);
        let pool = Pool::assemble(viewport, cells.clone(), formations.clone(), &mut rng).unwrap();

        assert_eq!(pool.len(), cells.len());

        for (i, p) in pool.particles().iter().enumerate() {
            assert_eq!(p.targets().len(), formations.len());

            for (s, anchors) in formations.iter().enumerate() {
                assert_eq!(p.shape_target(s), anchors[i % anchors.len()]);
            }

            assert_eq!(p.code_target(), cells[i].position);
            assert_eq!(p.ch(), cells[i].ch);
        }
    }

    #[test]
    fn particles_start_at_rest_on_first_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = Pool::build(
            &[disc(80), square(80)],
            &CodeText::default(),
            Viewport::new(640, 480),
            &SwarmConfig::classic(),
            &mut rng,
        )
        .unwrap();

        for p in pool.particles() {
            assert_eq!(p.position, p.shape_target(0));
            assert_eq!(p.velocity, Point::ZERO);
            assert!((0.0..TAU).contains(&p.phase()));
        }
    }

    #[test]
    fn rebuild_is_idempotent_in_size() {
        let masks = [disc(90), square(60)];
        let viewport = Viewport::new(1024, 768);
        let config = SwarmConfig::drift();

        let text = CodeText::default();
        let build = |seed| {
            Pool::build(&masks, &text, viewport, &config, &mut StdRng::seed_from_u64(seed)).unwrap()
        };
        let a = build(1);
        let b = build(2);

        assert_eq!(a.len(), b.len());
        assert_eq!(a.anchor_count(0), b.anchor_count(0));
        assert_eq!(a.anchor_count(1), b.anchor_count(1));
    }

    #[test]
    fn transparent_mask_is_a_reported_error() {
        let blank = OpacityMask::from_fn(50, 50, |_, _| false).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let viewport = Viewport::new(800, 600);

        let err = Pool::build(
            &[square(50), blank],
            &CodeText::default(),
            viewport,
            &SwarmConfig::classic(),
            &mut rng,
        )
        .unwrap_err();

        assert_eq!(err, SwarmError::EmptyFormation { shape: 1, viewport });
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = SwarmConfig::classic();
        let text = CodeText::default();

        assert_eq!(
            Pool::build(&[], &text, Viewport::new(800, 600), &config, &mut rng),
            Err(SwarmError::NoShapes)
        );
        assert_eq!(
            Pool::build(&[square(10)], &text, Viewport::new(0, 600), &config, &mut rng),
            Err(SwarmError::InvalidViewport(Viewport::new(0, 600)))
        );
        assert_eq!(
            Pool::build(&[square(10)], &text, Viewport::new(40, 50), &config, &mut rng),
            Err(SwarmError::EmptyCodeGrid(Viewport::new(40, 50)))
        );
    }
}
