use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blend::Blender;
use crate::canvas::{Glyph, GlyphSink};
use crate::config::SwarmConfig;
use crate::error::SwarmError;
use crate::forces;
use crate::geometry::{Point, Viewport};
use crate::grid::CodeText;
use crate::mask::OpacityMask;
use crate::pool::{Particle, Pool};
use crate::state::{Mode, StateMachine};

/// Snapshot of the host's inputs, taken once at the top of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Monotonic clock reading.
    pub now_ms: u64,
    /// `None` while the pointer is outside the surface.
    pub pointer: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub particles: usize,
    /// Particles the pointer pushed or pulled this frame.
    pub interacting: usize,
    pub mean_speed: f32,
}

/// Owns every piece of simulation state for one surface.
///
/// The pool is only ever replaced by a fully built successor, and `tick`
/// takes `&mut self`, so a frame can never observe a half-rebuilt array.
pub struct Swarm {
    config: SwarmConfig,
    masks: Vec<OpacityMask>,
    text: CodeText,
    pool: Pool,
    state: StateMachine,
    rng: StdRng,
    stats: FrameStats,
}

impl Swarm {
    /// Validates the configuration and builds the first pool. Fails instead of
    /// starting when any formation would be empty.
    pub fn new(
        config: SwarmConfig,
        masks: Vec<OpacityMask>,
        text: CodeText,
        viewport: Viewport,
        now_ms: u64,
    ) -> Result<Self, SwarmError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool = Pool::build(&masks, &text, viewport, &config, &mut rng)?;
        let state = StateMachine::new(&config, pool.shape_count(), now_ms);

        Ok(Self {
            config,
            masks,
            text,
            pool,
            state,
            rng,
            stats: FrameStats::default(),
        })
    }

    /// Discards every particle and rebuilds for `viewport`. On failure the
    /// current pool is kept.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), SwarmError> {
        let built = Pool::build(&self.masks, &self.text, viewport, &self.config, &mut self.rng);

        let pool = match built {
            Ok(pool) => pool,
            Err(err) => {
                tracing::warn!(%viewport, error = %err, "resize rejected, keeping previous pool");
                return Err(err);
            }
        };

        self.state.set_shape_count(pool.shape_count());
        self.pool = pool;
        Ok(())
    }

    /// Discrete user input: advances the mode and restarts the dwell timer.
    pub fn activate(&mut self, now_ms: u64) -> Mode {
        self.state.activate(now_ms)
    }

    /// One frame: time check, then forces, color and one draw per particle.
    pub fn tick(&mut self, input: FrameInput, sink: &mut impl GlyphSink) -> FrameStats {
        self.state.update(input.now_ms);

        let mode = self.state.mode();
        let blender = Blender::new(
            &self.config.color,
            self.state.accent(),
            input.now_ms,
            self.state.flash_at(),
        );
        let glow_boost = self.config.color.glow.map_or(0.0, |g| g.size_boost);
        let font_size = self.config.grid.font_size;

        let mut interacting = 0;
        let mut speed_sum = 0.0;

        for particle in self.pool.particles_mut() {
            let distance = pointer_distance(particle, input.pointer);

            if forces::step(particle, mode, input.pointer, distance, input.now_ms, &self.config) {
                interacting += 1;
            }

            let speed = particle.speed();
            speed_sum += speed;

            let tint = blender.tint(distance, speed);
            sink.draw(&Glyph {
                ch: particle.ch(),
                position: particle.position,
                color: tint.color,
                alpha: tint.alpha,
                size: font_size * (1.0 + tint.glow * glow_boost),
            });
        }

        let particles = self.pool.len();
        self.stats = FrameStats {
            particles,
            interacting,
            mean_speed: if particles == 0 {
                0.0
            } else {
                speed_sum / particles as f32
            },
        };

        self.stats
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn state(&self) -> &StateMachine {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn viewport(&self) -> Viewport {
        self.pool.viewport()
    }

    /// Statistics of the most recent `tick`.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Measured once per particle per frame and shared by forces and color.
fn pointer_distance(particle: &Particle, pointer: Option<Point>) -> f32 {
    pointer.map_or(f32::INFINITY, |p| p.distance(particle.position))
}
