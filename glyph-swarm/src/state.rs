use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blend::Rgb;
use crate::config::{AccentPolicy, SwarmConfig};

/// Pointer behaviour inside the hover radius while in code mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Push,
    Magnet,
}

impl Interaction {
    pub fn flipped(self) -> Self {
        match self {
            Interaction::Push => Interaction::Magnet,
            Interaction::Magnet => Interaction::Push,
        }
    }
}

/// Active formation. Shape mode always pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Shape(usize),
    Code(Interaction),
}

impl Mode {
    pub fn interaction(self) -> Interaction {
        match self {
            Mode::Shape(_) => Interaction::Push,
            Mode::Code(interaction) => interaction,
        }
    }

    pub fn is_code(self) -> bool {
        matches!(self, Mode::Code(_))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Shape(i) => write!(f, "shape {}", i),
            Mode::Code(Interaction::Push) => write!(f, "code/push"),
            Mode::Code(Interaction::Magnet) => write!(f, "code/magnet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Timer,
}

/// Single owner of the mode and its timers. The force engine and the color
/// blender only ever read it.
#[derive(Debug, Clone)]
pub struct StateMachine {
    mode: Mode,
    shape: usize,
    shape_count: usize,
    interaction: Interaction,
    accent: Rgb,
    palette: Vec<Rgb>,
    policy: AccentPolicy,
    auto: bool,
    dwell_ms: u64,
    last_switch: u64,
    flash_at: Option<u64>,
    rng: StdRng,
}

impl StateMachine {
    /// Starts in `Shape(0)` with the push variant armed. `shape_count` and the
    /// palette must be non-empty.
    pub fn new(config: &SwarmConfig, shape_count: usize, now_ms: u64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        let palette = config.color.palette.clone();

        Self {
            mode: Mode::Shape(0),
            shape: 0,
            shape_count: shape_count.max(1),
            interaction: Interaction::Push,
            accent: palette[0],
            palette,
            policy: config.color.accent,
            auto: config.cycle.auto,
            dwell_ms: config.cycle.dwell_ms,
            last_switch: now_ms,
            flash_at: None,
            rng,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn accent(&self) -> Rgb {
        self.accent
    }

    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    pub fn last_switch(&self) -> u64 {
        self.last_switch
    }

    /// Timestamp of the most recent timer-driven transition.
    pub fn flash_at(&self) -> Option<u64> {
        self.flash_at
    }

    /// Discrete "activate" input. Also restarts the dwell timer.
    pub fn activate(&mut self, now_ms: u64) -> Mode {
        self.transition(now_ms, Trigger::Manual)
    }

    /// Time check, run once at the top of every frame. Returns the new mode
    /// when the dwell expired.
    pub fn update(&mut self, now_ms: u64) -> Option<Mode> {
        if !self.auto || now_ms.saturating_sub(self.last_switch) < self.dwell_ms {
            return None;
        }

        Some(self.transition(now_ms, Trigger::Timer))
    }

    /// Number of formations changed under us (resize with a new mask set).
    pub fn set_shape_count(&mut self, shape_count: usize) {
        self.shape_count = shape_count.max(1);
        self.shape %= self.shape_count;

        if let Mode::Shape(_) = self.mode {
            self.mode = Mode::Shape(self.shape);
        }
    }

    fn transition(&mut self, now_ms: u64, trigger: Trigger) -> Mode {
        self.mode = match self.mode {
            Mode::Shape(_) => {
                self.interaction = self.interaction.flipped();
                Mode::Code(self.interaction)
            }
            Mode::Code(_) => {
                self.shape = (self.shape + 1) % self.shape_count;
                Mode::Shape(self.shape)
            }
        };

        self.accent = self.pick_accent();
        self.last_switch = now_ms;

        if trigger == Trigger::Timer {
            self.flash_at = Some(now_ms);
        }

        tracing::info!(
            mode = %self.mode,
            ?trigger,
            accent = ?self.accent,
            "mode transition"
        );

        self.mode
    }

    fn pick_accent(&mut self) -> Rgb {
        match self.policy {
            AccentPolicy::ByShape => self.palette[self.shape % self.palette.len()],
            AccentPolicy::Random if self.palette.len() > 1 => {
                let others: Vec<Rgb> = self
                    .palette
                    .iter()
                    .copied()
                    .filter(|c| *c != self.accent)
                    .collect();

                if others.is_empty() {
                    self.accent
                } else {
                    others[self.rng.gen_range(0..others.len())]
                }
            }
            AccentPolicy::Random => self.palette[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(config: &SwarmConfig, shapes: usize) -> StateMachine {
        StateMachine::new(config, shapes, 0)
    }

    #[test]
    fn starts_in_first_shape_pushing() {
        let m = machine(&SwarmConfig::classic(), 2);

        assert_eq!(m.mode(), Mode::Shape(0));
        assert_eq!(m.mode().interaction(), Interaction::Push);
        assert_eq!(m.flash_at(), None);
    }

    #[test]
    fn four_activations_follow_toggle_rule() {
        let mut m = machine(&SwarmConfig::classic(), 2);

        let seen: Vec<Mode> = (1..=4).map(|i| m.activate(i * 100)).collect();

        assert_eq!(
            seen,
            vec![
                Mode::Code(Interaction::Magnet),
                Mode::Shape(1),
                Mode::Code(Interaction::Push),
                Mode::Shape(0),
            ]
        );
    }

    #[test]
    fn shape_index_wraps_over_longer_sequences() {
        let mut m = machine(&SwarmConfig::classic(), 3);
        let shapes: Vec<Mode> = (0..6).map(|i| m.activate(i)).filter(|s| !s.is_code()).collect();

        assert_eq!(shapes, vec![Mode::Shape(1), Mode::Shape(2), Mode::Shape(0)]);
    }

    #[test]
    fn manual_machine_ignores_time() {
        let mut m = machine(&SwarmConfig::classic(), 2);

        assert_eq!(m.update(1_000_000), None);
        assert_eq!(m.mode(), Mode::Shape(0));
    }

    #[test]
    fn timer_fires_after_dwell_and_records_flash() {
        let mut m = machine(&SwarmConfig::cycle(), 2);

        assert_eq!(m.update(6_999), None);
        assert_eq!(m.update(7_000), Some(Mode::Code(Interaction::Magnet)));
        assert_eq!(m.flash_at(), Some(7_000));
        assert_eq!(m.last_switch(), 7_000);

        assert_eq!(m.update(13_999), None);
        assert_eq!(m.update(14_000), Some(Mode::Shape(1)));
        assert_eq!(m.flash_at(), Some(14_000));
    }

    #[test]
    fn manual_override_resets_dwell_without_flash() {
        let mut m = machine(&SwarmConfig::cycle(), 2);

        m.activate(5_000);
        assert_eq!(m.flash_at(), None);
        assert_eq!(m.update(7_000), None);
        assert_eq!(m.update(11_999), None);
        assert_eq!(m.update(12_000), Some(Mode::Shape(1)));
    }

    #[test]
    fn accent_follows_shape_by_default() {
        let config = SwarmConfig::classic();
        let palette = config.color.palette.clone();
        let mut m = machine(&config, 4);

        assert_eq!(m.accent(), palette[0]);
        m.activate(1);
        m.activate(2);
        assert_eq!(m.mode(), Mode::Shape(1));
        assert_eq!(m.accent(), palette[1]);
        m.activate(3);
        m.activate(4);
        m.activate(5);
        m.activate(6);
        assert_eq!(m.mode(), Mode::Shape(3));
        assert_eq!(m.accent(), palette[0]);
    }

    #[test]
    fn random_accent_always_changes() {
        let mut config = SwarmConfig::cycle();
        config.seed = Some(11);
        let mut m = machine(&config, 10);

        for i in 1..=50 {
            let before = m.accent();
            m.activate(i);
            assert_ne!(m.accent(), before);
            assert!(config.color.palette.contains(&m.accent()));
        }
    }

    #[test]
    fn shrinking_shape_count_clamps_index() {
        let mut m = machine(&SwarmConfig::classic(), 3);
        m.activate(1);
        m.activate(2);
        m.activate(3);
        m.activate(4);
        assert_eq!(m.mode(), Mode::Shape(2));

        m.set_shape_count(2);
        assert_eq!(m.mode(), Mode::Shape(0));
        assert_eq!(m.shape_count(), 2);
    }
}
