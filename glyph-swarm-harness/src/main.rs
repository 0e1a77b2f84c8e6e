use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEventKind, MouseButton, MouseEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use serde_json::Value;

use glyph_swarm::{
    CodeText, FrameInput, OpacityMask, Point, Swarm, SwarmConfig, SwarmView, Viewport,
};

/// Side of the built-in silhouettes, in mask pixels.
const BUILTIN_SIZE: u32 = 160;

#[derive(Parser, Debug)]
#[command(about = "Glyph particles morphing between silhouettes and code")]
struct Args {
    /// Silhouette image (PNG or JPEG). Repeat for more formations; built-in
    /// shapes are used when none is given.
    #[arg(short, long = "mask")]
    masks: Vec<PathBuf>,

    /// Text file tiled across the code grid.
    #[arg(long)]
    code: Option<PathBuf>,

    /// classic, drift, glow or cycle.
    #[arg(short, long, default_value = "cycle")]
    preset: String,

    /// JSON file layered over the preset.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write tracing output to this file.
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log {
        init_logging(path)?;
    }

    let config = load_config(&args)?;
    let masks = load_masks(&args.masks)?;
    let text = match &args.code {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading code block {}", path.display()))?;
            CodeText::from_text(&raw)?
        }
        None => CodeText::default(),
    };

    enable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;

    let result = run(config, masks, text, args.fps);

    disable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;

    result
}

fn init_logging(path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    Ok(())
}

fn load_config(args: &Args) -> Result<SwarmConfig> {
    let mut config = SwarmConfig::preset(&args.preset)
        .ok_or_else(|| anyhow!("unknown preset `{}`", args.preset))?;

    if let Some(path) = &args.config {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let patch: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;

        let mut merged = serde_json::to_value(&config)?;
        merge(&mut merged, patch);
        config = serde_json::from_value(merged)
            .with_context(|| format!("applying config {}", path.display()))?;
    }

    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

/// Recursive object merge; anything else in `patch` replaces `base`.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

fn load_masks(paths: &[PathBuf]) -> Result<Vec<OpacityMask>> {
    if paths.is_empty() {
        return builtin_masks();
    }

    paths.iter().map(PathBuf::as_path).map(load_mask).collect()
}

fn load_mask(path: &Path) -> Result<OpacityMask> {
    let img = image::open(path)
        .with_context(|| format!("decoding mask {}", path.display()))?
        .to_rgba8();
    let mask = OpacityMask::from_rgba(img.width(), img.height(), img.as_raw())?;

    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "loaded mask"
    );

    Ok(mask)
}

fn builtin_masks() -> Result<Vec<OpacityMask>> {
    let r = BUILTIN_SIZE as f32 / 2.0;
    let polar = |x: u32, y: u32| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        (dx, dy, (dx * dx + dy * dy).sqrt())
    };

    let disc = OpacityMask::from_fn(BUILTIN_SIZE, BUILTIN_SIZE, |x, y| polar(x, y).2 < r)?;
    let ring = OpacityMask::from_fn(BUILTIN_SIZE, BUILTIN_SIZE, |x, y| {
        let d = polar(x, y).2;
        d < r && d > r * 0.55
    })?;
    let diamond = OpacityMask::from_fn(BUILTIN_SIZE, BUILTIN_SIZE, |x, y| {
        let (dx, dy, _) = polar(x, y);
        dx.abs() + dy.abs() < r
    })?;

    Ok(vec![disc, ring, diamond])
}

/// Pixel viewport covered by a block of terminal cells.
fn viewport_for(area: Rect, config: &SwarmConfig) -> Viewport {
    Viewport::new(
        (area.width as f32 * config.grid.char_width) as u32,
        (area.height as f32 * config.grid.line_height) as u32,
    )
}

/// Center of the cell under the mouse, in the swarm's pixel space.
///
/// Terminals report nothing once the mouse leaves the window, so the last
/// event lands on an edge cell. The field's top row and side columns count as
/// outside; its bottom edge borders the status line, which already does.
fn cell_center(column: u16, row: u16, field: Rect, config: &SwarmConfig) -> Option<Point> {
    let on_edge = column == field.left() || column + 1 == field.right() || row == field.top();

    if on_edge || !field.contains(Position::new(column, row)) {
        return None;
    }

    Some(Point::new(
        ((column - field.x) as f32 + 0.5) * config.grid.char_width,
        ((row - field.y) as f32 + 0.5) * config.grid.line_height,
    ))
}

fn split(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area)
}

/// Frame clock that can be held still.
struct Clock {
    last: Instant,
    elapsed_ms: f64,
    paused: bool,
}

impl Clock {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            elapsed_ms: 0.0,
            paused: false,
        }
    }

    fn now_ms(&mut self) -> u64 {
        let now = Instant::now();

        if !self.paused {
            self.elapsed_ms += (now - self.last).as_secs_f64() * 1000.0;
        }

        self.last = now;
        self.elapsed_ms as u64
    }

    fn toggle(&mut self) {
        self.now_ms();
        self.paused = !self.paused;
    }
}

fn run(config: SwarmConfig, masks: Vec<OpacityMask>, text: CodeText, fps: u32) -> Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let [mut field, _] = split(Rect::new(0, 0, size.width, size.height));

    let mut clock = Clock::new();
    let viewport = viewport_for(field, &config);
    let mut swarm = Swarm::new(config, masks, text, viewport, clock.now_ms())?;
    let config = swarm.config().clone();

    tracing::info!(
        viewport = %swarm.viewport(),
        particles = swarm.particles().len(),
        "swarm started"
    );

    let frame = Duration::from_secs(1) / fps.max(1);
    let mut pointer: Option<Point> = None;
    let mut notice: Option<String> = None;

    loop {
        let started = Instant::now();
        let input = FrameInput {
            now_ms: clock.now_ms(),
            pointer,
        };

        terminal.draw(|f| {
            let [main, status] = split(f.area());
            f.render_widget(SwarmView::new(&mut swarm, input), main);
            f.render_widget(status_line(&swarm, clock.paused, notice.as_deref()), status);
        })?;

        while let Some(timeout) = frame.checked_sub(started.elapsed()) {
            if !event::poll(timeout)? {
                break;
            }

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        swarm.activate(clock.now_ms());
                    }
                    KeyCode::Char('p') => clock.toggle(),
                    _ => {}
                },

                Event::Mouse(mouse) => {
                    pointer = cell_center(mouse.column, mouse.row, field, &config);

                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        swarm.activate(clock.now_ms());
                    }
                }

                Event::FocusLost => pointer = None,

                Event::Resize(width, height) => {
                    [field, _] = split(Rect::new(0, 0, width, height));
                    notice = swarm
                        .resize(viewport_for(field, &config))
                        .err()
                        .map(|e| e.to_string());
                }

                _ => {}
            }
        }
    }
}

fn status_line<'a>(swarm: &Swarm, paused: bool, notice: Option<&'a str>) -> Paragraph<'a> {
    let stats = swarm.stats();
    let mut text = format!(
        " {}  particles {}  interacting {}  speed {:.2}{}  [click/space morph] [p pause] [q quit]",
        swarm.mode(),
        stats.particles,
        stats.interacting,
        stats.mean_speed,
        if paused { "  paused" } else { "" },
    );

    if let Some(notice) = notice {
        text.push_str("  ");
        text.push_str(notice);
    }

    Paragraph::new(text).style(Style::new().fg(Color::DarkGray))
}
