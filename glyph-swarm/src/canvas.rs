use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier};
use ratatui::widgets::Widget;

use crate::blend::Rgb;
use crate::config::SwarmConfig;
use crate::geometry::Point;
use crate::swarm::{FrameInput, Swarm};

/// One draw call: a character at a position in a given fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub position: Point,
    pub color: Rgb,
    pub alpha: f32,
    pub size: f32,
}

/// The external text-rendering primitive, called once per particle per frame.
pub trait GlyphSink {
    fn draw(&mut self, glyph: &Glyph);
}

impl GlyphSink for Vec<Glyph> {
    fn draw(&mut self, glyph: &Glyph) {
        self.push(*glyph);
    }
}

/// Size ratio above which a glyph is drawn bold.
const BOLD_RATIO: f32 = 1.25;

/// Draws glyphs into a ratatui buffer. A cell covers `char_width × line_height`
/// pixels; alpha is flattened against the background tone since terminals
/// have no translucency.
pub struct BufferCanvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    cell_w: f32,
    cell_h: f32,
    background: Rgb,
    font_size: f32,
}

impl<'a> BufferCanvas<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, config: &SwarmConfig) -> Self {
        Self {
            buf,
            area,
            cell_w: config.grid.char_width,
            cell_h: config.grid.line_height,
            background: config.color.background,
            font_size: config.grid.font_size,
        }
    }

    /// Paints the whole area with the background tone.
    pub fn clear(&mut self) {
        let bg: Color = self.background.into();

        for y in self.area.top()..self.area.bottom() {
            for x in self.area.left()..self.area.right() {
                let cell = &mut self.buf[(x, y)];
                cell.set_char(' ');
                cell.set_bg(bg);
                cell.modifier = Modifier::empty();
            }
        }
    }

    fn cell_at(&self, p: Point) -> Option<(u16, u16)> {
        if !(p.x >= 0.0 && p.y >= 0.0) {
            return None;
        }

        let col = (p.x / self.cell_w).floor();
        let row = (p.y / self.cell_h).floor();

        if col >= self.area.width as f32 || row >= self.area.height as f32 {
            return None;
        }

        Some((self.area.x + col as u16, self.area.y + row as u16))
    }
}

impl GlyphSink for BufferCanvas<'_> {
    fn draw(&mut self, glyph: &Glyph) {
        if glyph.ch.is_whitespace() {
            return;
        }

        let Some((x, y)) = self.cell_at(glyph.position) else {
            return;
        };

        let fg = glyph.color.over(self.background, glyph.alpha);
        let modifier = if glyph.size > self.font_size * BOLD_RATIO {
            Modifier::BOLD
        } else {
            Modifier::empty()
        };

        let cell = &mut self.buf[(x, y)];
        cell.set_char(glyph.ch);
        cell.set_fg(fg.into());
        cell.modifier = modifier;
    }
}

/// Ticks the swarm straight into the frame being rendered.
pub struct SwarmView<'a> {
    swarm: &'a mut Swarm,
    input: FrameInput,
}

impl<'a> SwarmView<'a> {
    pub fn new(swarm: &'a mut Swarm, input: FrameInput) -> Self {
        Self { swarm, input }
    }
}

impl Widget for SwarmView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = BufferCanvas::new(buf, area, self.swarm.config());

        canvas.clear();
        self.swarm.tick(self.input, &mut canvas);
    }
}
