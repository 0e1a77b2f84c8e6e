use crate::config::{GridConfig, RowRounding};
use crate::error::SwarmError;
use crate::geometry::{Point, Viewport};

/// Block tiled across the code grid when no other text is supplied.
pub const DEFAULT_CODE: &[&str] = &[
    "<!DOCTYPE html>",
    "<html lang=\"en\">",
    "<head>",
    "  <meta charset=\"UTF-8\">",
    "  <title>Hero Morph Engine</title>",
    "</head>",
    "<body>",
    "  <canvas id=\"hero\"></canvas>",
    "</body>",
    "</html>",
];

/// A multi-line block flattened into one cyclic glyph stream.
///
/// Line breaks (and any other control character) become blanks so they are
/// never the visible glyph of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeText {
    glyphs: Vec<char>,
}

impl CodeText {
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, SwarmError> {
        let joined = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");

        Self::from_text(&joined)
    }

    pub fn from_text(text: &str) -> Result<Self, SwarmError> {
        let glyphs: Vec<char> = text
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        if glyphs.is_empty() {
            return Err(SwarmError::EmptyCodeText);
        }

        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Wraps past the end of the block.
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index % self.glyphs.len()]
    }
}

impl Default for CodeText {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_CODE.join(" ").chars().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeCell {
    pub position: Point,
    pub ch: char,
}

/// `(cols, rows)` that fit inside the margins.
pub fn dimensions(viewport: Viewport, config: &GridConfig) -> (usize, usize) {
    let usable_w = (viewport.width as f32 - config.margin_x * 2.0).max(0.0);
    let usable_h = (viewport.height as f32 - config.margin_y * 2.0).max(0.0);

    let cols = (usable_w / config.char_width).floor();
    let rows = match config.rows {
        RowRounding::Floor => (usable_h / config.line_height).floor(),
        RowRounding::Ceil => (usable_h / config.line_height).ceil(),
    };

    (cols as usize, rows as usize)
}

/// Row-major cells covering the viewport, glyphs taken cyclically from `text`.
pub fn generate(text: &CodeText, viewport: Viewport, config: &GridConfig) -> Vec<CodeCell> {
    let (cols, rows) = dimensions(viewport, config);
    let mut cells = Vec::with_capacity(cols * rows);

    for r in 0..rows {
        let y = config.margin_y + r as f32 * config.line_height;

        for c in 0..cols {
            let x = config.margin_x + c as f32 * config.char_width;
            cells.push(CodeCell {
                position: Point::new(x, y),
                ch: text.glyph(cells.len()),
            });
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_by_fifty() -> CodeText {
        let lines: Vec<String> = (0..10).map(|i| format!("{i}").repeat(50)).collect();
        CodeText::from_lines(&lines).unwrap()
    }

    #[test]
    fn floor_dimensions_match_reference_viewport() {
        let config = GridConfig::default();
        assert_eq!(dimensions(Viewport::new(800, 600), &config), (63, 22));

        let cells = generate(&ten_by_fifty(), Viewport::new(800, 600), &config);
        assert_eq!(cells.len(), 1386);
    }

    #[test]
    fn ceil_adds_the_partial_row() {
        let config = GridConfig {
            rows: RowRounding::Ceil,
            ..GridConfig::default()
        };

        // (600 - 60) / 24 = 22.5
        assert_eq!(dimensions(Viewport::new(800, 600), &config), (63, 23));

        // Exact fit: ceil and floor agree.
        assert_eq!(dimensions(Viewport::new(800, 588), &config).1, 22);
    }

    #[test]
    fn cells_walk_row_major_from_margins() {
        let config = GridConfig::default();
        let cells = generate(&ten_by_fifty(), Viewport::new(800, 600), &config);

        assert_eq!(cells[0].position, Point::new(20.0, 30.0));
        assert_eq!(cells[1].position, Point::new(32.0, 30.0));
        assert_eq!(cells[63].position, Point::new(20.0, 54.0));

        let last = cells.last().unwrap().position;
        assert_eq!(last, Point::new(20.0 + 62.0 * 12.0, 30.0 + 21.0 * 24.0));
    }

    #[test]
    fn stream_wraps_cyclically() {
        let text = CodeText::from_text("abc").unwrap();
        let cells = generate(&text, Viewport::new(800, 600), &GridConfig::default());
        let glyphs: String = cells.iter().take(7).map(|c| c.ch).collect();

        assert_eq!(glyphs, "abcabca");
        assert_eq!(cells[1385].ch, text.glyph(1385));
    }

    #[test]
    fn newlines_never_become_visible_glyphs() {
        let text = CodeText::from_lines(&["ab", "cd"]).unwrap();
        assert_eq!(text.len(), 5);
        assert_eq!(text.glyph(2), ' ');

        let cells = generate(&text, Viewport::new(800, 600), &GridConfig::default());
        assert!(cells.iter().all(|c| c.ch != '\n'));

        let text = CodeText::from_text("a\r\n\tb").unwrap();
        assert!((0..text.len()).all(|i| !text.glyph(i).is_control()));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(CodeText::from_text(""), Err(SwarmError::EmptyCodeText));
        assert_eq!(
            CodeText::from_lines::<&str>(&[]),
            Err(SwarmError::EmptyCodeText)
        );
    }

    #[test]
    fn tiny_viewport_yields_no_cells() {
        let cells = generate(&CodeText::default(), Viewport::new(30, 40), &GridConfig::default());
        assert!(cells.is_empty());
    }

    #[test]
    fn default_block_has_no_line_breaks() {
        let text = CodeText::default();
        assert!(!text.is_empty());
        assert!((0..text.len()).all(|i| text.glyph(i) != '\n'));
    }
}
