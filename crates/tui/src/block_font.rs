use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FONT_WIDTH: usize = 4;
const SHADOW_OFFSET: usize = 1;
const FILL_CHAR: char = '█';
const SHADE_CHAR: char = '░';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('M', ["1  1", "1111", "1111", "1  1", "1  1"]),
        ('E', ["1111", "1   ", "111 ", "1   ", "1111"]),
        ('O', [" 11 ", "1  1", "1  1", "1  1", " 11 "]),
        ('0', ["1111", "1  1", "1  1", "1  1", "1111"]),
        ('1', ["  1 ", " 11 ", "  1 ", "  1 ", " 111"]),
        ('2', ["1111", "   1", "1111", "1   ", "1111"]),
        ('3', ["1111", "   1", " 111", "   1", "1111"]),
        ('4', ["1  1", "1  1", "1111", "   1", "   1"]),
        ('5', ["1111", "1   ", "1111", "   1", "1111"]),
        ('6', ["1111", "1   ", "1111", "1  1", "1111"]),
        ('7', ["1111", "   1", "  1 ", " 1  ", " 1  "]),
        ('8', ["1111", "1  1", "1111", "1  1", "1111"]),
        ('9', ["1111", "1  1", "1111", "   1", "1111"]),
        ('.', ["    ", "    ", "    ", "    ", " 1  "]),
        (' ', ["    ", "    ", "    ", "    ", "    "]),
        ('?', ["111 ", "   1", " 11 ", "    ", " 1  "]),
    ])
});

/// Render a headline with a drop shadow, e.g. the title banner.
pub fn render(text: &str) -> Vec<String> {
    draw(text, true)
}

/// Render without shadow; compact enough for the running timer.
pub fn render_flat(text: &str) -> Vec<String> {
    draw(text, false)
}

fn draw(text: &str, shadow: bool) -> Vec<String> {
    let content: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
    let extra = if shadow { SHADOW_OFFSET } else { 0 };
    let glyph_width = FONT_WIDTH * 2;
    let spacing = 2;
    let width = content.len() * (glyph_width + spacing) + extra * 2;
    let mut canvas = Canvas::new(width, FONT_HEIGHT + extra);

    for (index, ch) in content.iter().enumerate() {
        let Some(glyph) = GLYPHS.get(ch).or_else(|| GLYPHS.get(&'?')) else {
            continue;
        };
        let x = index * (glyph_width + spacing);
        if shadow {
            canvas.stamp(glyph, x + SHADOW_OFFSET * 2, SHADOW_OFFSET, SHADE_CHAR);
        }
        canvas.stamp(glyph, x, 0, FILL_CHAR);
    }

    canvas.into_lines()
}

struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
        }
    }

    /// Paint every set pixel of `glyph` two cells wide; fill overwrites shade.
    fn stamp(&mut self, glyph: &Glyph, x: usize, y: usize, ch: char) {
        for (row, line) in glyph.iter().enumerate() {
            for (col, pixel) in line.chars().enumerate() {
                if pixel != '1' {
                    continue;
                }
                self.put(x + col * 2, y + row, ch);
                self.put(x + col * 2 + 1, y + row, ch);
            }
        }
    }

    fn put(&mut self, x: usize, y: usize, ch: char) {
        let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return;
        };
        if *cell == ' ' || ch == FILL_CHAR {
            *cell = ch;
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.cells
            .into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_render_has_font_height() {
        let lines = render_flat("12.50");
        assert_eq!(lines.len(), FONT_HEIGHT);
        assert!(lines.iter().any(|line| line.contains(FILL_CHAR)));
        assert!(lines.iter().all(|line| !line.contains(SHADE_CHAR)));
    }

    #[test]
    fn banner_adds_shadow_rows() {
        let lines = render("MEMO");
        assert_eq!(lines.len(), FONT_HEIGHT + SHADOW_OFFSET);
        assert!(lines.iter().any(|line| line.contains(SHADE_CHAR)));
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(render_flat("#"), render_flat("?"));
    }
}
