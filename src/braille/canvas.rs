/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots) plus one
/// foreground color, taken from the last line drawn through the cell.
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    dots: Vec<u8>,       // Bit pattern per char
    colors: Vec<u32>,    // 0xAARRGGBB per char, 0 = unset
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![0u8; width * height],
            colors: vec![0u32; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.dots.fill(0);
        self.colors.fill(0);
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let idx = cy * self.width + cx;
        self.dots[idx] |= bit;
        self.colors[idx] = color;
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Draw a line using Bresenham's algorithm
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel_signed(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;

            if e2 >= dy {
                if x == x1 {
                    break;
                }
                err += dy;
                x += sx;
            }

            if e2 <= dx {
                if y == y1 {
                    break;
                }
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw an open or closed polyline in screen pixel coordinates.
    pub fn draw_polyline(&mut self, points: &[(f64, f64)], closed: bool, color: u32) {
        for pair in points.windows(2) {
            self.draw_line(
                pair[0].0 as i32,
                pair[0].1 as i32,
                pair[1].0 as i32,
                pair[1].1 as i32,
                color,
            );
        }
        if closed && points.len() > 2 {
            let first = points[0];
            let last = points[points.len() - 1];
            self.draw_line(
                last.0 as i32,
                last.1 as i32,
                first.0 as i32,
                first.1 as i32,
                color,
            );
        }
    }

    /// Braille glyph and color of a character cell. The glyph is
    /// U+2800 (blank) for cells with no dots set.
    pub fn cell(&self, cx: usize, cy: usize) -> (char, u32) {
        if cx >= self.width || cy >= self.height {
            return ('\u{2800}', 0);
        }
        let idx = cy * self.width + cx;
        let ch = char::from_u32(0x2800 + self.dots[idx] as u32).unwrap_or(' ');
        (ch, self.colors[idx])
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|cy| {
                (0..self.width)
                    .map(|cx| self.cell(cx, cy).0)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0xFFFF_FFFF;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0, WHITE);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
        assert_eq!(canvas.cell(0, 0).1, WHITE);
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        // Set all 8 dots
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y, WHITE);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF (all dots)
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0, WHITE);
        canvas.set_pixel(1, 1, WHITE);
        canvas.set_pixel(2, 2, WHITE);
        canvas.set_pixel(3, 3, WHITE);
        // First char: (0,0) and (1,1) = 0x01 | 0x10 = 0x11
        // Second char: (0,2) and (1,3) = 0x04 | 0x80 = 0x84
        assert_eq!(canvas.to_string(), "⠑⢄");
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        canvas.draw_line(0, 0, 9, 0, WHITE);
        // Top row of dots across all five cells
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_closed_polyline_draws_final_edge() {
        let mut open = BrailleCanvas::new(4, 2);
        let mut closed = BrailleCanvas::new(4, 2);
        let triangle = [(0.0, 0.0), (7.0, 0.0), (4.0, 7.0)];
        open.draw_polyline(&triangle, false, WHITE);
        closed.draw_polyline(&triangle, true, WHITE);
        let count = |c: &BrailleCanvas| {
            (0..2)
                .flat_map(|cy| (0..4).map(move |cx| (cx, cy)))
                .filter(|&(cx, cy)| c.cell(cx, cy).0 != '\u{2800}')
                .count()
        };
        assert!(count(&closed) >= count(&open));
        let s = closed.to_string();
        assert!(!s.is_empty());
    }

    #[test]
    fn test_clear_resets_dots_and_colors() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.set_pixel(1, 1, WHITE);
        canvas.clear();
        assert_eq!(canvas.cell(0, 0), ('\u{2800}', 0));
        assert_eq!(canvas.to_string(), "⠀⠀\n⠀⠀");
    }
}
