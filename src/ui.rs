use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::globe::texture::TRANSPARENT;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

const COASTLINE_COLOR: u32 = 0xFF40_E0E0;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_globe(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Globe ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(rendered) = app.frame.as_ref() {
        frame.render_widget(
            GlobeWidget {
                pixels: &rendered.pixels,
                pixel_width: rendered.width,
                pixel_height: rendered.height,
                overlay: overlay_canvas(rendered, inner),
            },
            inner,
        );
    }
}

/// Rasterize the clipped vector outlines into a braille layer sized to
/// the drawing area.
fn overlay_canvas(rendered: &crate::globe::Frame, inner: Rect) -> BrailleCanvas {
    let mut canvas = BrailleCanvas::new(inner.width as usize, inner.height as usize);
    for polygon in &rendered.polygons {
        canvas.draw_polyline(&polygon.points, polygon.closed, COASTLINE_COLOR);
    }
    canvas
}

/// Draws the texture raster as cell background colors with the braille
/// vector overlay on top.
struct GlobeWidget<'a> {
    pixels: &'a [u32],
    pixel_width: usize,
    pixel_height: usize,
    overlay: BrailleCanvas,
}

impl GlobeWidget<'_> {
    /// Average the opaque pixels of one 2x4 cell block, `None` when the
    /// whole block lies outside the projection.
    fn cell_color(&self, cx: usize, cy: usize) -> Option<Color> {
        let mut sum = [0u32; 3];
        let mut count = 0u32;
        for dy in 0..4 {
            let y = cy * 4 + dy;
            if y >= self.pixel_height {
                break;
            }
            for dx in 0..2 {
                let x = cx * 2 + dx;
                if x >= self.pixel_width {
                    break;
                }
                let pixel = self.pixels[y * self.pixel_width + x];
                if pixel != TRANSPARENT {
                    sum[0] += (pixel >> 16) & 0xFF;
                    sum[1] += (pixel >> 8) & 0xFF;
                    sum[2] += pixel & 0xFF;
                    count += 1;
                }
            }
        }
        if count == 0 {
            return None;
        }
        Some(Color::Rgb(
            (sum[0] / count) as u8,
            (sum[1] / count) as u8,
            (sum[2] / count) as u8,
        ))
    }
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for cy in 0..area.height as usize {
            for cx in 0..area.width as usize {
                let cell = &mut buf[(area.x + cx as u16, area.y + cy as u16)];
                if let Some(bg) = self.cell_color(cx, cy) {
                    cell.set_bg(bg);
                }
                let (glyph, color) = self.overlay.cell(cx, cy);
                if glyph != '\u{2800}' {
                    cell.set_char(glyph).set_fg(rgb_color(color));
                }
            }
        }
    }
}

fn rgb_color(argb: u32) -> Color {
    Color::Rgb(
        ((argb >> 16) & 0xFF) as u8,
        ((argb >> 8) & 0xFF) as u8,
        (argb & 0xFF) as u8,
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = app.globe.settings();

    let status = Line::from(vec![
        Span::styled(" Proj: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.globe.projection().name(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.radius_label(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if settings.smoothing { "[A]ntialias " } else { "[a]ntialias " },
            Style::default().fg(if settings.smoothing {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:rotate +/-:zoom m:projection q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
