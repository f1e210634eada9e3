use anyhow::Result;

use crate::data::WorldData;
use crate::globe::orientation::Orientation;
use crate::globe::projection::ProjectionKind;
use crate::globe::tiles::ProceduralPyramid;
use crate::globe::{Frame, Globe};

const ZOOM_STEP: f64 = 1.5;
const MIN_RADIUS: f64 = 20.0;

/// Application state: the globe, the vector overlay data and the
/// terminal-side input bookkeeping.
pub struct App {
    pub globe: Globe<ProceduralPyramid>,
    shapes: Vec<crate::globe::clipper::VectorShape>,
    pub frame: Option<Frame>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
}

impl App {
    pub fn new(width: usize, height: usize, world: WorldData) -> Result<Self> {
        // Braille gives 2x4 resolution per character
        // Account for border (2 chars horizontal, 2 vertical) and status bar
        let (pixel_width, pixel_height) = pixel_dims(width, height);
        let radius = (pixel_width.min(pixel_height) as f64 * 0.4).max(MIN_RADIUS);
        let globe = Globe::new(pixel_width, pixel_height, radius, ProceduralPyramid::new(6))?;
        let mut shapes = world.coastlines;
        shapes.extend(world.borders);
        Ok(Self {
            globe,
            shapes,
            frame: None,
            should_quit: false,
            last_mouse: None,
        })
    }

    /// Update the globe canvas when the terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = pixel_dims(width, height);
        self.globe.resize(pixel_width, pixel_height);
    }

    /// Re-render the frame if any view state changed.
    pub fn prepare_frame(&mut self) -> Result<()> {
        if self.globe.needs_update() || self.frame.is_none() {
            self.frame = Some(self.globe.render(&self.shapes)?);
        }
        Ok(())
    }

    /// Rotate by a keyboard step: one twentieth of the visible radius.
    pub fn rotate_step(&mut self, dx: i32, dy: i32) {
        let scale = 0.05 * self.globe.radius();
        self.rotate_pixels(dx as f64 * scale, dy as f64 * scale);
    }

    /// Rotate so the surface follows a pixel drag.
    fn rotate_pixels(&mut self, dx: f64, dy: f64) {
        let radius = self.globe.radius();
        let yaw = -dx / radius;
        let pitch = dy / radius;
        self.globe
            .rotate_by(Orientation::from_euler(yaw, pitch, 0.0));
    }

    pub fn zoom_in(&mut self) {
        let max = self.frame.as_ref().map_or(4000.0, |f| f.width as f64 * 20.0);
        let radius = (self.globe.radius() * ZOOM_STEP).min(max);
        let _ = self.globe.set_radius(radius);
    }

    pub fn zoom_out(&mut self) {
        let radius = (self.globe.radius() / ZOOM_STEP).max(MIN_RADIUS);
        let _ = self.globe.set_radius(radius);
    }

    /// Cycle Spherical -> Mercator -> Equirectangular -> Spherical.
    pub fn cycle_projection(&mut self) {
        let next = match self.globe.projection() {
            ProjectionKind::Spherical => ProjectionKind::Mercator,
            ProjectionKind::Mercator => ProjectionKind::Equirectangular,
            ProjectionKind::Equirectangular => ProjectionKind::Spherical,
        };
        self.globe.set_projection(next);
    }

    pub fn toggle_smoothing(&mut self) {
        let smoothing = !self.globe.settings().smoothing;
        self.globe.set_smoothing(smoothing);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let center = self.globe.center();
        let lat = center.lat.to_degrees();
        let lon = center.lon.to_degrees();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn radius_label(&self) -> String {
        format!("r={:.0}", self.globe.radius())
    }

    /// Handle mouse drag in terminal cell coordinates.
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            // Cells are 2 pixels wide and 4 tall.
            let dx = (x as f64 - last_x as f64) * 2.0;
            let dy = (y as f64 - last_y as f64) * 4.0;
            self.rotate_pixels(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }
}

/// Terminal character dimensions to braille pixel dimensions, with the
/// border and status bar subtracted.
fn pixel_dims(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2).max(1);
    let inner_height = height.saturating_sub(3).max(1);
    (inner_width * 2, inner_height * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_simple_world;

    #[test]
    fn frame_renders_once_then_caches() {
        let mut app = App::new(82, 33, generate_simple_world()).unwrap();
        app.prepare_frame().unwrap();
        assert!(app.frame.is_some());
        assert!(!app.globe.needs_update());

        app.rotate_step(1, 0);
        assert!(app.globe.needs_update());
        app.prepare_frame().unwrap();
        assert!(!app.globe.needs_update());
    }

    #[test]
    fn zoom_stays_above_floor() {
        let mut app = App::new(82, 33, WorldData::default()).unwrap();
        for _ in 0..20 {
            app.zoom_out();
        }
        assert!(app.globe.radius() >= MIN_RADIUS);
    }

    #[test]
    fn projection_cycle_returns_to_start() {
        let mut app = App::new(82, 33, WorldData::default()).unwrap();
        let start = app.globe.projection();
        app.cycle_projection();
        app.cycle_projection();
        app.cycle_projection();
        assert_eq!(app.globe.projection(), start);
    }
}
