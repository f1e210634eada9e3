pub mod clipper;
pub mod orientation;
pub mod projection;
pub mod texture;
pub mod tiles;
pub mod viewport;

use anyhow::Result;

use crate::geo::GeoCoord;
use clipper::{DetailRamp, ScreenPolygon, VectorClipper, VectorShape};
use orientation::Orientation;
use projection::ProjectionKind;
use texture::TextureMapper;
use tiles::TileProvider;
use viewport::Viewport;

/// Everything one frame produces: the raster underlay plus the clipped
/// vector outlines ready for drawing on top.
pub struct Frame {
    pub pixels: Vec<u32>,
    pub width: usize,
    pub height: usize,
    pub polygons: Vec<ScreenPolygon>,
}

/// Render knobs that survive across frames.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub projection: ProjectionKind,
    pub smoothing: bool,
    /// Optional cap on the tile pyramid level, below the provider's own.
    pub max_tile_level: Option<u8>,
    pub detail_ramp: DetailRamp,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Spherical,
            smoothing: false,
            max_tile_level: None,
            detail_ramp: DetailRamp::default(),
        }
    }
}

/// Owns the view state and drives texture mapping and vector clipping.
/// Rotation increments accumulate between frames; rendering only
/// happens when something changed since the last frame.
pub struct Globe<P> {
    orientation: Orientation,
    radius: f64,
    width: usize,
    height: usize,
    settings: RenderSettings,
    mapper: TextureMapper<P>,
    dirty: bool,
}

impl<P: TileProvider> Globe<P> {
    pub fn new(width: usize, height: usize, radius: f64, provider: P) -> Result<Self> {
        // Validate early so render() cannot fail later.
        Viewport::new(
            width,
            height,
            radius,
            Orientation::IDENTITY,
            ProjectionKind::Spherical,
        )?;
        Ok(Self {
            orientation: Orientation::IDENTITY,
            radius,
            width,
            height,
            settings: RenderSettings::default(),
            mapper: TextureMapper::new(provider),
            dirty: true,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn center(&self) -> GeoCoord {
        self.orientation.center()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn projection(&self) -> ProjectionKind {
        self.settings.projection
    }

    /// Compose an incremental rotation onto the current orientation.
    pub fn rotate_by(&mut self, increment: Orientation) {
        self.orientation.rotate_by(increment);
        self.dirty = true;
    }

    /// Jump straight to a given center coordinate.
    pub fn rotate_to(&mut self, center: GeoCoord) {
        self.orientation = Orientation::looking_at(center.lon, center.lat);
        self.dirty = true;
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        // Run the same validation the viewport applies.
        Viewport::new(
            self.width,
            self.height,
            radius,
            self.orientation,
            self.settings.projection,
        )?;
        self.radius = radius;
        self.dirty = true;
        Ok(())
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
    }

    pub fn set_projection(&mut self, projection: ProjectionKind) {
        if projection != self.settings.projection {
            self.settings.projection = projection;
            self.dirty = true;
        }
    }

    pub fn set_smoothing(&mut self, smoothing: bool) {
        if smoothing != self.settings.smoothing {
            self.settings.smoothing = smoothing;
            self.mapper.set_smoothing(smoothing);
            self.dirty = true;
        }
    }

    pub fn set_max_tile_level(&mut self, cap: Option<u8>) {
        if cap != self.settings.max_tile_level {
            self.settings.max_tile_level = cap;
            self.mapper.set_level_cap(cap);
            self.dirty = true;
        }
    }

    pub fn set_detail_ramp(&mut self, ramp: DetailRamp) {
        self.settings.detail_ramp = ramp;
        self.dirty = true;
    }

    /// True when view state changed since the last `render` call.
    pub fn needs_update(&self) -> bool {
        self.dirty
    }

    /// Force a redraw on the next frame, e.g. after new tiles arrived.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Produce one frame: map the raster texture, then clip the vector
    /// shapes against the same viewport snapshot.
    pub fn render(&mut self, shapes: &[VectorShape]) -> Result<Frame> {
        let vp = Viewport::new(
            self.width,
            self.height,
            self.radius,
            self.orientation,
            self.settings.projection,
        )?;

        let mut pixels = vec![texture::TRANSPARENT; self.width * self.height];
        self.mapper.map_texture(&mut pixels, &vp);
        let polygons = VectorClipper::clip(shapes, &vp, &self.settings.detail_ramp);

        self.dirty = false;
        Ok(Frame {
            pixels,
            width: self.width,
            height: self.height,
            polygons,
        })
    }
}
