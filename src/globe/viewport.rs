use anyhow::{ensure, Result};
use std::sync::OnceLock;

use crate::geo::LatLonBox;
use crate::globe::orientation::Orientation;
use crate::globe::projection::{self, ProjectionKind};

/// Snapshot of the render configuration for one frame: canvas size, the
/// radius of the projected globe in pixels, the orientation, and the
/// projection kind. Treated as immutable while a frame is in flight;
/// rotation requests are applied between frames by the frame driver.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    /// Screen pixels spanned by the sphere's radius. Controls zoom.
    pub radius: f64,
    pub orientation: Orientation,
    pub projection: ProjectionKind,
    /// Lazily computed visible geographic region.
    region: OnceLock<LatLonBox>,
}

impl Viewport {
    /// A non-positive radius is a setup error, not a render-time condition,
    /// so it is the one thing surfaced to the caller.
    pub fn new(
        width: usize,
        height: usize,
        radius: f64,
        orientation: Orientation,
        projection: ProjectionKind,
    ) -> Result<Self> {
        ensure!(
            radius > 0.0 && radius.is_finite(),
            "viewport radius must be positive and finite, got {radius}"
        );
        Ok(Self {
            width,
            height,
            radius,
            orientation,
            projection,
            region: OnceLock::new(),
        })
    }

    #[inline(always)]
    pub fn center_x(&self) -> f64 {
        self.width as f64 / 2.0
    }

    #[inline(always)]
    pub fn center_y(&self) -> f64 {
        self.height as f64 / 2.0
    }

    /// The geographic bounding box of everything currently on screen.
    /// Computed once per snapshot.
    pub fn visible_region(&self) -> LatLonBox {
        *self.region.get_or_init(|| projection::visible_region(self))
    }

    /// Whether the projected globe/map covers the whole canvas, in which
    /// case background clearing can be skipped.
    pub fn covers_viewport(&self) -> bool {
        match self.projection {
            ProjectionKind::Spherical => {
                let (w, h) = (self.width as f64, self.height as f64);
                // Quick test catching huge radii before squaring.
                if self.radius > w + h {
                    return true;
                }
                // The 4 is because the canvas extends width/2 and height/2
                // from the center. Boundary is inclusive.
                4.0 * self.radius * self.radius >= w * w + h * h
            }
            ProjectionKind::Mercator | ProjectionKind::Equirectangular => {
                projection::flat_band_covers(self)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spherical(radius: f64, width: usize, height: usize) -> Viewport {
        Viewport::new(
            width,
            height,
            radius,
            Orientation::IDENTITY,
            ProjectionKind::Spherical,
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(Viewport::new(
            100,
            100,
            0.0,
            Orientation::IDENTITY,
            ProjectionKind::Spherical
        )
        .is_err());
        assert!(Viewport::new(
            100,
            100,
            -5.0,
            Orientation::IDENTITY,
            ProjectionKind::Spherical
        )
        .is_err());
    }

    #[test]
    fn covers_matches_algebraic_test() {
        // 4r² vs w² + h²: 200² + 150² = 62500 = 4·125², so r = 125 exactly covers.
        assert!(spherical(125.0, 200, 150).covers_viewport());
        assert!(!spherical(124.9, 200, 150).covers_viewport());
        // Boundary is inclusive.
        let vp = spherical(125.0, 200, 150);
        assert_eq!(
            4.0 * vp.radius * vp.radius,
            (200.0f64 * 200.0 + 150.0 * 150.0)
        );
        assert!(vp.covers_viewport());
    }

    #[test]
    fn covers_short_circuits_on_huge_radius() {
        assert!(spherical(1e12, 1920, 1080).covers_viewport());
    }
}
