use anyhow::{bail, Result};
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::geo::{normalize_lon, GeoCoord, LatLonBox};
use crate::globe::viewport::Viewport;

/// Latitude beyond which the Mercator ordinate is clamped instead of
/// evaluated; inclusive on both sides.
pub const MERCATOR_LAT_CUTOFF: f64 = 1.4835;

/// Value of the inverse Gudermannian at the cutoff latitude. Everything
/// poleward of the cutoff maps to this fixed ordinate.
pub const MERCATOR_ASYMPTOTE: f64 = 3.1309587;

/// The closed set of supported projections. A `match` on this enum is the
/// dispatch table; each arm gets its own numeric shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Spherical,
    Mercator,
    Equirectangular,
}

impl ProjectionKind {
    /// Parse a theme/config name. Unknown names are a setup error.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "spherical" | "globe" => Ok(Self::Spherical),
            "mercator" => Ok(Self::Mercator),
            "equirectangular" | "plate-carree" => Ok(Self::Equirectangular),
            other => bail!("unknown projection kind: {other:?}"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spherical => "spherical",
            Self::Mercator => "mercator",
            Self::Equirectangular => "equirectangular",
        }
    }
}

/// Pixels per radian for the flat projections. The world map is 4·radius
/// wide and (for Equirectangular) 2·radius tall, matching the globe's
/// footprint at the same radius.
#[inline(always)]
fn flat_scale(vp: &Viewport) -> f64 {
    2.0 * vp.radius / PI
}

/// Pixel height of the normalized world band for Mercator.
#[inline(always)]
fn norm_global_height(vp: &Viewport) -> f64 {
    4.0 * vp.radius / PI
}

/// Inverse Gudermannian gd⁻¹(x) = atanh(sin x), developed as a Maclaurin
/// series (the integral of sec) and evaluated with Horner's scheme. Only
/// valid below the cutoff; the caller clamps beyond it.
#[inline(always)]
fn inv_gudermannian(x: f64) -> f64 {
    let x2 = x * x;
    x * (1.0
        + x2 * (1.0 / 6.0
            + x2 * (1.0 / 24.0
                + x2 * (61.0 / 5040.0
                    + x2 * (1385.0 / 362_880.0
                        + x2 * (50_521.0 / 39_916_800.0
                            + x2 * (2_702_765.0 / 6_227_020_800.0)))))))
}

/// Vertical pixel offset from the equator for a Mercator latitude.
/// Negative northward. Clamped to the asymptote at and beyond the cutoff
/// so the conversion never overflows near the poles.
pub fn rad_to_pixel_y(lat: f64, norm_global_height: f64) -> f64 {
    let gd = if lat.abs() >= MERCATOR_LAT_CUTOFF {
        MERCATOR_ASYMPTOTE.copysign(lat)
    } else {
        inv_gudermannian(lat)
    };
    -0.5 * norm_global_height * gd
}

/// Project a geographic coordinate to screen pixels.
///
/// The `bool` is hemisphere visibility: for Spherical it is true when the
/// rotated point faces the viewer (depth ≥ 0); the flat projections have
/// no hidden hemisphere, so it is always true even when the pixel falls
/// outside the canvas.
pub fn forward(geo: GeoCoord, vp: &Viewport) -> (f64, f64, bool) {
    match vp.projection {
        ProjectionKind::Spherical => {
            let v = vp.orientation.rotate_inverse(geo.to_vec3());
            let x = vp.center_x() + vp.radius * v.x;
            let y = vp.center_y() - vp.radius * v.y;
            (x, y, v.z >= 0.0)
        }
        ProjectionKind::Equirectangular => {
            let center = vp.orientation.center();
            let s = flat_scale(vp);
            let x = vp.center_x() + normalize_lon(geo.lon - center.lon) * s;
            let y = vp.center_y() - (geo.lat - center.lat) * s;
            (x, y, true)
        }
        ProjectionKind::Mercator => {
            let center = vp.orientation.center();
            let s = flat_scale(vp);
            let ngh = norm_global_height(vp);
            let x = vp.center_x() + normalize_lon(geo.lon - center.lon) * s;
            let y = vp.center_y() + rad_to_pixel_y(geo.lat, ngh)
                - rad_to_pixel_y(center.lat, ngh);
            (x, y, true)
        }
    }
}

/// Inverse-project a screen pixel to a geographic coordinate. None when
/// the pixel lies outside the projected disc (Spherical) or the world
/// band (flat projections).
pub fn inverse(x: f64, y: f64, vp: &Viewport) -> Option<GeoCoord> {
    match vp.projection {
        ProjectionKind::Spherical => {
            let dx = (x - vp.center_x()) / vp.radius;
            let dy = -(y - vp.center_y()) / vp.radius;
            let r2 = dx * dx + dy * dy;
            if r2 > 1.0 {
                return None;
            }
            let dz = (1.0 - r2).max(0.0).sqrt();
            let v = vp.orientation.rotate(DVec3::new(dx, dy, dz));
            Some(GeoCoord::from_vec3(v))
        }
        ProjectionKind::Equirectangular => {
            let center = vp.orientation.center();
            let s = flat_scale(vp);
            let lat = center.lat + (vp.center_y() - y) / s;
            if lat.abs() > FRAC_PI_2 {
                return None;
            }
            let lon = normalize_lon(center.lon + (x - vp.center_x()) / s);
            Some(GeoCoord { lon, lat })
        }
        ProjectionKind::Mercator => {
            let center = vp.orientation.center();
            let s = flat_scale(vp);
            let ngh = norm_global_height(vp);
            let center_gd = -rad_to_pixel_y(center.lat, ngh) / (0.5 * ngh);
            let gd = center_gd + (vp.center_y() - y) * PI / (2.0 * vp.radius);
            if gd.abs() > MERCATOR_ASYMPTOTE {
                return None;
            }
            let lat = gd.sinh().atan();
            let lon = normalize_lon(center.lon + (x - vp.center_x()) / s);
            Some(GeoCoord { lon, lat })
        }
    }
}

/// Whether the flat world band covers the canvas top to bottom. The flat
/// projections repeat in x, so horizontal coverage is unconditional.
pub fn flat_band_covers(vp: &Viewport) -> bool {
    let (top_lat, bottom_lat) = match vp.projection {
        ProjectionKind::Mercator => (MERCATOR_LAT_CUTOFF, -MERCATOR_LAT_CUTOFF),
        _ => (FRAC_PI_2, -FRAC_PI_2),
    };
    let center = vp.orientation.center();
    let (_, y_top, _) = forward(GeoCoord::new(center.lon, top_lat), vp);
    let (_, y_bottom, _) = forward(GeoCoord::new(center.lon, bottom_lat), vp);
    y_top <= 0.0 && y_bottom >= vp.height as f64
}

/// Compute the geographic bounding box of the visible canvas area.
pub fn visible_region(vp: &Viewport) -> LatLonBox {
    match vp.projection {
        ProjectionKind::Spherical => spherical_region(vp),
        ProjectionKind::Mercator | ProjectionKind::Equirectangular => flat_region(vp),
    }
}

/// Spherical visible region: analytic fast path when the whole globe fits
/// in the canvas, boundary sampling otherwise.
fn spherical_region(vp: &Viewport) -> LatLonBox {
    let center = vp.orientation.center();
    let whole_globe = 2.0 * vp.radius + 1.0 <= vp.width as f64
        && 2.0 * vp.radius + 1.0 <= vp.height as f64;

    if whole_globe {
        // The visible hemisphere spans a quarter turn from the center in
        // every direction.
        let north = (center.lat + FRAC_PI_2).min(FRAC_PI_2);
        let south = (center.lat - FRAC_PI_2).max(-FRAC_PI_2);
        if center.lat == 0.0 {
            // Both poles sit exactly on the horizon: the longitude range
            // is the quarter turn either side of the center meridian.
            return LatLonBox {
                west: normalize_lon(center.lon - FRAC_PI_2),
                east: normalize_lon(center.lon + FRAC_PI_2),
                south,
                north,
            };
        }
        // One pole is strictly inside the hemisphere, so every meridian
        // crosses the visible area.
        return LatLonBox {
            west: -PI,
            east: PI,
            south,
            north,
        };
    }

    // Zoomed in: sample the canvas boundary and track the extremes.
    let mut min_lon = f64::MAX;
    let mut max_lon = f64::MIN;
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut any = false;

    let mut visit = |x: f64, y: f64| {
        if let Some(g) = inverse(x, y, vp) {
            min_lon = min_lon.min(g.lon);
            max_lon = max_lon.max(g.lon);
            min_lat = min_lat.min(g.lat);
            max_lat = max_lat.max(g.lat);
            any = true;
        }
    };

    let (w, h) = (vp.width as f64, vp.height as f64);
    const EDGE_SAMPLES: usize = 16;
    for i in 0..=EDGE_SAMPLES {
        let t = i as f64 / EDGE_SAMPLES as f64;
        visit(t * w, 0.0);
        visit(t * w, h);
        visit(0.0, t * h);
        visit(w, t * h);
    }
    visit(w / 2.0, h / 2.0);

    if !any {
        return LatLonBox::full();
    }

    let mut region = LatLonBox {
        west: min_lon,
        east: max_lon,
        south: min_lat,
        north: max_lat,
    };

    // A span wider than a half turn means the box wraps the antimeridian;
    // fall back to the full longitude range rather than guessing.
    if max_lon - min_lon > PI {
        region.west = -PI;
        region.east = PI;
    }

    // If a pole is on screen every meridian is visible.
    for (pole_lat, north) in [(FRAC_PI_2, true), (-FRAC_PI_2, false)] {
        let (x, y, visible) = forward(GeoCoord::new(0.0, pole_lat), vp);
        if visible && x >= 0.0 && x < w && y >= 0.0 && y < h {
            region.west = -PI;
            region.east = PI;
            if north {
                region.north = FRAC_PI_2;
            } else {
                region.south = -FRAC_PI_2;
            }
        }
    }

    region
}

/// Flat visible region straight from the canvas extent.
fn flat_region(vp: &Viewport) -> LatLonBox {
    let center = vp.orientation.center();
    let s = flat_scale(vp);
    let (w, h) = (vp.width as f64, vp.height as f64);

    let lon_span = w / s;
    let (west, east) = if lon_span >= 2.0 * PI {
        (-PI, PI)
    } else {
        (
            normalize_lon(center.lon - lon_span / 2.0),
            normalize_lon(center.lon + lon_span / 2.0),
        )
    };

    let north = inverse(w / 2.0, 0.0, vp)
        .map(|g| g.lat)
        .unwrap_or(FRAC_PI_2);
    let south = inverse(w / 2.0, h, vp)
        .map(|g| g.lat)
        .unwrap_or(-FRAC_PI_2);

    LatLonBox {
        west,
        east,
        south,
        north,
    }
}
