use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// A geographic coordinate in radians.
/// Longitude is kept in (-PI, PI], latitude in [-PI/2, PI/2].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoCoord {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon: normalize_lon(lon),
            lat: normalize_lat(lat),
        }
    }

    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians())
    }

    /// Position on the unit sphere. Axis convention follows the globe's
    /// orientation math: +y is the north pole, +z points at (0, 0),
    /// +x points at (90°E, 0).
    #[inline(always)]
    pub fn to_vec3(self) -> DVec3 {
        let (sin_lon, cos_lon) = self.lon.sin_cos();
        let (sin_lat, cos_lat) = self.lat.sin_cos();
        DVec3::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
    }

    /// Recover lon/lat from a unit sphere vector. Pole vectors get lon = 0.
    #[inline(always)]
    pub fn from_vec3(v: DVec3) -> Self {
        let lat = v.y.clamp(-1.0, 1.0).asin();
        let lon = if v.x == 0.0 && v.z == 0.0 {
            0.0
        } else {
            v.x.atan2(v.z)
        };
        Self { lon, lat }
    }
}

/// Wrap longitude into (-PI, PI]. Any finite input maps to a defined value.
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Clamp latitude into [-PI/2, PI/2].
#[inline(always)]
pub fn normalize_lat(lat: f64) -> f64 {
    lat.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// An axis-aligned latitude/longitude box describing a visible region.
/// West may exceed east when the box crosses the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLonBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl LatLonBox {
    /// The whole sphere.
    pub fn full() -> Self {
        Self {
            west: -PI,
            east: PI,
            south: -FRAC_PI_2,
            north: FRAC_PI_2,
        }
    }

    pub fn contains(&self, coord: GeoCoord) -> bool {
        if coord.lat < self.south || coord.lat > self.north {
            return false;
        }
        if self.west <= self.east {
            coord.lon >= self.west && coord.lon <= self.east
        } else {
            // Crosses the antimeridian
            coord.lon >= self.west || coord.lon <= self.east
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lon_wraps_into_half_open_range() {
        assert!((normalize_lon(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_lon(-PI) - PI).abs() < 1e-12);
        assert!((normalize_lon(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert_eq!(normalize_lon(0.5), 0.5);
    }

    #[test]
    fn lat_clamps_at_poles() {
        assert_eq!(normalize_lat(2.0), FRAC_PI_2);
        assert_eq!(normalize_lat(-2.0), -FRAC_PI_2);
    }

    #[test]
    fn vec3_round_trip() {
        let g = GeoCoord::from_degrees(12.5, -33.0);
        let back = GeoCoord::from_vec3(g.to_vec3());
        assert!((g.lon - back.lon).abs() < 1e-12);
        assert!((g.lat - back.lat).abs() < 1e-12);
    }

    #[test]
    fn pole_vector_has_defined_longitude() {
        let g = GeoCoord::from_vec3(DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(g.lon, 0.0);
        assert!((g.lat - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn box_spanning_antimeridian() {
        let b = LatLonBox {
            west: 3.0,
            east: -3.0,
            south: -0.5,
            north: 0.5,
        };
        assert!(b.contains(GeoCoord::new(3.1, 0.0)));
        assert!(b.contains(GeoCoord::new(-3.1, 0.0)));
        assert!(!b.contains(GeoCoord::new(0.0, 0.0)));
    }
}
