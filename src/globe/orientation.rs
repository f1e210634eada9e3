use glam::{DQuat, DVec3};

use crate::geo::GeoCoord;

/// The globe's rotation state as a unit quaternion.
///
/// The identity orientation looks straight at (0°, 0°): the +z axis points
/// out of the screen, +y is up (north), +x is right (east). Viewing a
/// geographic point means rotating it by the *inverse* orientation and
/// reading its z component as depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation(DQuat);

impl Orientation {
    pub const IDENTITY: Self = Self(DQuat::IDENTITY);

    /// Build from Euler angles in radians: yaw about +y, then pitch about
    /// +x, then roll about +z.
    pub fn from_euler(yaw: f64, pitch: f64, roll: f64) -> Self {
        let q = DQuat::from_rotation_y(yaw)
            * DQuat::from_rotation_x(pitch)
            * DQuat::from_rotation_z(roll);
        Self(q.normalize())
    }

    /// Orientation that centers the given geographic point on screen.
    pub fn looking_at(lon: f64, lat: f64) -> Self {
        Self::from_euler(lon, -lat, 0.0)
    }

    /// Compose an incremental rotation onto the current one, in place.
    /// Left-multiplies and renormalizes so repeated composition cannot
    /// drift off the unit sphere.
    pub fn rotate_by(&mut self, increment: Orientation) {
        self.0 = (increment.0 * self.0).normalize();
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    /// Rotate a 3D vector by this orientation.
    #[inline(always)]
    pub fn rotate(&self, v: DVec3) -> DVec3 {
        self.0 * v
    }

    /// Rotate a 3D vector by the inverse orientation (world to view).
    #[inline(always)]
    pub fn rotate_inverse(&self, v: DVec3) -> DVec3 {
        self.0.inverse() * v
    }

    /// Spherical linear interpolation towards `other`.
    pub fn slerp(&self, other: Orientation, t: f64) -> Self {
        Self(self.0.slerp(other.0, t).normalize())
    }

    /// Normalized linear interpolation towards `other`, taking the shorter
    /// path. Cheaper than slerp; accurate enough for horizon refinement.
    pub fn nlerp(&self, other: Orientation, t: f64) -> Self {
        let b = if self.0.dot(other.0) < 0.0 {
            -other.0
        } else {
            other.0
        };
        Self((self.0 * (1.0 - t) + b * t).normalize())
    }

    /// The geographic point currently facing the viewer.
    pub fn center(&self) -> GeoCoord {
        GeoCoord::from_vec3(self.rotate(DVec3::Z))
    }

    /// Yaw component: the longitude the view is centered on.
    pub fn yaw(&self) -> f64 {
        self.center().lon
    }

    /// Pitch component: negative of the centered latitude (see
    /// `from_euler`).
    pub fn pitch(&self) -> f64 {
        -self.center().lat
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_centers_origin() {
        let c = Orientation::IDENTITY.center();
        assert!(c.lon.abs() < 1e-12);
        assert!(c.lat.abs() < 1e-12);
    }

    #[test]
    fn looking_at_recovers_center() {
        let o = Orientation::looking_at(1.1, -0.4);
        let c = o.center();
        assert!((c.lon - 1.1).abs() < 1e-12);
        assert!((c.lat + 0.4).abs() < 1e-12);
    }

    #[test]
    fn rotate_by_stays_normalized() {
        let mut o = Orientation::IDENTITY;
        let inc = Orientation::from_euler(0.013, 0.007, 0.0);
        for _ in 0..10_000 {
            o.rotate_by(inc);
        }
        let len = o.rotate(DVec3::Z).length();
        assert!((len - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inverse_undoes_rotation() {
        let o = Orientation::from_euler(0.7, -0.3, 0.1);
        let v = GeoCoord::from_degrees(30.0, 45.0).to_vec3();
        let back = o.rotate(o.rotate_inverse(v));
        assert!((back - v).length() < 1e-12);
    }

    #[test]
    fn nlerp_endpoints_and_midpoint() {
        let a = Orientation::IDENTITY;
        let b = Orientation::from_euler(FRAC_PI_2, 0.0, 0.0);
        assert!((a.nlerp(b, 0.0).center().lon).abs() < 1e-12);
        assert!((a.nlerp(b, 1.0).center().lon - FRAC_PI_2).abs() < 1e-9);
        // Midpoint of a pure yaw rotation halves the angle.
        assert!((a.nlerp(b, 0.5).center().lon - FRAC_PI_2 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn slerp_constant_speed_quarter() {
        let a = Orientation::IDENTITY;
        let b = Orientation::from_euler(1.2, 0.0, 0.0);
        assert!((a.slerp(b, 0.25).center().lon - 0.3).abs() < 1e-9);
    }
}
