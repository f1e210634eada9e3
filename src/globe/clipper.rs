use glam::DVec3;

use crate::geo::GeoCoord;
use crate::globe::projection::{self, ProjectionKind};
use crate::globe::viewport::Viewport;

/// One vertex of a vector shape: unit-sphere position plus the detail
/// tier it belongs to. Higher tiers survive further zoom-out.
#[derive(Clone, Copy, Debug)]
pub struct ShapeVertex {
    pub position: DVec3,
    pub detail: u8,
}

/// A pre-projected geographic polyline or polygon, immutable once handed
/// to the clipper. Carries a 5-point bounding quad (the lat/lon bbox
/// corners plus its center) for cheap visibility culling.
#[derive(Clone, Debug)]
pub struct VectorShape {
    vertices: Vec<ShapeVertex>,
    bounding: [DVec3; 5],
    closed: bool,
}

impl VectorShape {
    pub fn new(points: impl IntoIterator<Item = (GeoCoord, u8)>, closed: bool) -> Self {
        let mut vertices = Vec::new();
        let mut min_lon = f64::MAX;
        let mut max_lon = f64::MIN;
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        for (coord, detail) in points {
            min_lon = min_lon.min(coord.lon);
            max_lon = max_lon.max(coord.lon);
            min_lat = min_lat.min(coord.lat);
            max_lat = max_lat.max(coord.lat);
            vertices.push(ShapeVertex {
                position: coord.to_vec3(),
                detail,
            });
        }
        if vertices.is_empty() {
            min_lon = 0.0;
            max_lon = 0.0;
            min_lat = 0.0;
            max_lat = 0.0;
        }
        let corner = |lon: f64, lat: f64| GeoCoord::new(lon, lat).to_vec3();
        let bounding = [
            corner(min_lon, min_lat),
            corner(min_lon, max_lat),
            corner(max_lon, min_lat),
            corner(max_lon, max_lat),
            corner((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0),
        ];
        Self {
            vertices,
            bounding,
            closed,
        }
    }

    /// Convenience for data loaders: degree coordinates, one detail tier
    /// for the whole shape.
    pub fn from_degrees(points: &[(f64, f64)], detail: u8, closed: bool) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(lon, lat)| (GeoCoord::from_degrees(lon, lat), detail)),
            closed,
        )
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A clipped screen-space shape, rebuilt from scratch every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenPolygon {
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

/// Radius-to-detail mapping: at and above each radius the corresponding
/// tier (and coarser, i.e. numerically higher) vertices are kept.
/// The default ramp keeps everything from tier 5 down to tier 0 as the
/// globe grows. Themes may override it.
#[derive(Clone, Debug)]
pub struct DetailRamp {
    /// (radius threshold, required tier), sorted by ascending radius.
    steps: Vec<(f64, u8)>,
}

impl Default for DetailRamp {
    fn default() -> Self {
        Self {
            steps: vec![
                (50.0, 4),
                (600.0, 3),
                (1000.0, 2),
                (2500.0, 1),
                (5000.0, 0),
            ],
        }
    }
}

impl DetailRamp {
    pub fn new(mut steps: Vec<(f64, u8)>) -> Self {
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { steps }
    }

    /// Minimum vertex tier retained at this radius.
    pub fn detail_for_radius(&self, radius: f64) -> u8 {
        let mut detail = 5;
        for &(threshold, tier) in &self.steps {
            if radius > threshold {
                detail = tier;
            }
        }
        detail
    }
}

/// Converts geographic shapes into screen polygons for one viewport
/// snapshot, stitching horizon-crossing segments into closed outlines
/// with arcs along the visible disc's edge.
pub struct VectorClipper {
    center_x: f64,
    center_y: f64,
    /// Disc radius used for clipping; one pixel inside the projected
    /// radius so arcs never land outside the texture disc.
    radius: f64,
    /// Squared screen radius of the horizon circle that arcs follow.
    r_limit: f64,
    /// Depth below which a whole bounding quad means the shape is culled.
    z_bbox_limit: f64,
    detail: u8,
    polygons: Vec<ScreenPolygon>,
    // Per-shape horizon bookkeeping.
    polygon: Vec<(f64, f64)>,
    closed: bool,
    last_point: (f64, f64),
    current_point: (f64, f64),
    last_visible: bool,
    currently_visible: bool,
    horizon_pair: bool,
    horizon_a: (f64, f64),
    first_horizon: Option<(f64, f64)>,
}

impl VectorClipper {
    pub fn new(vp: &Viewport, detail_ramp: &DetailRamp) -> Self {
        let radius = (vp.radius - 1.0).max(1.0);
        let img_radius = vp.center_x() * vp.center_x() + vp.center_y() * vp.center_y();
        // Lowest depth still visible on screen: 0 when the whole disc is
        // in view, higher when zoomed in past the canvas corners.
        let z_limit = if img_radius < radius * radius {
            (1.0 - img_radius / (radius * radius)).sqrt()
        } else {
            0.0
        };
        let r_limit = radius * radius * (1.0 - z_limit * z_limit);
        Self {
            center_x: vp.center_x(),
            center_y: vp.center_y(),
            radius,
            r_limit,
            z_bbox_limit: z_limit,
            detail: detail_ramp.detail_for_radius(vp.radius),
            polygons: Vec::new(),
            polygon: Vec::new(),
            closed: false,
            last_point: (0.0, 0.0),
            current_point: (0.0, 0.0),
            last_visible: false,
            currently_visible: false,
            horizon_pair: false,
            horizon_a: (0.0, 0.0),
            first_horizon: None,
        }
    }

    /// Clip a collection of shapes against the viewport, producing the
    /// screen polygons to draw this frame.
    pub fn clip(shapes: &[VectorShape], vp: &Viewport, ramp: &DetailRamp) -> Vec<ScreenPolygon> {
        match vp.projection {
            ProjectionKind::Spherical => {
                let mut clipper = Self::new(vp, ramp);
                let inverse = vp.orientation.inverse();
                for shape in shapes {
                    // Bounding-quad cull: skip shapes whose whole quad is
                    // below the depth limit without touching vertices.
                    let visible = shape
                        .bounding
                        .iter()
                        .any(|&corner| inverse.rotate(corner).z > clipper.z_bbox_limit);
                    if visible {
                        clipper.clip_shape(shape, vp);
                    }
                }
                clipper.polygons
            }
            ProjectionKind::Mercator | ProjectionKind::Equirectangular => {
                clip_flat(shapes, vp, ramp)
            }
        }
    }

    fn clip_shape(&mut self, shape: &VectorShape, vp: &Viewport) {
        self.polygon = Vec::with_capacity(shape.len());
        self.closed = shape.closed();
        self.first_horizon = None;
        self.horizon_pair = false;

        let inverse = vp.orientation.inverse();
        let detail = self.detail;
        let mut first = true;
        let retained = shape.vertices.iter().filter(move |v| v.detail >= detail);
        // Closed shapes re-process their first retained vertex so the
        // wrap-around edge gets the same horizon treatment.
        let first_again = if shape.closed() {
            shape.vertices.iter().find(|v| v.detail >= detail)
        } else {
            None
        };

        for vertex in retained.chain(first_again) {
            let v = inverse.rotate(vertex.position);
            self.current_point = (
                self.center_x + self.radius * v.x,
                self.center_y - self.radius * v.y,
            );

            self.last_visible = self.currently_visible;
            self.currently_visible = v.z >= 0.0;
            if first {
                self.init_cross_horizon();
                first = false;
            }
            if self.currently_visible != self.last_visible {
                self.manage_cross_horizon();
            }

            // Filter points on the hidden hemisphere and duplicates.
            if self.currently_visible && self.current_point != self.last_point {
                self.polygon.push(self.current_point);
            }
            self.last_point = self.current_point;
        }

        // An unresolved orphan crossing means the shape entered
        // visibility before ever leaving it in stream order; close the
        // outline with the final arc.
        if let Some(first_horizon) = self.first_horizon.take() {
            if self.closed {
                self.create_arc(self.horizon_a, first_horizon);
            }
        }

        // Shapes degenerated to fewer than two points cannot be drawn.
        if self.polygon.len() >= 2 {
            self.polygons.push(ScreenPolygon {
                points: std::mem::take(&mut self.polygon),
                closed: self.closed,
            });
        }
    }

    fn init_cross_horizon(&mut self) {
        self.last_visible = self.currently_visible;
        // Offset so the duplicate filter cannot reject the first point.
        self.last_point = (self.current_point.0 + 1.0, self.current_point.1 + 1.0);
        self.horizon_pair = false;
        self.first_horizon = None;
    }

    fn manage_cross_horizon(&mut self) {
        if !self.horizon_pair {
            if !self.currently_visible {
                // Leaving the visible hemisphere: remember the exit.
                self.horizon_a = self.horizon_point();
                self.horizon_pair = true;
            } else {
                // Entering without a known exit: orphan start point,
                // resolved by the closure pass.
                self.first_horizon = Some(self.horizon_point());
            }
        } else {
            // Entering again: bridge exit and entry with an arc.
            let b = self.horizon_point();
            self.create_arc(self.horizon_a, b);
            self.horizon_pair = false;
        }
    }

    /// Intersection of the crossing segment with the horizon circle:
    /// keep the crossing point's horizontal offset and move it along the
    /// y axis onto the circle, preserving its vertical side.
    fn horizon_point(&self) -> (f64, f64) {
        let dx = self.current_point.0 - self.center_x;
        let mut dy = (self.r_limit - dx * dx).max(0.0).sqrt();
        if self.current_point.1 - self.center_y < 0.0 {
            dy = -dy;
        }
        (self.center_x + dx, self.center_y + dy)
    }

    /// Emit the horizon arc from `a` to `b` along the shorter angular
    /// direction, stepping roughly every four pixels of arc length so
    /// large discs stay smooth and tiny ones stay cheap.
    fn create_arc(&mut self, a: (f64, f64), b: (f64, f64)) {
        self.polygon.push(a);

        let alpha = (a.1 - self.center_y).atan2(a.0 - self.center_x).to_degrees();
        let beta = (b.1 - self.center_y).atan2(b.0 - self.center_x).to_degrees();

        let mut diff = beta - alpha;
        if diff != 0.0 {
            // Take the shorter way around.
            if diff.abs() > 180.0 {
                diff -= 360f64.copysign(diff);
            }
            let arc_radius = self.r_limit.sqrt();
            let arc_pixels = diff.abs().to_radians() * arc_radius;
            let steps = ((arc_pixels / 4.0).ceil() as usize).max(1);
            for i in 1..steps {
                let angle = (alpha + diff * i as f64 / steps as f64).to_radians();
                self.polygon.push((
                    self.center_x + arc_radius * angle.cos(),
                    self.center_y + arc_radius * angle.sin(),
                ));
            }
        }

        self.polygon.push(b);
    }
}

/// Flat projections have no hidden hemisphere; shapes only need the
/// detail filter and a split wherever the outline jumps across the
/// antimeridian seam.
fn clip_flat(shapes: &[VectorShape], vp: &Viewport, ramp: &DetailRamp) -> Vec<ScreenPolygon> {
    let detail = ramp.detail_for_radius(vp.radius);
    let half_world = 2.0 * vp.radius; // world map is 4·radius wide
    let mut polygons = Vec::new();

    for shape in shapes {
        let mut current: Vec<(f64, f64)> = Vec::new();
        let mut pieces = 0usize;
        for vertex in shape.vertices.iter().filter(|v| v.detail >= detail) {
            let geo = GeoCoord::from_vec3(vertex.position);
            let (x, y, _) = projection::forward(geo, vp);
            if let Some(&(last_x, _)) = current.last() {
                if (x - last_x).abs() > half_world {
                    if current.len() >= 2 {
                        polygons.push(ScreenPolygon {
                            points: std::mem::take(&mut current),
                            closed: false,
                        });
                        pieces += 1;
                    } else {
                        current.clear();
                    }
                }
            }
            current.push((x, y));
        }
        if current.len() >= 2 {
            polygons.push(ScreenPolygon {
                // A split outline cannot stay closed.
                closed: shape.closed() && pieces == 0,
                points: current,
            });
        }
    }

    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::orientation::Orientation;

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

    fn clip(shapes: &[VectorShape], vp: &Viewport) -> Vec<ScreenPolygon> {
        VectorClipper::clip(shapes, vp, &DetailRamp::default())
    }

    #[test]
    fn hidden_shape_is_culled() {
        let shape =
            VectorShape::from_degrees(&[(170.0, -2.0), (178.0, 2.0), (174.0, 5.0)], 5, true);
        let vp = spherical(100.0, 200, 200);
        assert!(clip(&[shape], &vp).is_empty());
    }

    #[test]
    fn fully_visible_shape_projects_all_vertices() {
        let shape =
            VectorShape::from_degrees(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], 5, false);
        let vp = spherical(100.0, 200, 200);
        let out = clip(&[shape], &vp);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].points.len(), 3);
        assert!(!out[0].closed);
        // First vertex is the sub-observer point, dead center (radius
        // shrinks by one pixel for clipping, so exactly (100, 100)).
        assert_eq!(out[0].points[0], (100.0, 100.0));
    }

    #[test]
    fn detail_filter_drops_coarse_vertices() {
        let shape = VectorShape::new(
            [
                (GeoCoord::from_degrees(0.0, 0.0), 5),
                (GeoCoord::from_degrees(5.0, 0.0), 2),
                (GeoCoord::from_degrees(10.0, 0.0), 5),
                (GeoCoord::from_degrees(15.0, 0.0), 5),
            ],
            false,
        );
        // Radius 40 requires tier 5; the tier-2 vertex is dropped.
        let vp = spherical(40.0, 200, 200);
        let out = clip(&[shape.clone()], &vp);
        assert_eq!(out[0].points.len(), 3);
        // At radius 700 tier 3 suffices and nothing is dropped... except
        // the tier-2 vertex still, until radius passes 1000.
        let vp = spherical(700.0, 4000, 4000);
        let out = clip(&[shape.clone()], &vp);
        assert_eq!(out[0].points.len(), 3);
        let vp = spherical(1100.0, 4000, 4000);
        let out = clip(&[shape], &vp);
        assert_eq!(out[0].points.len(), 4);
    }

    #[test]
    fn arc_takes_shorter_side_without_wrapping() {
        let vp = spherical(101.0, 200, 200);
        let mut clipper = VectorClipper::new(&vp, &DetailRamp::default());
        // Crossing points at 10° and 170° around the disc center.
        let r = clipper.r_limit.sqrt();
        let at = |deg: f64| {
            let rad = deg.to_radians();
            (100.0 + r * rad.cos(), 100.0 + r * rad.sin())
        };
        clipper.create_arc(at(10.0), at(170.0));
        let angles: Vec<f64> = clipper
            .polygon
            .iter()
            .map(|&(x, y)| (y - 100.0).atan2(x - 100.0).to_degrees())
            .collect();
        assert!((angles[0] - 10.0).abs() < 1e-6);
        assert!((angles.last().unwrap() - 170.0).abs() < 1e-6);
        // Strictly increasing through the 160° side; never the 200° way.
        for pair in angles.windows(2) {
            assert!(pair[1] > pair[0] - 1e-9, "arc wrapped: {pair:?}");
        }
        assert!(angles.len() > 10);
    }

    #[test]
    fn sub_observer_to_antipode_clips_to_arc_not_chord() {
        // Radius 100, 200×200 canvas: one vertex faces the viewer dead
        // on, the other is (nearly) antipodal and hidden.
        let shape = VectorShape::from_degrees(&[(0.0, 0.0), (179.0, 10.0)], 5, true);
        let vp = spherical(100.0, 200, 200);
        let out = clip(&[shape], &vp);
        assert_eq!(out.len(), 1);
        let polygon = &out[0];
        assert!(polygon.closed);
        // The visible vertex survives at the center.
        assert_eq!(polygon.points[0], (100.0, 100.0));
        // The wrap-around edge re-enters and finishes at the start.
        assert_eq!(*polygon.points.last().unwrap(), polygon.points[0]);
        // Everything in between is the crossing pair plus the bridging
        // arc: all of it rides the horizon circle instead of cutting a
        // chord through the disc.
        let r = 99.0;
        let interior = &polygon.points[1..polygon.points.len() - 1];
        for &(x, y) in interior {
            let dist = ((x - 100.0).powi(2) + (y - 100.0).powi(2)).sqrt();
            assert!((dist - r).abs() < 1.5, "point ({x}, {y}) off the horizon");
        }
        // The arc is actually sampled, not a two-point jump.
        assert!(polygon.points.len() > 20);
    }

    #[test]
    fn closed_shape_crossing_horizon_stays_closed() {
        // A ring straddling the horizon: half its vertices face away.
        let points: Vec<(f64, f64)> = (0..12)
            .map(|i| {
                let lon = i as f64 * 30.0;
                (lon, 20.0)
            })
            .collect();
        let shape = VectorShape::from_degrees(&points, 5, true);
        let vp = spherical(100.0, 200, 200);
        let out = clip(&[shape], &vp);
        assert_eq!(out.len(), 1);
        assert!(out[0].closed);
        assert!(out[0].points.len() >= 2);
    }

    #[test]
    fn degenerate_output_is_dropped() {
        // Only one visible vertex: cannot form a line.
        let shape = VectorShape::from_degrees(&[(0.0, 0.0)], 5, false);
        let vp = spherical(100.0, 200, 200);
        assert!(clip(&[shape], &vp).is_empty());
    }

    #[test]
    fn flat_projection_splits_at_antimeridian() {
        let shape = VectorShape::from_degrees(
            &[(170.0, 0.0), (179.0, 0.0), (-179.0, 0.0), (-170.0, 0.0)],
            5,
            false,
        );
        let vp = Viewport::new(
            400,
            200,
            50.0,
            Orientation::IDENTITY,
            ProjectionKind::Equirectangular,
        )
        .unwrap();
        let out = clip_flat(&[shape], &vp, &DetailRamp::default());
        assert_eq!(out.len(), 2, "expected a split at the seam");
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let vp = spherical(100.0, 200, 200);
        assert!(clip(&[], &vp).is_empty());
    }

    #[test]
    fn detail_ramp_default_matches_thresholds() {
        let ramp = DetailRamp::default();
        assert_eq!(ramp.detail_for_radius(40.0), 5);
        assert_eq!(ramp.detail_for_radius(51.0), 4);
        assert_eq!(ramp.detail_for_radius(601.0), 3);
        assert_eq!(ramp.detail_for_radius(1001.0), 2);
        assert_eq!(ramp.detail_for_radius(2501.0), 1);
        assert_eq!(ramp.detail_for_radius(5001.0), 0);
    }
}
