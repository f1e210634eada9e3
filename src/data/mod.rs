use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

use crate::globe::clipper::VectorShape;

/// Detail tier assigned to coarse outlines: survives any zoom level.
const DETAIL_COARSE: u8 = 5;
const DETAIL_MEDIUM: u8 = 3;
const DETAIL_FINE: u8 = 1;

/// Vector overlay layers drawn on top of the raster texture.
#[derive(Default)]
pub struct WorldData {
    pub coastlines: Vec<VectorShape>,
    pub borders: Vec<VectorShape>,
}

impl WorldData {
    pub fn is_empty(&self) -> bool {
        self.coastlines.is_empty() && self.borders.is_empty()
    }
}

/// Load all available Natural Earth GeoJSON data, coarse resolutions
/// first so they take the high detail tiers.
pub fn load_world(data_dir: &Path) -> Result<WorldData> {
    let mut world = WorldData::default();

    let coastline_files = [
        ("ne_110m_coastline.json", DETAIL_COARSE),
        ("natural-earth.json", DETAIL_MEDIUM),
        ("ne_50m_coastline.json", DETAIL_MEDIUM),
        ("ne_10m_coastline.json", DETAIL_FINE),
    ];
    for (filename, detail) in coastline_files {
        let path = data_dir.join(filename);
        if path.exists() {
            match load_shapes(&path, detail) {
                Ok(shapes) => world.coastlines.extend(shapes),
                Err(e) => eprintln!("Warning: Failed to load {}: {}", filename, e),
            }
        }
    }

    let border_files = [
        ("ne_110m_borders.json", DETAIL_COARSE),
        ("ne_50m_borders.json", DETAIL_MEDIUM),
        ("ne_10m_borders.json", DETAIL_FINE),
    ];
    for (filename, detail) in border_files {
        let path = data_dir.join(filename);
        if path.exists() {
            match load_shapes(&path, detail) {
                Ok(shapes) => world.borders.extend(shapes),
                Err(e) => eprintln!("Warning: Failed to load {}: {}", filename, e),
            }
        }
    }

    Ok(world)
}

fn load_shapes(path: &Path, detail: u8) -> Result<Vec<VectorShape>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    let mut shapes = Vec::new();
    process_geojson(&geojson, &mut |line, closed| {
        shapes.push(shape_from_line(line, detail, closed));
    });
    Ok(shapes)
}

fn shape_from_line(mut line: Vec<(f64, f64)>, detail: u8, closed: bool) -> VectorShape {
    // Rings repeat their first coordinate; the clipper closes shapes
    // itself, so drop the duplicate.
    if closed && line.len() > 1 && line.first() == line.last() {
        line.pop();
    }
    VectorShape::from_degrees(&line, detail, closed)
}

/// Walk a GeoJSON document and hand every line feature to the callback
/// along with whether it came from a polygon ring.
fn process_geojson<F>(geojson: &GeoJson, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>, bool),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry(geometry, add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry(geometry, add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry(geometry, add_line);
        }
    }
}

fn process_geometry<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>, bool),
{
    let to_line = |coords: &[Vec<f64>]| -> Vec<(f64, f64)> {
        coords.iter().map(|c| (c[0], c[1])).collect()
    };
    match &geometry.value {
        Value::LineString(coords) => {
            add_line(to_line(coords), false);
        }
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords), false);
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior), true);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior), true);
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry(g, add_line);
            }
        }
        _ => {}
    }
}

/// Generate a simple world map outline for when no data file is available
pub fn generate_simple_world() -> WorldData {
    // Simplified continent outlines (used as the coarse fallback)
    let outlines: [&[(f64, f64)]; 7] = [
        // North America
        &[
            (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
            (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
            (-97.0, 25.0), (-97.0, 28.0), (-82.0, 24.0), (-80.0, 25.0),
            (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0), (-67.0, 45.0),
            (-65.0, 47.0), (-55.0, 47.0), (-52.0, 47.0), (-55.0, 52.0),
            (-58.0, 55.0), (-64.0, 60.0), (-73.0, 62.0), (-80.0, 63.0),
            (-95.0, 62.0), (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0),
        ],
        // South America
        &[
            (-80.0, 10.0), (-75.0, 5.0), (-70.0, 5.0), (-60.0, 5.0),
            (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
            (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
            (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0), (-75.0, -45.0),
            (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-70.0, -15.0),
            (-80.0, -5.0), (-80.0, 0.0),
        ],
        // Europe
        &[
            (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
            (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
            (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
            (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
            (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
            (-5.0, 48.0), (-5.0, 43.0),
        ],
        // Africa, southern outline
        &[
            (-17.0, 15.0), (-15.0, 10.0), (-10.0, 5.0), (0.0, 5.0),
            (10.0, 5.0), (15.0, 0.0), (20.0, -5.0), (25.0, -10.0),
            (35.0, -20.0), (35.0, -25.0), (30.0, -30.0), (20.0, -35.0),
            (18.0, -35.0), (15.0, -30.0), (10.0, -15.0), (10.0, 0.0),
            (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0), (-17.0, 15.0),
        ],
        // Africa, northern outline
        &[
            (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0),
            (10.0, 37.0), (20.0, 33.0), (25.0, 32.0), (35.0, 30.0),
            (35.0, 20.0), (42.0, 12.0), (50.0, 12.0), (45.0, 5.0),
            (35.0, -5.0), (35.0, -20.0),
        ],
        // Asia
        &[
            (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0),
            (60.0, 25.0), (65.0, 25.0), (70.0, 20.0), (75.0, 15.0),
            (80.0, 8.0), (80.0, 15.0), (88.0, 22.0), (92.0, 22.0),
            (95.0, 16.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0),
            (115.0, 22.0), (120.0, 22.0), (122.0, 25.0), (125.0, 30.0),
            (130.0, 35.0), (135.0, 35.0), (140.0, 40.0), (145.0, 45.0),
            (145.0, 50.0), (140.0, 55.0), (135.0, 55.0), (130.0, 52.0),
            (130.0, 43.0), (120.0, 40.0), (110.0, 45.0), (90.0, 50.0),
            (70.0, 55.0), (60.0, 55.0), (50.0, 50.0), (40.0, 43.0),
        ],
        // Australia
        &[
            (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
            (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
            (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
            (125.0, -32.0), (115.0, -35.0), (115.0, -25.0),
        ],
    ];

    WorldData {
        coastlines: outlines
            .iter()
            .map(|points| VectorShape::from_degrees(points, DETAIL_COARSE, true))
            .collect(),
        borders: Vec::new(),
    }
}
