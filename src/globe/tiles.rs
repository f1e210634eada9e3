use std::collections::HashMap;
use std::f64::consts::{PI, TAU};
use std::sync::{Arc, RwLock};

/// Edge length of every tile in pixels.
pub const TILE_SIZE: usize = 256;

/// Address of one tile in the pyramid. Level 0 is the coarsest: the world
/// is 2×1 tiles (equirectangular 2:1), and every level doubles the linear
/// resolution.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TileAddress {
    pub level: u8,
    pub column: u32,
    pub row: u32,
}

impl TileAddress {
    pub fn new(level: u8, column: u32, row: u32) -> Self {
        Self { level, column, row }
    }

    /// Number of tile columns at this level.
    #[inline(always)]
    pub fn columns(level: u8) -> u32 {
        2 << level
    }

    /// Number of tile rows at this level.
    #[inline(always)]
    pub fn rows(level: u8) -> u32 {
        1 << level
    }

    pub fn is_valid(&self) -> bool {
        self.column < Self::columns(self.level) && self.row < Self::rows(self.level)
    }

    /// The enclosing tile one level coarser.
    pub fn parent(&self) -> Option<TileAddress> {
        if self.level == 0 {
            return None;
        }
        Some(TileAddress {
            level: self.level - 1,
            column: self.column >> 1,
            row: self.row >> 1,
        })
    }

    /// Global pixel width of the whole pyramid at a level.
    #[inline(always)]
    pub fn global_width(level: u8) -> u32 {
        Self::columns(level) * TILE_SIZE as u32
    }

    #[inline(always)]
    pub fn global_height(level: u8) -> u32 {
        Self::rows(level) * TILE_SIZE as u32
    }
}

/// A fixed-size RGBA raster tile. Shared between the provider's cache and
/// the texture mapper via `Arc`; the mapper holds a handle only while it
/// crosses the tile, so background upgrades replace cache entries without
/// touching buffers being read.
pub struct Tile {
    pixels: Vec<u32>,
}

impl Tile {
    /// Pixel layout is 0xAARRGGBB.
    pub fn from_pixels(pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), TILE_SIZE * TILE_SIZE);
        Self { pixels }
    }

    pub fn solid(color: u32) -> Self {
        Self {
            pixels: vec![color; TILE_SIZE * TILE_SIZE],
        }
    }

    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * TILE_SIZE + x]
    }
}

/// Pack an opaque RGB color.
#[inline(always)]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Pick the pyramid level at which one source pixel maps to approximately
/// one screen pixel for the given globe radius: the smallest level whose
/// global width is at least the globe's on-screen circumference.
/// Monotonically non-decreasing in radius.
pub fn select_tile_level(radius: f64, max_level: u8) -> u8 {
    let circumference = TAU * radius;
    let mut level = 0u8;
    while level < max_level
        && (TileAddress::global_width(level) as f64) < circumference
    {
        level += 1;
    }
    level
}

/// The narrow contract the renderer depends on: best-effort tile fetch
/// that never fails (placeholder or coarser data on miss) and a one-time
/// maximum-level detection.
pub trait TileProvider: Send + Sync {
    fn fetch(&self, address: TileAddress) -> Arc<Tile>;
    fn max_level(&self) -> u8;
}

/// Dull gray placeholder used when nothing at all is loaded.
const PLACEHOLDER: u32 = rgb(60, 60, 70);

/// Tile store backed by explicitly inserted tiles. Misses degrade to the
/// nearest loaded ancestor, upscaled, and finally to a flat placeholder,
/// so a fetch never fails and never blocks the scanline loop.
pub struct TileStore {
    tiles: RwLock<HashMap<TileAddress, Arc<Tile>>>,
    max_level: u8,
}

impl TileStore {
    pub fn new(max_level: u8) -> Self {
        Self {
            tiles: RwLock::new(HashMap::new()),
            max_level,
        }
    }

    /// Insert or replace a tile. Replacement is an atomic swap of the
    /// `Arc`; readers holding the old handle keep a consistent buffer.
    pub fn insert(&self, address: TileAddress, tile: Tile) {
        self.tiles
            .write()
            .expect("tile store lock poisoned")
            .insert(address, Arc::new(tile));
    }

    /// Nearest-neighbor upscale of the ancestor region covering `address`.
    fn upscale_from(ancestor: &Tile, address: TileAddress, levels_up: u8) -> Tile {
        let scale = 1usize << levels_up;
        let sub_x = (address.column as usize % scale) * TILE_SIZE / scale;
        let sub_y = (address.row as usize % scale) * TILE_SIZE / scale;
        let mut pixels = vec![0u32; TILE_SIZE * TILE_SIZE];
        for y in 0..TILE_SIZE {
            let src_y = sub_y + y / scale;
            for x in 0..TILE_SIZE {
                let src_x = sub_x + x / scale;
                pixels[y * TILE_SIZE + x] = ancestor.pixel(src_x, src_y);
            }
        }
        Tile::from_pixels(pixels)
    }
}

impl TileProvider for TileStore {
    fn fetch(&self, address: TileAddress) -> Arc<Tile> {
        let tiles = self.tiles.read().expect("tile store lock poisoned");
        if let Some(tile) = tiles.get(&address) {
            return Arc::clone(tile);
        }
        // Walk up the pyramid for the best available coarser tile.
        let mut current = address;
        let mut levels_up = 0u8;
        while let Some(parent) = current.parent() {
            levels_up += 1;
            if let Some(ancestor) = tiles.get(&parent) {
                return Arc::new(Self::upscale_from(ancestor, address, levels_up));
            }
            current = parent;
        }
        Arc::new(Tile::solid(PLACEHOLDER))
    }

    fn max_level(&self) -> u8 {
        self.max_level
    }
}

/// Synthetic shaded-relief pyramid for the demo and tests: a deterministic
/// elevation function colored sea-to-summit, generated on demand and
/// cached. Never misses.
pub struct ProceduralPyramid {
    cache: RwLock<HashMap<TileAddress, Arc<Tile>>>,
    max_level: u8,
}

impl ProceduralPyramid {
    pub fn new(max_level: u8) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_level,
        }
    }

    /// Smooth pseudo-terrain in [-1, 1] from a few sine octaves.
    fn elevation(lon: f64, lat: f64) -> f64 {
        let e = 0.55 * (2.0 * lon).sin() * (1.5 * lat + 0.4).cos()
            + 0.30 * (5.0 * lon + 1.3).cos() * (3.0 * lat).sin()
            + 0.15 * (9.0 * lon - 0.7).sin() * (7.0 * lat + 2.1).cos();
        e.clamp(-1.0, 1.0)
    }

    fn shade(e: f64) -> u32 {
        if e < 0.0 {
            // Ocean: darker with depth.
            let t = 1.0 + e;
            rgb(
                (20.0 + 40.0 * t) as u8,
                (50.0 + 80.0 * t) as u8,
                (120.0 + 100.0 * t) as u8,
            )
        } else if e < 0.35 {
            let t = e / 0.35;
            rgb((40.0 + 80.0 * t) as u8, (140.0 - 30.0 * t) as u8, 50)
        } else if e < 0.7 {
            let t = (e - 0.35) / 0.35;
            rgb((120.0 + 40.0 * t) as u8, (110.0 - 30.0 * t) as u8, (50.0 + 30.0 * t) as u8)
        } else {
            let t = ((e - 0.7) / 0.3).min(1.0);
            let c = (160.0 + 95.0 * t) as u8;
            rgb(c, c, c)
        }
    }

    fn generate(address: TileAddress) -> Tile {
        let global_w = TileAddress::global_width(address.level) as f64;
        let global_h = TileAddress::global_height(address.level) as f64;
        let mut pixels = vec![0u32; TILE_SIZE * TILE_SIZE];
        for y in 0..TILE_SIZE {
            let gy = (address.row as usize * TILE_SIZE + y) as f64 + 0.5;
            let lat = PI / 2.0 - gy / global_h * PI;
            for x in 0..TILE_SIZE {
                let gx = (address.column as usize * TILE_SIZE + x) as f64 + 0.5;
                let lon = gx / global_w * TAU - PI;
                pixels[y * TILE_SIZE + x] = Self::shade(Self::elevation(lon, lat));
            }
        }
        Tile::from_pixels(pixels)
    }
}

impl TileProvider for ProceduralPyramid {
    fn fetch(&self, address: TileAddress) -> Arc<Tile> {
        if let Some(tile) = self
            .cache
            .read()
            .expect("pyramid lock poisoned")
            .get(&address)
        {
            return Arc::clone(tile);
        }
        let tile = Arc::new(Self::generate(address));
        self.cache
            .write()
            .expect("pyramid lock poisoned")
            .insert(address, Arc::clone(&tile));
        tile
    }

    fn max_level(&self) -> u8 {
        self.max_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_geometry_doubles() {
        assert_eq!(TileAddress::columns(0), 2);
        assert_eq!(TileAddress::rows(0), 1);
        assert_eq!(TileAddress::columns(3), 16);
        assert_eq!(TileAddress::rows(3), 8);
        assert_eq!(TileAddress::global_width(0), 512);
        assert_eq!(TileAddress::global_height(2), 1024);
    }

    #[test]
    fn address_validity_and_parent() {
        assert!(TileAddress::new(2, 7, 3).is_valid());
        assert!(!TileAddress::new(2, 8, 0).is_valid());
        assert!(!TileAddress::new(0, 0, 1).is_valid());
        assert_eq!(
            TileAddress::new(3, 13, 6).parent(),
            Some(TileAddress::new(2, 6, 3))
        );
        assert_eq!(TileAddress::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn level_selection_monotonic_in_radius() {
        let mut previous = 0u8;
        for r in 1..3000 {
            let level = select_tile_level(r as f64, 8);
            assert!(level >= previous, "level dropped at radius {r}");
            previous = level;
        }
    }

    #[test]
    fn level_selection_matches_resolution() {
        // Level 0 spans 512 px; a radius of 81 gives a circumference of
        // ~509 px, so level 0 still resolves it. Radius 82 does not.
        assert_eq!(select_tile_level(81.0, 8), 0);
        assert_eq!(select_tile_level(82.0, 8), 1);
        // Clamped at the provider's maximum.
        assert_eq!(select_tile_level(1e9, 5), 5);
    }

    #[test]
    fn store_miss_degrades_to_ancestor() {
        let store = TileStore::new(3);
        store.insert(TileAddress::new(0, 0, 0), Tile::solid(rgb(1, 2, 3)));
        // Level-2 child inside the level-0 tile resolves to its color.
        let tile = store.fetch(TileAddress::new(2, 3, 1));
        assert_eq!(tile.pixel(0, 0), rgb(1, 2, 3));
    }

    #[test]
    fn empty_store_serves_placeholder() {
        let store = TileStore::new(2);
        let tile = store.fetch(TileAddress::new(1, 0, 0));
        assert_eq!(tile.pixel(128, 128), PLACEHOLDER);
    }

    #[test]
    fn procedural_pyramid_is_deterministic() {
        let p = ProceduralPyramid::new(4);
        let a = p.fetch(TileAddress::new(1, 2, 1));
        let b = p.fetch(TileAddress::new(1, 2, 1));
        assert_eq!(a.pixel(17, 200), b.pixel(17, 200));
    }
}
