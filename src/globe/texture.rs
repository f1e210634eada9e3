use rayon::prelude::*;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

use crate::globe::projection;
use crate::globe::tiles::{select_tile_level, Tile, TileAddress, TileProvider, TILE_SIZE};
use crate::globe::viewport::Viewport;

/// Fully transparent pixel written for everything outside the projected
/// globe/map.
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Per-scanline mutable scan state: the tile currently crossed and the
/// last sampled source pixel. Passed explicitly through each scanline call
/// instead of living on the mapper, so rows can be mapped in parallel and
/// the mapper stays reentrant across concurrent viewports.
struct ScanState {
    address: Option<TileAddress>,
    tile: Option<Arc<Tile>>,
    last_ix: i64,
    last_iy: i64,
    last_color: u32,
}

impl ScanState {
    fn new() -> Self {
        Self {
            address: None,
            tile: None,
            last_ix: i64::MIN,
            last_iy: i64::MIN,
            last_color: TRANSPARENT,
        }
    }

    /// Fetch the tile containing the global pixel, reusing the current
    /// handle while the scan stays inside its bounds. The fetch is the
    /// only suspension point in the pixel loop; the provider answers
    /// best-effort (coarser or placeholder data) rather than stalling.
    #[inline]
    fn resolve_tile<'a, P: TileProvider>(
        &'a mut self,
        provider: &P,
        level: u8,
        ix: i64,
        iy: i64,
    ) -> &'a Tile {
        let column = (ix / TILE_SIZE as i64) as u32;
        let row = (iy / TILE_SIZE as i64) as u32;
        let wanted = TileAddress::new(level, column, row);
        if self.address != Some(wanted) {
            self.tile = Some(provider.fetch(wanted));
            self.address = Some(wanted);
        }
        self.tile.as_deref().expect("tile fetched above")
    }

    /// Color of one global source pixel, with tile-crossing bookkeeping.
    #[inline]
    fn pixel_at<P: TileProvider>(&mut self, provider: &P, level: u8, ix: i64, iy: i64) -> u32 {
        let tile = self.resolve_tile(provider, level, ix, iy);
        tile.pixel(
            (ix % TILE_SIZE as i64) as usize,
            (iy % TILE_SIZE as i64) as usize,
        )
    }
}

/// Maps the tile pyramid onto the screen, one scanline at a time: every
/// output pixel inside the visible disc is inverse-projected to a
/// geographic coordinate and sampled from the pyramid at the level where
/// one source pixel covers about one screen pixel.
pub struct TextureMapper<P> {
    provider: P,
    smoothing: bool,
    level_cap: Option<u8>,
    tile_level: u8,
}

impl<P: TileProvider> TextureMapper<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            smoothing: false,
            level_cap: None,
            tile_level: 0,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Bilinear sampling across tile boundaries instead of nearest
    /// neighbor.
    pub fn set_smoothing(&mut self, smoothing: bool) {
        self.smoothing = smoothing;
    }

    /// Cap the pyramid level below the provider's maximum, e.g. to limit
    /// memory for very deep pyramids.
    pub fn set_level_cap(&mut self, cap: Option<u8>) {
        self.level_cap = cap;
    }

    pub fn tile_level(&self) -> u8 {
        self.tile_level
    }

    /// Render one frame into `target` (row-major 0xAARRGGBB, exactly
    /// `vp.width × vp.height`). Pixels outside the projection stay fully
    /// transparent; missing tiles degrade to coarser data, so the frame
    /// never fails.
    pub fn map_texture(&mut self, target: &mut [u32], vp: &Viewport) {
        debug_assert_eq!(target.len(), vp.width * vp.height);

        // Level selection happens once per frame; a radius change simply
        // lands here with a new level, and all per-scanline position
        // state below starts fresh.
        let max_level = self
            .level_cap
            .map_or(self.provider.max_level(), |cap| {
                cap.min(self.provider.max_level())
            });
        let level = select_tile_level(vp.radius, max_level);
        self.tile_level = level;

        let global_w = TileAddress::global_width(level) as f64;
        let global_h = TileAddress::global_height(level) as f64;
        let rad_to_pixel_x = global_w / TAU;
        let rad_to_pixel_y = global_h / PI;

        let provider = &self.provider;
        let smoothing = self.smoothing;
        let width = vp.width;

        target
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, scanline)| {
                let mut state = ScanState::new();
                let y = row as f64 + 0.5;
                for (col, out) in scanline.iter_mut().enumerate() {
                    let x = col as f64 + 0.5;
                    let Some(geo) = projection::inverse(x, y, vp) else {
                        *out = TRANSPARENT;
                        continue;
                    };
                    // Geographic coordinate to global pyramid pixels.
                    let gx = (geo.lon + PI) * rad_to_pixel_x;
                    let gy = (FRAC_PI_2 - geo.lat) * rad_to_pixel_y;
                    *out = if smoothing {
                        sample_bilinear(&mut state, provider, level, gx, gy, global_w, global_h)
                    } else {
                        sample_nearest(&mut state, provider, level, gx, gy, global_w, global_h)
                    };
                }
            });
    }
}

#[inline(always)]
fn clamp_global(v: f64, max: f64) -> i64 {
    (v as i64).clamp(0, max as i64 - 1)
}

/// Nearest-neighbor sample. Consecutive screen pixels often land on the
/// same source pixel, so the last color is reused without re-touching the
/// tile.
#[inline]
fn sample_nearest<P: TileProvider>(
    state: &mut ScanState,
    provider: &P,
    level: u8,
    gx: f64,
    gy: f64,
    global_w: f64,
    global_h: f64,
) -> u32 {
    let ix = clamp_global(gx, global_w);
    let iy = clamp_global(gy, global_h);
    if ix == state.last_ix && iy == state.last_iy {
        return state.last_color;
    }
    let color = state.pixel_at(provider, level, ix, iy);
    state.last_ix = ix;
    state.last_iy = iy;
    state.last_color = color;
    color
}

/// Bilinear sample blending the four surrounding source pixels, wrapping
/// in longitude and clamping at the poles; blends across tile boundaries
/// since each corner resolves its own tile.
#[inline]
fn sample_bilinear<P: TileProvider>(
    state: &mut ScanState,
    provider: &P,
    level: u8,
    gx: f64,
    gy: f64,
    global_w: f64,
    global_h: f64,
) -> u32 {
    let fx = gx - 0.5;
    let fy = gy - 0.5;
    let ix = fx.floor();
    let iy = fy.floor();
    let tx = fx - ix;
    let ty = fy - iy;

    let max_x = global_w as i64;
    let x0 = (ix as i64).rem_euclid(max_x);
    let x1 = (ix as i64 + 1).rem_euclid(max_x);
    let y0 = (iy as i64).clamp(0, global_h as i64 - 1);
    let y1 = (iy as i64 + 1).clamp(0, global_h as i64 - 1);

    let c00 = state.pixel_at(provider, level, x0, y0);
    let c10 = state.pixel_at(provider, level, x1, y0);
    let c01 = state.pixel_at(provider, level, x0, y1);
    let c11 = state.pixel_at(provider, level, x1, y1);

    let top = mix(c00, c10, tx);
    let bottom = mix(c01, c11, tx);
    mix(top, bottom, ty)
}

/// Per-channel linear blend of two packed colors.
#[inline(always)]
fn mix(a: u32, b: u32, t: f64) -> u32 {
    let mut out = 0u32;
    for shift in [24, 16, 8, 0] {
        let ca = (a >> shift & 0xFF) as f64;
        let cb = (b >> shift & 0xFF) as f64;
        out |= (((ca + (cb - ca) * t) as u32) & 0xFF) << shift;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::orientation::Orientation;
    use crate::globe::projection::ProjectionKind;
    use crate::globe::tiles::{rgb, TileStore};

    fn render(provider: TileStore, vp: &Viewport, smoothing: bool) -> Vec<u32> {
        let mut mapper = TextureMapper::new(provider);
        mapper.set_smoothing(smoothing);
        let mut target = vec![0u32; vp.width * vp.height];
        mapper.map_texture(&mut target, vp);
        target
    }

    fn spherical_viewport(radius: f64) -> Viewport {
        Viewport::new(
            200,
            200,
            radius,
            Orientation::IDENTITY,
            ProjectionKind::Spherical,
        )
        .unwrap()
    }

    #[test]
    fn corners_outside_disc_are_transparent() {
        let store = TileStore::new(2);
        store.insert(TileAddress::new(0, 0, 0), Tile::solid(rgb(9, 9, 9)));
        store.insert(TileAddress::new(0, 1, 0), Tile::solid(rgb(9, 9, 9)));
        let vp = spherical_viewport(80.0);
        let target = render(store, &vp, false);
        assert_eq!(target[0], TRANSPARENT);
        assert_eq!(target[199], TRANSPARENT);
        assert_eq!(target[199 * 200], TRANSPARENT);
    }

    #[test]
    fn center_pixel_samples_loaded_tile() {
        let store = TileStore::new(2);
        // (0, 0) falls in the eastern level-0 tile (column 1).
        store.insert(TileAddress::new(0, 1, 0), Tile::solid(rgb(200, 10, 10)));
        let vp = spherical_viewport(80.0);
        let target = render(store, &vp, false);
        assert_eq!(target[100 * 200 + 100], rgb(200, 10, 10));
    }

    #[test]
    fn empty_pyramid_still_fills_disc() {
        let store = TileStore::new(3);
        let vp = spherical_viewport(80.0);
        let target = render(store, &vp, false);
        let center = target[100 * 200 + 100];
        assert_ne!(center, TRANSPARENT);
        // Every pixel inside the disc got the same placeholder color.
        assert_eq!(target[100 * 200 + 60], center);
    }

    #[test]
    fn smoothing_blends_across_tile_boundary() {
        let store = TileStore::new(0);
        let a = rgb(0, 0, 0);
        let b = rgb(200, 200, 200);
        store.insert(TileAddress::new(0, 0, 0), Tile::solid(a));
        store.insert(TileAddress::new(0, 1, 0), Tile::solid(b));
        // Radius chosen so the pixel right of center lands within half a
        // source pixel of the lon = 0 tile seam.
        let vp = spherical_viewport(100.0);
        let target = render(store, &vp, true);
        let center = target[100 * 200 + 100];
        let red = center >> 16 & 0xFF;
        assert!(red > 0 && red < 200, "expected a blend, got {red}");
    }

    #[test]
    fn flat_projection_fills_band_only() {
        let store = TileStore::new(2);
        store.insert(TileAddress::new(0, 0, 0), Tile::solid(rgb(5, 5, 5)));
        store.insert(TileAddress::new(0, 1, 0), Tile::solid(rgb(5, 5, 5)));
        let vp = Viewport::new(
            200,
            200,
            40.0,
            Orientation::IDENTITY,
            ProjectionKind::Equirectangular,
        )
        .unwrap();
        let target = render(store, &vp, false);
        // Band is 2·40 = 80 px tall around y = 100.
        assert_eq!(target[100 * 200 + 100], rgb(5, 5, 5));
        assert_eq!(target[10 * 200 + 100], TRANSPARENT);
        assert_eq!(target[190 * 200 + 100], TRANSPARENT);
    }

    #[test]
    fn level_follows_radius() {
        let store = TileStore::new(6);
        let mut mapper = TextureMapper::new(store);
        let mut target = vec![0u32; 200 * 200];
        mapper.map_texture(&mut target, &spherical_viewport(80.0));
        let coarse = mapper.tile_level();
        mapper.map_texture(&mut target, &spherical_viewport(1000.0));
        let fine = mapper.tile_level();
        assert!(fine > coarse);
    }
}
