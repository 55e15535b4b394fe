//! Procedural planet textures with a content-addressed, byte-budgeted cache.
//!
//! Flow: hue-shifted radial albedo → one variant overlay → grain → PNG.
//! The PRNG is seeded from `seedKey|tex|variant|size`, so the output is a pure
//! function of the request and a cache hit can hand back the same `Arc`.
//! Entries are never evicted; once the budget is spent, new textures are
//! rendered per request and not stored.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use image::{ImageFormat, RgbaImage};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cosmos::appearance::{parse_hex_color, TextureVariant};
use crate::cosmos::raster::{
    apply_grain, blend_pixel, clamp01, fill_disc, fill_disc_gradient, fill_gradient,
    stroke_polyline, Color, RadialGradient,
};
use crate::cosmos::seed::Mulberry32;

/// Largest texture edge we are willing to rasterize.
pub const MAX_TEXTURE_SIZE: u32 = 1024;

const GRAIN_STRENGTH: f64 = 0.07;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureRequest {
    pub seed_key: String,
    pub size: u32,
    pub base: String,
    pub accent: String,
    pub variant: TextureVariant,
    #[serde(default)]
    pub hue_shift_deg: i32,
}

impl TextureRequest {
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.seed_key,
            self.size,
            self.base,
            self.accent,
            self.variant.as_str(),
            self.hue_shift_deg
        )
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub cache_key: String,
    pub png: Bytes,
}

/// In-process texture cache. Entries are content-addressed so they never go
/// stale; `max_bytes` caps the PNG bytes retained for the life of the process.
#[derive(Debug)]
pub struct TextureCache {
    entries: DashMap<String, Arc<Texture>>,
    retained: AtomicUsize,
    max_bytes: usize,
}

impl TextureCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            retained: AtomicUsize::new(0),
            max_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retained_bytes(&self) -> usize {
        self.retained.load(Ordering::Acquire)
    }

    /// Claims `len` bytes of the budget. False when they do not fit.
    fn reserve(&self, len: usize) -> bool {
        self.retained
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(len).filter(|total| *total <= self.max_bytes)
            })
            .is_ok()
    }

    /// Returns the cached texture or renders and stores it.
    ///
    /// `None` means no raster surface could be produced (bad size, unparseable
    /// colors, encoder failure); callers fall back to the CSS appearance.
    pub fn get_or_render(&self, request: &TextureRequest) -> Option<Arc<Texture>> {
        let key = request.cache_key();
        if let Some(hit) = self.entries.get(&key) {
            debug!("texture cache hit: {key}");
            return Some(Arc::clone(hit.value()));
        }

        let texture = Arc::new(render_texture(request)?);
        let len = texture.png.len();
        if !self.reserve(len) {
            debug!(retained = self.retained_bytes(), "texture cache full, not storing {key}");
            return Some(texture);
        }

        // A concurrent render of the same key may have landed first; keep
        // whichever is stored so every caller sees one Arc.
        match self.entries.entry(key) {
            Entry::Occupied(stored) => {
                self.retained.fetch_sub(len, Ordering::AcqRel);
                Some(Arc::clone(stored.get()))
            }
            Entry::Vacant(slot) => Some(Arc::clone(slot.insert(texture).value())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

pub fn render_texture(request: &TextureRequest) -> Option<Texture> {
    let size = request.size;
    if size == 0 || size > MAX_TEXTURE_SIZE {
        warn!("texture size {size} outside 1..={MAX_TEXTURE_SIZE}");
        return None;
    }
    let base = parse_hex_color(&request.base)?;
    let accent = parse_hex_color(&request.accent)?;

    let img = render_raster(request, base, accent);

    let mut png = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        warn!("texture PNG encoding failed: {e}");
        return None;
    }
    Some(Texture {
        cache_key: request.cache_key(),
        png: Bytes::from(png),
    })
}

fn render_raster(request: &TextureRequest, base: [u8; 3], accent: [u8; 3]) -> RgbaImage {
    let size = request.size;
    let s = f64::from(size);
    let mut img = RgbaImage::new(size, size);

    let mut rng = Mulberry32::from_key(&format!(
        "{}|tex|{}|{}",
        request.seed_key,
        request.variant.as_str(),
        size
    ));

    let hue = f64::from(request.hue_shift_deg);
    let base_shifted = shift_hue(base, hue, 0.08, 0.01);
    let accent_shifted = shift_hue(accent, hue * 0.85, 0.10, 0.0);

    let albedo_stops = [
        (0.0, Color::from_rgb(base_shifted, 1.0)),
        (0.55, Color::from_rgb(accent_shifted, 1.0)),
        (1.0, Color::rgba(0.0, 0.0, 0.0, 0.22)),
    ];
    let albedo = RadialGradient {
        fx: s * 0.28,
        fy: s * 0.26,
        cx: s * 0.55,
        cy: s * 0.6,
        r: s * 0.85,
        stops: &albedo_stops,
    };
    fill_gradient(&mut img, &albedo);

    match request.variant {
        TextureVariant::Bands => draw_gas_bands(&mut img, &mut rng, base, accent),
        TextureVariant::Craters => draw_rocky(&mut img, &mut rng),
        TextureVariant::Ice => draw_ice(&mut img, &mut rng),
        TextureVariant::Nebula => draw_nebula(&mut img, &mut rng),
        TextureVariant::TechGrid => draw_tech_grid(&mut img, &mut rng),
        TextureVariant::Lava => draw_lava(&mut img, &mut rng),
    }

    apply_grain(&mut img, GRAIN_STRENGTH, || rng.next_f64());
    img
}

fn white(a: f64) -> Color {
    Color::rgba(255.0, 255.0, 255.0, a)
}

fn black(a: f64) -> Color {
    Color::rgba(0.0, 0.0, 0.0, a)
}

/// Sinusoidal bands in a frame rotated by a seeded angle, plus soft storms.
fn draw_gas_bands(img: &mut RgbaImage, rng: &mut Mulberry32, base: [u8; 3], accent: [u8; 3]) {
    let size = img.width();
    let s = f64::from(size);
    let angle = rng.range(-20.0, 20.0).to_radians();
    let freq = f64::from(rng.int_in(6, 6));
    let phase = rng.range(0.0, std::f64::consts::TAU);

    let base_c = Color::from_rgb(base, 1.0);
    let accent_c = Color::from_rgb(accent, 1.0);
    let rows: Vec<Color> = (0..size)
        .map(|y| {
            let t = f64::from(y) / s;
            let w = (t * std::f64::consts::TAU * freq + phase).sin() * 0.45
                + (t * std::f64::consts::TAU * (freq * 0.5) + phase * 0.7).sin() * 0.18;
            let jitter = (rng.next_f64() - 0.5) * 0.08;
            let v = clamp01(0.5 + w + jitter);
            let c = base_c.lerp(accent_c, v);
            Color::rgba(c.r.round(), c.g.round(), c.b.round(), 0.85)
        })
        .collect();

    // Map each device pixel back into the band frame (inverse rotation about
    // the center) and take that row's color.
    let (sin, cos) = angle.sin_cos();
    let c = s / 2.0;
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = (f64::from(x) + 0.5 - c, f64::from(y) + 0.5 - c);
            let lx = dx * cos + dy * sin + c;
            let ly = -dx * sin + dy * cos + c;
            if lx < 0.0 || lx >= s || ly < 0.0 || ly >= s {
                continue;
            }
            blend_pixel(img, x, y, rows[ly as usize], 1.0);
        }
    }

    let storm_stops = [(0.0, white(0.12)), (0.35, white(0.06)), (1.0, white(0.0))];
    let storms = rng.int_in(4, 4);
    for _ in 0..storms {
        let lx = s * rng.range(0.15, 0.85);
        let ly = s * rng.range(0.15, 0.85);
        let r = s * rng.range(0.06, 0.20);
        // Storms live in the rotated frame too.
        let (dx, dy) = (lx - c, ly - c);
        let x = dx * cos - dy * sin + c;
        let y = dx * sin + dy * cos + c;
        fill_disc_gradient(img, x, y, r, &RadialGradient::centered(x, y, r, &storm_stops));
    }
}

/// Dark-centered craters with a light rim, then fine speckles.
fn draw_rocky(img: &mut RgbaImage, rng: &mut Mulberry32) {
    let s = f64::from(img.width());
    let crater_stops = [
        (0.0, black(0.22)),
        (0.55, black(0.10)),
        (0.72, white(0.08)),
        (1.0, white(0.0)),
    ];
    let craters = rng.int_in(6, 8);
    for _ in 0..craters {
        let x = s * rng.range(0.12, 0.88);
        let y = s * rng.range(0.12, 0.88);
        let r = s * rng.range(0.045, 0.165);
        let gradient = RadialGradient {
            fx: x - r * 0.15,
            fy: y - r * 0.15,
            cx: x,
            cy: y,
            r,
            stops: &crater_stops,
        };
        fill_disc_gradient(img, x, y, r, &gradient);
    }

    let dots = rng.int_in(220, 180);
    for _ in 0..dots {
        let x = rng.next_f64() * s;
        let y = rng.next_f64() * s;
        let r = rng.range(0.4, 1.5);
        let color = if rng.next_f64() > 0.5 {
            white(0.03)
        } else {
            black(0.04)
        };
        fill_disc(img, x, y, r, color);
    }
}

/// Short jagged random-walk veins at low opacity.
fn draw_ice(img: &mut RgbaImage, rng: &mut Mulberry32) {
    let s = f64::from(img.width());
    let stroke = white(0.9 * 0.16);
    let veins = rng.int_in(14, 12);
    for _ in 0..veins {
        let mut x = rng.next_f64() * s;
        let mut y = rng.next_f64() * s;
        let steps = rng.int_in(6, 10);
        let mut points = Vec::with_capacity(steps as usize + 1);
        points.push((x, y));
        for _ in 0..steps {
            x += (rng.next_f64() - 0.5) * (s * 0.12);
            y += (rng.next_f64() - 0.5) * (s * 0.12);
            points.push((x, y));
        }
        stroke_polyline(img, &points, 1.2, stroke);
    }
}

fn draw_nebula(img: &mut RgbaImage, rng: &mut Mulberry32) {
    let s = f64::from(img.width());
    let stops = [(0.0, white(0.10)), (0.4, white(0.06)), (1.0, white(0.0))];
    let swirls = rng.int_in(4, 5);
    for _ in 0..swirls {
        let x = s * rng.range(0.1, 0.9);
        let y = s * rng.range(0.1, 0.9);
        let r = s * rng.range(0.2, 0.55);
        fill_disc_gradient(img, x, y, r, &RadialGradient::centered(x, y, r, &stops));
    }
}

/// Evenly spaced orthogonal lines; the step size is the only seeded input.
fn draw_tech_grid(img: &mut RgbaImage, rng: &mut Mulberry32) {
    let size = img.width();
    let s = f64::from(size);
    let step = rng.int_in(8, 8) as usize;
    let stroke = white(0.7 * 0.18);
    for x in (0..=size).step_by(step) {
        let x = f64::from(x) + 0.5;
        stroke_polyline(img, &[(x, 0.0), (x, s)], 1.0, stroke);
    }
    for y in (0..=size).step_by(step) {
        let y = f64::from(y) + 0.5;
        stroke_polyline(img, &[(0.0, y), (s, y)], 1.0, stroke);
    }
}

fn draw_lava(img: &mut RgbaImage, rng: &mut Mulberry32) {
    let s = f64::from(img.width());
    let stops = [
        (0.0, Color::rgba(255.0, 190.0, 70.0, 0.22)),
        (0.35, Color::rgba(255.0, 120.0, 30.0, 0.16)),
        (1.0, black(0.0)),
    ];
    let blobs = rng.int_in(10, 10);
    for _ in 0..blobs {
        let x = s * rng.range(0.1, 0.9);
        let y = s * rng.range(0.1, 0.9);
        let r = s * rng.range(0.06, 0.28);
        fill_disc_gradient(img, x, y, r, &RadialGradient::centered(x, y, r, &stops));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Color helpers
// ────────────────────────────────────────────────────────────────────────────

fn rgb_to_hsl([r, g, b]: [u8; 3]) -> (f64, f64, f64) {
    let (r, g, b) = (f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 0.5 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };
    let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Rotates hue by `deg` and nudges saturation/lightness up.
fn shift_hue(rgb: [u8; 3], deg: f64, sat_boost: f64, light_boost: f64) -> [u8; 3] {
    let (h, s, l) = rgb_to_hsl(rgb);
    let h = (h + deg / 360.0 + 1.0).rem_euclid(1.0);
    hsl_to_rgb(h, clamp01(s + sat_boost), clamp01(l + light_boost))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(variant: TextureVariant) -> TextureRequest {
        TextureRequest {
            seed_key: "skill:1:Chiarezza".to_string(),
            size: 48,
            base: "#22d3ee".to_string(),
            accent: "#0891b2".to_string(),
            variant,
            hue_shift_deg: 12,
        }
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            request(TextureVariant::TechGrid).cache_key(),
            "skill:1:Chiarezza|48|#22d3ee|#0891b2|tech-grid|12"
        );
    }

    const BUDGET: usize = 16 * 1024 * 1024;

    #[test]
    fn test_identical_requests_share_cached_arc() {
        let cache = TextureCache::new(BUDGET);
        let a = cache.get_or_render(&request(TextureVariant::Bands)).unwrap();
        let b = cache.get_or_render(&request(TextureVariant::Bands)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changing_one_parameter_changes_key_and_output() {
        let cache = TextureCache::new(BUDGET);
        let a = cache.get_or_render(&request(TextureVariant::Nebula)).unwrap();
        let mut other = request(TextureVariant::Nebula);
        other.hue_shift_deg = -40;
        let b = cache.get_or_render(&other).unwrap();
        assert_ne!(a.cache_key, b.cache_key);
        assert_ne!(a.png, b.png);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_render_is_deterministic_across_caches() {
        for variant in TextureVariant::ALL {
            let a = render_texture(&request(variant)).unwrap();
            let b = render_texture(&request(variant)).unwrap();
            assert_eq!(a.png, b.png, "variant {variant:?} is not deterministic");
        }
    }

    #[test]
    fn test_every_variant_renders_png() {
        for variant in TextureVariant::ALL {
            let t = render_texture(&request(variant)).unwrap();
            assert_eq!(&t.png[1..4], b"PNG");
        }
    }

    #[test]
    fn test_full_cache_renders_without_storing() {
        let first = render_texture(&request(TextureVariant::Craters)).unwrap();
        let cache = TextureCache::new(first.png.len());

        let a = cache.get_or_render(&request(TextureVariant::Craters)).unwrap();
        assert_eq!(cache.retained_bytes(), first.png.len());

        let mut other = request(TextureVariant::Craters);
        other.seed_key = "skill:2:Ascolto".to_string();
        let b = cache.get_or_render(&other).unwrap();
        let c = cache.get_or_render(&other).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.retained_bytes(), first.png.len());
        assert!(!Arc::ptr_eq(&b, &c));
        assert_eq!(b.png, c.png);

        // the stored entry is still served from memory
        let again = cache.get_or_render(&request(TextureVariant::Craters)).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn test_zero_budget_never_stores() {
        let cache = TextureCache::new(0);
        assert!(cache.get_or_render(&request(TextureVariant::Lava)).is_some());
        assert!(cache.is_empty());
        assert_eq!(cache.retained_bytes(), 0);
    }

    #[test]
    fn test_unusable_surface_returns_none() {
        let cache = TextureCache::new(BUDGET);
        let mut zero = request(TextureVariant::Ice);
        zero.size = 0;
        assert!(cache.get_or_render(&zero).is_none());

        let mut huge = request(TextureVariant::Ice);
        huge.size = MAX_TEXTURE_SIZE + 1;
        assert!(cache.get_or_render(&huge).is_none());

        let mut bad_color = request(TextureVariant::Ice);
        bad_color.base = "not-a-color".to_string();
        assert!(cache.get_or_render(&bad_color).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shift_hue_zero_keeps_hue() {
        let (h0, _, _) = rgb_to_hsl([0x22, 0xd3, 0xee]);
        let (h1, _, _) = rgb_to_hsl(shift_hue([0x22, 0xd3, 0xee], 0.0, 0.0, 0.0));
        assert!((h0 - h1).abs() < 0.01);
    }

    #[test]
    fn test_hsl_roundtrip_primaries() {
        for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [128, 128, 128]] {
            let (h, s, l) = rgb_to_hsl(rgb);
            assert_eq!(hsl_to_rgb(h, s, l), rgb);
        }
    }
}
