//! Minimal 2D drawing primitives over an RGBA buffer: source-over blending,
//! two-point radial gradients, discs, stroked polylines and per-pixel grain.
//!
//! Only what the planet overlays need. Colors are straight (non-premultiplied)
//! RGBA with float alpha.

use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(rgb: [u8; 3], a: f64) -> Self {
        Self::rgba(f64::from(rgb[0]), f64::from(rgb[1]), f64::from(rgb[2]), a)
    }

    pub fn lerp(self, other: Color, t: f64) -> Color {
        Color {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
            a: lerp(self.a, other.a, t),
        }
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Color stops, sorted by offset.
pub type Stops<'a> = &'a [(f64, Color)];

fn sample_stops(stops: Stops<'_>, t: f64) -> Color {
    let t = clamp01(t);
    let Some(&(first_off, first)) = stops.first() else {
        return Color::rgba(0.0, 0.0, 0.0, 0.0);
    };
    if t <= first_off {
        return first;
    }
    for pair in stops.windows(2) {
        let (o0, c0) = pair[0];
        let (o1, c1) = pair[1];
        if t <= o1 {
            let span = (o1 - o0).max(f64::EPSILON);
            return c0.lerp(c1, (t - o0) / span);
        }
    }
    stops[stops.len() - 1].1
}

/// A radial gradient from a zero-radius focal point `(fx, fy)` to the circle
/// `(cx, cy, r)`, matching canvas `createRadialGradient(fx, fy, 0, cx, cy, r)`
/// when the focal point lies inside the outer circle.
#[derive(Debug, Clone, Copy)]
pub struct RadialGradient<'a> {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub stops: Stops<'a>,
}

impl RadialGradient<'_> {
    pub fn centered(cx: f64, cy: f64, r: f64, stops: Stops<'_>) -> RadialGradient<'_> {
        RadialGradient {
            fx: cx,
            fy: cy,
            cx,
            cy,
            r,
            stops,
        }
    }

    /// Solves `|p - f - t·d| = t·r` for the largest `t`.
    fn param_at(&self, px: f64, py: f64) -> f64 {
        let (dx, dy) = (self.cx - self.fx, self.cy - self.fy);
        let (qx, qy) = (px - self.fx, py - self.fy);
        let a = dx * dx + dy * dy - self.r * self.r;
        let b = -2.0 * (qx * dx + qy * dy);
        let c = qx * qx + qy * qy;
        if a.abs() < 1e-9 {
            return if b.abs() < 1e-9 { 0.0 } else { -c / b };
        }
        let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
        let t0 = (-b + disc) / (2.0 * a);
        let t1 = (-b - disc) / (2.0 * a);
        t0.max(t1).max(0.0)
    }

    pub fn color_at(&self, px: f64, py: f64) -> Color {
        sample_stops(self.stops, self.param_at(px, py))
    }
}

/// Source-over blend of `src` onto the pixel at `(x, y)` with extra coverage.
pub fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, src: Color, coverage: f64) {
    let sa = clamp01(src.a * coverage);
    if sa <= 0.0 {
        return;
    }
    let dst = img.get_pixel(x, y).0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: f64, d: u8| -> u8 {
        let v = (s * sa + f64::from(d) * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    img.put_pixel(
        x,
        y,
        Rgba([
            mix(src.r, dst[0]),
            mix(src.g, dst[1]),
            mix(src.b, dst[2]),
            (out_a * 255.0).round() as u8,
        ]),
    );
}

/// Fills the whole image with a gradient (`fillRect(0, 0, size, size)`).
pub fn fill_gradient(img: &mut RgbaImage, gradient: &RadialGradient<'_>) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let c = gradient.color_at(f64::from(x) + 0.5, f64::from(y) + 0.5);
            blend_pixel(img, x, y, c, 1.0);
        }
    }
}

/// Visits every pixel whose bounding box touches the disc, with an
/// anti-aliased coverage estimate.
fn for_each_in_disc(img: &RgbaImage, cx: f64, cy: f64, r: f64, mut f: impl FnMut(u32, u32, f64, f64, f64)) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || r <= 0.0 {
        return;
    }
    let x0 = (cx - r - 1.0).floor().max(0.0) as u32;
    let y0 = (cy - r - 1.0).floor().max(0.0) as u32;
    let x1 = ((cx + r + 1.0).ceil().max(0.0) as u32).min(w - 1);
    let y1 = ((cy + r + 1.0).ceil().max(0.0) as u32).min(h - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            let coverage = clamp01(r - dist + 0.5);
            if coverage > 0.0 {
                f(x, y, px, py, coverage);
            }
        }
    }
}

/// `arc(cx, cy, r); fill()` with a gradient fill style.
pub fn fill_disc_gradient(img: &mut RgbaImage, cx: f64, cy: f64, r: f64, gradient: &RadialGradient<'_>) {
    let mut hits = Vec::new();
    for_each_in_disc(img, cx, cy, r, |x, y, px, py, cov| {
        hits.push((x, y, gradient.color_at(px, py), cov));
    });
    for (x, y, c, cov) in hits {
        blend_pixel(img, x, y, c, cov);
    }
}

/// `arc(cx, cy, r); fill()` with a solid color.
pub fn fill_disc(img: &mut RgbaImage, cx: f64, cy: f64, r: f64, color: Color) {
    let mut hits = Vec::new();
    for_each_in_disc(img, cx, cy, r, |x, y, _, _, cov| hits.push((x, y, cov)));
    for (x, y, cov) in hits {
        blend_pixel(img, x, y, color, cov);
    }
}

fn distance_to_segment(px: f64, py: f64, a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= f64::EPSILON {
        0.0
    } else {
        clamp01(((px - a.0) * dx + (py - a.1) * dy) / len2)
    };
    let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}

/// Strokes a polyline once: coverage is the max over segments, so joints do
/// not double-blend.
pub fn stroke_polyline(img: &mut RgbaImage, points: &[(f64, f64)], width: f64, color: Color) {
    let (w, h) = img.dimensions();
    if points.len() < 2 || w == 0 || h == 0 {
        return;
    }
    let pad = width / 2.0 + 1.0;
    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min) - pad;
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + pad;
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) - pad;
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) + pad;
    if max_x < 0.0 || max_y < 0.0 || min_x >= f64::from(w) || min_y >= f64::from(h) {
        return;
    }
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil() as u32).min(w - 1);
    let y1 = (max_y.ceil() as u32).min(h - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            let dist = points
                .windows(2)
                .map(|s| distance_to_segment(px, py, s[0], s[1]))
                .fold(f64::INFINITY, f64::min);
            let coverage = clamp01(width / 2.0 + 0.5 - dist);
            if coverage > 0.0 {
                blend_pixel(img, x, y, color, coverage);
            }
        }
    }
}

/// Adds the same signed noise to r, g and b of every pixel.
/// `noise` yields values in `[0, 1)`; `strength` scales the ±0.5 swing.
pub fn apply_grain(img: &mut RgbaImage, strength: f64, mut noise: impl FnMut() -> f64) {
    for px in img.pixels_mut() {
        let n = (noise() - 0.5) * 255.0 * strength;
        for c in px.0.iter_mut().take(3) {
            *c = (f64::from(*c) + n).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Color = Color::rgba(255.0, 255.0, 255.0, 1.0);
    const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    #[test]
    fn test_stops_interpolate_and_clamp() {
        let stops = [(0.0, BLACK), (1.0, WHITE)];
        assert_eq!(sample_stops(&stops, -1.0), BLACK);
        assert_eq!(sample_stops(&stops, 2.0), WHITE);
        let mid = sample_stops(&stops, 0.5);
        assert!((mid.r - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_centered_gradient_param_is_distance_ratio() {
        let stops = [(0.0, BLACK), (1.0, WHITE)];
        let g = RadialGradient::centered(10.0, 10.0, 10.0, &stops);
        assert!((g.param_at(10.0, 10.0)).abs() < 1e-9);
        assert!((g.param_at(15.0, 10.0) - 0.5).abs() < 1e-9);
        assert!((g.param_at(20.0, 10.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_blend_over_transparent_takes_source() {
        let mut img = RgbaImage::new(1, 1);
        blend_pixel(&mut img, 0, 0, Color::rgba(200.0, 100.0, 50.0, 0.5), 1.0);
        assert_eq!(img.get_pixel(0, 0).0, [200, 100, 50, 128]);
    }

    #[test]
    fn test_fill_disc_stays_inside_bounds() {
        let mut img = RgbaImage::new(8, 8);
        fill_disc(&mut img, -3.0, 20.0, 50.0, WHITE);
        fill_disc(&mut img, 4.0, 4.0, 1.0, WHITE);
        assert_eq!(img.get_pixel(4, 4).0[3], 255);
    }

    #[test]
    fn test_stroke_touches_line_pixels_only() {
        let mut img = RgbaImage::new(10, 10);
        stroke_polyline(&mut img, &[(0.0, 5.5), (10.0, 5.5)], 1.0, WHITE);
        assert_eq!(img.get_pixel(3, 5).0[3], 255);
        assert_eq!(img.get_pixel(3, 0).0[3], 0);
    }

    #[test]
    fn test_grain_zero_strength_is_identity() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        apply_grain(&mut img, 0.0, || 0.9);
        assert!(img.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }
}
