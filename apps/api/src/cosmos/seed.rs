//! Seeded hashing and a small deterministic PRNG.
//!
//! Everything visual in the cosmos view is derived from string seed keys so that
//! a reloaded flight log looks exactly the same without persisting any extra
//! state. Neither function here is cryptographic.

/// djb2-xor over UTF-16 code units with 32-bit wrapping arithmetic.
///
/// Code units (not chars or bytes) keep the output identical to what a browser
/// computes for the same key, so server- and client-side renderers agree.
pub fn hash_string(input: &str) -> u32 {
    let mut h: i32 = 5381;
    for unit in input.encode_utf16() {
        h = h.wrapping_mul(33) ^ i32::from(unit);
    }
    h as u32
}

/// Mulberry32: a fast 32-bit generator producing floats in `[0, 1)`.
///
/// The sequence for a given seed is reproducible bit-for-bit on every platform.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seeds the generator from a string key via [`hash_string`].
    pub fn from_key(key: &str) -> Self {
        Self::new(hash_string(key))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let a = self.state;
        let mut t = (a ^ (a >> 15)).wrapping_mul(1 | a);
        t = (t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t))) ^ t;
        t ^ (t >> 14)
    }

    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform integer in `[lo, lo + span)`, mirroring `lo + floor(rng() * span)`.
    pub fn int_in(&mut self, lo: u32, span: u32) -> u32 {
        lo + (self.next_f64() * f64::from(span)).floor() as u32
    }
}

impl Iterator for Mulberry32 {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty_string_is_seed() {
        assert_eq!(hash_string(""), 5381);
    }

    #[test]
    fn test_hash_single_char() {
        // 5381 * 33 ^ 'a'(97) = 177573 ^ 97 = 177604
        assert_eq!(hash_string("a"), 177_604);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_string("skill:1:Chiarezza"), hash_string("skill:1:Chiarezza"));
        assert_ne!(hash_string("skill:1:Chiarezza"), hash_string("skill:2:Chiarezza"));
    }

    #[test]
    fn test_hash_long_input_wraps_without_panicking() {
        let long = "ø".repeat(10_000);
        let _ = hash_string(&long);
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        // U+1F680 is a surrogate pair in UTF-16: two units, not one char.
        let mut h: i32 = 5381;
        for unit in [0xD83Du16, 0xDE80u16] {
            h = h.wrapping_mul(33) ^ i32::from(unit);
        }
        assert_eq!(hash_string("\u{1F680}"), h as u32);
    }

    #[test]
    fn test_matches_browser_golden_values() {
        let first: Vec<f64> = Mulberry32::new(42).take(3).collect();
        assert_eq!(
            first,
            vec![0.6011037519201636, 0.44829055899754167, 0.8524657934904099]
        );
        assert_eq!(hash_string("skill:1:Chiarezza"), 3801280976);
    }

    #[test]
    fn test_mulberry_is_reproducible() {
        let a: Vec<f64> = Mulberry32::new(42).take(32).collect();
        let b: Vec<f64> = Mulberry32::new(42).take(32).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mulberry_range_is_half_open_unit() {
        for v in Mulberry32::new(7).take(10_000) {
            assert!((0.0..1.0).contains(&v), "value {v} out of range");
        }
    }

    #[test]
    fn test_mulberry_different_seeds_diverge() {
        let a: Vec<f64> = Mulberry32::new(1).take(8).collect();
        let b: Vec<f64> = Mulberry32::new(2).take(8).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_int_in_bounds() {
        let mut rng = Mulberry32::from_key("grid");
        for _ in 0..1000 {
            let v = rng.int_in(8, 8);
            assert!((8..16).contains(&v));
        }
    }
}
