//! Appearance Resolver: maps a content-addressed seed key to a stable visual
//! "personality" (texture variant, ring, hue shift) and a curated palette.
//!
//! Nothing here is random: the same key always yields the same bundle, so
//! planets keep their look across reloads without storing anything.

use serde::{Deserialize, Serialize};

use crate::cosmos::seed::{hash_string, Mulberry32};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Entity kinds that get a planet-like body in the visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    Skill,
    Project,
    Lesson,
    Social,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Skill => "skill",
            BodyKind::Project => "project",
            BodyKind::Lesson => "lesson",
            BodyKind::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureVariant {
    Craters,
    Bands,
    Ice,
    Nebula,
    TechGrid,
    Lava,
}

impl TextureVariant {
    pub const ALL: [TextureVariant; 6] = [
        TextureVariant::Craters,
        TextureVariant::Bands,
        TextureVariant::Ice,
        TextureVariant::Nebula,
        TextureVariant::TechGrid,
        TextureVariant::Lava,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureVariant::Craters => "craters",
            TextureVariant::Bands => "bands",
            TextureVariant::Ice => "ice",
            TextureVariant::Nebula => "nebula",
            TextureVariant::TechGrid => "tech-grid",
            TextureVariant::Lava => "lava",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetAppearance {
    pub variant: TextureVariant,
    pub has_ring: bool,
    /// -20..=19
    pub ring_tilt_deg: i32,
    /// Skills: -120..=119, everything else: -15..=14
    pub hue_shift_deg: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub base: String,
    pub accent: String,
    pub glow: String,
}

/// CSS-only fallback used when no raster texture can be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssBackground {
    pub background_image: String,
    pub filter: String,
    pub background_size: String,
    pub background_blend_mode: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Curated tables
// ────────────────────────────────────────────────────────────────────────────

/// (base, accent). Glow is derived from the base at 40% opacity.
const PALETTE_TABLE: &[(&str, &str)] = &[
    ("#22d3ee", "#0891b2"),
    ("#d946ef", "#a21caf"),
    ("#facc15", "#ca8a04"),
    ("#0077b5", "#005885"),
    ("#6e5494", "#4c3a6b"),
    ("#10b981", "#059669"),
    ("#ef4444", "#dc2626"),
    ("#8b5cf6", "#6d28d9"),
    ("#f97316", "#c2410c"),
    ("#38bdf8", "#1d4ed8"),
    ("#f472b6", "#be185d"),
    ("#a3e635", "#4d7c0f"),
    ("#2dd4bf", "#0f766e"),
    ("#fb7185", "#9f1239"),
];

/// Variant weights for skills: gas giants dominate so the skill ring reads as
/// a coherent family, with the other looks as accents.
const SKILL_VARIANT_WEIGHTS: [(TextureVariant, u32); 6] = [
    (TextureVariant::Bands, 5),
    (TextureVariant::Craters, 2),
    (TextureVariant::Ice, 2),
    (TextureVariant::Nebula, 2),
    (TextureVariant::TechGrid, 1),
    (TextureVariant::Lava, 1),
];

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

/// Builds the stable identity key for an entity: `kind:id:name`.
pub fn seed_key_for(kind: BodyKind, id: &str, name: &str) -> String {
    format!("{}:{}:{}", kind.as_str(), id, name)
}

/// Kind-agnostic appearance: uniform variant pick, narrow hue spread.
pub fn planet_appearance(seed_key: &str) -> PlanetAppearance {
    let h = hash_string(seed_key);
    PlanetAppearance {
        variant: TextureVariant::ALL[(h % 6) as usize],
        has_ring: h % 7 == 0 || h % 11 == 0,
        ring_tilt_deg: (h % 40) as i32 - 20,
        hue_shift_deg: (h % 30) as i32 - 15,
    }
}

/// Appearance with per-kind weighting. Ring and tilt come straight from the
/// hash; the variant pick uses a PRNG seeded from it so it is not correlated
/// with the ring decision.
pub fn appearance_for_kind(kind: BodyKind, seed_key: &str) -> PlanetAppearance {
    let h = hash_string(&format!("{}|{}", kind.as_str(), seed_key));
    let mut rng = Mulberry32::new(h);

    let variant = match kind {
        BodyKind::Skill => weighted_variant(rng.next_f64()),
        _ => TextureVariant::ALL[(rng.next_f64() * 6.0).floor() as usize % 6],
    };

    let hue_shift_deg = match kind {
        BodyKind::Skill => (h % 240) as i32 - 120,
        _ => (h % 30) as i32 - 15,
    };

    PlanetAppearance {
        variant,
        has_ring: h % 7 == 0 || h % 11 == 0,
        ring_tilt_deg: (h % 40) as i32 - 20,
        hue_shift_deg,
    }
}

fn weighted_variant(roll: f64) -> TextureVariant {
    let total: u32 = SKILL_VARIANT_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut target = roll * f64::from(total);
    for (variant, weight) in SKILL_VARIANT_WEIGHTS {
        if target < f64::from(weight) {
            return variant;
        }
        target -= f64::from(weight);
    }
    TextureVariant::Bands
}

/// Picks a palette from the curated table. When `h % 9 == 0` base and accent
/// swap, which doubles the effective palette count while staying reproducible.
pub fn deterministic_palette(seed_key: &str) -> Palette {
    let h = hash_string(seed_key);
    let (base, accent) = PALETTE_TABLE[h as usize % PALETTE_TABLE.len()];
    let (base, accent) = if h % 9 == 0 {
        (accent, base)
    } else {
        (base, accent)
    };
    Palette {
        base: base.to_string(),
        accent: accent.to_string(),
        glow: glow_for(base),
    }
}

fn glow_for(hex: &str) -> String {
    match parse_hex_color(hex) {
        Some([r, g, b]) => format!("rgba({r}, {g}, {b}, 0.4)"),
        None => "rgba(255, 255, 255, 0.4)".to_string(),
    }
}

/// Parses `#rgb` / `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let h = hex.trim().trim_start_matches('#');
    let full: String = match h.len() {
        3 => h.chars().flat_map(|c| [c, c]).collect(),
        6 => h.to_string(),
        _ => return None,
    };
    let n = u32::from_str_radix(&full, 16).ok()?;
    Some([(n >> 16) as u8, (n >> 8) as u8, n as u8])
}

/// Layered CSS gradients approximating each texture variant.
pub fn css_background(
    base: &str,
    accent: &str,
    variant: TextureVariant,
    hue_shift_deg: i32,
) -> CssBackground {
    let albedo = format!("radial-gradient(circle at 30% 30%, {base}ff 0%, {accent}ff 55%, {base}aa 100%)");
    let overlay = match variant {
        TextureVariant::Craters => "radial-gradient(circle at 70% 35%, rgba(255,255,255,0.12) 0%, rgba(255,255,255,0.00) 38%), \
             radial-gradient(circle at 40% 75%, rgba(0,0,0,0.35) 0%, rgba(0,0,0,0.00) 45%), \
             radial-gradient(circle at 75% 75%, rgba(255,255,255,0.10) 0%, rgba(255,255,255,0.00) 40%)",
        TextureVariant::Bands => "repeating-linear-gradient(12deg, rgba(255,255,255,0.12) 0px, rgba(255,255,255,0.12) 6px, \
             rgba(0,0,0,0.0) 6px, rgba(0,0,0,0.0) 14px)",
        TextureVariant::Ice => "repeating-radial-gradient(circle at 60% 40%, rgba(255,255,255,0.18) 0px, rgba(255,255,255,0.18) 2px, \
             rgba(255,255,255,0.0) 2px, rgba(255,255,255,0.0) 7px)",
        TextureVariant::TechGrid => "linear-gradient(to right, rgba(255,255,255,0.12) 1px, transparent 1px), \
             linear-gradient(to bottom, rgba(255,255,255,0.10) 1px, transparent 1px)",
        TextureVariant::Lava => "conic-gradient(from 120deg, rgba(255,255,255,0.00), rgba(255,180,0,0.18), \
             rgba(255,255,255,0.00), rgba(255,80,0,0.18), rgba(255,255,255,0.00))",
        TextureVariant::Nebula => "radial-gradient(circle at 60% 50%, rgba(255,255,255,0.12) 0%, rgba(255,255,255,0.00) 55%), \
             conic-gradient(from 240deg, rgba(255,255,255,0.00), rgba(255,255,255,0.12), rgba(255,255,255,0.00))",
    };

    let is_grid = variant == TextureVariant::TechGrid;
    CssBackground {
        background_image: format!("{albedo}, {overlay}"),
        filter: if hue_shift_deg == 0 {
            "none".to_string()
        } else {
            format!("hue-rotate({hue_shift_deg}deg)")
        },
        background_size: if is_grid { "auto, 10px 10px, 10px 10px" } else { "auto" }.to_string(),
        background_blend_mode: if is_grid { "normal, overlay, overlay" } else { "normal" }.to_string(),
    }
}
