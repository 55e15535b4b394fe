// Deterministic visuals for the solar-system view: seeded hashing, appearance
// resolution and procedural textures. Everything is a pure function of the
// seed key except the texture cache.

pub mod appearance;
pub mod handlers;
pub mod raster;
pub mod seed;
pub mod texture;
