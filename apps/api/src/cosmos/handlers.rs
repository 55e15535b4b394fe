use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cosmos::appearance::{
    appearance_for_kind, css_background, deterministic_palette, planet_appearance, seed_key_for,
    BodyKind, CssBackground, Palette, PlanetAppearance,
};
use crate::cosmos::texture::TextureRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// Textures are content-addressed, so a URL never changes meaning.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Deserialize)]
pub struct AppearanceQuery {
    pub kind: Option<BodyKind>,
    /// Explicit seed key. Otherwise built from `kind`, `id` and `name`.
    pub key: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceResponse {
    pub seed_key: String,
    pub appearance: PlanetAppearance,
    pub palette: Palette,
    pub css: CssBackground,
}

fn query_error(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

pub fn describe(query: AppearanceQuery) -> Result<AppearanceResponse, AppError> {
    let seed_key = match (query.key, query.kind) {
        (Some(key), _) if !key.trim().is_empty() => key,
        (_, Some(kind)) => seed_key_for(
            kind,
            query.id.as_deref().unwrap_or_default(),
            query.name.as_deref().unwrap_or_default(),
        ),
        _ => return Err(AppError::BadRequest("Either key or kind is required".to_string())),
    };

    let appearance = match query.kind {
        Some(kind) => appearance_for_kind(kind, &seed_key),
        None => planet_appearance(&seed_key),
    };
    let palette = deterministic_palette(&seed_key);
    let css = css_background(
        &palette.base,
        &palette.accent,
        appearance.variant,
        appearance.hue_shift_deg,
    );

    Ok(AppearanceResponse {
        seed_key,
        appearance,
        palette,
        css,
    })
}

/// GET /api/v1/appearance
pub async fn handle_appearance(
    query: Result<Query<AppearanceQuery>, QueryRejection>,
) -> Result<Json<AppearanceResponse>, AppError> {
    let Query(query) = query.map_err(query_error)?;
    Ok(Json(describe(query)?))
}

/// GET /api/v1/texture
/// PNG bytes, or 404 when no surface can be produced (the client then uses
/// the CSS fallback from `/appearance`).
pub async fn handle_texture(
    State(state): State<AppState>,
    query: Result<Query<TextureRequest>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(request) = query.map_err(query_error)?;
    let cache = Arc::clone(&state.textures);
    let texture = tokio::task::spawn_blocking(move || cache.get_or_render(&request))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in texture render: {e}")))?
        .ok_or_else(|| AppError::NotFound("Texture could not be rendered".to_string()))?;
    debug!(key = %texture.cache_key, bytes = texture.png.len(), "texture served");

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, IMMUTABLE),
        ],
        texture.png.clone(),
    ))
}
