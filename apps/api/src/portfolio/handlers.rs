use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderName},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::portfolio::audio::{catalog, TrackInfo};
use crate::portfolio::builder::{build_anti_portfolio, BuildDeps, BuildInput, UploadedFile};
use crate::portfolio::flight_log::{
    decode_flight_log, encode_flight_log, FLIGHT_LOG_FILE_NAME, FLIGHT_LOG_SLOT,
};
use crate::portfolio::models::AntiPortfolioData;
use crate::portfolio::schema::{validate, validate_value};
use crate::state::AppState;

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
}

/// `links` arrives as a JSON array string. Anything else counts as no links.
fn parse_links(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => {
            if !raw.trim().is_empty() {
                warn!("ignoring links field that is not a JSON array");
            }
            Vec::new()
        }
    }
}

async fn read_build_input(mut multipart: Multipart) -> Result<BuildInput, AppError> {
    let mut input = BuildInput::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "files" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                input.files.push(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            "links" => {
                let raw = field.text().await.map_err(multipart_error)?;
                input.links = parse_links(&raw);
            }
            "briefing" => {
                input.briefing = field.text().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }
    Ok(input)
}

/// POST /api/v1/build
pub async fn handle_build(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AntiPortfolioData>, AppError> {
    let input = read_build_input(multipart).await?;
    let deps = BuildDeps {
        llm: state.llm.as_ref(),
        extractor: state.extractor.as_ref(),
        retry: state.config.retry_policy(),
        upload_max_size: state.config.upload_max_size,
    };
    let data = build_anti_portfolio(input, &deps).await?;
    Ok(Json(data))
}

/// GET /api/v1/audio-tracks
pub async fn handle_audio_tracks() -> Json<Vec<TrackInfo>> {
    Json(catalog())
}

/// POST /api/v1/flight-log
/// Validates a user-loaded flight log and echoes it back as a download. The
/// `x-flight-log-slot` header names the local-storage slot to keep it in.
pub async fn handle_flight_log(body: String) -> Result<impl IntoResponse, AppError> {
    let data = match decode_flight_log(&body) {
        Some(data) => {
            validate(&data).map_err(AppError::InvalidFlightLog)?;
            data
        }
        None => {
            let value: Value = serde_json::from_str(&body)
                .map_err(|e| AppError::BadRequest(format!("Flight log is not valid JSON: {e}")))?;
            validate_value(&value).map_err(AppError::InvalidFlightLog)?
        }
    };

    let pretty = encode_flight_log(&data).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{FLIGHT_LOG_FILE_NAME}\""),
            ),
            (HeaderName::from_static("x-flight-log-slot"), FLIGHT_LOG_SLOT.to_string()),
        ],
        pretty,
    ))
}
