//! Anti-portfolio build pipeline.
//!
//! Flow: filter inputs → extract text (PDFs, then links) → name hint →
//!       analysis call → generation call → repair → sanitize → validate.
//!
//! Strictly sequential: generation depends on analysis, and each external
//! step runs under its own retry budget.

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::ContentExtractor;
use crate::llm_client::{CompletionRequest, TextCompletion};
use crate::portfolio::analysis::ProfileAnalysis;
use crate::portfolio::models::{AntiPortfolioData, MAX_SOCIAL_LINKS};
use crate::portfolio::names::name_hint;
use crate::portfolio::prompts::{
    analysis_prompt, build_system, generation_prompt, GenerationInput, ANALYSIS_MAX_TOKENS,
    GENERATION_MAX_TOKENS,
};
use crate::portfolio::repair::parse_model_json;
use crate::portfolio::sanitize::{normalize_url, sanitize, SanitizeContext};
use crate::portfolio::schema::validate;
use crate::retry::{with_retry, with_retry_when, RetryPolicy};

pub const MAX_BRIEFING_CHARS: usize = 2500;

/// Web pages get at most one retry regardless of the configured budget.
const WEB_MAX_RETRIES: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| ct.contains("pdf"))
            || self.name.to_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    pub files: Vec<UploadedFile>,
    /// Raw link strings as submitted; normalized here.
    pub links: Vec<String>,
    pub briefing: String,
}

/// External collaborators and limits for one build.
pub struct BuildDeps<'a> {
    pub llm: &'a dyn TextCompletion,
    pub extractor: &'a dyn ContentExtractor,
    pub retry: RetryPolicy,
    pub upload_max_size: usize,
}

/// Inputs that survived filtering.
struct AcceptedInput {
    files: Vec<UploadedFile>,
    links: Vec<String>,
    briefing: String,
}

fn accept(input: BuildInput, upload_max_size: usize) -> AcceptedInput {
    let files = input
        .files
        .into_iter()
        .filter(|f| {
            let keep = f.bytes.len() <= upload_max_size && f.is_pdf();
            if !keep {
                warn!(file = %f.name, size = f.bytes.len(), "dropping oversize or non-PDF upload");
            }
            keep
        })
        .collect();

    let links = input
        .links
        .iter()
        .map(|l| normalize_url(l))
        .filter(|l| !l.is_empty())
        .take(MAX_SOCIAL_LINKS)
        .collect();

    AcceptedInput {
        files,
        links,
        briefing: input.briefing.trim().chars().take(MAX_BRIEFING_CHARS).collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the whole pipeline. The result has already passed schema validation.
pub async fn build_anti_portfolio(input: BuildInput, deps: &BuildDeps<'_>) -> Result<AntiPortfolioData, AppError> {
    if input.files.is_empty() && input.links.iter().all(|l| l.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "At least one file or one link is required".to_string(),
        ));
    }

    let accepted = accept(input, deps.upload_max_size);

    let mut file_blocks = Vec::new();
    for file in &accepted.files {
        let operation = format!("pdf:{}", file.name);
        // A timed-out parse still owns its blocking thread, so it is not retried.
        let retryable = |e: &AppError| e.is_retryable() && !matches!(e, AppError::Timeout { .. });
        let text = with_retry_when(&deps.retry, &operation, retryable, || {
            deps.extractor.pdf_text(&operation, file.bytes.clone())
        })
        .await?;
        if !text.is_empty() {
            file_blocks.push(format!("=== File: {} ===\n{}", file.name, text));
        }
    }

    let web_policy = deps.retry.capped(WEB_MAX_RETRIES);
    let mut web_blocks = Vec::new();
    for url in &accepted.links {
        let operation = format!("web:{url}");
        let text = with_retry(&web_policy, &operation, || deps.extractor.web_text(&operation, url)).await?;
        if !text.is_empty() {
            web_blocks.push(format!("=== Web: {url} ===\n{text}"));
        }
    }

    let briefing_block = (!accepted.briefing.is_empty())
        .then(|| format!("=== User Narrative (Briefing di missione) ===\n{}", accepted.briefing));
    let combined = briefing_block
        .into_iter()
        .chain(file_blocks.iter().cloned())
        .chain(web_blocks.iter().cloned())
        .collect::<Vec<_>>()
        .join("\n\n");
    if combined.trim().is_empty() {
        return Err(AppError::BadRequest(
            "No content could be extracted from the provided files and links".to_string(),
        ));
    }

    let cv_text = if file_blocks.is_empty() {
        combined.clone()
    } else {
        file_blocks.join("\n\n")
    };
    let hint = name_hint(&cv_text, &accepted.links);
    let files_count = accepted.files.len();
    let links_count = accepted.links.len();
    info!(
        files = files_count,
        links = links_count,
        chars = combined.chars().count(),
        name_hint = hint.as_deref().unwrap_or(""),
        "content extracted"
    );

    let system = build_system();

    let prompt = analysis_prompt(&combined);
    let analysis = with_retry(&deps.retry, "ai:analyze", || async {
        let raw = deps
            .llm
            .complete(CompletionRequest {
                system: &system,
                prompt: &prompt,
                max_tokens: ANALYSIS_MAX_TOKENS,
            })
            .await?;
        let value = parse_model_json(&raw)?;
        Ok::<_, AppError>(ProfileAnalysis::from_untrusted(&value))
    })
    .await?
    .with_source_counts(files_count, links_count);
    info!(confidence = analysis.confidence.overall, "profile analyzed");

    let prompt = generation_prompt(&GenerationInput {
        analysis: &analysis,
        links: &accepted.links,
        files_count,
        links_count,
        name_hint: hint.as_deref(),
    })
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode generation input: {e}")))?;
    let raw = with_retry(&deps.retry, "ai:generate", || async {
        let text = deps
            .llm
            .complete(CompletionRequest {
                system: &system,
                prompt: &prompt,
                max_tokens: GENERATION_MAX_TOKENS,
            })
            .await?;
        Ok::<_, AppError>(parse_model_json(&text)?)
    })
    .await?;

    let ctx = SanitizeContext {
        name_hint: hint.as_deref(),
        files_count: Some(files_count),
        links_count: Some(links_count),
        now: Utc::now(),
    };
    let data = sanitize(&raw, &ctx);
    validate(&data).map_err(AppError::SchemaValidation)?;

    info!(
        name = %data.user_data.name,
        theme = data.user_data.theme.as_str(),
        skills = data.user_data.skills.len(),
        "anti-portfolio built"
    );
    Ok(data)
}
