//! Coerces an untrusted model document into a well-formed [`AntiPortfolioData`].
//!
//! Each field goes through exactly one `coerce_*` call with a documented
//! fallback, then the business rules run on the typed result: real-name
//! enforcement, thematic role, unique skill ids and project→skill references.
//! The output always passes [`crate::portfolio::schema::validate`], and a
//! document that already passes comes back unchanged.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde_json::{Map, Value};
use url::Url;

use crate::cosmos::appearance::BodyKind;
use crate::portfolio::audio::AudioTrack;
use crate::portfolio::coerce::{
    coerce_array, coerce_enum, coerce_id, coerce_int, coerce_number, coerce_object,
    coerce_opt_string, coerce_string, coerce_string_list, truncate,
};
use crate::portfolio::models::{
    AntiPortfolioData, BackgroundAudio, Failure, LessonLearned, Meta, Project, Skill, SocialIcon,
    SocialLink, SourceSummary, Theme, UserData, IDENTITY_NEGATIONS, MAX_LESSONS, MAX_PROJECTS,
    MAX_SKILLS, MAX_SOCIAL_LINKS, SCHEMA_VERSION,
};
use crate::portfolio::names::enforce_real_name;
use crate::portfolio::schema::bounds;

const HOVER_CHARS: usize = 64;

pub const FALLBACK_ROLE: &str = "Navigatore di Rotte Sconosciute";

/// Words that make a role read like a real-world job title (EN + IT).
const ROLE_JOB_TOKENS: &[&str] = &[
    "engineer",
    "developer",
    "analyst",
    "manager",
    "specialist",
    "designer",
    "marketer",
    "consultant",
    "ingegnere",
    "sviluppatore",
    "sviluppatrice",
    "analista",
    "responsabile",
    "specialista",
    "progettista",
    "consulente",
];

const DEFAULT_NEGATIONS: [&str; IDENTITY_NEGATIONS] = [
    "Non sono il mio [[job title]].",
    "Non sono i miei [[deliverable]].",
    "Non sono gli [[strumenti]] che uso.",
    "Non sono le mie [[certificazioni]].",
    "Non sono il mio [[CV]].",
];

/// Facts the sanitizer takes from the request rather than from the model.
#[derive(Debug, Clone)]
pub struct SanitizeContext<'a> {
    pub name_hint: Option<&'a str>,
    /// Real input counts; override whatever the model reported.
    pub files_count: Option<usize>,
    pub links_count: Option<usize>,
    pub now: DateTime<Utc>,
}

impl SanitizeContext<'_> {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            name_hint: None,
            files_count: None,
            links_count: None,
            now,
        }
    }
}

type Obj = Map<String, Value>;

fn field<'v>(obj: Option<&'v Obj>, key: &str) -> Option<&'v Value> {
    obj.and_then(|o| o.get(key))
}

pub fn is_job_title_role(role: &str) -> bool {
    role.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| ROLE_JOB_TOKENS.contains(&token))
}

/// Prefixes `https://` when the link has no scheme.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Normalized link text, when it parses to a URL with a host.
pub fn usable_url(raw: &str) -> Option<(String, Url)> {
    let text = normalize_url(raw);
    let url = Url::parse(&text).ok().filter(|u| u.host_str().is_some())?;
    Some((text, url))
}

fn hover_from(text: &str) -> String {
    truncate(text, HOVER_CHARS)
}

fn count(real: Option<usize>, raw: Option<&Value>) -> i64 {
    match real {
        Some(n) => i64::try_from(n).unwrap_or(i64::MAX).min(*bounds::COUNT.end()),
        None => coerce_int(raw, bounds::COUNT, 0),
    }
}

fn sanitize_skills(raw: Option<&Value>, theme: Theme) -> Vec<Skill> {
    let mut used = HashSet::new();
    coerce_array(raw)
        .iter()
        .take(MAX_SKILLS)
        .enumerate()
        .map(|(i, entry)| {
            let obj = entry.as_object();
            let n = i as i64 + 1;
            let mut id = coerce_id(field(obj, "id"))
                .filter(|id| !used.contains(id))
                .unwrap_or(n);
            while used.contains(&id) {
                id += 1;
            }
            used.insert(id);

            let name = coerce_string(field(obj, "name"), &format!("Skill {n}"));
            let description = coerce_string(
                field(obj, "description"),
                &format!("Come uso {name} nelle mie missioni."),
            );
            Skill {
                id,
                skill_type: coerce_enum(field(obj, "type"), Theme::parse, theme),
                planet_type: BodyKind::Skill,
                level: coerce_number(field(obj, "level"), bounds::LEVEL, 70.0),
                orbit_radius: coerce_number(field(obj, "orbitRadius"), bounds::ORBIT_RADIUS, 220.0),
                speed: coerce_number(field(obj, "speed"), bounds::SPEED, 30.0),
                relevance: coerce_int(field(obj, "relevance"), bounds::RELEVANCE, 7),
                hover_info: coerce_string(field(obj, "hoverInfo"), &hover_from(&description)),
                description,
                name,
            }
        })
        .collect()
}

/// Links whose URL is still unusable after normalization are dropped.
fn sanitize_social_links(raw: Option<&Value>) -> Vec<SocialLink> {
    coerce_array(raw)
        .iter()
        .take(MAX_SOCIAL_LINKS)
        .enumerate()
        .filter_map(|(i, entry)| {
            let obj = entry.as_object();
            let (url_text, url) = usable_url(&coerce_string(field(obj, "url"), ""))?;

            let icon = field(obj, "icon")
                .and_then(Value::as_str)
                .and_then(SocialIcon::parse)
                .or_else(|| SocialIcon::from_url(&url))
                .or_else(|| SocialIcon::BY_POSITION.get(i).copied())
                .unwrap_or(SocialIcon::Portfolio);
            let name = coerce_string(field(obj, "name"), icon.display_name());
            let preview_description = coerce_string(
                field(obj, "previewDescription"),
                &format!("Apri {name} per i dettagli."),
            );

            Some(SocialLink {
                id: coerce_string(field(obj, "id"), icon.as_str()),
                planet_type: BodyKind::Social,
                url: url_text,
                icon,
                orbit_radius: coerce_number(field(obj, "orbitRadius"), bounds::ORBIT_RADIUS, 350.0),
                speed: coerce_number(field(obj, "speed"), bounds::SPEED, 60.0),
                relevance: coerce_int(field(obj, "relevance"), bounds::RELEVANCE, 7),
                hover_info: coerce_string(field(obj, "hoverInfo"), &hover_from(&preview_description)),
                preview_description,
                name,
            })
        })
        .collect()
}

fn sanitize_lessons(raw: Option<&Value>, fallback_year: i64) -> Vec<LessonLearned> {
    coerce_array(raw)
        .iter()
        .take(MAX_LESSONS)
        .enumerate()
        .map(|(i, entry)| {
            let obj = entry.as_object();
            let n = i + 1;
            let lesson_extracted = coerce_string(
                field(obj, "lessonExtracted"),
                "Lezione estratta: adattarsi, osservare, migliorare.",
            );
            LessonLearned {
                id: coerce_string(field(obj, "id"), &format!("lesson-{n}")),
                title: coerce_string(field(obj, "title"), &format!("Lezione {n}")),
                year: coerce_int(field(obj, "year"), bounds::YEAR, fallback_year),
                incident_report: coerce_string(
                    field(obj, "incidentReport"),
                    "Evento critico registrato durante la missione.",
                ),
                quote: coerce_string(field(obj, "quote"), "“Ogni errore è un dato.”"),
                orbit_radius: coerce_number(
                    field(obj, "orbitRadius"),
                    bounds::LESSON_ORBIT_RADIUS,
                    500.0,
                ),
                speed: coerce_number(field(obj, "speed"), bounds::SPEED, 100.0),
                relevance: coerce_int(field(obj, "relevance"), bounds::RELEVANCE, 8),
                hover_info: coerce_string(field(obj, "hoverInfo"), &hover_from(&lesson_extracted)),
                lesson_extracted,
            }
        })
        .collect()
}

/// A dangling `skillId` is re-pointed at `skills[i % len]`. Without skills
/// there is nothing to orbit, so no project survives.
fn sanitize_projects(raw: Option<&Value>, skills: &[Skill]) -> Vec<Project> {
    if skills.is_empty() {
        return Vec::new();
    }
    let skill_ids: HashSet<i64> = skills.iter().map(|s| s.id).collect();

    coerce_array(raw)
        .iter()
        .take(MAX_PROJECTS)
        .enumerate()
        .map(|(i, entry)| {
            let obj = entry.as_object();
            let n = i as i64 + 1;
            let skill_id = coerce_id(field(obj, "skillId"))
                .filter(|id| skill_ids.contains(id))
                .unwrap_or(skills[i % skills.len()].id);
            Project {
                id: coerce_id(field(obj, "id")).unwrap_or(n),
                title: coerce_string(field(obj, "title"), &format!("Missione {n}")),
                skill_id,
                description: coerce_string(
                    field(obj, "description"),
                    "Dettagli della missione non disponibili.",
                ),
                outcome: coerce_string(field(obj, "outcome"), "Esito non disponibile."),
                tags: coerce_string_list(field(obj, "tags"), usize::MAX),
            }
        })
        .collect()
}

fn sanitize_failure(raw: Option<&Obj>) -> Failure {
    Failure {
        title: coerce_string(field(raw, "title"), "Anomalia di Missione"),
        lesson: coerce_string(field(raw, "lesson"), "Lezione: correggere rotta e ripartire."),
        story: coerce_string(
            field(raw, "story"),
            "Un evento critico ha costretto a ricalibrare la traiettoria.",
        ),
    }
}

fn sanitize_audio(raw: Option<&Obj>) -> BackgroundAudio {
    let defaults = BackgroundAudio::default();
    BackgroundAudio {
        track_id: coerce_enum(field(raw, "trackId"), AudioTrack::from_id, defaults.track_id),
        volume: coerce_number(field(raw, "volume"), bounds::VOLUME, defaults.volume),
    }
}

fn sanitize_user_data(raw: Option<&Obj>, ctx: &SanitizeContext<'_>, fallback_year: i64) -> UserData {
    let theme = coerce_enum(field(raw, "theme"), Theme::parse, Theme::default());

    let role = coerce_string(field(raw, "role"), FALLBACK_ROLE);
    let role = if is_job_title_role(&role) {
        FALLBACK_ROLE.to_string()
    } else {
        role
    };

    let mut identity_negations = coerce_string_list(field(raw, "identityNegations"), IDENTITY_NEGATIONS);
    if identity_negations.is_empty() {
        identity_negations = DEFAULT_NEGATIONS.iter().map(|s| s.to_string()).collect();
    }

    let skills = sanitize_skills(field(raw, "skills"), theme);
    let projects = sanitize_projects(field(raw, "projects"), &skills);

    UserData {
        name: enforce_real_name(&coerce_string(field(raw, "name"), ""), ctx.name_hint),
        role,
        theme,
        manifesto: coerce_string(
            field(raw, "manifesto"),
            "Trasformo esperienze in traiettorie migliori.",
        ),
        identity_negations,
        background_audio: sanitize_audio(coerce_object(field(raw, "backgroundAudio"))),
        core: coerce_string(field(raw, "core"), "Curiosity"),
        core_description: coerce_string(
            field(raw, "coreDescription"),
            "Il mio faro quando tutto diventa complesso.",
        ),
        skills,
        social_links: sanitize_social_links(field(raw, "socialLinks")),
        lessons_learned: sanitize_lessons(field(raw, "lessonsLearned"), fallback_year),
        projects,
        failure: sanitize_failure(coerce_object(field(raw, "failure"))),
    }
}

fn sanitize_meta(raw: Option<&Obj>, ctx: &SanitizeContext<'_>) -> Meta {
    let summary = coerce_object(field(raw, "sourceSummary"));
    Meta {
        source_summary: SourceSummary {
            files_count: count(ctx.files_count, field(summary, "filesCount")),
            links_count: count(ctx.links_count, field(summary, "linksCount")),
        },
        confidence: coerce_number(field(raw, "confidence"), bounds::CONFIDENCE, 0.5),
        limitations: coerce_string_list(field(raw, "limitations"), usize::MAX),
    }
}

/// Never fails. Non-object input yields a fully defaulted document.
pub fn sanitize(raw: &Value, ctx: &SanitizeContext<'_>) -> AntiPortfolioData {
    let root = raw.as_object();

    let generated_at = coerce_opt_string(field(root, "generatedAt"))
        .unwrap_or_else(|| ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true));
    let fallback_year = DateTime::parse_from_rfc3339(&generated_at)
        .map(|t| i64::from(t.year()))
        .unwrap_or_else(|_| i64::from(ctx.now.year()))
        .clamp(*bounds::YEAR.start(), *bounds::YEAR.end());

    AntiPortfolioData {
        version: SCHEMA_VERSION.to_string(),
        user_data: sanitize_user_data(coerce_object(field(root, "userData")), ctx, fallback_year),
        meta: sanitize_meta(coerce_object(field(root, "meta")), ctx),
        generated_at,
    }
}
