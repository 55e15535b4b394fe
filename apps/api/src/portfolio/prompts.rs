// Prompt templates for the two model calls of a build.
// Placeholders in `{braces}` are substituted by the builder functions below.

use crate::llm_client::prompts::{system_prompt, JSON_ONLY_SYSTEM, NON_FABRICATION_SYSTEM};
use crate::portfolio::analysis::ProfileAnalysis;
use crate::portfolio::audio::AudioTrack;
use crate::portfolio::models::{IDENTITY_NEGATIONS, MAX_LESSONS, MAX_PROJECTS, MAX_SKILLS};

pub const ANALYSIS_MAX_TOKENS: u32 = 4000;
pub const GENERATION_MAX_TOKENS: u32 = 5000;

pub const ANALYSIS_PROMPT: &str = r#"You analyze professional profiles.

Work with whatever content is provided, even if it is incomplete or badly extracted.
Make only conservative inferences. Do NOT invent companies, titles, dates, achievements,
projects, incidents, metrics, quotes or personal details. When a detail is not clearly
supported, leave it out and add a note to "limitations".

Return a JSON object with exactly this structure:
{
  "experiences": {"companies": ["..."], "projects": ["..."], "roles": ["..."]},
  "challenges": ["..."],
  "lessons": ["..."],
  "psychologicalProfile": {
    "traits": ["..."], "motivations": ["..."], "workStyle": ["..."], "strengths": ["..."]
  },
  "confidence": {"overall": 0.0, "sources": {"files": 0, "web": 0}},
  "limitations": ["..."]
}

CONTENT:
{content}"#;

pub const GENERATION_PROMPT: &str = r#"You generate an "Anti-Portfolio" with a cosmic, space-mission theme.

Put the PERSON first: values, motivations, lessons, failures. Projects and titles come after
the human narrative. Use conventional experience only as evidence of human patterns
(decision-making, collaboration, resilience, curiosity, ownership, clarity, taste).

Pick the theme from the profile:
- tech: software, engineering, data, IT
- marketing: growth, communication, brand, go-to-market
- design: product, UX, visual, service

Rules:
- Fill every field. Never output placeholders such as "N/A", "TBD" or "Skill name".
- userData.role is a sci-fi mission role in Italian (e.g. "Navigatore di Dati Orbitali"),
  never a real job title and never words like engineer, developer, analyst, manager,
  specialist, designer, marketer, consultant or their Italian equivalents.
- skills are human capabilities or operating principles ("Chiarezza", "Ascolto attivo",
  "Decisioni in incertezza"), never tools, technologies or certifications. Each
  description includes one concrete behavioural example.
- projects are missions tied to a skillId: what changed, what was learned, the human
  impact. Tags are human signals ("alignment", "feedback loops"), at most one tech tag.
- socialLinks only for recognised linkedin, github or portfolio links (0 to 3).
- identityNegations: Italian lines starting with "Non sono" or "Io non sono", each with
  1-2 phrases wrapped in [[double brackets]], e.g. "Non sono il mio [[job title]]."
- backgroundAudio: one trackId from the list below, volume between 0.2 and 0.4.

Background audio tracks:
{tracks}

Schema:
{
  "version": "1.0",
  "generatedAt": "ISO date",
  "userData": {
    "name": "Full Name",
    "role": "...",
    "theme": "tech|marketing|design",
    "manifesto": "...",
    "identityNegations": ["Non sono ..."],
    "backgroundAudio": {"trackId": "gravity_waves_downtempo", "volume": 0.3},
    "core": "...",
    "coreDescription": "...",
    "skills": [{"id": 1, "name": "...", "type": "tech|marketing|design", "planetType": "skill",
      "level": 0, "orbitRadius": 100, "speed": 30, "description": "...", "relevance": 1,
      "hoverInfo": "..."}],
    "socialLinks": [{"id": "linkedin|github|portfolio", "name": "...", "planetType": "social",
      "url": "https://...", "icon": "linkedin|github|portfolio", "orbitRadius": 350,
      "speed": 60, "relevance": 7, "hoverInfo": "...", "previewDescription": "..."}],
    "lessonsLearned": [{"id": "lesson-1", "title": "...", "year": 2024, "incidentReport": "...",
      "lessonExtracted": "...", "quote": "...", "orbitRadius": 500, "speed": 100,
      "relevance": 8, "hoverInfo": "..."}],
    "projects": [{"id": 1, "title": "...", "skillId": 1, "description": "...",
      "outcome": "...", "tags": ["..."]}],
    "failure": {"title": "...", "lesson": "...", "story": "..."}
  },
  "meta": {"sourceSummary": {"filesCount": 0, "linksCount": 0}, "confidence": 0.0,
    "limitations": ["..."]}
}

Name hint (do NOT invent names; if unknown use the hint or "Anonymous Explorer"): {name_hint}

INPUT (ProfileAnalysis JSON):
{analysis_json}

INPUT (links):
{links_json}

Hard constraints:
- skills: exactly {skills} items
- projects: exactly {projects} items
- lessonsLearned: exactly {lessons} items
- identityNegations: exactly {negations} items
- name: the real person name if present; NEVER placeholders like "Mario Rossi", "John Doe", "Alex Cosmo"
- Set meta.sourceSummary.filesCount={files_count} and meta.sourceSummary.linksCount={links_count}.
- Set generatedAt to the current ISO date."#;

/// System prompt shared by both calls.
pub fn build_system() -> String {
    system_prompt(&[JSON_ONLY_SYSTEM, NON_FABRICATION_SYSTEM])
}

pub fn analysis_prompt(content: &str) -> String {
    ANALYSIS_PROMPT.replace("{content}", content)
}

fn track_list() -> String {
    AudioTrack::ALL
        .iter()
        .map(|t| format!("- {}: {}", t.id(), t.mood()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct GenerationInput<'a> {
    pub analysis: &'a ProfileAnalysis,
    pub links: &'a [String],
    pub files_count: usize,
    pub links_count: usize,
    pub name_hint: Option<&'a str>,
}

pub fn generation_prompt(input: &GenerationInput<'_>) -> serde_json::Result<String> {
    let analysis_json = serde_json::to_string(input.analysis)?;
    let links_json = serde_json::to_string(input.links)?;
    Ok(GENERATION_PROMPT
        .replace("{tracks}", &track_list())
        .replace("{skills}", &MAX_SKILLS.to_string())
        .replace("{projects}", &MAX_PROJECTS.to_string())
        .replace("{lessons}", &MAX_LESSONS.to_string())
        .replace("{negations}", &IDENTITY_NEGATIONS.to_string())
        .replace("{files_count}", &input.files_count.to_string())
        .replace("{links_count}", &input.links_count.to_string())
        .replace("{name_hint}", input.name_hint.unwrap_or(""))
        .replace("{links_json}", &links_json)
        // analysis last: it carries user text that may contain `{braces}`
        .replace("{analysis_json}", &analysis_json))
}
