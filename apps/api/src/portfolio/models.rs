use serde::{Deserialize, Serialize};
use url::Url;

use crate::cosmos::appearance::BodyKind;
use crate::portfolio::audio::AudioTrack;

pub const SCHEMA_VERSION: &str = "1.0";

pub const MAX_SKILLS: usize = 7;
pub const MAX_PROJECTS: usize = 4;
pub const MAX_LESSONS: usize = 2;
pub const MAX_SOCIAL_LINKS: usize = 3;
pub const IDENTITY_NEGATIONS: usize = 5;

/// Professional theme of the whole flight log. Drives the color scheme client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Tech,
    Marketing,
    Design,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Tech, Theme::Marketing, Theme::Design];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Tech => "tech",
            Theme::Marketing => "marketing",
            Theme::Design => "design",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Theme> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialIcon {
    Linkedin,
    Github,
    Portfolio,
}

impl SocialIcon {
    /// Positional fallback order when neither the icon nor the URL is conclusive.
    pub const BY_POSITION: [SocialIcon; 3] =
        [SocialIcon::Linkedin, SocialIcon::Github, SocialIcon::Portfolio];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialIcon::Linkedin => "linkedin",
            SocialIcon::Github => "github",
            SocialIcon::Portfolio => "portfolio",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SocialIcon::Linkedin => "LinkedIn",
            SocialIcon::Github => "GitHub",
            SocialIcon::Portfolio => "Portfolio",
        }
    }

    pub fn parse(raw: &str) -> Option<SocialIcon> {
        let raw = raw.trim();
        Self::BY_POSITION
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(raw))
    }

    /// Recognizes LinkedIn and GitHub hosts. Anything else is not conclusive.
    pub fn from_url(url: &Url) -> Option<SocialIcon> {
        let host = url.host_str()?.to_ascii_lowercase();
        if host == "linkedin.com" || host.ends_with(".linkedin.com") {
            Some(SocialIcon::Linkedin)
        } else if host == "github.com" || host.ends_with(".github.com") {
            Some(SocialIcon::Github)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: Theme,
    pub planet_type: BodyKind,
    pub level: f64,
    pub orbit_radius: f64,
    pub speed: f64,
    pub description: String,
    pub relevance: i64,
    pub hover_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub id: String,
    pub name: String,
    pub planet_type: BodyKind,
    pub url: String,
    pub icon: SocialIcon,
    pub orbit_radius: f64,
    pub speed: f64,
    pub relevance: i64,
    pub hover_info: String,
    pub preview_description: String,
}

/// A "mission". Always orbits the skill referenced by `skill_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub skill_id: i64,
    pub description: String,
    pub outcome: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonLearned {
    pub id: String,
    pub title: String,
    pub year: i64,
    pub incident_report: String,
    pub lesson_extracted: String,
    pub quote: String,
    pub orbit_radius: f64,
    pub speed: f64,
    pub relevance: i64,
    pub hover_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub title: String,
    pub lesson: String,
    pub story: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundAudio {
    pub track_id: AudioTrack,
    pub volume: f64,
}

impl Default for BackgroundAudio {
    fn default() -> Self {
        Self {
            track_id: AudioTrack::default(),
            volume: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub name: String,
    pub role: String,
    pub theme: Theme,
    pub manifesto: String,
    #[serde(default)]
    pub identity_negations: Vec<String>,
    #[serde(default)]
    pub background_audio: BackgroundAudio,
    pub core: String,
    pub core_description: String,
    pub skills: Vec<Skill>,
    pub social_links: Vec<SocialLink>,
    pub lessons_learned: Vec<LessonLearned>,
    pub projects: Vec<Project>,
    pub failure: Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub files_count: i64,
    pub links_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub source_summary: SourceSummary,
    pub confidence: f64,
    pub limitations: Vec<String>,
}

/// The root artifact, a.k.a. the flight log once stored client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiPortfolioData {
    pub version: String,
    pub generated_at: String,
    pub user_data: UserData,
    pub meta: Meta,
}
