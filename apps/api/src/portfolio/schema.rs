//! Structural gate for [`AntiPortfolioData`].
//!
//! Types and enum membership are enforced by deserialization; this module
//! checks everything serde cannot express: numeric ranges, trimmed non-empty
//! text, collection caps, id uniqueness, project→skill references and the
//! business rules the sanitizer applies (real name, thematic role, usable
//! URLs). A document that passes is returned unchanged by the sanitizer.
//! Validation is all-or-nothing: every violation is collected, none is fixed.

use std::collections::HashSet;
use std::fmt::Display;
use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::Value;

use crate::cosmos::appearance::BodyKind;
use crate::portfolio::models::{
    AntiPortfolioData, LessonLearned, Project, Skill, SocialLink, IDENTITY_NEGATIONS, MAX_LESSONS,
    MAX_PROJECTS, MAX_SKILLS, MAX_SOCIAL_LINKS, SCHEMA_VERSION,
};
use crate::portfolio::names::is_valid_name;
use crate::portfolio::sanitize::{is_job_title_role, usable_url};

/// Closed ranges shared by the sanitizer and the validator.
pub mod bounds {
    use std::ops::RangeInclusive;

    use crate::portfolio::coerce::MAX_SAFE_INTEGER;

    pub const ID: RangeInclusive<i64> = 0..=MAX_SAFE_INTEGER;
    pub const COUNT: RangeInclusive<i64> = 0..=MAX_SAFE_INTEGER;
    pub const LEVEL: RangeInclusive<f64> = 0.0..=100.0;
    pub const ORBIT_RADIUS: RangeInclusive<f64> = 50.0..=800.0;
    pub const LESSON_ORBIT_RADIUS: RangeInclusive<f64> = 50.0..=1000.0;
    pub const SPEED: RangeInclusive<f64> = 5.0..=200.0;
    pub const RELEVANCE: RangeInclusive<i64> = 1..=10;
    pub const YEAR: RangeInclusive<i64> = 1900..=2100;
    pub const VOLUME: RangeInclusive<f64> = 0.0..=1.0;
    pub const CONFIDENCE: RangeInclusive<f64> = 0.0..=1.0;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: expected {}, got {}", self.path, self.expected, self.actual)
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, path: String, expected: impl Into<String>, actual: impl Display) {
        self.violations.push(Violation {
            path,
            expected: expected.into(),
            actual: actual.to_string(),
        });
    }

    fn text(&mut self, path: String, value: &str) {
        if value.trim().is_empty() || value.trim() != value {
            self.fail(path, "non-empty trimmed string", format!("{value:?}"));
        }
    }

    fn text_list(&mut self, path: &str, items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            self.text(format!("{path}[{i}]"), item);
        }
    }

    fn within<T: PartialOrd + Display>(&mut self, path: String, value: T, range: &RangeInclusive<T>) {
        if !range.contains(&value) {
            self.fail(path, format!("[{}, {}]", range.start(), range.end()), value);
        }
    }

    fn max_len(&mut self, path: String, len: usize, max: usize) {
        if len > max {
            self.fail(path, format!("at most {max} items"), format!("{len} items"));
        }
    }

    fn planet(&mut self, path: String, actual: BodyKind, expected: BodyKind) {
        if actual != expected {
            self.fail(path, format!("{:?}", expected.as_str()), format!("{:?}", actual.as_str()));
        }
    }

    fn skill(&mut self, p: &str, skill: &Skill) {
        self.within(format!("{p}.id"), skill.id, &bounds::ID);
        self.text(format!("{p}.name"), &skill.name);
        self.planet(format!("{p}.planetType"), skill.planet_type, BodyKind::Skill);
        self.within(format!("{p}.level"), skill.level, &bounds::LEVEL);
        self.within(format!("{p}.orbitRadius"), skill.orbit_radius, &bounds::ORBIT_RADIUS);
        self.within(format!("{p}.speed"), skill.speed, &bounds::SPEED);
        self.text(format!("{p}.description"), &skill.description);
        self.within(format!("{p}.relevance"), skill.relevance, &bounds::RELEVANCE);
        self.text(format!("{p}.hoverInfo"), &skill.hover_info);
    }

    fn social(&mut self, p: &str, link: &SocialLink) {
        self.text(format!("{p}.id"), &link.id);
        self.text(format!("{p}.name"), &link.name);
        self.planet(format!("{p}.planetType"), link.planet_type, BodyKind::Social);
        match usable_url(&link.url) {
            Some((normalized, _)) if normalized == link.url => {}
            _ => self.fail(format!("{p}.url"), "absolute URL with a host", format!("{:?}", link.url)),
        }
        self.within(format!("{p}.orbitRadius"), link.orbit_radius, &bounds::ORBIT_RADIUS);
        self.within(format!("{p}.speed"), link.speed, &bounds::SPEED);
        self.within(format!("{p}.relevance"), link.relevance, &bounds::RELEVANCE);
        self.text(format!("{p}.hoverInfo"), &link.hover_info);
        self.text(format!("{p}.previewDescription"), &link.preview_description);
    }

    fn lesson(&mut self, p: &str, lesson: &LessonLearned) {
        self.text(format!("{p}.id"), &lesson.id);
        self.text(format!("{p}.title"), &lesson.title);
        self.within(format!("{p}.year"), lesson.year, &bounds::YEAR);
        self.text(format!("{p}.incidentReport"), &lesson.incident_report);
        self.text(format!("{p}.lessonExtracted"), &lesson.lesson_extracted);
        self.text(format!("{p}.quote"), &lesson.quote);
        self.within(format!("{p}.orbitRadius"), lesson.orbit_radius, &bounds::LESSON_ORBIT_RADIUS);
        self.within(format!("{p}.speed"), lesson.speed, &bounds::SPEED);
        self.within(format!("{p}.relevance"), lesson.relevance, &bounds::RELEVANCE);
        self.text(format!("{p}.hoverInfo"), &lesson.hover_info);
    }

    fn project(&mut self, p: &str, project: &Project, skill_ids: &HashSet<i64>) {
        self.within(format!("{p}.id"), project.id, &bounds::ID);
        self.text(format!("{p}.title"), &project.title);
        if !skill_ids.contains(&project.skill_id) {
            self.fail(format!("{p}.skillId"), "id of an existing skill", project.skill_id);
        }
        self.text(format!("{p}.description"), &project.description);
        self.text(format!("{p}.outcome"), &project.outcome);
        self.text_list(&format!("{p}.tags"), &project.tags);
    }
}

/// Checks a typed document. `Err` carries every violation found.
pub fn validate(data: &AntiPortfolioData) -> Result<(), Vec<Violation>> {
    let mut c = Checker::default();

    if data.version != SCHEMA_VERSION {
        c.fail("version".into(), format!("{SCHEMA_VERSION:?}"), format!("{:?}", data.version));
    }
    c.text("generatedAt".into(), &data.generated_at);

    let ud = &data.user_data;
    c.text("userData.name".into(), &ud.name);
    if !ud.name.trim().is_empty() && !is_valid_name(&ud.name) {
        c.fail("userData.name".into(), "real person name", format!("{:?}", ud.name));
    }
    c.text("userData.role".into(), &ud.role);
    if is_job_title_role(&ud.role) {
        c.fail("userData.role".into(), "thematic role, not a job title", format!("{:?}", ud.role));
    }
    c.text("userData.manifesto".into(), &ud.manifesto);
    if ud.identity_negations.is_empty() {
        c.fail("userData.identityNegations".into(), "at least 1 item", "0 items");
    }
    c.max_len("userData.identityNegations".into(), ud.identity_negations.len(), IDENTITY_NEGATIONS);
    c.text_list("userData.identityNegations", &ud.identity_negations);
    c.within("userData.backgroundAudio.volume".into(), ud.background_audio.volume, &bounds::VOLUME);
    c.text("userData.core".into(), &ud.core);
    c.text("userData.coreDescription".into(), &ud.core_description);

    c.max_len("userData.skills".into(), ud.skills.len(), MAX_SKILLS);
    let mut skill_ids = HashSet::new();
    for (i, skill) in ud.skills.iter().enumerate() {
        let path = format!("userData.skills[{i}]");
        c.skill(&path, skill);
        if !skill_ids.insert(skill.id) {
            c.fail(format!("{path}.id"), "unique skill id", skill.id);
        }
    }

    c.max_len("userData.socialLinks".into(), ud.social_links.len(), MAX_SOCIAL_LINKS);
    for (i, link) in ud.social_links.iter().enumerate() {
        c.social(&format!("userData.socialLinks[{i}]"), link);
    }

    c.max_len("userData.lessonsLearned".into(), ud.lessons_learned.len(), MAX_LESSONS);
    for (i, lesson) in ud.lessons_learned.iter().enumerate() {
        c.lesson(&format!("userData.lessonsLearned[{i}]"), lesson);
    }

    c.max_len("userData.projects".into(), ud.projects.len(), MAX_PROJECTS);
    for (i, project) in ud.projects.iter().enumerate() {
        c.project(&format!("userData.projects[{i}]"), project, &skill_ids);
    }

    c.text("userData.failure.title".into(), &ud.failure.title);
    c.text("userData.failure.lesson".into(), &ud.failure.lesson);
    c.text("userData.failure.story".into(), &ud.failure.story);

    let summary = &data.meta.source_summary;
    c.within("meta.sourceSummary.filesCount".into(), summary.files_count, &bounds::COUNT);
    c.within("meta.sourceSummary.linksCount".into(), summary.links_count, &bounds::COUNT);
    c.within("meta.confidence".into(), data.meta.confidence, &bounds::CONFIDENCE);
    c.text_list("meta.limitations", &data.meta.limitations);

    if c.violations.is_empty() {
        Ok(())
    } else {
        Err(c.violations)
    }
}

/// Deserializes then validates an untyped document, e.g. a flight log the user
/// loaded from disk. A shape mismatch is reported as one violation at `$`.
pub fn validate_value(value: &Value) -> Result<AntiPortfolioData, Vec<Violation>> {
    let data: AntiPortfolioData = serde_json::from_value(value.clone()).map_err(|e| {
        vec![Violation {
            path: "$".to_string(),
            expected: "AntiPortfolioData document".to_string(),
            actual: e.to_string(),
        }]
    })?;
    validate(&data)?;
    Ok(data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::portfolio::audio::AudioTrack;
    use crate::portfolio::models::*;

    pub(crate) fn valid_document() -> AntiPortfolioData {
        let skills = (1..=7)
            .map(|id| Skill {
                id,
                name: format!("Abilità {id}"),
                skill_type: Theme::Design,
                planet_type: BodyKind::Skill,
                level: 75.0,
                orbit_radius: 120.0 + id as f64 * 60.0,
                speed: 30.0,
                description: "Ascolto prima di decidere.".into(),
                relevance: 7,
                hover_info: "Ascolto prima di decidere.".into(),
            })
            .collect();
        AntiPortfolioData {
            version: SCHEMA_VERSION.into(),
            generated_at: "2026-10-16T09:00:00Z".into(),
            user_data: UserData {
                name: "Giulia Bianchi".into(),
                role: "Navigatrice di Rotte Sconosciute".into(),
                theme: Theme::Design,
                manifesto: "Trasformo domande in traiettorie.".into(),
                identity_negations: (1..=5).map(|i| format!("Non sono il mio [[titolo {i}]].")).collect(),
                background_audio: BackgroundAudio {
                    track_id: AudioTrack::QuietGravityPiano,
                    volume: 0.3,
                },
                core: "Chiarezza".into(),
                core_description: "Il mio faro.".into(),
                skills,
                social_links: vec![SocialLink {
                    id: "linkedin".into(),
                    name: "LinkedIn".into(),
                    planet_type: BodyKind::Social,
                    url: "https://www.linkedin.com/in/giulia-bianchi".into(),
                    icon: SocialIcon::Linkedin,
                    orbit_radius: 350.0,
                    speed: 60.0,
                    relevance: 7,
                    hover_info: "Profilo professionale".into(),
                    preview_description: "Esperienze e raccomandazioni.".into(),
                }],
                lessons_learned: vec![LessonLearned {
                    id: "lesson-1".into(),
                    title: "Il lancio rinviato".into(),
                    year: 2023,
                    incident_report: "info non disponibile".into(),
                    lesson_extracted: "Chiedere prima.".into(),
                    quote: "“Ogni errore è un dato.”".into(),
                    orbit_radius: 500.0,
                    speed: 100.0,
                    relevance: 8,
                    hover_info: "Chiedere prima.".into(),
                }],
                projects: (1..=4)
                    .map(|id| Project {
                        id,
                        title: format!("Missione {id}"),
                        skill_id: id,
                        description: "Allineare il team.".into(),
                        outcome: "Meno rilavorazioni.".into(),
                        tags: vec!["alignment".into()],
                    })
                    .collect(),
                failure: Failure {
                    title: "Anomalia di Missione".into(),
                    lesson: "Correggere rotta.".into(),
                    story: "info non disponibile".into(),
                },
            },
            meta: Meta {
                source_summary: SourceSummary {
                    files_count: 1,
                    links_count: 1,
                },
                confidence: 0.7,
                limitations: vec![],
            },
        }
    }

    #[test]
    fn test_valid_document_passes() {
        assert_eq!(validate(&valid_document()), Ok(()));
    }

    #[test]
    fn test_out_of_range_values_are_reported_with_paths() {
        let mut doc = valid_document();
        doc.user_data.skills[2].level = 101.0;
        doc.user_data.lessons_learned[0].year = 1899;
        doc.meta.confidence = 1.5;
        let violations = validate(&doc).unwrap_err();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "userData.skills[2].level",
                "userData.lessonsLearned[0].year",
                "meta.confidence"
            ]
        );
        assert_eq!(violations[0].expected, "[0, 100]");
        assert_eq!(violations[0].actual, "101");
    }

    #[test]
    fn test_duplicate_skill_ids_and_dangling_project() {
        let mut doc = valid_document();
        doc.user_data.skills[1].id = 1;
        doc.user_data.projects[0].skill_id = 99;
        let violations = validate(&doc).unwrap_err();
        assert!(violations.iter().any(|v| v.path == "userData.skills[1].id"));
        assert!(violations.iter().any(|v| v.path == "userData.projects[0].skillId"));
    }

    #[test]
    fn test_caps_and_empty_text() {
        let mut doc = valid_document();
        let extra = doc.user_data.skills[0].clone();
        doc.user_data.skills.push(Skill { id: 8, ..extra });
        doc.user_data.failure.story = "  ".into();
        doc.user_data.social_links[0].url = "not a url".into();
        let violations = validate(&doc).unwrap_err();
        assert!(violations.iter().any(|v| v.path == "userData.skills" && v.actual == "8 items"));
        assert!(violations.iter().any(|v| v.path == "userData.failure.story"));
        assert!(violations.iter().any(|v| v.path == "userData.socialLinks[0].url"));
    }

    #[test]
    fn test_sanitizer_rules_are_enforced() {
        let mut doc = valid_document();
        doc.user_data.name = "Mario Rossi".into();
        doc.user_data.role = "Senior Data Analyst".into();
        doc.user_data.identity_negations.clear();
        doc.user_data.projects[1].tags.push(" ".into());
        doc.user_data.manifesto = " Trasformo domande. ".into();
        doc.user_data.social_links[0].url = "mailto:giulia@example.com".into();
        doc.meta.limitations.push(String::new());
        let violations = validate(&doc).unwrap_err();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "userData.name",
                "userData.role",
                "userData.manifesto",
                "userData.identityNegations",
                "userData.socialLinks[0].url",
                "userData.projects[1].tags[1]",
                "meta.limitations[0]"
            ]
        );
        assert_eq!(violations[0].expected, "real person name");
    }

    #[test]
    fn test_url_must_be_already_normalized() {
        let mut doc = valid_document();
        doc.user_data.social_links[0].url = "linkedin.com/in/giulia-bianchi".into();
        let violations = validate(&doc).unwrap_err();
        assert_eq!(violations[0].path, "userData.socialLinks[0].url");
        doc.user_data.social_links[0].url = "file:///etc/passwd".into();
        assert!(validate(&doc).is_err());
    }

    #[test]
    fn test_validate_value_reports_shape_mismatch() {
        let mut value = serde_json::to_value(valid_document()).unwrap();
        value["userData"]["theme"] = serde_json::json!("space");
        let violations = validate_value(&value).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$");
    }

    #[test]
    fn test_validate_value_roundtrip() {
        let value = serde_json::to_value(valid_document()).unwrap();
        assert_eq!(validate_value(&value).unwrap(), valid_document());
    }
}
