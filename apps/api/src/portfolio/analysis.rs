use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::portfolio::coerce::{coerce_number, coerce_object, coerce_string_list};

/// Cap on the per-source counts reported to the generation step.
pub const MAX_SOURCE_COUNT: i64 = 10;

/// Generous per-list cap. The analysis is an intermediate, not shown to users.
const LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiences {
    pub companies: Vec<String>,
    pub projects: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychologicalProfile {
    pub traits: Vec<String>,
    pub motivations: Vec<String>,
    pub work_style: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub files: i64,
    pub web: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfidence {
    pub overall: f64,
    pub sources: SourceCounts,
}

impl Default for AnalysisConfidence {
    fn default() -> Self {
        Self {
            overall: 0.5,
            sources: SourceCounts::default(),
        }
    }
}

/// Output of the first model call: what the sources say about the person.
/// Fed verbatim (as JSON) into the generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAnalysis {
    pub experiences: Experiences,
    pub challenges: Vec<String>,
    pub lessons: Vec<String>,
    pub psychological_profile: PsychologicalProfile,
    pub confidence: AnalysisConfidence,
    pub limitations: Vec<String>,
}

impl ProfileAnalysis {
    /// Every field is optional on input; wrong shapes become empty lists.
    pub fn from_untrusted(raw: &Value) -> Self {
        let list = |obj: Option<&serde_json::Map<String, Value>>, key: &str| {
            coerce_string_list(obj.and_then(|o| o.get(key)), LIST_LIMIT)
        };
        let root = raw.as_object();
        let experiences = coerce_object(root.and_then(|r| r.get("experiences")));
        let profile = coerce_object(root.and_then(|r| r.get("psychologicalProfile")));
        let confidence = coerce_object(root.and_then(|r| r.get("confidence")));

        Self {
            experiences: Experiences {
                companies: list(experiences, "companies"),
                projects: list(experiences, "projects"),
                roles: list(experiences, "roles"),
            },
            challenges: list(root, "challenges"),
            lessons: list(root, "lessons"),
            psychological_profile: PsychologicalProfile {
                traits: list(profile, "traits"),
                motivations: list(profile, "motivations"),
                work_style: list(profile, "workStyle"),
                strengths: list(profile, "strengths"),
            },
            confidence: AnalysisConfidence {
                overall: coerce_number(confidence.and_then(|c| c.get("overall")), 0.0..=1.0, 0.5),
                sources: SourceCounts::default(),
            },
            limitations: list(root, "limitations"),
        }
    }

    /// Replaces whatever the model claimed with the real input counts.
    pub fn with_source_counts(mut self, files: usize, links: usize) -> Self {
        let cap = |n: usize| i64::try_from(n).unwrap_or(i64::MAX).clamp(0, MAX_SOURCE_COUNT);
        self.confidence.sources = SourceCounts {
            files: cap(files),
            web: cap(links),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_untrusted_tolerates_missing_and_wrong_shapes() {
        let raw = json!({
            "experiences": {"companies": ["Acme"], "roles": "analyst"},
            "challenges": ["deadline", 42, ""],
            "psychologicalProfile": {"workStyle": ["asincrono"]},
            "confidence": {"overall": "0.8", "sources": {"files": 99}}
        });
        let analysis = ProfileAnalysis::from_untrusted(&raw);
        assert_eq!(analysis.experiences.companies, vec!["Acme"]);
        assert!(analysis.experiences.roles.is_empty());
        assert_eq!(analysis.challenges, vec!["deadline"]);
        assert_eq!(analysis.psychological_profile.work_style, vec!["asincrono"]);
        assert_eq!(analysis.confidence.overall, 0.8);
        assert_eq!(analysis.confidence.sources, SourceCounts::default());
        assert!(analysis.limitations.is_empty());
    }

    #[test]
    fn test_non_object_gives_defaults() {
        assert_eq!(ProfileAnalysis::from_untrusted(&json!([1, 2])), ProfileAnalysis::default());
    }

    #[test]
    fn test_source_counts_are_capped() {
        let analysis = ProfileAnalysis::default().with_source_counts(3, 25);
        assert_eq!(analysis.confidence.sources.files, 3);
        assert_eq!(analysis.confidence.sources.web, MAX_SOURCE_COUNT);
    }

    #[test]
    fn test_serializes_camel_case() {
        let v = serde_json::to_value(ProfileAnalysis::default()).unwrap();
        assert!(v.get("psychologicalProfile").unwrap().get("workStyle").is_some());
    }
}
