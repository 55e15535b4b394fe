//! Person-name rules: detecting placeholder or job-title "names" produced by
//! the model, and guessing the real name from the extracted CV text.

use std::sync::OnceLock;

use regex::Regex;

pub const ANONYMOUS_NAME: &str = "Anonymous Explorer";

const PLACEHOLDER_NAMES: &[&str] = &[
    "alex cosmo",
    "marco rossi",
    "mario rossi",
    "john doe",
    "jane doe",
    "full name",
    "nome cognome",
];

/// Decoy token the model likes to invent (e.g. "Alex Cosmo", "Cosmonauta").
const PLACEHOLDER_TOKEN: &str = "cosmo";

const NAME_JOB_TOKENS: &[&str] = &[
    "consultant",
    "engineer",
    "developer",
    "designer",
    "manager",
    "analyst",
    "specialist",
    "director",
    "officer",
    "architect",
    "customer",
    "transformation",
    "marketing",
    "sales",
    "growth",
    "product",
    "data",
];

/// Job tokens used while scanning CV headers. Includes a common misspelling.
const HEADER_JOB_TOKENS: &[&str] = &[
    "consultant",
    "engineer",
    "developer",
    "designer",
    "manager",
    "analyst",
    "specialist",
    "director",
    "officer",
    "architect",
    "product",
    "data",
    "marketing",
    "customer",
    "transformation",
    "trasformation",
];

const SECTION_TOKENS: &[&str] = &[
    "profilo",
    "personale",
    "istruzione",
    "lingue",
    "contatti",
    "competenze",
    "esperienze",
    "lavorative",
    "curriculum",
    "vitae",
    "resume",
    "cv",
];

pub fn is_placeholder_name(name: &str) -> bool {
    let n = name.trim().to_lowercase();
    n.is_empty() || PLACEHOLDER_NAMES.contains(&n.as_str()) || n.contains(PLACEHOLDER_TOKEN)
}

/// True when any whitespace token is a strong job keyword.
pub fn looks_like_job_title_as_name(name: &str) -> bool {
    let n = name.trim().to_lowercase();
    n.is_empty() || n.split_whitespace().any(|t| NAME_JOB_TOKENS.contains(&t))
}

pub fn is_valid_name(name: &str) -> bool {
    !is_placeholder_name(name) && !looks_like_job_title_as_name(name)
}

/// Keeps `current` when valid, otherwise the hint when valid, otherwise
/// [`ANONYMOUS_NAME`].
pub fn enforce_real_name(current: &str, hint: Option<&str>) -> String {
    let current = current.trim();
    if is_valid_name(current) {
        return current.to_string();
    }
    match hint.map(str::trim) {
        Some(hint) if is_valid_name(hint) => hint.to_string(),
        _ => ANONYMOUS_NAME.to_string(),
    }
}

/// CV heuristics first (on `cv_text`), LinkedIn slug second.
pub fn name_hint(cv_text: &str, links: &[String]) -> Option<String> {
    guess_name_from_cv_text(cv_text).or_else(|| guess_name_from_linkedin(links))
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn labeled_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)(?:^|\n)[ \t]*nome[ \t]*[:\-][ \t]*([^\n]{3,80})")
}

fn caps_run_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"[A-ZÀ-ÖØ-Ý]{2,}(?:\s+[A-ZÀ-ÖØ-Ý]{2,}){1,2}")
}

fn contact_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)curriculum|resume|cv|email|telefono|phone|linkedin|github")
}

fn title_case_word_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[A-ZÀ-ÖØ-Ý][a-zà-öø-ÿ'’\-]+$")
}

fn all_caps_word_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[A-ZÀ-ÖØ-Ý'’\-]+$")
}

fn linkedin_slug_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?i)linkedin\.com/in/([^/?#]+)")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn titleize(s: &str) -> String {
    s.replace('#', " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn any_token_in(words: &[String], tokens: &[&str]) -> bool {
    words.iter().any(|w| tokens.contains(&w.as_str()))
}

/// Heuristics, first match wins:
/// 1. a `Nome:` labelled line with at least two words,
/// 2. an ALL-CAPS run of 2-3 words in the first 800 chars that is neither a
///    job title nor a CV section header,
/// 3. a Title Case or ALL-CAPS header line of 2-4 words among the first 12
///    lines, skipping contact lines.
pub fn guess_name_from_cv_text(text: &str) -> Option<String> {
    let cleaned = text.replace('\r', "\n");

    if let Some(caps) = labeled_re().and_then(|re| re.captures(&cleaned)) {
        let candidate = caps[1].trim();
        if candidate.split_whitespace().count() >= 2 {
            return Some(candidate.to_string());
        }
    }

    let head: String = cleaned.chars().take(800).collect();
    let head = head.replace('#', " ").split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(re) = caps_run_re() {
        for m in re.find_iter(&head) {
            let words: Vec<String> = m.as_str().split_whitespace().map(str::to_lowercase).collect();
            if !(2..=3).contains(&words.len())
                || any_token_in(&words, HEADER_JOB_TOKENS)
                || any_token_in(&words, SECTION_TOKENS)
            {
                continue;
            }
            return Some(titleize(m.as_str()));
        }
    }

    let (Some(contact), Some(title_word), Some(caps_word)) =
        (contact_line_re(), title_case_word_re(), all_caps_word_re())
    else {
        return None;
    };

    cleaned
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(12)
        .filter(|l| !contact.is_match(l))
        .find_map(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            if !(2..=4).contains(&words.len()) {
                return None;
            }
            if words.iter().all(|w| title_word.is_match(w)) {
                return Some(line.to_string());
            }
            if words.iter().all(|w| caps_word.is_match(w)) && words.len() <= 3 {
                let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
                if !any_token_in(&lower, HEADER_JOB_TOKENS) {
                    return Some(titleize(line));
                }
            }
            None
        })
}

/// `linkedin.com/in/giulia-bianchi` -> `Giulia Bianchi`. Slugs with fewer
/// than two parts are skipped.
pub fn guess_name_from_linkedin(links: &[String]) -> Option<String> {
    let re = linkedin_slug_re()?;
    links.iter().find_map(|link| {
        let raw_slug = re.captures(link)?.get(1)?.as_str();
        // form_urlencoded is the percent-decoder url ships with
        let decoded: String = url::form_urlencoded::parse(raw_slug.as_bytes())
            .map(|(k, _)| k.into_owned())
            .collect();
        let slug: String = decoded
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .map(|c| if c == '_' { '-' } else { c })
            .collect();
        let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
        if parts.len() < 2 {
            return None;
        }
        let name = parts.iter().take(4).map(|p| capitalize(p)).collect::<Vec<_>>().join(" ");
        (name.len() >= 5).then_some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_names() {
        assert!(is_placeholder_name("Mario Rossi"));
        assert!(is_placeholder_name("  JOHN DOE "));
        assert!(is_placeholder_name("Alex Cosmo"));
        assert!(is_placeholder_name("Cosmonauta Ignoto"));
        assert!(is_placeholder_name(""));
        assert!(!is_placeholder_name("Giulia Bianchi"));
    }

    #[test]
    fn test_job_title_as_name() {
        assert!(looks_like_job_title_as_name("Customer Transformation Consultant"));
        assert!(looks_like_job_title_as_name("Senior Data Analyst"));
        assert!(!looks_like_job_title_as_name("Giulia Bianchi"));
    }

    #[test]
    fn test_enforce_real_name() {
        assert_eq!(enforce_real_name("Mario Rossi", Some("Giulia Bianchi")), "Giulia Bianchi");
        assert_eq!(enforce_real_name("Luca Verdi", Some("Giulia Bianchi")), "Luca Verdi");
        assert_eq!(enforce_real_name("Mario Rossi", Some("John Doe")), ANONYMOUS_NAME);
        assert_eq!(enforce_real_name("", None), ANONYMOUS_NAME);
        assert_eq!(enforce_real_name("Product Manager", Some("Sales Lead")), ANONYMOUS_NAME);
    }

    #[test]
    fn test_labeled_name() {
        let cv = "Curriculum\nNome: Giulia Bianchi\nEmail: g@example.com";
        assert_eq!(guess_name_from_cv_text(cv).as_deref(), Some("Giulia Bianchi"));
    }

    #[test]
    fn test_labeled_single_word_is_ignored() {
        let cv = "nome: Giulia\nsomething else entirely here";
        assert_eq!(guess_name_from_cv_text(cv), None);
    }

    #[test]
    fn test_all_caps_run_skips_sections_and_jobs() {
        let cv = "PROFILO PERSONALE e DATA ANALYST presso Acme; GIULIA BIANCHI, Milano";
        assert_eq!(guess_name_from_cv_text(cv).as_deref(), Some("Giulia Bianchi"));
    }

    #[test]
    fn test_title_case_header_line() {
        let cv = "Michele Miranda\nmichele@example.com\nEsperienza di dieci anni nel settore";
        assert_eq!(guess_name_from_cv_text(cv).as_deref(), Some("Michele Miranda"));
    }

    #[test]
    fn test_no_name_found() {
        assert_eq!(guess_name_from_cv_text("lorem ipsum dolor sit amet"), None);
    }

    #[test]
    fn test_linkedin_slug_title_cases_parts() {
        let links = vec![
            "https://github.com/gb".to_string(),
            "https://www.linkedin.com/in/giulia-bianchi/".to_string(),
        ];
        assert_eq!(guess_name_from_linkedin(&links).as_deref(), Some("Giulia Bianchi"));
    }

    #[test]
    fn test_linkedin_slug_underscores_and_case() {
        let links = vec!["linkedin.com/in/GIULIA_bianchi?trk=x".to_string()];
        assert_eq!(guess_name_from_linkedin(&links).as_deref(), Some("Giulia Bianchi"));
    }

    #[test]
    fn test_linkedin_single_part_slug_skipped() {
        let links = vec!["https://linkedin.com/in/gbianchi".to_string()];
        assert_eq!(guess_name_from_linkedin(&links), None);
    }

    #[test]
    fn test_name_hint_prefers_cv() {
        let links = vec!["https://linkedin.com/in/luca-verdi".to_string()];
        assert_eq!(
            name_hint("Nome: Giulia Bianchi", &links).as_deref(),
            Some("Giulia Bianchi")
        );
        assert_eq!(name_hint("", &links).as_deref(), Some("Luca Verdi"));
    }
}
