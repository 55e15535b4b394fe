//! Readable-text extraction from fetched HTML.
//!
//! Chrome (scripts, styles, navigation, headers, footers, asides) is removed,
//! then the first `<main>`, `<article>` or `<body>` is kept, in that order of
//! preference. Tags are stripped and whitespace collapsed.

use std::sync::OnceLock;

use regex::Regex;

const CHROME_TAGS: [&str; 7] = ["script", "style", "noscript", "nav", "footer", "header", "aside"];
const CONTENT_TAGS: [&str; 3] = ["main", "article", "body"];

fn block_re(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok()
}

fn inner_re(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>")).ok()
}

fn chrome_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| CHROME_TAGS.iter().copied().filter_map(block_re).collect())
}

fn content_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| CONTENT_TAGS.iter().copied().filter_map(inner_re).collect())
}

fn tag_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->|<[^>]+>").ok()).as_ref()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // last, so "&amp;lt;" stays "&lt;"
        .replace("&amp;", "&")
}

pub fn html_to_text(html: &str) -> String {
    let mut doc = html.to_string();
    for re in chrome_res() {
        doc = re.replace_all(&doc, " ").into_owned();
    }

    let region = content_res()
        .iter()
        .find_map(|re| re.captures(&doc).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
        .unwrap_or(doc);

    let stripped = match tag_re() {
        Some(re) => re.replace_all(&region, " ").into_owned(),
        None => region,
    };

    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
