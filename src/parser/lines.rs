use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::rating::clean_title;

// URLs may hold one level of balanced parentheses, e.g. `Foo_(bar)`
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^###\s+\[([^\]]+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)(.*)$").unwrap()
});
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s+`([^`]+)`\s*(?:\[([^\]]*)\]\(((?:[^()\s]|\([^()\s]*\))+)\))?\s*(.*)$")
        .unwrap()
});
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap());

const SHORTCODE_OPENERS: &[&str] = &["{{<", "{{%"];
const IMAGE_MARKER: &str = "![";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    Heading,
    Bullet,
}

/// A line that opens an entry. `raw_title` still carries any sentinel glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub form: Form,
    pub raw_title: String,
    pub link: Option<String>,
    pub link_text: Option<String>,
    /// Trailing free text on a bullet line; always `None` for headings.
    pub lead: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Empty,
    Opener(Opener),
    /// Shortcodes, images and horizontal rules: never part of a description.
    Excluded,
    Text(String),
}

/// Classify one line. Heading form is tried before bullet form.
pub fn classify_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Empty;
    }

    if let Some(caps) = HEADING_RE.captures(line) {
        if let Some(opener) = opener(Form::Heading, &caps[1], Some(&caps[2]), None, None) {
            return Line::Opener(opener);
        }
    } else if let Some(caps) = BULLET_RE.captures(line) {
        let lead = caps.get(4).map(|m| m.as_str().trim()).filter(|t| !t.is_empty());
        if let Some(opener) = opener(
            Form::Bullet,
            &caps[1],
            caps.get(3).map(|m| m.as_str()),
            caps.get(2).map(|m| m.as_str()),
            lead,
        ) {
            return Line::Opener(opener);
        }
    } else if line.starts_with("### [") || line.starts_with("- `") {
        debug!(line, "entry-like line did not match, keeping as text");
    }

    if is_excluded(line) {
        return Line::Excluded;
    }

    Line::Text(line.to_string())
}

fn opener(
    form: Form,
    raw_title: &str,
    link: Option<&str>,
    link_text: Option<&str>,
    lead: Option<&str>,
) -> Option<Opener> {
    // A title made only of glyphs would clean to nothing
    if clean_title(raw_title).is_empty() {
        debug!(raw_title, "entry title is empty after cleaning, keeping as text");
        return None;
    }
    Some(Opener {
        form,
        raw_title: raw_title.to_string(),
        link: link.map(str::to_string),
        link_text: link_text.map(str::to_string),
        lead: lead.map(str::to_string),
    })
}

fn is_excluded(line: &str) -> bool {
    SHORTCODE_OPENERS.iter().any(|s| line.starts_with(s))
        || line.starts_with(IMAGE_MARKER)
        || RULE_RE.is_match(line)
}
