use tracing::debug;

use crate::entry::Item;

use super::lines::{classify_line, Line, Opener};
use super::rating::{clean_title, extract_rating};

/// Heading that opens the section we collect entries from.
pub const SECTION_MARKER: &str = "## 物";
const SECOND_LEVEL: &str = "## ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Derive a 1..=5 rating from sentinel glyphs. When off, `rating` stays `None`.
    pub extract_rating: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extract_rating: true,
        }
    }
}

/// An entry whose description is still being collected.
#[derive(Debug)]
struct Pending {
    title: String,
    link: Option<String>,
    link_text: Option<String>,
    rating: Option<u8>,
    lines: Vec<String>,
}

impl Pending {
    fn close(self) -> Item {
        Item {
            title: self.title,
            link: self.link,
            link_text: self.link_text,
            description: self.lines.join(" ").trim().to_string(),
            rating: self.rating,
        }
    }
}

#[derive(Debug)]
enum State {
    BeforeSection,
    InSection(Option<Pending>),
    AfterSection,
}

/// Walk `markdown` line by line and return the entries of the marked section,
/// in document order.
pub fn scan_section(markdown: &str, opts: ScanOptions) -> Vec<Item> {
    let mut items = Vec::new();
    let mut state = State::BeforeSection;

    for line in markdown.lines() {
        state = step(state, line, opts, &mut items);
        if matches!(state, State::AfterSection) {
            break;
        }
    }

    if let State::InSection(Some(pending)) = state {
        items.push(pending.close());
    }
    items
}

fn step(state: State, raw: &str, opts: ScanOptions, out: &mut Vec<Item>) -> State {
    let line = raw.trim();
    match state {
        State::BeforeSection if is_marker(line) => State::InSection(None),
        State::BeforeSection => State::BeforeSection,
        State::AfterSection => State::AfterSection,
        // a repeated marker is consumed like the first one
        State::InSection(pending) if is_marker(line) => State::InSection(pending),
        State::InSection(pending) if line.starts_with(SECOND_LEVEL) => {
            if let Some(p) = pending {
                out.push(p.close());
            }
            State::AfterSection
        }
        State::InSection(pending) => match classify_line(line) {
            Line::Opener(opener) => {
                if let Some(p) = pending {
                    out.push(p.close());
                }
                State::InSection(Some(open_entry(opener, opts)))
            }
            Line::Text(text) => State::InSection(pending.map(|mut p| {
                p.lines.push(text);
                p
            })),
            Line::Empty | Line::Excluded => State::InSection(pending),
        },
    }
}

/// Single place where an opener line turns into entry fields.
fn open_entry(opener: Opener, opts: ScanOptions) -> Pending {
    let rating = opts
        .extract_rating
        .then(|| extract_rating(&opener.raw_title));
    let title = clean_title(&opener.raw_title);
    debug!(form = ?opener.form, %title, ?rating, "Opened entry");
    Pending {
        title,
        link: opener.link,
        link_text: opener.link_text,
        rating,
        lines: opener.lead.into_iter().collect(),
    }
}

fn is_marker(line: &str) -> bool {
    line.starts_with(SECTION_MARKER)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scan(md: &str) -> Vec<Item> {
        scan_section(md, ScanOptions::default())
    }

    #[test]
    fn bullet_scenario_stops_at_next_section() {
        let md = "## 物\n- `Widget` [buy](http://x) great toy\n  more text\n## 味\nignored";
        let items = scan(md);
        assert_eq!(items.len(), 1);
        let w = &items[0];
        assert_eq!(w.title, "Widget");
        assert_eq!(w.link.as_deref(), Some("http://x"));
        assert_eq!(w.link_text.as_deref(), Some("buy"));
        assert_eq!(w.description, "great toy more text");
    }

    #[test]
    fn heading_rating_and_clean_title() {
        let items = scan("## 物\n### [Widget 🤩](http://x)\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Widget");
        assert_eq!(items[0].rating, Some(5));
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn heading_description_from_following_lines_only() {
        let md = "## 物\n### [Lamp](http://l) ignored tail\nBright.\n\nWarm too.\n";
        let items = scan(md);
        assert_eq!(items[0].description, "Bright. Warm too.");
        assert_eq!(items[0].rating, Some(3));
    }

    #[test]
    fn no_marker_no_entries() {
        assert!(scan("# Post\n- `Widget` [buy](http://x)\n### [A](http://a)\n").is_empty());
    }

    #[test]
    fn bullet_inside_description_reopens() {
        let md = "## 物\n- `One` first\ncontinued\n- `Two` [l](http://two) second\nmore\n";
        let items = scan(md);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "One");
        assert_eq!(items[0].description, "first continued");
        assert_eq!(items[1].title, "Two");
        assert_eq!(items[1].link.as_deref(), Some("http://two"));
        assert_eq!(items[1].description, "second more");
    }

    #[test]
    fn heading_after_bullet_keeps_same_extraction() {
        let md = "## 物\n- `One 👎`\n### [Two 👍](http://t)\nok\n";
        let items = scan(md);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "One");
        assert_eq!(items[0].rating, Some(2));
        assert_eq!(items[0].description, "");
        assert_eq!(items[1].title, "Two");
        assert_eq!(items[1].rating, Some(4));
        assert_eq!(items[1].description, "ok");
    }

    #[test]
    fn bare_bullet_has_no_link_or_description() {
        let items = scan("## 物\n- `Bare`\n");
        assert_eq!(items[0].link, None);
        assert_eq!(items[0].link_text, None);
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn excluded_lines_do_not_end_entry() {
        let md = "## 物\n- `Cam` nice\n{{< figure src=\"cam.jpg\" >}}\n![cam](cam.jpg)\n---\nstill cam\n";
        let items = scan(md);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "nice still cam");
    }

    #[test]
    fn preamble_text_is_ignored() {
        let md = "## 物\n\nThis month's picks:\n\n- `Pen`\n";
        let items = scan(md);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Pen");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn later_same_name_section_not_recovered() {
        let md = "## 物\n- `A`\n## 味\n- `B`\n## 物\n- `C`\n";
        let titles: Vec<_> = scan(md).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["A"]);
    }

    #[test]
    fn marker_with_suffix_opens_section() {
        let items = scan("## 物 (May)\n- `A`\n");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn third_level_heading_does_not_end_section() {
        let md = "## 物\n- `A` x\n### Notes\ny\n";
        let items = scan(md);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "x ### Notes y");
    }

    #[test]
    fn rating_disabled() {
        let items = scan_section(
            "## 物\n### [Widget 🤩](http://x)\n",
            ScanOptions {
                extract_rating: false,
            },
        );
        assert_eq!(items[0].title, "Widget");
        assert_eq!(items[0].rating, None);
    }

    #[test]
    fn fixture_post() {
        let md = std::fs::read_to_string("tests/fixtures/2024-05-monthly.md").unwrap();
        let items = scan(&md);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Kindle Scribe", "Field Notes", "Bamboo Toothbrush", "Rain Jacket"]);
        assert_eq!(items[0].rating, Some(5));
        assert_eq!(items[2].rating, Some(1));
        assert_eq!(items[3].rating, Some(3));
        assert_eq!(items[1].link_text.as_deref(), Some("shop"));
        assert!(items[0].description.starts_with("Writing on e-ink"));
        assert!(!items[3].description.contains("Recipe"));
    }

    proptest! {
        #[test]
        fn documents_without_marker_yield_nothing(lines in proptest::collection::vec("[^物\n]{0,40}", 0..20)) {
            let md = lines.join("\n");
            prop_assert!(scan(&md).is_empty());
        }

        #[test]
        fn bullet_fields_are_extracted(
            title in "[A-Za-z0-9]{1,12}",
            link_text in "[A-Za-z ]{0,10}",
            url in "https://[a-z]{1,10}\\.com/[a-z_]{0,8}(\\([a-z]{1,5}\\))?",
            desc in "[a-z][a-z ]{0,20}",
        ) {
            let md = format!("## 物\n- `{}` [{}]({}) {}\n", title, link_text, url, desc);
            let items = scan(&md);
            prop_assert_eq!(items.len(), 1);
            prop_assert_eq!(&items[0].title, &title);
            prop_assert_eq!(items[0].link_text.as_deref(), Some(link_text.as_str()));
            prop_assert_eq!(items[0].link.as_deref(), Some(url.as_str()));
            prop_assert!(items[0].description.starts_with(desc.trim_end()));
        }
    }
}
