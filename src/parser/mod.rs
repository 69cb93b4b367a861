pub mod dedup;
pub mod frontmatter;
pub mod lines;
pub mod rating;
pub mod section;

use crate::entry::{Entry, Origin};
use section::ScanOptions;

/// How a frontmatter `url` becomes a full post URL.
#[derive(Debug, Clone, Default)]
pub struct PostUrl {
    pub prefix: String,
    pub suffix: String,
}

impl PostUrl {
    pub fn compose(&self, path: &str) -> String {
        format!("{}{}{}", self.prefix, path, self.suffix)
    }
}

/// One document → its entries: frontmatter URL, then section scan, then origin fields.
pub fn parse_document(
    markdown: &str,
    origin: &Origin,
    opts: ScanOptions,
    post_url: &PostUrl,
) -> Vec<Entry> {
    let post = extract_post_url(markdown, post_url);
    section::scan_section(markdown, opts)
        .into_iter()
        .map(|item| Entry::new(item, origin, post.as_deref()))
        .collect()
}

fn extract_post_url(markdown: &str, post_url: &PostUrl) -> Option<String> {
    frontmatter::extract_frontmatter_url(markdown).map(|path| post_url.compose(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> PostUrl {
        PostUrl {
            prefix: "https://blog.example".into(),
            suffix: String::new(),
        }
    }

    #[test]
    fn entries_carry_origin_and_post_url() {
        let md = std::fs::read_to_string("tests/fixtures/2024-05-travel.md").unwrap();
        let origin = Origin::month("https://raw.example/2024-05-travel.md", "2024-05");
        let entries = parse_document(&md, &origin, ScanOptions::default(), &blog());
        assert_eq!(entries.len(), 2);
        for e in &entries {
            assert_eq!(e.source, origin.source);
            assert_eq!(e.year_month.as_deref(), Some("2024-05"));
            assert_eq!(
                e.post_url.as_deref(),
                Some("https://blog.example/posts/2024-05-travel/")
            );
        }
        assert_eq!(entries[1].title, "Packing Cubes");
        assert_eq!(entries[1].rating, Some(4));
    }

    #[test]
    fn no_frontmatter_no_post_url() {
        let md = std::fs::read_to_string("tests/fixtures/no-frontmatter.md").unwrap();
        let entries = parse_document(&md, &Origin::url("u"), ScanOptions::default(), &blog());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].post_url, None);
        assert_eq!(entries[0].year_month, None);
    }

    #[test]
    fn compose_with_suffix() {
        let p = PostUrl {
            prefix: "https://blog.example".into(),
            suffix: "index.html".into(),
        };
        assert_eq!(p.compose("/posts/a/"), "https://blog.example/posts/a/index.html");
    }
}
