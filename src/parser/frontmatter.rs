const FENCE: &str = "---";
const URL_KEY: &str = "url";

/// Pull the `url` value out of a leading `---` metadata block.
///
/// Only that one key is read; the block is not parsed as YAML. Returns `None`
/// when the document does not open with a fence, the fence is never closed,
/// or no non-empty `url` line is present.
pub fn extract_frontmatter_url(document: &str) -> Option<String> {
    let mut lines = document.trim_start_matches('\u{feff}').lines();
    if lines.next()?.trim_end() != FENCE {
        return None;
    }

    let mut url = None;
    for line in lines {
        if line.trim_end() == FENCE {
            return url;
        }
        if url.is_none() {
            url = url_value(line);
        }
    }
    None
}

fn url_value(line: &str) -> Option<String> {
    let (key, value) = line.split_once(':')?;
    if key.trim() != URL_KEY {
        return None;
    }
    let value = value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}
