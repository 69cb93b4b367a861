use serde::Serialize;

/// One entry as it comes out of the section scanner, before it is tied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: String,
    pub link: Option<String>,
    pub link_text: Option<String>,
    pub description: String,
    pub rating: Option<u8>,
}

/// Where a document came from: its URL and, when resolved through a month
/// lookup, the `YYYY-MM` batch tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub source: String,
    pub year_month: Option<String>,
}

impl Origin {
    pub fn url(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            year_month: None,
        }
    }

    pub fn month(source: impl Into<String>, year_month: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            year_month: Some(year_month.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
}

impl Entry {
    pub fn new(item: Item, origin: &Origin, post_url: Option<&str>) -> Self {
        Entry {
            title: item.title,
            link: item.link,
            link_text: item.link_text,
            description: item.description,
            rating: item.rating,
            source: origin.source.clone(),
            year_month: origin.year_month.clone(),
            post_url: post_url.map(str::to_string),
        }
    }
}
