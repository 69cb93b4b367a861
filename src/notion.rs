use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::NotionConfig;
use crate::entry::Entry;
use crate::parser::rating::glyph_for;

const NOTION_API: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich-text objects longer than this.
const TEXT_CHUNK: usize = 2000;

const PROP_TITLE: &str = "Name";
const PROP_RATING: &str = "Rating";
const PROP_LINK: &str = "Link";
const PROP_POST: &str = "Post";
const PROP_DESCRIPTION: &str = "Description";

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("Notion returned {status} for {title:?}: {body}")]
    Status {
        title: String,
        status: u16,
        body: String,
    },

    #[error("request for {title:?} failed: {source}")]
    Transport {
        title: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response for {title:?}: {source}")]
    Decode {
        title: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpsertReport {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<PageRef>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    id: String,
}

/// Title-keyed upsert into a Notion database.
pub struct NotionStore {
    client: reqwest::Client,
    config: NotionConfig,
}

impl NotionStore {
    pub fn new(config: NotionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build Notion client")?;
        Ok(Self { client, config })
    }

    /// Upsert every entry in order. A failed entry is logged and counted; the rest still run.
    pub async fn upsert_all(&self, entries: &[Entry]) -> UpsertReport {
        let pb = ProgressBar::new(entries.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        let mut report = UpsertReport::default();
        for entry in entries {
            pb.set_message(entry.title.clone());
            match self.upsert(entry).await {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!("Upsert failed: {}", e);
                    report.failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Upserted {} entries ({} created, {} updated, {} failed)",
            entries.len(),
            report.created,
            report.updated,
            report.failed
        );
        report
    }

    async fn upsert(&self, entry: &Entry) -> Result<Outcome, UpsertError> {
        match self.find_page(&entry.title).await? {
            Some(page_id) => {
                if let Some(body) = update_body(entry) {
                    let url = format!("{}/pages/{}", NOTION_API, page_id);
                    self.send(self.client.patch(url).json(&body), &entry.title)
                        .await?;
                }
                debug!(title = %entry.title, %page_id, "Updated existing page");
                Ok(Outcome::Updated)
            }
            None => {
                let body = create_body(&self.config.database_id, entry);
                let url = format!("{}/pages", NOTION_API);
                self.send(self.client.post(url).json(&body), &entry.title)
                    .await?;
                debug!(title = %entry.title, "Created page");
                Ok(Outcome::Created)
            }
        }
    }

    /// First page whose title equals `title`, following query cursors.
    async fn find_page(&self, title: &str) -> Result<Option<String>, UpsertError> {
        let url = format!(
            "{}/databases/{}/query",
            NOTION_API, self.config.database_id
        );
        let mut cursor: Option<String> = None;

        loop {
            let body = query_body(title, cursor.as_deref());
            let value = self
                .send(self.client.post(&url).json(&body), title)
                .await?;
            let page: QueryResponse =
                serde_json::from_value(value).map_err(|source| UpsertError::Decode {
                    title: title.to_string(),
                    source,
                })?;

            if let Some(found) = page.results.into_iter().next() {
                return Ok(Some(found.id));
            }
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => return Ok(None),
            }
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        title: &str,
    ) -> Result<Value, UpsertError> {
        let transport = |source| UpsertError::Transport {
            title: title.to_string(),
            source,
        };

        let response = request
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpsertError::Status {
                title: title.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await.map_err(transport)?;
        parse_body(&text, title)
    }
}

fn parse_body(text: &str, title: &str) -> Result<Value, UpsertError> {
    serde_json::from_str(text).map_err(|source| UpsertError::Decode {
        title: title.to_string(),
        source,
    })
}

fn query_body(title: &str, cursor: Option<&str>) -> Value {
    let mut body = json!({
        "filter": {
            "property": PROP_TITLE,
            "title": { "equals": title }
        },
        "page_size": 10
    });
    if let Some(cursor) = cursor {
        body["start_cursor"] = json!(cursor);
    }
    body
}

/// Full property set for a new page, description included.
fn create_body(database_id: &str, entry: &Entry) -> Value {
    let mut props = shared_properties(entry);
    props.insert(
        PROP_TITLE.to_string(),
        json!({ "title": [{ "text": { "content": entry.title } }] }),
    );
    if !entry.description.is_empty() {
        props.insert(
            PROP_DESCRIPTION.to_string(),
            json!({ "rich_text": rich_text(&entry.description) }),
        );
    }
    json!({
        "parent": { "database_id": database_id },
        "properties": props
    })
}

/// Properties refreshed on an existing page. The description is left alone.
fn update_body(entry: &Entry) -> Option<Value> {
    let props = shared_properties(entry);
    (!props.is_empty()).then(|| json!({ "properties": props }))
}

fn shared_properties(entry: &Entry) -> Map<String, Value> {
    let mut props = Map::new();
    if let Some(glyph) = entry.rating.and_then(glyph_for) {
        props.insert(
            PROP_RATING.to_string(),
            json!({ "select": { "name": glyph.to_string() } }),
        );
    }
    if let Some(link) = &entry.link {
        props.insert(PROP_LINK.to_string(), json!({ "url": link }));
    }
    if let Some(post) = &entry.post_url {
        props.insert(PROP_POST.to_string(), json!({ "url": post }));
    }
    props
}

/// Split into rich-text objects of at most `TEXT_CHUNK` UTF-16 units, the unit
/// Notion counts in. Characters are never split.
fn rich_text(text: &str) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut chunk = String::new();
    let mut units = 0;
    for c in text.chars() {
        if units + c.len_utf16() > TEXT_CHUNK {
            parts.push(std::mem::take(&mut chunk));
            units = 0;
        }
        units += c.len_utf16();
        chunk.push(c);
    }
    if !chunk.is_empty() {
        parts.push(chunk);
    }
    parts
        .into_iter()
        .map(|content| json!({ "text": { "content": content } }))
        .collect()
}
