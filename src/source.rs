use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::RepoConfig;

const GITHUB_API: &str = "https://api.github.com";
const RAW_HOST: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = concat!("mono_sync/", env!("CARGO_PKG_VERSION"));

static BLOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/blob/(.+)$").unwrap());

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned {status}: {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unreadable response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid month {0:?}, expected YYYY-MM")]
    InvalidMonth(String),
}

/// One row of the GitHub contents API listing.
#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Fetches raw post markdown and lists a month's posts from the repository.
pub struct DocumentSource {
    client: reqwest::Client,
    token: Option<String>,
}

impl DocumentSource {
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, token })
    }

    /// GET the document text. GitHub `blob` page URLs are fetched from the raw host.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = to_raw_url(url);
        debug!(%url, "Fetching document");
        let response = self.get(&url).await?;
        response.text().await.map_err(|source| FetchError::Decode { url, source })
    }

    /// URLs of the posts for `year_month`, sorted by file name. An empty list is not an error.
    pub async fn list_month(
        &self,
        repo: &RepoConfig,
        year_month: &str,
    ) -> Result<Vec<String>, FetchError> {
        validate_month(year_month)?;
        let url = contents_url(repo);
        let response = self.get(&url).await?;
        let items: Vec<ContentItem> = response
            .json()
            .await
            .map_err(|source| FetchError::Decode { url, source })?;

        let urls = select_month(&items, repo, year_month);
        info!("{} posts for {} in {}/{}", urls.len(), year_month, repo.repo, repo.path);
        Ok(urls)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref().filter(|_| is_github(url)) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        Ok(response)
    }
}

/// Check a `YYYY-MM` batch identifier.
pub fn validate_month(year_month: &str) -> Result<(), FetchError> {
    let well_formed = year_month.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", year_month), "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(FetchError::InvalidMonth(year_month.to_string()))
    }
}

pub fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

/// Rewrite `github.com/<owner>/<repo>/blob/<ref>/<path>` to its raw form.
pub fn to_raw_url(url: &str) -> String {
    match BLOB_RE.captures(url) {
        Some(caps) => format!("{}/{}/{}/{}", RAW_HOST, &caps[1], &caps[2], &caps[3]),
        None => url.to_string(),
    }
}

fn contents_url(repo: &RepoConfig) -> String {
    format!(
        "{}/repos/{}/contents/{}?ref={}",
        GITHUB_API, repo.repo, repo.path, repo.branch
    )
}

fn raw_url(repo: &RepoConfig, path: &str) -> String {
    format!("{}/{}/{}/{}", RAW_HOST, repo.repo, repo.branch, path)
}

/// Markdown files named `YYYY-MM*.md`, and `YYYY-MM*` page-bundle directories
/// (read through their `index.md`).
fn select_month(items: &[ContentItem], repo: &RepoConfig, year_month: &str) -> Vec<String> {
    let mut matched: Vec<&ContentItem> = items
        .iter()
        .filter(|item| item.name.starts_with(year_month))
        .filter(|item| match item.kind.as_str() {
            "file" => item.name.ends_with(".md"),
            "dir" => true,
            _ => false,
        })
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name));

    matched
        .into_iter()
        .map(|item| match item.kind.as_str() {
            "dir" => raw_url(repo, &format!("{}/index.md", item.path)),
            _ => raw_url(repo, &item.path),
        })
        .collect()
}

fn is_github(url: &str) -> bool {
    url.starts_with(GITHUB_API) || url.starts_with(RAW_HOST)
}
