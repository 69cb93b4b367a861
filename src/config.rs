use anyhow::{Context, Result};
use serde::Deserialize;

use crate::parser::section::ScanOptions;
use crate::parser::PostUrl;

const ENV_PREFIX: &str = "MONO";

/// Runtime settings, read from `.env` and `MONO_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `owner/name` of the repository holding the posts.
    pub github_repo: Option<String>,
    pub github_branch: String,
    /// Directory inside the repository that contains the posts.
    pub github_path: String,
    pub github_token: Option<String>,
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub post_url_prefix: String,
    pub post_url_suffix: String,
    pub extract_rating: bool,
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_repo: None,
            github_branch: "main".to_string(),
            github_path: "content/posts".to_string(),
            github_token: None,
            notion_token: None,
            notion_database_id: None,
            post_url_prefix: String::new(),
            post_url_suffix: String::new(),
            extract_rating: true,
            concurrency: 4,
        }
    }
}

/// Repository coordinates, present only once `github_repo` is known.
#[derive(Debug, Clone)]
pub struct RepoConfig {
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to read MONO_* settings")
    }

    pub fn repo(&self) -> Result<RepoConfig> {
        let repo = self
            .github_repo
            .clone()
            .filter(|r| r.contains('/'))
            .context("MONO_GITHUB_REPO must be set to owner/name to resolve months")?;
        Ok(RepoConfig {
            repo,
            branch: self.github_branch.clone(),
            path: self.github_path.trim_matches('/').to_string(),
            token: self.github_token.clone(),
        })
    }

    pub fn notion(&self) -> Result<NotionConfig> {
        Ok(NotionConfig {
            token: self
                .notion_token
                .clone()
                .context("MONO_NOTION_TOKEN must be set to sync")?,
            database_id: self
                .notion_database_id
                .clone()
                .context("MONO_NOTION_DATABASE_ID must be set to sync")?,
        })
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extract_rating: self.extract_rating,
        }
    }

    pub fn post_url(&self) -> PostUrl {
        PostUrl {
            prefix: self.post_url_prefix.clone(),
            suffix: self.post_url_suffix.clone(),
        }
    }
}
