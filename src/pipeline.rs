use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::RepoConfig;
use crate::entry::{Entry, Origin};
use crate::parser::dedup::dedupe;
use crate::parser::section::ScanOptions;
use crate::parser::{parse_document, PostUrl};
use crate::source::{DocumentSource, FetchError};

/// A fetched document, still tagged with where it came from.
pub struct Document {
    pub origin: Origin,
    pub markdown: String,
}

pub struct Batch {
    pub entries: Vec<Entry>,
    pub documents: usize,
    pub fetch_errors: usize,
    pub duplicates: usize,
}

/// Direct URLs first, then each month's listing. A month whose listing fails is skipped.
pub async fn resolve(
    source: &DocumentSource,
    repo: Option<&RepoConfig>,
    urls: &[String],
    months: &[String],
) -> anyhow::Result<Vec<Origin>> {
    let mut origins: Vec<Origin> = urls.iter().map(Origin::url).collect();

    if months.is_empty() {
        return Ok(origins);
    }
    let repo = repo.ok_or_else(|| anyhow::anyhow!("A repository is required to resolve months"))?;

    for month in months {
        match source.list_month(repo, month).await {
            Ok(found) if found.is_empty() => info!("Nothing to process for {}", month),
            Ok(found) => origins.extend(found.into_iter().map(|url| Origin::month(url, month))),
            Err(e) => warn!("Could not list {}: {}", month, e),
        }
    }
    Ok(origins)
}

/// Fetch documents concurrently. Failures are logged and dropped; the rest come
/// back in the order of `origins`.
pub async fn fetch_all(
    source: Arc<DocumentSource>,
    origins: Vec<Origin>,
    concurrency: usize,
) -> (Vec<Document>, usize) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<(usize, Origin, Result<String, FetchError>)>(concurrency.max(1) * 2);

    for (idx, origin) in origins.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let result = match sem.acquire().await {
                Ok(_permit) => source.fetch(&origin.source).await,
                Err(_) => return,
            };
            let _ = tx.send((idx, origin, result)).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut fetched = Vec::new();
    let mut errors = 0usize;
    while let Some((idx, origin, result)) = rx.recv().await {
        match result {
            Ok(markdown) => fetched.push((idx, Document { origin, markdown })),
            Err(e) => {
                warn!("Skipping {}: {}", origin.source, e);
                errors += 1;
            }
        }
    }

    fetched.sort_by_key(|(idx, _)| *idx);
    (fetched.into_iter().map(|(_, doc)| doc).collect(), errors)
}

/// Parse every document in parallel, keeping document order.
pub fn parse_documents(docs: &[Document], opts: ScanOptions, post_url: &PostUrl) -> Vec<Entry> {
    docs.par_iter()
        .map(|doc| parse_document(&doc.markdown, &doc.origin, opts, post_url))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Resolve, fetch, parse and dedupe in one go.
pub async fn collect(
    source: Arc<DocumentSource>,
    origins: Vec<Origin>,
    concurrency: usize,
    opts: ScanOptions,
    post_url: &PostUrl,
) -> Batch {
    let (docs, fetch_errors) = fetch_all(source, origins, concurrency).await;
    let parsed = parse_documents(&docs, opts, post_url);
    let deduped = dedupe(parsed);

    info!(
        "Parsed {} entries from {} documents ({} duplicates dropped, {} fetch errors)",
        deduped.entries.len(),
        docs.len(),
        deduped.removed,
        fetch_errors
    );

    Batch {
        entries: deduped.entries,
        documents: docs.len(),
        fetch_errors,
        duplicates: deduped.removed,
    }
}
