use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::abstracts::extract::ContentExtraction;
use crate::abstracts::{FallbackBackend, Resolver};
use crate::apis::arxiv::ArxivClient;
use crate::apis::{FeedError, PaperRecord};
use crate::browser::BrowserError;
use crate::config::Config;
use crate::output::{self, OutputError, MAX_OUTPUT_BYTES};

#[derive(Debug)]
pub struct RunSummary {
    pub saved: usize,
    pub output_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to fetch the arXiv feed: {0}")]
    Feed(#[from] FeedError),
    #[error("failed to launch headless browser: {0}")]
    Browser(#[from] BrowserError),
    #[error("failed to write output: {0}")]
    Output(#[from] OutputError),
}

/// One full pass: fetch the feed, acquire the fallback backend, resolve every
/// paper, release the backend, then write the bounded document.
///
/// `launch` is only awaited after the feed has been fetched, so a feed
/// failure never starts the backend. The backend is shut down before the
/// output is serialized.
pub async fn run<B, L>(
    config: &Config,
    client: &ArxivClient,
    launch: L,
) -> Result<RunSummary, RunError>
where
    B: FallbackBackend,
    L: Future<Output = Result<B, BrowserError>>,
{
    let papers = client
        .fetch_recent(&config.category, config.max_results)
        .await?;
    let backend = launch.await?;

    let results = {
        let resolver = Resolver::new()
            .with_strategy(ContentExtraction::new(client.http()))
            .with_strategy(backend.fallback(config.settle_delay));
        collect(papers, &resolver).await
    };

    if let Err(e) = backend.shutdown().await {
        tracing::warn!("Fallback backend did not shut down cleanly: {}", e);
    }

    Ok(persist(results, &config.output_file)?)
}

/// Resolve each paper in fetch order, keeping only those with an abstract.
pub async fn collect(papers: Vec<PaperRecord>, resolver: &Resolver<'_>) -> Vec<PaperRecord> {
    let total = papers.len();
    let mut results = Vec::with_capacity(total);
    for mut paper in papers {
        if let Some(text) = resolver.resolve(&paper).await {
            paper.abstract_text = Some(text);
            results.push(paper);
        }
    }
    tracing::info!("Recovered abstracts for {} of {} papers", results.len(), total);
    results
}

/// Serialize the collected papers under the size ceiling and write them to `path`.
/// Nothing is written if the document cannot be made small enough.
pub fn persist(mut results: Vec<PaperRecord>, path: &Path) -> Result<RunSummary, OutputError> {
    let doc = output::serialize_bounded(&mut results, MAX_OUTPUT_BYTES)?;
    output::write_document(path, &doc.json)?;
    tracing::info!(
        "Wrote {} bytes to {} after {} truncation passes",
        doc.json.len(),
        path.display(),
        doc.truncation_passes
    );
    Ok(RunSummary {
        saved: doc.records,
        output_file: path.to_path_buf(),
    })
}
