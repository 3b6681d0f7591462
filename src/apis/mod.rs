pub mod arxiv;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One paper discovered in the feed. `abstract_text` stays `None` until
/// a strategy recovers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub url: String,
    pub title: String,
    pub authors: Vec<String>,
    pub date: String,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none", default)]
    pub abstract_text: Option<String>,
}

impl PaperRecord {
    /// Address of the human-readable abstract page for this record.
    pub fn abstract_page_url(&self) -> String {
        self.url.replace("/pdf/", "/abs/")
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("malformed feed: {0}")]
    Malformed(String),
}
