use async_trait::async_trait;

use super::{AbstractStrategy, StrategyError};

/// Lines at or below this many characters are never abstract candidates.
const MIN_CANDIDATE_CHARS: usize = 50;
/// A candidate this long is taken even without the word "abstract".
const LONG_LINE_CHARS: usize = 150;

/// Primary strategy: fetch the abstract page and pick a line out of its readable text.
pub struct ContentExtraction {
    client: reqwest::Client,
}

impl ContentExtraction {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AbstractStrategy for ContentExtraction {
    fn name(&self) -> &str {
        "content-extraction"
    }

    async fn recover(&self, page_url: &str) -> Result<Option<String>, StrategyError> {
        let html = self
            .client
            .get(page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let text = extract_readable_text(&html)?;
        Ok(select_abstract_line(&text))
    }
}

/// Main readable text of an HTML page, boilerplate removed.
pub fn extract_readable_text(html: &str) -> Result<String, StrategyError> {
    let result =
        rs_trafilatura::extract(html).map_err(|e| StrategyError::Extraction(e.to_string()))?;
    let text = result.content_text.trim();
    if text.is_empty() {
        return Err(StrategyError::Extraction("page has no readable text".to_string()));
    }
    Ok(text.to_string())
}

/// Pick the abstract out of extracted page text.
///
/// The text must mention "abstract" somewhere. Among lines longer than 50
/// characters, the first that mentions "abstract" or runs past 150
/// characters wins.
pub fn select_abstract_line(text: &str) -> Option<String> {
    if !text.to_lowercase().contains("abstract") {
        return None;
    }
    text.lines()
        .filter(|line| line.chars().count() > MIN_CANDIDATE_CHARS)
        .find(|line| {
            line.to_lowercase().contains("abstract") || line.chars().count() > LONG_LINE_CHARS
        })
        .map(|line| line.trim().to_string())
}
