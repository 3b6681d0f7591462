//! Abstract recovery.
//!
//! A [`Resolver`] holds an ordered list of [`AbstractStrategy`] values and
//! asks each in turn for a paper's abstract, stopping at the first one that
//! produces text. Strategy errors stay inside the resolver: one paper's
//! failure never reaches the batch.

pub mod extract;
pub mod ocr;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::apis::PaperRecord;
use crate::browser::BrowserError;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content extraction failed: {0}")]
    Extraction(String),
    #[error("visual recognition failed: {0}")]
    Fallback(String),
}

impl From<BrowserError> for StrategyError {
    fn from(e: BrowserError) -> Self {
        StrategyError::Fallback(e.to_string())
    }
}

/// One way of recovering an abstract from a paper's abstract page.
#[async_trait]
pub trait AbstractStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the page was processed but nothing looked like an abstract.
    async fn recover(&self, page_url: &str) -> Result<Option<String>, StrategyError>;
}

#[async_trait]
impl<T: AbstractStrategy + ?Sized> AbstractStrategy for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn recover(&self, page_url: &str) -> Result<Option<String>, StrategyError> {
        (**self).recover(page_url).await
    }
}

/// The shared resource behind the fallback strategy. It is acquired once per
/// run, lent to the fallback strategy while papers are resolved, and shut
/// down before the output is written.
#[async_trait]
pub trait FallbackBackend: Send + Sync + Sized {
    fn fallback(&self, settle: Duration) -> Box<dyn AbstractStrategy + '_>;

    async fn shutdown(self) -> Result<(), BrowserError>;
}

#[derive(Default)]
pub struct Resolver<'a> {
    strategies: Vec<Box<dyn AbstractStrategy + 'a>>,
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy. Strategies are tried in the order they were added.
    pub fn with_strategy(mut self, strategy: impl AbstractStrategy + 'a) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Recover a non-empty abstract for `paper`, or `None` if every strategy came up empty.
    pub async fn resolve(&self, paper: &PaperRecord) -> Option<String> {
        let page_url = paper.abstract_page_url();
        for strategy in &self.strategies {
            match strategy.recover(&page_url).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    tracing::debug!("{}: abstract recovered by {}", page_url, strategy.name());
                    return Some(text);
                }
                Ok(_) => {
                    tracing::debug!("{}: {} found no abstract", page_url, strategy.name());
                }
                Err(e) => {
                    tracing::debug!("{}: {} failed: {}", page_url, strategy.name(), e);
                }
            }
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedStrategy};
    use super::*;

    fn paper(url: &str) -> PaperRecord {
        PaperRecord {
            url: url.to_string(),
            title: "A paper".to_string(),
            authors: vec!["A. Author".to_string()],
            date: "2024-03-01".to_string(),
            abstract_text: None,
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let url = "http://arxiv.org/abs/1";
        let primary = ScriptedStrategy::new("primary", vec![(url, Scripted::Text("Abstract: primary text"))]);
        let fallback = ScriptedStrategy::new("fallback", vec![(url, Scripted::Text("fallback text"))]);
        let resolver = Resolver::new().with_strategy(&primary).with_strategy(&fallback);

        let got = resolver.resolve(&paper(url)).await;
        assert_eq!(got.as_deref(), Some("Abstract: primary text"));
        assert_eq!(primary.calls().len(), 1);
        assert!(fallback.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_runs_after_primary_miss_or_error() {
        let miss = "http://arxiv.org/abs/miss";
        let boom = "http://arxiv.org/abs/boom";
        let primary = ScriptedStrategy::new(
            "primary",
            vec![(miss, Scripted::Nothing), (boom, Scripted::Fail)],
        );
        let fallback = ScriptedStrategy::new(
            "fallback",
            vec![(miss, Scripted::Text("ocr one")), (boom, Scripted::Text("ocr two"))],
        );
        let resolver = Resolver::new().with_strategy(&primary).with_strategy(&fallback);

        assert_eq!(resolver.resolve(&paper(miss)).await.as_deref(), Some("ocr one"));
        assert_eq!(resolver.resolve(&paper(boom)).await.as_deref(), Some("ocr two"));
        assert_eq!(fallback.calls(), vec![miss.to_string(), boom.to_string()]);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_yields_none() {
        let url = "http://arxiv.org/abs/2";
        let primary = ScriptedStrategy::new("primary", vec![(url, Scripted::Fail)]);
        let fallback = ScriptedStrategy::new("fallback", vec![(url, Scripted::Fail)]);
        let resolver = Resolver::new().with_strategy(&primary).with_strategy(&fallback);
        assert!(resolver.resolve(&paper(url)).await.is_none());
    }

    #[tokio::test]
    async fn test_blank_text_counts_as_miss() {
        let url = "http://arxiv.org/abs/3";
        let primary = ScriptedStrategy::new("primary", vec![(url, Scripted::Text("   "))]);
        let fallback = ScriptedStrategy::new("fallback", vec![(url, Scripted::Text("real text"))]);
        let resolver = Resolver::new().with_strategy(&primary).with_strategy(&fallback);
        assert_eq!(resolver.resolve(&paper(url)).await.as_deref(), Some("real text"));
    }

    #[tokio::test]
    async fn test_pdf_url_is_rewritten_before_lookup() {
        let primary = ScriptedStrategy::new("primary", vec![]);
        let resolver = Resolver::new().with_strategy(&primary);
        resolver.resolve(&paper("http://arxiv.org/pdf/2401.1")).await;
        assert_eq!(primary.calls(), vec!["http://arxiv.org/abs/2401.1".to_string()]);
    }
}
