use std::time::Duration;

use async_trait::async_trait;
use leptess::LepTess;

use super::{AbstractStrategy, FallbackBackend, StrategyError};
use crate::browser::{BrowserError, BrowserSession};

/// Recognized lines must be longer than this to count as an abstract.
const MIN_ABSTRACT_CHARS: usize = 100;
const OCR_LANGUAGE: &str = "eng";

/// Fallback strategy: screenshot the rendered page and read it back with Tesseract.
pub struct VisualRecognition<'a> {
    session: &'a BrowserSession,
    settle: Duration,
}

impl<'a> VisualRecognition<'a> {
    pub fn new(session: &'a BrowserSession, settle: Duration) -> Self {
        Self { session, settle }
    }
}

#[async_trait]
impl<'a> AbstractStrategy for VisualRecognition<'a> {
    fn name(&self) -> &str {
        "visual-recognition"
    }

    async fn recover(&self, page_url: &str) -> Result<Option<String>, StrategyError> {
        let png = self.session.capture(page_url, self.settle).await?;
        let text = recognize_text(png).await?;
        Ok(select_recognized_line(&text))
    }
}

#[async_trait]
impl FallbackBackend for BrowserSession {
    fn fallback(&self, settle: Duration) -> Box<dyn AbstractStrategy + '_> {
        Box::new(VisualRecognition::new(self, settle))
    }

    async fn shutdown(self) -> Result<(), BrowserError> {
        self.close().await
    }
}

/// Run Tesseract over an encoded image on the blocking pool.
pub async fn recognize_text(image: Vec<u8>) -> Result<String, StrategyError> {
    tokio::task::spawn_blocking(move || {
        let mut tess = LepTess::new(None, OCR_LANGUAGE)
            .map_err(|e| StrategyError::Fallback(format!("failed to initialize Tesseract: {}", e)))?;
        tess.set_image_from_mem(&image)
            .map_err(|e| StrategyError::Fallback(format!("failed to load screenshot: {}", e)))?;
        tess.get_utf8_text()
            .map_err(|e| StrategyError::Fallback(format!("recognized text is not UTF-8: {}", e)))
    })
    .await
    .map_err(|e| StrategyError::Fallback(format!("OCR worker failed: {}", e)))?
}

/// First recognized line longer than 100 characters, trimmed.
pub fn select_recognized_line(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.chars().count() > MIN_ABSTRACT_CHARS)
        .map(|line| line.trim().to_string())
}
