use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("browser protocol error: {0}")]
    Cdp(#[from] CdpError),
    #[error("browser process error: {0}")]
    Io(#[from] std::io::Error),
}

/// One headless Chrome process with a single tab, shared by every
/// screenshot taken during a run.
///
/// Call [`BrowserSession::close`] when done. If the session is dropped
/// instead, the event loop is aborted and chromiumoxide kills the child
/// process.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(chrome_executable: Option<&Path>) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--log-level=3");
        if let Some(path) = chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser event loop: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        tracing::info!("Headless browser launched");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Navigate the session's tab to `url`, wait `settle`, and return a
    /// full-page PNG screenshot.
    pub async fn capture(&self, url: &str, settle: Duration) -> Result<Vec<u8>, BrowserError> {
        self.page.goto(url).await?;
        tokio::time::sleep(settle).await;
        let png = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await?;
        Ok(png)
    }

    /// Shut the browser down and wait for the process to exit.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        self.browser.wait().await?;
        if let Err(e) = (&mut self.handler).await {
            tracing::debug!("browser event loop ended abnormally: {}", e);
        }
        tracing::info!("Headless browser closed");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
