use std::path::Path;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use color_eyre::eyre::{Result, WrapErr, eyre};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::ports::page::{PageElement, RenderedPage};

/// Upper bound on DOM polls while waiting for the page to settle.
const MAX_STABILITY_POLLS: u32 = 30;

/// A headless Chromium instance driven over the DevTools protocol.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch the browser binary at `executable` with the sandbox disabled.
    pub async fn launch(executable: &Path) -> Result<Self> {
        log::debug!("Launching browser: {}", executable.display());

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .no_sandbox()
            .build()
            .map_err(|e| eyre!("Invalid browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .wrap_err_with(|| format!("Failed to launch browser: {}", executable.display()))?;

        // The handler must be polled for the browser connection to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Open `url` and wait until its DOM stops changing.
    pub async fn open(&self, url: &str, settle_interval: Duration) -> Result<ChromiumPage> {
        log::info!("[APPLE] Playlist URL: {}", url);

        let page = self
            .browser
            .new_page(url)
            .await
            .wrap_err_with(|| format!("Failed to open page: {}", url))?;
        page.wait_for_navigation()
            .await
            .wrap_err("Failed to wait for page navigation")?;

        wait_until_stable(&page, settle_interval).await?;

        Ok(ChromiumPage { page })
    }

    /// Close the browser and hand back `result`; a close failure is only logged.
    pub async fn close_with<T>(self, result: Result<T>) -> Result<T> {
        keep_result(result, self.close().await)
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .wrap_err("Failed to close browser")?;
        if let Err(e) = self.browser.wait().await {
            log::debug!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

fn keep_result<T>(result: Result<T>, closed: Result<()>) -> Result<T> {
    if let Err(e) = closed {
        log::warn!("Failed to close browser: {:#}", e);
    }
    result
}

/// Polls the page HTML until two consecutive snapshots are identical.
async fn wait_until_stable(page: &Page, interval: Duration) -> Result<()> {
    let mut previous = page.content().await.wrap_err("Failed to read page content")?;

    for poll in 1..=MAX_STABILITY_POLLS {
        tokio::time::sleep(interval).await;
        let current = page.content().await.wrap_err("Failed to read page content")?;
        if current == previous {
            log::debug!("Page stable after {} polls", poll);
            return Ok(());
        }
        previous = current;
    }

    log::warn!(
        "Page still changing after {} polls, continuing anyway",
        MAX_STABILITY_POLLS
    );
    Ok(())
}

pub struct ChromiumPage {
    page: Page,
}

pub struct ChromiumElement {
    element: Element,
}

fn wrap_elements(elements: Vec<Element>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|element| Box::new(ChromiumElement { element }) as Box<dyn PageElement>)
        .collect()
}

#[async_trait::async_trait]
impl RenderedPage for ChromiumPage {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .wrap_err_with(|| format!("Failed to query elements: {}", selector))?;
        Ok(wrap_elements(elements))
    }
}

#[async_trait::async_trait]
impl PageElement for ChromiumElement {
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .wrap_err_with(|| format!("Failed to query elements: {}", selector))?;
        Ok(wrap_elements(elements))
    }

    async fn text(&self) -> Result<String> {
        self.element
            .inner_text()
            .await
            .wrap_err("Failed to read element text")?
            .ok_or_else(|| eyre!("Element has no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_failure_keeps_run_error() {
        let result: Result<()> = keep_result(
            Err(eyre!("Failed to match track: 'Song B' by 'Artist B'")),
            Err(eyre!("Failed to close browser")),
        );

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Song B"));
        assert!(!message.contains("close"));
    }

    #[test]
    fn test_close_failure_keeps_successful_run() {
        let result = keep_result(Ok(3), Err(eyre!("Failed to close browser")));
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_clean_close_passes_result_through() {
        assert_eq!(keep_result(Ok("done"), Ok(())).unwrap(), "done");
    }
}
