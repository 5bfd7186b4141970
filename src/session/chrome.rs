use crate::{BrowserSession, Locator, ScrapeError};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// How long to wait for a page (or a view inside it) to render.
    pub render_wait: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions {
            headless: true,
            render_wait: Duration::from_secs(1),
        }
    }
}

/// A single Chrome tab driven over the DevTools protocol.
///
/// Dropping the session closes the tab and then the browser process, so the
/// browser is released on every exit path including early errors.
pub struct ChromeSession {
    tab: Arc<Tab>,
    render_wait: Duration,
    // Declared after `tab` so the tab goes first.
    _browser: Browser,
}

impl ChromeSession {
    pub fn launch(options: &BrowserOptions) -> Result<Self, ScrapeError> {
        info!("Launching Chrome (headless: {})", options.headless);

        let launch_options = LaunchOptions {
            headless: options.headless,
            window_size: Some((1920, 1080)),
            ..Default::default()
        };
        let browser = Browser::new(launch_options).map_err(|source| ScrapeError::Browser {
            stage: None,
            url: "about:blank".to_string(),
            source,
        })?;
        let tab = browser.new_tab().map_err(|source| ScrapeError::Browser {
            stage: None,
            url: "about:blank".to_string(),
            source,
        })?;

        Ok(ChromeSession {
            tab,
            render_wait: options.render_wait,
            _browser: browser,
        })
    }

    fn fail(&self) -> impl Fn(anyhow::Error) -> ScrapeError {
        let url = self.current_url();
        move |source| ScrapeError::Browser {
            stage: None,
            url: url.clone(),
            source,
        }
    }

    /// Waits for the tab to leave `before` and finish loading. Returns
    /// `false` if the URL never changed.
    fn settle_after(&self, before: &str) -> Result<bool, ScrapeError> {
        if !poll_until(self.render_wait, POLL_INTERVAL, || self.tab.get_url() != before) {
            return Ok(false);
        }
        self.tab.wait_until_navigated().map_err(self.fail())?;
        Ok(true)
    }
}

/// Checks `done` every `interval` until it holds or `timeout` runs out.
fn poll_until<F: FnMut() -> bool>(timeout: Duration, interval: Duration, mut done: F) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if done() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(interval);
    }
}

fn element_count(value: Option<&serde_json::Value>) -> Option<usize> {
    value
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

impl BrowserSession for ChromeSession {
    fn visit(&mut self, url: &str) -> Result<(), ScrapeError> {
        debug!("Visit {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|source| ScrapeError::Browser {
                stage: None,
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool, ScrapeError> {
        Ok(self
            .tab
            .wait_for_element_with_custom_timeout(css, timeout)
            .is_ok())
    }

    fn count(&mut self, css: &str) -> Result<usize, ScrapeError> {
        let script = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(css)?
        );
        let result = self.tab.evaluate(&script, false).map_err(self.fail())?;
        element_count(result.value.as_ref()).ok_or_else(|| {
            self.fail()(anyhow::anyhow!(
                "counting `{}` returned {:?}",
                css,
                result.value
            ))
        })
    }

    fn click(&mut self, locator: &Locator) -> Result<bool, ScrapeError> {
        if self.count(locator.css)? <= locator.nth {
            return Ok(false);
        }

        let before = self.current_url();
        debug!("Click {} on {}", locator, before);
        let fail = self.fail();
        let elements = self.tab.find_elements(locator.css).map_err(&fail)?;
        match elements.get(locator.nth) {
            Some(element) => {
                element.click().map_err(&fail)?;
            }
            None => return Ok(false),
        }

        // Controls that open a view in place never change the URL.
        if self.settle_after(&before)? {
            debug!("Navigated to {}", self.current_url());
        }
        Ok(true)
    }

    fn back(&mut self) -> Result<(), ScrapeError> {
        let before = self.current_url();
        debug!("Back from {}", before);
        self.tab
            .evaluate("window.history.back()", false)
            .map_err(self.fail())?;
        if self.settle_after(&before)? {
            Ok(())
        } else {
            Err(self.fail()(anyhow::anyhow!(
                "history.back() did not leave the page within {:?}",
                self.render_wait
            )))
        }
    }

    fn html(&mut self) -> Result<String, ScrapeError> {
        self.tab.get_content().map_err(self.fail())
    }

    fn current_url(&self) -> String {
        self.tab.get_url()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        match self.tab.close(true) {
            Ok(_) => debug!("Closed browser tab"),
            Err(e) => warn!("Failed to close browser tab: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn element_count_rejects_non_numbers() {
        assert_eq!(element_count(Some(&json!(4))), Some(4));
        assert_eq!(element_count(Some(&json!(0))), Some(0));
        assert_eq!(element_count(Some(&json!("4"))), None);
        assert_eq!(element_count(Some(&json!(null))), None);
        assert_eq!(element_count(None), None);
    }

    #[test]
    fn poll_until_sees_late_change() {
        let mut calls = 0;
        let changed = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            calls >= 3
        });
        assert!(changed);
        assert_eq!(calls, 3);
    }

    #[test]
    fn poll_until_gives_up_after_timeout() {
        let started = Instant::now();
        let changed = poll_until(Duration::from_millis(20), Duration::from_millis(5), || false);
        assert!(!changed);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
