use crate::{BrowserSession, Locator, ScrapeError};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A browser stand-in that serves recorded pages.
///
/// Pages are keyed by URL. Clicking an element follows a transition
/// registered for that `(page, locator)` pair if there is one, otherwise the
/// `href` of the nearest enclosing anchor. Elements that lead nowhere click
/// without effect, like a dead button would.
#[derive(Debug, Default)]
pub struct ReplaySession {
    pages: HashMap<String, String>,
    transitions: HashMap<(String, Locator), String>,
    history: Vec<String>,
    current: Option<String>,
}

impl ReplaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        locator: Locator,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.insert((from.into(), locator), to.into());
        self
    }

    fn page(&self) -> Result<Html, ScrapeError> {
        let url = self.current.as_deref().unwrap_or("about:blank");
        match self.pages.get(url) {
            Some(html) => Ok(Html::parse_document(html)),
            None => Err(self.fail(format!("no recorded page for {}", url))),
        }
    }

    fn selector(&self, css: &str) -> Result<Selector, ScrapeError> {
        Selector::parse(css).map_err(|e| self.fail(format!("invalid selector `{}`: {:?}", css, e)))
    }

    fn fail(&self, message: String) -> ScrapeError {
        ScrapeError::Browser {
            stage: None,
            url: self.current_url(),
            source: anyhow::anyhow!(message),
        }
    }

    fn go(&mut self, url: String) {
        if let Some(previous) = self.current.replace(url) {
            self.history.push(previous);
        }
    }
}

fn enclosing_href(element: ElementRef<'_>) -> Option<String> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string)
}

impl BrowserSession for ReplaySession {
    fn visit(&mut self, url: &str) -> Result<(), ScrapeError> {
        debug!("Visit {}", url);
        if !self.pages.contains_key(url) {
            return Err(ScrapeError::Browser {
                stage: None,
                url: url.to_string(),
                source: anyhow::anyhow!("no recorded page for {}", url),
            });
        }
        self.go(url.to_string());
        Ok(())
    }

    fn wait_for(&mut self, css: &str, _timeout: Duration) -> Result<bool, ScrapeError> {
        Ok(self.count(css)? > 0)
    }

    fn count(&mut self, css: &str) -> Result<usize, ScrapeError> {
        let selector = self.selector(css)?;
        Ok(self.page()?.select(&selector).count())
    }

    fn click(&mut self, locator: &Locator) -> Result<bool, ScrapeError> {
        let selector = self.selector(locator.css)?;
        let doc = self.page()?;
        let href = match doc.select(&selector).nth(locator.nth) {
            Some(element) => enclosing_href(element),
            None => return Ok(false),
        };

        let current = self.current_url();
        let target = match self.transitions.get(&(current.clone(), locator.clone())) {
            Some(target) => target.clone(),
            None => match href {
                Some(href) => Url::parse(&current)
                    .and_then(|base| base.join(&href))
                    .map_err(|e| self.fail(format!("cannot follow `{}`: {}", href, e)))?
                    .to_string(),
                None => return Ok(true),
            },
        };

        debug!("Click {} -> {}", locator, target);
        if !self.pages.contains_key(&target) {
            return Err(self.fail(format!("no recorded page for {}", target)));
        }
        self.go(target);
        Ok(true)
    }

    fn back(&mut self) -> Result<(), ScrapeError> {
        match self.history.pop() {
            Some(previous) => {
                debug!("Back to {}", previous);
                self.current = Some(previous);
                Ok(())
            }
            None => Err(self.fail("no page to go back to".to_string())),
        }
    }

    fn html(&mut self) -> Result<String, ScrapeError> {
        let url = self.current.as_deref().unwrap_or("about:blank");
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| self.fail(format!("no recorded page for {}", url)))
    }

    fn current_url(&self) -> String {
        self.current
            .clone()
            .unwrap_or_else(|| "about:blank".to_string())
    }
}
