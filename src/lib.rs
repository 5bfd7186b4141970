use std::time::Duration;
use tracing::{debug, info};

pub mod mars;
pub mod session;

mod error;
mod utils;

pub use error::{ScrapeError, Stage};
pub use mars::{
    ArticleSummary, FactsTable, FeaturedImage, HemisphereEntry, MarsData, ResultRecord, Targets,
};
pub use session::{BrowserOptions, ChromeSession, Locator, ReplaySession};

/// One live page plus its navigation history.
///
/// Extractors only talk to the browser through this trait, so the same
/// extraction code runs against Chrome or against recorded pages.
pub trait BrowserSession {
    fn visit(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Waits up to `timeout` for `css` to match. `false` is not an error:
    /// the caller decides whether a missing element matters.
    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<bool, ScrapeError>;

    fn count(&mut self, css: &str) -> Result<usize, ScrapeError>;

    /// Clicks the element addressed by `locator`. Returns `false` when no
    /// such element exists.
    fn click(&mut self, locator: &Locator) -> Result<bool, ScrapeError>;

    fn back(&mut self) -> Result<(), ScrapeError>;
    fn html(&mut self) -> Result<String, ScrapeError>;
    fn current_url(&self) -> String;
}

/// Everything gathered with the browser, before the facts table joins it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browsed {
    pub news: ArticleSummary,
    pub featured_image: FeaturedImage,
    pub hemispheres: Vec<HemisphereEntry>,
}

/// Runs the browser-bound extractors one after another on a single session.
pub fn browse<S: BrowserSession>(
    session: &mut S,
    targets: &Targets,
    wait: Duration,
) -> Result<Browsed, ScrapeError> {
    let news = mars::news::extract_news(session, &targets.news_url, wait)?;
    info!("News: {}", news.title);

    let featured_image = mars::image::extract_featured_image(
        session,
        &targets.gallery_url,
        &targets.image_base_url,
        wait,
    )?;
    info!("Featured image: {}", featured_image.url);

    let hemispheres =
        mars::hemispheres::extract_hemispheres(session, &targets.hemispheres_url, wait)?;
    info!("Hemispheres: {}", hemispheres.len());

    Ok(Browsed {
        news,
        featured_image,
        hemispheres,
    })
}

/// Scrapes every target once and assembles the record.
///
/// `open_session` runs on a blocking thread, and the session it returns
/// lives there for the whole browsing pass. It is dropped (closing the
/// browser) on every exit path. The facts table needs no browser and is
/// fetched concurrently. The first error from either side is returned.
pub async fn scrape<S, F>(
    client: &reqwest::Client,
    targets: Targets,
    wait: Duration,
    open_session: F,
) -> Result<ResultRecord, ScrapeError>
where
    S: BrowserSession,
    F: FnOnce() -> Result<S, ScrapeError> + Send + 'static,
{
    let (browsed, facts) = tokio::try_join!(
        run_browser(targets.clone(), wait, open_session),
        mars::facts::fetch_facts(client, &targets.facts_url),
    )?;

    debug!("All extractors finished");
    Ok(ResultRecord::assemble(browsed, facts))
}

async fn run_browser<S, F>(
    targets: Targets,
    wait: Duration,
    open_session: F,
) -> Result<Browsed, ScrapeError>
where
    S: BrowserSession,
    F: FnOnce() -> Result<S, ScrapeError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut session = open_session()?;
        browse(&mut session, &targets, wait)
    })
    .await?
}
