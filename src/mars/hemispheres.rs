use super::{Control, HemisphereEntry};
use crate::{utils, BrowserSession, ScrapeError, Stage};
use lazy_static::lazy_static;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Entry links on the listing page, in listing order.
pub const ENTRY_LINKS: &str = "a.product-item h3";
const TITLE: &str = "h2.title";
/// Text of the link to the full-size image on a detail page.
const SAMPLE_LINK_TEXT: &str = "Sample";

/// Mars has four hemisphere mosaics on the listing.
pub const MAX_HEMISPHERES: usize = 4;

const E: &str = "Invalid selector";
lazy_static! {
    static ref TITLE_SEL: Selector = Selector::parse(TITLE).expect(E);
    static ref A: Selector = Selector::parse("a").expect(E);
}

/// Walks the listing: open entry i, read it, go back, repeat.
///
/// The listing is counted once, when it first renders, and reads at most
/// [`MAX_HEMISPHERES`] entries. Coming back to a listing that no longer
/// renders is an error, not a shorter list.
pub fn extract_hemispheres<S: BrowserSession>(
    session: &mut S,
    url: &str,
    wait: Duration,
) -> Result<Vec<HemisphereEntry>, ScrapeError> {
    walk_listing(session, url, wait).map_err(|e| e.at(Stage::Hemispheres))
}

fn walk_listing<S: BrowserSession>(
    session: &mut S,
    url: &str,
    wait: Duration,
) -> Result<Vec<HemisphereEntry>, ScrapeError> {
    session.visit(url)?;
    let available = if session.wait_for(ENTRY_LINKS, wait)? {
        session.count(ENTRY_LINKS)?
    } else {
        0
    };
    if available < MAX_HEMISPHERES {
        warn!(
            "Listing {} has {} entries, expected {}",
            url, available, MAX_HEMISPHERES
        );
    }

    let mut entries = Vec::with_capacity(MAX_HEMISPHERES);
    for i in 0..available.min(MAX_HEMISPHERES) {
        // Listing: open entry i.
        let locator = Control::HemisphereLink(i).locator();
        if !session.click(&locator)? {
            return Err(listing_lost(url, &locator.to_string()));
        }
        if !session.wait_for(TITLE, wait)? {
            debug!("{} did not render within {:?}", TITLE, wait);
        }

        // Detail: read it and go back.
        let detail_url = session.current_url();
        let html = session.html()?;
        let entry = parse_hemisphere(&Html::parse_document(&html), &detail_url)?;
        info!("[{}] {}", i + 1, entry.title);
        entries.push(entry);

        session.back()?;
        if !session.wait_for(ENTRY_LINKS, wait)? {
            return Err(listing_lost(url, ENTRY_LINKS));
        }
    }

    Ok(entries)
}

fn listing_lost(url: &str, selector: &str) -> ScrapeError {
    ScrapeError::NotFound {
        stage: Stage::Hemispheres,
        url: url.to_string(),
        selector: selector.to_string(),
    }
}

/// Reads the image link and heading of a hemisphere detail page. Relative
/// links are resolved against `url`.
pub fn parse_hemisphere(doc: &Html, url: &str) -> Result<HemisphereEntry, ScrapeError> {
    let link = doc
        .select(&A)
        .find(|a| utils::clean_text(a.text().collect::<String>()) == SAMPLE_LINK_TEXT)
        .ok_or_else(|| ScrapeError::NotFound {
            stage: Stage::Hemispheres,
            url: url.to_string(),
            selector: format!("a:text({})", SAMPLE_LINK_TEXT),
        })?;

    let invalid = |reason: String| ScrapeError::InvalidReference {
        stage: Stage::Hemispheres,
        url: url.to_string(),
        reason,
    };
    let href = link
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| invalid("sample link has no `href`".to_string()))?;
    let image_url = Url::parse(url)
        .and_then(|base| base.join(href))
        .map_err(|e| invalid(format!("cannot resolve `{}`: {}", href, e)))?;

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|h2| utils::clean_text(h2.text().collect::<String>()))
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ScrapeError::NotFound {
            stage: Stage::Hemispheres,
            url: url.to_string(),
            selector: TITLE.to_string(),
        })?;

    Ok(HemisphereEntry {
        image_url: image_url.to_string(),
        title,
    })
}
