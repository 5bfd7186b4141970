use super::ArticleSummary;
use crate::{utils, BrowserSession, ScrapeError, Stage};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

/// The teaser block grouping a news entry's title and summary.
pub const TEASER: &str = "div.list_text";
const TITLE: &str = "div.content_title";
const SUMMARY: &str = "div.article_teaser_body";

const E: &str = "Invalid selector";
lazy_static! {
    static ref TEASER_SEL: Selector = Selector::parse(TEASER).expect(E);
    static ref TITLE_SEL: Selector = Selector::parse(TITLE).expect(E);
    static ref SUMMARY_SEL: Selector = Selector::parse(SUMMARY).expect(E);
}

/// Visits the news listing and reads the newest article.
pub fn extract_news<S: BrowserSession>(
    session: &mut S,
    url: &str,
    wait: Duration,
) -> Result<ArticleSummary, ScrapeError> {
    read_newest(session, url, wait).map_err(|e| e.at(Stage::News))
}

fn read_newest<S: BrowserSession>(
    session: &mut S,
    url: &str,
    wait: Duration,
) -> Result<ArticleSummary, ScrapeError> {
    session.visit(url)?;
    if !session.wait_for(TEASER, wait)? {
        debug!("{} did not render within {:?}", TEASER, wait);
    }
    let html = session.html()?;
    parse_news(&Html::parse_document(&html), url)
}

/// Reads title and summary from the first teaser block of `doc`.
pub fn parse_news(doc: &Html, url: &str) -> Result<ArticleSummary, ScrapeError> {
    let teaser = doc
        .select(&TEASER_SEL)
        .next()
        .ok_or_else(|| not_found(url, TEASER))?;

    Ok(ArticleSummary {
        title: text_of(teaser, &TITLE_SEL, TITLE, url)?,
        summary: text_of(teaser, &SUMMARY_SEL, SUMMARY, url)?,
    })
}

fn text_of(
    teaser: ElementRef<'_>,
    selector: &Selector,
    css: &str,
    url: &str,
) -> Result<String, ScrapeError> {
    teaser
        .select(selector)
        .next()
        .map(|el| utils::clean_text(el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| not_found(url, css))
}

fn not_found(url: &str, selector: &str) -> ScrapeError {
    ScrapeError::NotFound {
        stage: Stage::News,
        url: url.to_string(),
        selector: selector.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const URL: &str = "https://mars.test/news";

    #[test]
    fn first_teaser_block_wins() {
        let html = fs::read_to_string("tests/htmls/news.html").expect("Invalid file path");
        let doc = Html::parse_document(&html);

        let news = parse_news(&doc, URL).unwrap();

        assert_eq!(
            news,
            ArticleSummary {
                title: "NASA's Perseverance Rover Lands Safely".to_string(),
                summary: "The six-wheeled robot touched down in Jezero Crater after a seven-month journey from Earth.".to_string(),
            }
        );
    }

    #[test]
    fn missing_teaser_is_not_found() {
        let doc = Html::parse_document("<html><body><ul class='item_list'></ul></body></html>");

        let err = parse_news(&doc, URL).unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::NotFound { stage: Stage::News, ref url, ref selector }
                if url == URL && selector == TEASER
        ));
    }

    #[test]
    fn unreachable_page_names_the_stage() {
        let mut session = crate::ReplaySession::new();

        let err = extract_news(&mut session, URL, Duration::ZERO).unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::Browser { stage: Some(Stage::News), ref url, .. } if url == URL
        ));
    }

    #[test]
    fn empty_summary_is_not_found() {
        let doc = Html::parse_document(
            r#"<div class="list_text">
                 <div class="content_title">Title</div>
                 <div class="article_teaser_body">   </div>
               </div>"#,
        );

        let err = parse_news(&doc, URL).unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::NotFound { ref selector, .. } if selector == SUMMARY
        ));
    }
}
