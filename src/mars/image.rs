use super::{Control, FeaturedImage};
use crate::{BrowserSession, ScrapeError, Stage};
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// The image shown once the full-resolution view is open.
pub const FULL_IMAGE: &str = "img.fancybox-image";

lazy_static! {
    static ref FULL_IMAGE_SEL: Selector = Selector::parse(FULL_IMAGE).expect("Invalid selector");
}

/// Visits the gallery, opens the full-resolution view and composes the
/// absolute URL of the featured image.
pub fn extract_featured_image<S: BrowserSession>(
    session: &mut S,
    gallery_url: &str,
    base_url: &str,
    wait: Duration,
) -> Result<FeaturedImage, ScrapeError> {
    read_full_image(session, gallery_url, base_url, wait)
        .map_err(|e| e.at(Stage::FeaturedImage))
}

fn read_full_image<S: BrowserSession>(
    session: &mut S,
    gallery_url: &str,
    base_url: &str,
    wait: Duration,
) -> Result<FeaturedImage, ScrapeError> {
    session.visit(gallery_url)?;
    open_full_resolution_view(session, gallery_url)?;
    if !session.wait_for(FULL_IMAGE, wait)? {
        debug!("{} did not render within {:?}", FULL_IMAGE, wait);
    }

    let html = session.html()?;
    let relative = parse_image_path(&Html::parse_document(&html), gallery_url)?;

    Ok(FeaturedImage {
        url: compose_url(base_url, &relative),
    })
}

pub fn open_full_resolution_view<S: BrowserSession>(
    session: &mut S,
    gallery_url: &str,
) -> Result<(), ScrapeError> {
    let locator = Control::FullImageButton.locator();
    if session.click(&locator)? {
        Ok(())
    } else {
        Err(ScrapeError::NotFound {
            stage: Stage::FeaturedImage,
            url: gallery_url.to_string(),
            selector: locator.to_string(),
        })
    }
}

/// Reads the relative `src` of the full-size image.
pub fn parse_image_path(doc: &Html, url: &str) -> Result<String, ScrapeError> {
    let invalid = |reason: &str| ScrapeError::InvalidReference {
        stage: Stage::FeaturedImage,
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let img = doc
        .select(&FULL_IMAGE_SEL)
        .next()
        .ok_or_else(|| invalid("no `img.fancybox-image` after opening the full view"))?;

    match img.value().attr("src").map(str::trim) {
        Some(src) if !src.is_empty() => Ok(src.to_string()),
        _ => Err(invalid("full-size image has no `src`")),
    }
}

/// Joins `base` and `relative` by plain concatenation, dropping one slash
/// if both sides carry it.
pub fn compose_url(base: &str, relative: &str) -> String {
    if base.ends_with('/') && relative.starts_with('/') {
        format!("{}{}", base, &relative[1..])
    } else {
        format!("{}{}", base, relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReplaySession;
    use pretty_assertions::assert_eq;
    use std::fs;

    const GALLERY: &str = "https://images.test/space/index.html";
    const GALLERY_FULL: &str = "https://images.test/space/index.html#full";

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("tests/htmls/{}", name)).expect("Invalid file path")
    }

    #[test]
    fn compose_concatenates_base_and_path() {
        assert_eq!(
            compose_url("https://example.com/", "image/full.jpg"),
            "https://example.com/image/full.jpg"
        );
        assert_eq!(
            compose_url("https://example.com/", "/image/full.jpg"),
            "https://example.com/image/full.jpg"
        );
    }

    #[test]
    fn opens_full_view_then_reads_source() {
        let mut session = ReplaySession::new()
            .with_page(GALLERY, fixture("gallery.html"))
            .with_page(GALLERY_FULL, fixture("gallery_full.html"))
            .with_transition(GALLERY, Control::FullImageButton.locator(), GALLERY_FULL);

        let image = extract_featured_image(
            &mut session,
            GALLERY,
            "https://example.com/",
            Duration::ZERO,
        )
        .unwrap();

        assert_eq!(image.url, "https://example.com/image/featured/mars2.jpg");
    }

    #[test]
    fn missing_image_after_transition_is_invalid_reference() {
        // The second button exists but opens nothing.
        let mut session = ReplaySession::new().with_page(GALLERY, fixture("gallery.html"));

        let err = extract_featured_image(
            &mut session,
            GALLERY,
            "https://example.com/",
            Duration::ZERO,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::InvalidReference { stage: Stage::FeaturedImage, .. }
        ));
    }

    #[test]
    fn missing_button_is_not_found() {
        let mut session =
            ReplaySession::new().with_page(GALLERY, "<html><body><button>Menu</button></body></html>");

        let err = extract_featured_image(
            &mut session,
            GALLERY,
            "https://example.com/",
            Duration::ZERO,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::NotFound { ref selector, .. } if selector == "button[1]"
        ));
    }

    #[test]
    fn broken_transition_names_the_stage() {
        // The full view points at a page that was never recorded.
        let mut session = ReplaySession::new()
            .with_page(GALLERY, fixture("gallery.html"))
            .with_transition(GALLERY, Control::FullImageButton.locator(), GALLERY_FULL);

        let err = extract_featured_image(
            &mut session,
            GALLERY,
            "https://example.com/",
            Duration::ZERO,
        )
        .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::FeaturedImage));
        assert!(matches!(err, ScrapeError::Browser { .. }));
    }

    #[test]
    fn empty_src_is_invalid_reference() {
        let doc = Html::parse_document(r#"<img class="fancybox-image" src="  ">"#);
        assert!(matches!(
            parse_image_path(&doc, GALLERY),
            Err(ScrapeError::InvalidReference { .. })
        ));
    }
}
