pub mod facts;
pub mod hemispheres;
pub mod image;
pub mod news;

mod data;

pub use data::{MarsData, ResultTable};
pub use facts::{Fact, FactsTable};

use crate::{session::Locator, utils, Browsed};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where each piece of the record is scraped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub news_url: String,
    pub gallery_url: String,
    /// Prefix for the relative path of the full-size featured image.
    pub image_base_url: String,
    pub facts_url: String,
    pub hemispheres_url: String,
}

pub const NEWS_URL: &str = "https://mars.nasa.gov/news";
pub const IMAGE_BASE_URL: &str = "https://data-class-jpl-space.s3.amazonaws.com/JPL_Space/";
pub const GALLERY_URL: &str = "https://data-class-jpl-space.s3.amazonaws.com/JPL_Space/index.html";
pub const FACTS_URL: &str = "http://space-facts.com/mars/";
pub const HEMISPHERES_URL: &str =
    "https://data-class-mars-hemispheres.s3.amazonaws.com/Mars_Hemispheres/index.html";

impl Default for Targets {
    fn default() -> Self {
        Targets {
            news_url: NEWS_URL.to_string(),
            gallery_url: GALLERY_URL.to_string(),
            image_base_url: IMAGE_BASE_URL.to_string(),
            facts_url: FACTS_URL.to_string(),
            hemispheres_url: HEMISPHERES_URL.to_string(),
        }
    }
}

/// Interactive controls the extractors press, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Opens the full-resolution view of the featured image.
    FullImageButton,
    /// The i-th entry on the hemisphere listing.
    HemisphereLink(usize),
}

impl Control {
    pub fn locator(&self) -> Locator {
        match self {
            // The first button on the gallery page is the nav toggle.
            Control::FullImageButton => Locator::new("button", 1),
            Control::HemisphereLink(i) => Locator::new(hemispheres::ENTRY_LINKS, *i),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HemisphereEntry {
    pub image_url: String,
    pub title: String,
}

/// Everything one run collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub news: ArticleSummary,
    pub featured_image: FeaturedImage,
    pub facts: FactsTable,
    pub hemispheres: Vec<HemisphereEntry>,
    pub last_modified: DateTime<FixedOffset>,
}

impl ResultRecord {
    pub fn assemble(browsed: Browsed, facts: FactsTable) -> Self {
        let Browsed {
            news,
            featured_image,
            hemispheres,
        } = browsed;
        ResultRecord {
            news,
            featured_image,
            facts,
            hemispheres,
            last_modified: utils::get_now(),
        }
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Last Modified   : {}", self.last_modified)?;
        writeln!(f, "News Title      : {}", self.news.title)?;
        writeln!(f, "News Summary    : {}", self.news.summary)?;
        writeln!(f, "Featured Image  : {}", self.featured_image.url)?;
        writeln!(f, "Facts           : ")?;
        for fact in self.facts.iter() {
            writeln!(f, "> {:<24} {}", fact.description, fact.mars)?;
        }
        writeln!(f, "Hemispheres     : ")?;
        for h in &self.hemispheres {
            writeln!(f, "> {}", h.title)?;
            writeln!(f, "  {}", h.image_url)?;
        }

        Ok(())
    }
}
