use std::fmt;

/// Which extractor was running when an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    News,
    FeaturedImage,
    Facts,
    Hemispheres,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::News => "news",
            Stage::FeaturedImage => "featured image",
            Stage::Facts => "facts",
            Stage::Hemispheres => "hemispheres",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("[{stage}] element `{selector}` not found on {url}")]
    NotFound {
        stage: Stage,
        url: String,
        selector: String,
    },

    #[error("[{stage}] invalid reference on {url}: {reason}")]
    InvalidReference {
        stage: Stage,
        url: String,
        reason: String,
    },

    #[error("[{stage}] data unavailable at {url}: {reason}")]
    DataUnavailable {
        stage: Stage,
        url: String,
        reason: String,
    },

    #[error("{}Browser error on {url}", prefix(.stage))]
    Browser {
        stage: Option<Stage>,
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{}Request to {url} failed", prefix(.stage))]
    Http {
        stage: Option<Stage>,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("Serialization error")]
    Json(#[from] serde_json::Error),

    #[error("Browser task failed")]
    Task(#[from] tokio::task::JoinError),
}

fn prefix(stage: &Option<Stage>) -> String {
    match stage {
        Some(stage) => format!("[{}] ", stage),
        None => String::new(),
    }
}

impl ScrapeError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ScrapeError::NotFound { stage, .. }
            | ScrapeError::InvalidReference { stage, .. }
            | ScrapeError::DataUnavailable { stage, .. } => Some(*stage),
            ScrapeError::Browser { stage, .. } | ScrapeError::Http { stage, .. } => *stage,
            _ => None,
        }
    }

    /// Tags a transport error with the extractor it happened in, unless it
    /// already names one.
    pub fn at(mut self, stage: Stage) -> Self {
        match &mut self {
            ScrapeError::Browser { stage: s, .. } | ScrapeError::Http { stage: s, .. } => {
                s.get_or_insert(stage);
            }
            _ => {}
        }
        self
    }
}
