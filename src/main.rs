use clap::Parser;
use mission_to_mars::{mars, BrowserOptions, ChromeSession, MarsData, Targets};
use std::time::Duration;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Scrape the latest Mars news, featured image, facts and hemisphere images.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = mars::NEWS_URL)]
    news_url: String,

    #[arg(long, default_value = mars::GALLERY_URL)]
    gallery_url: String,

    /// Prefix for the featured image's relative path
    #[arg(long, default_value = mars::IMAGE_BASE_URL)]
    image_base_url: String,

    #[arg(long, default_value = mars::FACTS_URL)]
    facts_url: String,

    #[arg(long, default_value = mars::HEMISPHERES_URL)]
    hemispheres_url: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// How long to wait for each page to render, in milliseconds
    #[arg(long, default_value_t = 1000)]
    wait_ms: u64,

    /// Store results in `<DB>.db`
    #[arg(long, default_value = "mars")]
    db: String,

    /// Do not store the results
    #[arg(long)]
    no_store: bool,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();
    let targets = Targets {
        news_url: args.news_url,
        gallery_url: args.gallery_url,
        image_base_url: args.image_base_url,
        facts_url: args.facts_url,
        hemispheres_url: args.hemispheres_url,
    };
    let options = BrowserOptions {
        headless: !args.headed,
        render_wait: Duration::from_millis(args.wait_ms),
    };

    let client = reqwest::Client::new();
    let wait = options.render_wait;
    let record =
        mission_to_mars::scrape(&client, targets, wait, move || ChromeSession::launch(&options))
            .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record);
    }

    if !args.no_store {
        let store = MarsData::new(&args.db).await?;
        store.save(&record).await?;
        info!("Saved run {} to {}.db", record.last_modified, args.db);
    }

    Ok(())
}
