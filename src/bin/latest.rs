use clap::Parser;
use mission_to_mars::MarsData;

/// Print the most recently stored scrape.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Read results from `<DB>.db`
    #[arg(long, default_value = "mars")]
    db: String,

    /// Print only the facts table, as HTML
    #[arg(long)]
    facts_html: bool,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,

    /// List every stored run instead
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| "warn,sqlx=warn".into()),
        )
        .init();

    let args = Args::parse();
    let store = MarsData::new(&args.db).await?;

    if args.history {
        for (id, title) in store.history().await? {
            println!("{}  {}", id, title);
        }
        return Ok(());
    }

    let Some(record) = store.latest().await? else {
        eprintln!("No runs stored in {}.db", args.db);
        std::process::exit(1);
    };

    if args.facts_html {
        println!("{}", record.facts.to_html());
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record);
    }

    Ok(())
}
