use anyhow::{Context, Result};
use clap::Parser;
use poemfeed::util::{strip_control_chars, truncate_to_width};
use poemfeed::{
    Config, DecorationPicker, FeedController, FeedEngine, FeedOptions, JsonFileCache, NoopCache,
    Poem, PoemCache, SampleCorpus,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Column budget for rendered verse lines
const LINE_WIDTH: usize = 78;

/// Get the config directory path (~/.config/poemfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("poemfeed"))
}

#[derive(Parser, Debug)]
#[command(name = "poemfeed", about = "An endless feed of Persian poetry")]
struct Args {
    /// Config file (defaults to ~/.config/poemfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Size of the initial batch
    #[arg(long, value_name = "N")]
    count: Option<usize>,

    /// Extra pages to load after the initial batch
    #[arg(long, value_name = "N", default_value_t = 0)]
    pages: usize,

    /// Skip the network and use only local content
    #[arg(long)]
    offline: bool,

    /// Print a single random poem and exit
    #[arg(long)]
    one: bool,
}

fn print_poem(index: usize, poem: &Poem, decoration: Option<&str>) {
    let title = strip_control_chars(&poem.title);
    let poet = strip_control_chars(&poem.poet.name);
    let heading = format!("{}. {} ({})", index + 1, title, poet);
    println!("{}", truncate_to_width(&heading, LINE_WIDTH));
    if let Some(decoration) = decoration {
        println!("   [{}]", decoration);
    }
    for line in poem.plain_text.lines().filter(|l| !l.trim().is_empty()) {
        let line = strip_control_chars(line);
        println!("   {}", truncate_to_width(&line, LINE_WIDTH - 3));
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(count) = args.count {
        config.initial_batch_size = count.max(1);
    }

    let cache: Arc<dyn PoemCache> = if config.cache_enabled && !args.offline {
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }
        Arc::new(JsonFileCache::new(config_dir.join("cache.json")))
    } else {
        Arc::new(NoopCache)
    };

    let engine = if args.offline {
        FeedEngine::offline(Arc::new(SampleCorpus))
    } else {
        FeedEngine::from_config(&config, Arc::new(SampleCorpus), cache)
            .context("Failed to set up poetry API client")?
    };
    tracing::debug!(strategies = engine.strategy_count(), "Engine ready");

    if args.one {
        let poem = engine
            .fetch_one()
            .await
            .context("No poem available from any source")?;
        print_poem(0, &poem, None);
        return Ok(());
    }

    // A one-shot run has no scrolling to prewarm for
    let options = FeedOptions {
        prewarm_delay: None,
        min_refresh_display: std::time::Duration::ZERO,
        ..FeedOptions::from(&config)
    };
    let feed = FeedController::new(Arc::new(engine), DecorationPicker::default(), options);

    feed.load_initial().await;
    if let Some(err) = feed.snapshot().last_error {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    // Each page scrolls to the current tail, which trips the prefetch window
    for _ in 0..args.pages {
        let tail = feed.len().saturating_sub(1);
        if !feed.on_visible(tail).await {
            tracing::debug!(tail, "Tail trigger requested nothing");
        }
    }

    let snapshot = feed.snapshot();
    for (i, poem) in snapshot.poems.iter().enumerate() {
        print_poem(i, poem, snapshot.decorations.get(i).map(String::as_str));
    }
    tracing::info!(poems = snapshot.poems.len(), "Feed printed");
    Ok(())
}
