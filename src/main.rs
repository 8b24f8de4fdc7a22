use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tweet_sentiment::config::Config;
use tweet_sentiment::render;
use tweet_sentiment::twitter_client::TwitterClient;
use tweet_sentiment::{distribution, save, Burst, Dataset, SentimentSession, ThresholdPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Analyze this keyword once and exit; without it, read keywords from stdin.
    keyword: Option<String>,

    #[arg(
        short = 'n',
        long,
        default_value_t = 50,
        value_parser = clap::value_parser!(u16).range(1..=1000)
    )]
    max_results: u16,

    /// CSV destination; defaults to `{keyword}_tweets.csv`. Every burst in an interactive
    /// session overwrites this one file.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the breakdown of a previously saved CSV and exit.
    #[arg(long, conflicts_with = "keyword")]
    show: Option<PathBuf>,

    /// `dead-zone` or `zero`.
    #[arg(long)]
    policy: Option<ThresholdPolicy>,
}

fn display_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(100)
}

fn show_saved(path: &Path) -> Result<()> {
    let dataset =
        Dataset::load(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut stdout = stdout();
    println!("{} tweets in {}", dataset.len(), dataset.path.display());
    render::render_rows(&mut stdout, &dataset.rows, display_width())?;
    render::render_distribution(&mut stdout, &distribution(&dataset))?;
    Ok(())
}

async fn run_burst(
    session: &mut SentimentSession<TwitterClient>,
    keyword: &str,
    args: &Args,
) -> Result<()> {
    let mut stdout = stdout();

    let rows = match session.analyze(keyword, args.max_results as usize).await {
        Ok(Burst::Completed(rows)) => rows,
        Ok(Burst::Throttled(quota)) => {
            println!("{}", render::describe_quota(quota));
            return Ok(());
        }
        Err(tweet_sentiment::Error::InvalidInput(message)) => {
            println!("{message}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if rows.is_empty() {
        println!("No tweets found for that keyword.");
        return Ok(());
    }

    let path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_tweets.csv", keyword.trim())));
    let dataset = save(rows, &path, session.classifier())
        .with_context(|| format!("Failed to save {}", path.display()))?;

    println!("Analyzed {} tweets, saved to {}", dataset.len(), path.display());
    render::render_rows(&mut stdout, &dataset.rows, display_width())?;
    render::render_distribution(&mut stdout, &distribution(&dataset))?;
    println!("{}", render::describe_quota(session.quota()));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tweet_sentiment=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &args.show {
        return show_saved(path);
    }

    let mut config = Config::from_env()?;
    if let Some(policy) = args.policy {
        config.sentiment_policy = policy;
    }

    let mut session = SentimentSession::from_config(&config);
    tracing::info!(
        tokens = session.pool_size(),
        policy = ?session.classifier().policy(),
        "starting"
    );

    if let Some(keyword) = &args.keyword {
        return run_burst(&mut session, keyword, &args).await;
    }

    println!("{}", render::describe_quota(session.quota()));
    let mut lines = stdin().lock().lines();
    loop {
        print!("keyword> ");
        stdout().flush()?;
        // CR: blocking read on the runtime thread; fine while bursts are strictly sequential
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        match line.trim() {
            "" => continue,
            "q" | "quit" | "exit" => break,
            keyword => run_burst(&mut session, keyword, &args).await?,
        }
    }

    Ok(())
}
