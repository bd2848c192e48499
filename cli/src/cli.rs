use clap::Parser;
use libpixgrab::{
    init_fetch, FetchConfig, RunSummary, Update, DEFAULT_OUTPUT_DIR, DEFAULT_PAUSE_MS,
    DEFAULT_PER_PAGE,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::channel;

const API_KEY_VAR: &str = "PIXABAY_API_KEY";
const MAX_BUFFER_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A bulk Pixabay image fetcher",
    long_about = "Fetches one page of photo results per palette color from the Pixabay API \
    and saves the 300px rendition of each result locally, named by its id."
)]
pub struct Cli {
    #[arg(default_value = DEFAULT_OUTPUT_DIR, help = "Directory the images are saved into.")]
    output_directory: PathBuf,
    #[arg(long, help = "Number of results requested per color. Defaults to 40.")]
    per_page: Option<u8>,
    #[arg(
        long,
        help = "Pause between download attempts in milliseconds. Defaults to 50."
    )]
    pause_ms: Option<u64>,
}

/// A missing or empty credential is a fatal misconfiguration.
fn api_key_from_env() -> Option<String> {
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.is_empty() => Some(key),
        _ => None,
    }
}

pub async fn fetch(cli: Cli) {
    let api_key = match api_key_from_env() {
        Some(key) => key,
        None => {
            eprintln!("{} is not set. Set it to your Pixabay API key.", API_KEY_VAR);
            std::process::exit(1);
        }
    };

    let mut config = FetchConfig::new(api_key);
    config.output_dir = cli.output_directory;
    config.per_page = cli.per_page.unwrap_or(DEFAULT_PER_PAGE);
    config.pause = Duration::from_millis(cli.pause_ms.unwrap_or(DEFAULT_PAUSE_MS));

    println!("Started");
    let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
    let fetch_task = tokio::spawn(async move { init_fetch(&config, tx).await });

    while let Some(update) = rx.recv().await {
        match update {
            Update::MessageUpdate(msg) => {
                if msg.is_error {
                    println!("{}", msg.content.red());
                } else {
                    println!("{}", msg.content);
                }
            }
            Update::SavedUpdate(saved) => {
                println!(
                    "[Saved] {} @ {} {} bytes",
                    saved.id, saved.file, saved.bytes_written
                );
            }
        };
    }

    match fetch_task.await {
        Ok(summary) => print_summary(&summary),
        Err(e) => println!("{}", format!("Fetch task panicked : {}", e).red()),
    }
    println!("Finished");
}

fn print_summary(summary: &RunSummary) {
    println!("Summary :");
    for color in summary.colors.iter() {
        if color.search_failed {
            println!("  {:<9} : {}", color.color, "search failed".red());
        } else {
            println!(
                "  {:<9} : {} saved, {} failed of {} attempted",
                color.color,
                color.succeeded.green(),
                color.failed.red(),
                color.attempted
            );
        }
    }
    println!(
        "Total : {} saved, {} failed of {} attempted",
        summary.succeeded().green(),
        summary.failed().red(),
        summary.attempted()
    );
}
