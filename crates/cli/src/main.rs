use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::render;
use cli::repl::{self, Command, Reply, Session};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use viewer_core::config;
use viewer_core::controller::{ResultSetController, SubmitOutcome};
use viewer_core::services;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    init_tracing(&cfg.logging.level);

    let ctl = services::build_controller(&cfg)?;
    match cli.command {
        Commands::Search { query, json } => run_search(ctl, &query, json).await,
        Commands::Browse => run_browse(ctl).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser)]
#[command(name = "smarn")]
#[command(about = "Search screenshots and browse the matches", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print the result grid
    Search {
        /// Free-text query
        query: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive search, grid and viewer
    Browse,
}

async fn run_search(ctl: ResultSetController, query: &str, json: bool) -> Result<()> {
    match ctl.submit_query(query).await {
        SubmitOutcome::Applied(_) => {}
        SubmitOutcome::Failed(message) => anyhow::bail!(message),
        SubmitOutcome::Superseded => return Ok(()),
    }
    let Some(grid) = ctl.grid() else {
        return Ok(());
    };
    repl::load_thumbnails(&grid).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&render::grid_json(&grid))?);
    } else {
        println!("{}", render::render_grid(&grid));
    }
    Ok(())
}

async fn run_browse(ctl: ResultSetController) -> Result<()> {
    let mut session = Session::new(ctl);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(b"type help for commands\n> ").await?;
    stdout.flush().await?;
    while let Some(line) = lines.next_line().await? {
        let out = match Command::parse(&line) {
            Ok(cmd) => match session.execute(cmd).await? {
                Reply::Text(text) => text,
                Reply::Quit => break,
            },
            Err(e) => e,
        };
        if !out.is_empty() {
            stdout.write_all(out.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
