use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volley_stats::api::state::AppState;
use volley_stats::config::AppConfig;
use volley_stats::engine::{Command, MatchSession, MatchSummary, Outcome};
use volley_stats::models::{MatchId, MatchRules};
use volley_stats::storage::{MatchRepository, StorageConfig};

#[derive(Parser)]
#[command(name = "volley-stats")]
#[command(about = "Live volleyball match scoring and statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a JSON array of commands through a match session
    Replay {
        /// File containing the commands
        path: PathBuf,

        /// Persist into the data directory instead of memory
        #[arg(long)]
        persist: bool,
    },

    /// Browse completed matches
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List completed matches, most recent first
    List,

    /// Print the full report of a completed match
    Show {
        /// Match ID
        id: String,
    },

    /// Delete a completed match
    Delete {
        /// Match ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("loading config {}", cli.config))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting volley-stats v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = cli
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.clone());
    let storage = StorageConfig::new(data_dir);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let session = MatchSession::open(config.rules, MatchRepository::open(&storage));
            let state = AppState::new(session, config.server.cors_origin.clone());
            let app = volley_stats::api::build_router(state);

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Scoreboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Replay { path, persist } => {
            let repo = if persist {
                MatchRepository::open(&storage)
            } else {
                MatchRepository::in_memory()
            };
            replay(&path, config.rules, repo)?;
        }
        Commands::History { action } => {
            let repo = MatchRepository::open(&storage);
            run_history(action, &repo)?;
        }
    }

    Ok(())
}

fn replay(path: &Path, rules: MatchRules, repo: MatchRepository) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading commands from {}", path.display()))?;
    let commands: Vec<Command> =
        serde_json::from_str(&contents).context("parsing command list")?;

    let mut session = MatchSession::new(rules, repo);
    let mut ignored = 0;
    for (i, command) in commands.into_iter().enumerate() {
        let name = command.name();
        let outcome = session.apply(command);
        match &outcome {
            Outcome::Ignored => {
                ignored += 1;
                println!("{:>4}  {:<20} ignored", i + 1, name);
            }
            Outcome::Applied => {
                println!("{:>4}  {:<20} {}", i + 1, name, score_line(&session));
            }
            other => {
                println!(
                    "{:>4}  {:<20} {}",
                    i + 1,
                    name,
                    serde_json::to_string(other)?
                );
            }
        }
        if let Some(error) = session.last_error() {
            eprintln!("      persistence: {}", error);
        }
    }

    if ignored > 0 {
        tracing::warn!("{} command(s) were ignored", ignored);
    }

    if let Some(data) = session.engine().data() {
        let summary = MatchSummary::build(data);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn score_line(session: &MatchSession) -> String {
    let engine = session.engine();
    match engine.data() {
        Some(data) => {
            let score = engine.score();
            format!(
                "set {} {}-{} (sets {}-{})",
                data.current_set, score.own, score.rival, data.sets_won.own, data.sets_won.rival
            )
        }
        None => format!("{:?}", engine.view()),
    }
}

fn run_history(action: HistoryAction, repo: &MatchRepository) -> Result<()> {
    match action {
        HistoryAction::List => {
            let matches = repo.list_completed()?;
            if matches.is_empty() {
                println!("No completed matches.");
            }
            for data in &matches {
                let date = data
                    .date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "----------".to_string());
                println!(
                    "{}  {}  {} {}-{} {}  {}",
                    data.id,
                    date,
                    data.team_names.own,
                    data.sets_won.own,
                    data.sets_won.rival,
                    data.team_names.rival,
                    data.location
                );
            }
        }
        HistoryAction::Show { id } => {
            let id = MatchId::from(id.as_str());
            if !repo.is_completed(&id)? {
                anyhow::bail!("No completed match with id {}", id);
            }
            let data = repo
                .load(&id)?
                .with_context(|| format!("match {} could not be loaded", id))?;
            let summary = MatchSummary::build(&data);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        HistoryAction::Delete { id } => {
            let id = MatchId::from(id.as_str());
            if !repo.is_completed(&id)? {
                anyhow::bail!("No completed match with id {}", id);
            }
            repo.delete_completed(&id)?;
            if repo.last_active()?.as_ref() == Some(&id) {
                repo.clear_last_active()?;
            }
            println!("Deleted match {}", id);
        }
    }
    Ok(())
}
