use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quiz_core::model::{ItemSet, QuizMode};
use services::{Clock, QuizServices};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod corpus;
mod driver;

use config::{AppConfig, FileConfig, prepare_sqlite_file};
use corpus::Corpus;
use driver::{Driver, Outcome};

#[derive(Parser)]
#[command(name = "quiz", version, about = "Resumable vocabulary quizzes over a JSON corpus")]
struct Cli {
    /// TOML config file
    #[arg(long, env = "QUIZ_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Database URL (e.g. sqlite:quiz.sqlite3)
    #[arg(long, env = "QUIZ_DB_URL", global = true)]
    db: Option<String>,

    /// Corpus root containing <level>/<set>.json files
    #[arg(long, env = "QUIZ_CORPUS_DIR", global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sets with saved progress per mode
    Sets,

    /// Play a set in the terminal
    Play {
        /// Set identity, <level>_<name>
        #[arg(long)]
        set: String,

        #[arg(long, default_value = "multiple-choice")]
        mode: QuizMode,

        /// Seed the shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Zero a set's progress; the next play starts with a fresh order
    Restart {
        #[arg(long)]
        set: String,

        #[arg(long, default_value = "multiple-choice")]
        mode: QuizMode,
    },

    /// Delete saved progress for a set (all modes unless --mode is given)
    Clear {
        #[arg(long)]
        set: String,

        #[arg(long)]
        mode: Option<QuizMode>,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,quiz=info,services=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let cfg = AppConfig::resolve(file, cli.db, cli.corpus)?;

    // Open + migrate SQLite here so the library crates never touch the filesystem layout.
    prepare_sqlite_file(&cfg.database_url)?;
    let services =
        QuizServices::new_sqlite_with(&cfg.database_url, cfg.sqlite, Clock::system(), cfg.policy)
            .await
            .with_context(|| format!("failed to open {}", cfg.database_url))?;
    let corpus = Corpus::load_dir(&cfg.corpus_dir)?;
    info!(db = %cfg.database_url, sets = corpus.sets().len(), "ready");

    match cli.command {
        Commands::Sets => list_sets(&services, &corpus).await,
        Commands::Play { set, mode, seed } => {
            let set = find_set(&corpus, &set)?;
            let mut quiz = match seed {
                Some(seed) => services.seeded_controller(seed),
                None => services.controller(),
            };
            let stdin = std::io::stdin();
            let mut driver = Driver::new(stdin.lock(), std::io::stdout());
            if driver.run(&mut quiz, set, mode).await? == Outcome::Quit {
                info!(set = %set.identity(), %mode, "quiz paused");
            }
            Ok(())
        }
        Commands::Restart { set, mode } => {
            let set = find_set(&corpus, &set)?;
            let store = services.session_store();
            match store.find(&set.identity(), mode).await? {
                Some(session) => {
                    store.restart(session.id()).await?;
                    println!("{} ({mode}) restarted.", set.identity());
                }
                None => println!("{} ({mode}) has no saved progress.", set.identity()),
            }
            Ok(())
        }
        Commands::Clear { set, mode } => {
            let set = find_set(&corpus, &set)?;
            let modes = mode.map_or_else(|| QuizMode::ALL.to_vec(), |m| vec![m]);
            let store = services.session_store();
            for mode in modes {
                let removed = store.clear(&set.identity(), mode).await?;
                let status = if removed { "cleared" } else { "nothing to clear" };
                println!("{} ({mode}): {status}", set.identity());
            }
            Ok(())
        }
    }
}

fn find_set<'a>(corpus: &'a Corpus, identity: &str) -> Result<&'a ItemSet> {
    corpus
        .find(identity)
        .with_context(|| format!("unknown set {identity}; run `quiz sets` to list them"))
}

async fn list_sets(services: &QuizServices, corpus: &Corpus) -> Result<()> {
    let store = services.session_store();
    for set in corpus.sets() {
        let mut line = format!("{:<32} {:>4} items", set.identity().as_str(), set.len());
        for mode in QuizMode::ALL {
            let progress = match store.find(&set.identity(), mode).await? {
                Some(session) => {
                    let s = session.snapshot();
                    format!("{}/{} score {}", s.current_index, s.total_questions, s.score)
                }
                None => "-".to_string(),
            };
            write!(line, "  {}: {progress}", mode.name())?;
        }
        println!("{line}");
    }
    Ok(())
}
