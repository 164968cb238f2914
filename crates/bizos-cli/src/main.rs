mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{artifact::ArtifactSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bizos",
    about = "AI Business OS wizard — track phase progress from idea to growth",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .bizos/)
    #[arg(long, global = true, env = "BIZOS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a wizard workspace in the current directory
    Init,

    /// Show progress for every phase
    Status,

    /// Show the recommended next phase
    Next,

    /// Mark a phase complete (phase1..phase5 or 1..5)
    Complete {
        phase: String,
        /// Mark the phase incomplete instead
        #[arg(long)]
        undo: bool,
    },

    /// Clear all phase progress
    Reset,

    /// Choose a business idea from a generation result
    Select {
        /// Business state JSON (founder, ideas, createdAt)
        #[arg(long)]
        business: PathBuf,
        /// Idea id to select (omit to list ideas)
        #[arg(long)]
        idea: Option<String>,
    },

    /// Show the current selection
    Selection,

    /// Manage generated phase outputs
    Artifact {
        #[command(subcommand)]
        subcommand: ArtifactSubcommand,
    },

    /// Follow progress changes from this and other processes
    Watch,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Next => cmd::next::run(&root, cli.json),
        Commands::Complete { phase, undo } => cmd::complete::run(&root, &phase, !undo, cli.json),
        Commands::Reset => cmd::complete::reset(&root, cli.json),
        Commands::Select { business, idea } => {
            cmd::select::run(&root, &business, idea.as_deref(), cli.json)
        }
        Commands::Selection => cmd::select::show(&root, cli.json),
        Commands::Artifact { subcommand } => cmd::artifact::run(&root, subcommand, cli.json),
        Commands::Watch => cmd::watch::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
