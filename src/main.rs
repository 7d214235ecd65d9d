use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use mygit::areas::repository::Repository;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mygit",
    version = "0.1.0",
    about = "A minimal content-addressed version control tool",
    long_about = "Stores file snapshots in a Git-compatible object database, \
    stages them through a binary index, and records a linear commit history.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(
        name = "add",
        about = "Add file contents to the index",
        long_about = "This command stages files for the next commit. \
        Directories are added recursively."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to add")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged files as a new commit. \
        The author is read from GIT_AUTHOR_NAME and GIT_AUTHOR_EMAIL."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "log",
        about = "Show commit logs",
        long_about = "This command lists the commits reachable from HEAD, newest first."
    )]
    Log,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn open_repository(path: Option<&str>) -> Result<Repository> {
    let path = match path {
        Some(path) => path.to_string(),
        None => std::env::current_dir()?.to_string_lossy().to_string(),
    };

    Repository::new(&path, Box::new(std::io::stdout()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let mut repository = open_repository(path.as_deref())?;
            repository.init().await?;
        }
        Commands::Add { paths } => {
            let mut repository = open_repository(None)?;
            repository.add(paths).await?;
        }
        Commands::Commit { message } => {
            let mut repository = open_repository(None)?;
            repository.commit(message.trim()).await?;
        }
        Commands::Log => {
            let mut repository = open_repository(None)?;
            repository.log().await?;
        }
    }

    Ok(())
}
