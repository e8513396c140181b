use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Environment variable holding the log filter directive.
const ENV_LOG: &str = "AUTOMERGE_LOG";

#[derive(Parser)]
#[command(name = "automerge")]
#[command(version, about = "Browse GitHub issues and manage AI-generated fixes")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL. Overrides AUTOMERGE_API_URL and automerge.toml.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding automerge.toml and the stored session
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the GitHub login page
    Login {
        /// Print the login URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Show the current session, optionally completing a login
    Session {
        /// Redirect URL received after login (contains `user_id=`)
        #[arg(long, env = "AUTOMERGE_LAUNCH_URL")]
        url: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// List your repositories, or show one (owner/name)
    Repos { name: Option<String> },
    /// List issues across your repositories
    Issues {
        /// Only issues of this repository (owner/name)
        #[arg(short, long)]
        repo: Option<String>,
        /// Search in title and description
        #[arg(short, long)]
        search: Option<String>,
        /// Only issues carrying this label
        #[arg(short, long)]
        label: Option<String>,
        /// Only issues the AI can fix
        #[arg(long)]
        ai_fixable: bool,
    },
    /// Show an issue with its fixes
    Issue { id: u64 },
    /// Generate, submit or delete AI fixes
    Fix {
        #[command(subcommand)]
        command: FixCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum FixCommands {
    /// Generate a new fix for an issue
    Generate { issue: u64 },
    /// Submit a fix as a pull request
    Submit {
        issue: u64,
        fix: u64,
        /// Pull request message
        #[arg(short, long)]
        message: String,
    },
    /// Delete a fix that has not been submitted
    Delete {
        issue: u64,
        fix: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(&cli, command.clone());
    }

    let ctx = cmd::AppContext::new(&cli)?;
    match &cli.command {
        Commands::Login { no_browser } => cmd::cmd_login(&ctx, *no_browser)?,
        Commands::Session { url } => cmd::cmd_session(&ctx, url.as_deref()).await?,
        Commands::Logout => cmd::cmd_logout(&ctx)?,
        Commands::Repos { name } => cmd::cmd_repos(&ctx, name.as_deref()).await?,
        Commands::Issues {
            repo,
            search,
            label,
            ai_fixable,
        } => {
            cmd::cmd_issues(
                &ctx,
                repo.as_deref(),
                search.as_deref(),
                label.as_deref(),
                *ai_fixable,
            )
            .await?
        }
        Commands::Issue { id } => cmd::cmd_issue(&ctx, *id).await?,
        Commands::Fix { command } => cmd::cmd_fix(&ctx, command.clone()).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
