//! CLI entry and dispatch.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TODO_HIVE_LOG";

#[derive(Parser)]
#[command(name = "todo-hive")]
#[command(version)]
#[command(about = "Terminal client for todo hive backends")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "TODO_HIVE_BASE_URL", value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout {
        /// Also forget the detected backend variant
        #[arg(long)]
        forget_backend: bool,
    },
    /// Show the signed-in user
    Whoami,
    /// Manage todos (Worker A backends)
    Todos {
        #[command(subcommand)]
        command: TodoCommands,
    },
    /// Inspect the session token
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Check backend liveness
    Health,
    /// Show the service description (Worker B backends)
    Info {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show session and backend status
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Interactive line-based client (default)
    Shell,
}

#[derive(clap::Subcommand)]
enum TodoCommands {
    /// List todos, newest first
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a todo
    Add {
        #[arg(value_name = "CONTENT")]
        content: String,
    },
}

#[derive(clap::Subcommand)]
enum TokenCommands {
    /// Print the stored token
    Show,
    /// Copy the stored token to the clipboard
    Copy,
    /// Ask the backend whether the stored token is valid (Worker B backends)
    Verify,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the backend base URL in the config file
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so command output stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, base_url } = cli;

    // Config commands must not need a loadable config, so the context is
    // built per command.
    let ctx = || commands::Context::load(base_url.as_deref());

    // default to the interactive shell
    let Some(command) = command else {
        return commands::shell::run(&ctx()?).await;
    };

    match command {
        Commands::Register { username, password } => {
            commands::auth::register(&ctx()?, &username, password).await
        }
        Commands::Login { username, password } => {
            commands::auth::login(&ctx()?, &username, password).await
        }
        Commands::Logout { forget_backend } => {
            commands::auth::logout(&ctx()?, forget_backend).await
        }
        Commands::Whoami => commands::auth::whoami(&ctx()?).await,
        Commands::Todos { command } => match command {
            TodoCommands::List { json } => commands::todos::list(&ctx()?, json).await,
            TodoCommands::Add { content } => commands::todos::add(&ctx()?, &content).await,
        },
        Commands::Token { command } => match command {
            TokenCommands::Show => commands::token::show(&ctx()?),
            TokenCommands::Copy => commands::token::copy(&ctx()?).await,
            TokenCommands::Verify => commands::token::verify(&ctx()?).await,
        },
        Commands::Health => commands::service::health(&ctx()?).await,
        Commands::Info { json } => commands::service::info(&ctx()?, json).await,
        Commands::Status => commands::service::status(&ctx()?),
        Commands::Shell => commands::shell::run(&ctx()?).await,
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
        },
    }
}
