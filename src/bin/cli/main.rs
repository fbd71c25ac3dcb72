mod commands;
mod render;

use std::io::IsTerminal;

use anyhow::Context;
use cardstack_lib::{AppContext, Config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cardstack", about = "Flashcard sets with AI elaborations", version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Enter or leave demo mode (local storage, no account)
    #[command(subcommand)]
    Demo(DemoCommand),

    /// Sign in with email and password
    Login {
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,
        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// List your card sets
    Sets,

    /// Create a card set
    Create {
        /// Set title
        title: String,
        /// A card as "front::back"; repeat for more cards
        #[arg(long = "card", required = true)]
        cards: Vec<String>,
    },

    /// Print every card of a set
    Show {
        /// Set id or /flashcards/<id> path
        set: String,
    },

    /// Review a set interactively
    Review {
        /// Set id or /flashcards/<id> path
        set: String,
    },

    /// Elaborate on one card of a set
    Elaborate {
        /// Set id or /flashcards/<id> path
        set: String,
        /// Card number, starting at 1
        number: usize,
    },

    /// Delete a set and its cards
    Delete {
        /// Set id or /flashcards/<id> path
        set: String,
    },
}

#[derive(Subcommand)]
enum DemoCommand {
    /// Switch to demo mode
    Enter,
    /// Leave demo mode
    Exit,
}

/// Read a password line from stdin when not given on the command line
fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_line(&mut buf)
        .context("Failed to read password")?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    let config = Config::load().context("Failed to load config")?;
    let mut app = AppContext::init(config).context("Failed to start")?;

    match cli.command {
        Command::Demo(DemoCommand::Enter) => {
            commands::demo::run_enter(&mut app, &cli.format)?;
        }
        Command::Demo(DemoCommand::Exit) => {
            commands::demo::run_exit(&mut app, &cli.format)?;
        }
        Command::Login { email, password } => {
            let password = resolve_password(password)?;
            commands::auth::run_login(&mut app, &email, &password, &cli.format).await?;
        }
        Command::Signup { email, password } => {
            let password = resolve_password(password)?;
            commands::auth::run_signup(&mut app, &email, &password, &cli.format).await?;
        }
        Command::Logout => {
            commands::auth::run_logout(&mut app, &cli.format)?;
        }
        Command::Whoami => {
            commands::auth::run_whoami(&app, &cli.format)?;
        }
        Command::Sets => {
            commands::sets::run(&app, &cli.format, use_color).await?;
        }
        Command::Create { title, cards } => {
            commands::create::run(&app, &title, &cards, &cli.format).await?;
        }
        Command::Show { set } => {
            commands::show::run(&app, commands::set_id_arg(&set), &cli.format, use_color).await?;
        }
        Command::Review { set } => {
            commands::review::run(&app, commands::set_id_arg(&set), use_color).await?;
        }
        Command::Elaborate { set, number } => {
            commands::review::run_elaborate(&app, commands::set_id_arg(&set), number, &cli.format).await?;
        }
        Command::Delete { set } => {
            commands::delete::run(&app, commands::set_id_arg(&set), &cli.format).await?;
        }
    }

    Ok(())
}
