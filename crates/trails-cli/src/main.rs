//! trails - terminal front end for Brain-Trails flashcards.
//!
//! # Configuration
//!
//! - `TRAILS_API_URL` - API root, defaults to `http://localhost:5000/api`
//! - `TRAILS_TOKEN` - access token, or
//! - `TRAILS_USERNAME` / `TRAILS_PASSWORD` - credentials for a fresh login
//!
//! A `.env` file in the working directory is loaded first. Logs go to stderr;
//! set `RUST_LOG=trails_core=debug` to trace state transitions.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trails_client::{ApiClient, AuthClient};
use trails_core::{
    AuthSession, CardReview, ClientConfig, Credentials, DeckId, DeckManager, Registration,
};

mod review_loop;

#[derive(Parser, Debug)]
#[command(
    name = "trails",
    version,
    about = "Review Brain-Trails flashcards from the terminal",
    after_help = "Examples:\n  trails decks\n  trails create-deck Biology\n  trails add-card 3 \"Mitosis?\" \"Cell division\"\n  trails review 3\n"
)]
struct Cli {
    /// Config file (.toml, .json or .yaml); environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Access token
    #[arg(long, env = "TRAILS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Username or email for login
    #[arg(long, env = "TRAILS_USERNAME", global = true)]
    username: Option<String>,

    /// Password for login or registration
    #[arg(long, env = "TRAILS_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List decks with their card counts
    Decks,

    /// Create a deck
    CreateDeck {
        /// Deck name
        name: String,
    },

    /// Add a card to a deck
    AddCard {
        /// Deck ID
        deck_id: String,
        /// Question side
        question: String,
        /// Answer side
        answer: String,
    },

    /// Review a deck interactively (defaults to the first deck)
    Review {
        /// Deck ID
        deck_id: Option<String>,
    },

    /// Create an account; the password comes from TRAILS_PASSWORD
    Register {
        username: String,
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the review screen
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Register { username, email } => {
            let password = cli
                .password
                .as_deref()
                .context("Set TRAILS_PASSWORD to the new account's password")?;
            let message = AuthClient::new(&config)?
                .register(&Registration::new(username, email, password))
                .await?;
            println!("{}", message);
            Ok(())
        }
        command => {
            let session = open_session(
                cli.token.as_deref(),
                cli.username.as_deref(),
                cli.password.as_deref(),
                &config,
            )
            .await?;
            let api = Arc::new(ApiClient::new(&config, session)?);
            let review = CardReview::new(api.clone(), api.clone())
                .with_transition_delay(config.transition_delay());
            let manager = DeckManager::with_review(api.clone(), review);

            let result = run(command, &manager).await;

            drop(manager);
            if let Ok(api) = Arc::try_unwrap(api) {
                api.into_session().logout();
            }
            result
        }
    }
}

async fn run(command: Commands, manager: &DeckManager) -> Result<()> {
    match command {
        Commands::Decks => {
            let decks = manager.list_decks().await?;
            if decks.is_empty() {
                println!("No decks yet. Create one with `trails create-deck <name>`.");
            }
            for deck in decks {
                println!("{:>6}  {}  ({} cards)", deck.id, deck.name, deck.card_count);
            }
        }
        Commands::CreateDeck { name } => {
            let deck = manager.create_deck(&name).await?;
            println!("Created deck {} ({})", deck.name, deck.id);
        }
        Commands::AddCard {
            deck_id,
            question,
            answer,
        } => {
            manager.select_deck(&DeckId::from(deck_id)).await?;
            let card = manager.create_card(&question, &answer).await?;
            println!("Added card {}", card.id);
        }
        Commands::Review { deck_id } => {
            match deck_id {
                Some(id) => {
                    manager.list_decks().await?;
                    manager.select_deck(&DeckId::from(id)).await?;
                }
                None => {
                    manager.refresh().await?;
                }
            }
            if manager.active_deck().await.is_none() {
                bail!("No decks to review");
            }
            review_loop::run(manager).await?;
        }
        Commands::Register { .. } => bail!("register does not need a session"),
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

async fn open_session(
    token: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
    config: &ClientConfig,
) -> Result<AuthSession> {
    if let Some(token) = token {
        return Ok(AuthSession::from_token(token)?);
    }
    match (username, password) {
        (Some(username), Some(password)) => {
            let credentials = Credentials::new(username, password);
            Ok(AuthClient::new(config)?.login(&credentials).await?)
        }
        _ => bail!("Set TRAILS_TOKEN, or TRAILS_USERNAME and TRAILS_PASSWORD"),
    }
}
