use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use termfolio::{
    constants, persona, relay_client, terminal, web_server, ChatSession, CompletionClient,
    Profile, RelayClient,
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the chat relay that forwards conversations to the completions provider.
    Serve {
        #[arg(long, env = "TERMFOLIO_PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the relay endpoint.")]
        port: u16,
        #[arg(long, env = "TERMFOLIO_MODEL", default_value = constants::DEFAULT_CHAT_MODEL, help = "Completion model name.")]
        model: String,
        #[arg(long, help = "JSON file overriding the built-in profile.")]
        profile: Option<PathBuf>,
    },
    /// Open the terminal chat window.
    Chat {
        #[command(flatten)]
        relay: RelayArgs,
    },
    /// Ask a single question and print the reply.
    Ask {
        #[arg(help = "The question to ask.")]
        question: String,
        #[command(flatten)]
        relay: RelayArgs,
    },
    /// Print the persona preamble sent ahead of every conversation.
    Persona {
        #[arg(long, help = "Date to embed (YYYY-MM-DD); defaults to today.")]
        date: Option<NaiveDate>,
        #[arg(long, help = "JSON file overriding the built-in profile.")]
        profile: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RelayArgs {
    #[arg(long, env = "TERMFOLIO_RELAY_URL", default_value = constants::DEFAULT_RELAY_URL, help = "Base URL of the chat relay.")]
    relay_url: String,
    #[arg(long, default_value_t = constants::DEFAULT_REQUEST_TIMEOUT.as_secs(), help = "Seconds to wait for a reply.")]
    timeout_secs: u64,
    #[arg(long, help = "JSON file overriding the built-in profile.")]
    profile: Option<PathBuf>,
}

impl RelayArgs {
    fn client(&self) -> Result<RelayClient> {
        RelayClient::new(&self.relay_url, Duration::from_secs(self.timeout_secs))
            .context("Failed to build relay client")
    }

    fn profile(&self) -> Result<Profile> {
        Profile::load_or_default(self.profile.as_deref())
    }
}

// Reads log level from RUST_LOG (e.g., RUST_LOG=info,termfolio=debug). The
// chat window owns the terminal, so it logs to a file instead of stderr.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or(path.as_os_str());
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
            None
        }
    }
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file =
        matches!(cli.command, Commands::Chat { .. }).then(|| Path::new(constants::LOG_FILE));
    let _guard = init_tracing(log_file);

    info!("termfolio starting with command: {:?}", cli.command);

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Serve { port, model, profile } => {
            let profile = Profile::load_or_default(profile.as_deref())?;
            if constants::OPENAI_API_KEY.is_empty() {
                warn!("OPENAI_API_KEY is not set; every reply will be the fallback message");
            }
            let completion = CompletionClient::new(
                constants::OPENAI_API_KEY.as_str(),
                constants::OPENAI_BASE_URL.as_str(),
                model,
            );
            let state = web_server::AppState::new(completion, &profile);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, state).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            // Pin the ctrl_c future to the stack so its address is stable
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { relay } => {
            let profile = relay.profile()?;
            terminal::run_chat(relay.client()?, &profile, today)
                .await
                .context("Chat session failed")?;
        }
        Commands::Ask { question, relay } => {
            let profile = relay.profile()?;
            let client = relay.client()?;
            let mut session = ChatSession::from_profile(&profile, today)?;
            if relay_client::exchange(&mut session, &client, &question).await {
                if let Some(reply) = session.transcript().last() {
                    println!("{}", reply.content);
                }
            } else {
                info!("Empty question; nothing sent");
            }
        }
        Commands::Persona { date, profile } => {
            let profile = Profile::load_or_default(profile.as_deref())?;
            let preamble = persona::build_persona_preamble(&profile, date.unwrap_or(today))?;
            println!("{}", preamble);
        }
    }

    Ok(())
}
