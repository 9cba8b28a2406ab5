//! Main Entrypoint for the MBTI Coach
//!
//! This binary is responsible for:
//! 1. Parsing the command line and loading configuration from the environment.
//! 2. Initializing logging (to stderr, so it never mixes with the conversation).
//! 3. Loading persona profiles and prompts, and building the model client.
//! 4. Running one coaching session on the terminal.

use anyhow::Context;
use clap::Parser;
use mbti_coach::{app, cli::Cli, config::Config};
use mbti_core::{CoachSession, SessionSettings, console::TerminalConsole};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;
    config.apply_cli(&cli);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    if cli.no_color {
        colored::control::set_override(false);
    }
    info!(model = %config.chat_model, profiles = %config.profiles_path.display(), "Configuration loaded");

    // --- 3. Initialize Session Dependencies ---
    let profiles = app::load_profiles(&config);
    let prompts = app::load_prompts(&config)?;
    let llm_client = app::build_llm_client(&config);

    // --- 4. Run the Session ---
    let mut session = CoachSession::new(
        llm_client,
        TerminalConsole::stdio(),
        profiles,
        prompts,
        SessionSettings::default(),
    );
    let outcome = session.run().await.context("Coaching session ended early")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    info!("Session complete.");
    Ok(())
}
