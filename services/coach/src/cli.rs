use clap::Parser;
use std::path::PathBuf;

/// Interactive MBTI discovery and relationship coaching.
#[derive(Debug, Parser)]
#[command(name = "mbti-coach", version, about)]
pub struct Cli {
    /// Assistant profiles JSON (overrides PROFILES_PATH).
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Directory of prompt overrides (overrides PROMPTS_PATH).
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Chat model identifier (overrides CHAT_MODEL).
    #[arg(long)]
    pub model: Option<String>,

    /// Disable coloured output.
    #[arg(long)]
    pub no_color: bool,

    /// Print the session outcome as JSON when the session ends.
    #[arg(long)]
    pub json: bool,
}
