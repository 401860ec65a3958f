use crate::api_connection::endpoints::DEFAULT_MODEL;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the food photo to analyze
    pub image_file: String,

    /// Gemini model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[arg(long, default_value = "GEMINI_API_KEY")]
    pub api_key_env: String,

    /// Print the raw analysis JSON instead of the rendered report
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
