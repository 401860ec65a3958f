use anyhow::{anyhow, Context, Result};
use log::debug;
use nutriscan::analysis::GeminiAnalyzer;
use nutriscan::api_connection::GeminiClient;
use nutriscan::cli::parse_args;
use nutriscan::controller::AppController;
use nutriscan::{encoder, report};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli_args = parse_args();

    let client = GeminiClient::from_env(&cli_args.api_key_env, &cli_args.model)
        .map_err(|e| anyhow!("Failed to configure analysis client: {}", e))?;
    let mut controller = AppController::new(Box::new(GeminiAnalyzer::new(client)));

    let encoded = match encoder::encode(Path::new(&cli_args.image_file)).await? {
        Some(encoded) => encoded,
        None => {
            // Non-image input is skipped without user-facing output.
            debug!("'{}' is not an image file; nothing to do", cli_args.image_file);
            return Ok(());
        }
    };

    controller.submit(&encoded).await;

    if cli_args.json {
        if let Some(result) = &controller.state().result {
            let json = serde_json::to_string_pretty(result)
                .context("Failed to serialize analysis result")?;
            println!("{}", json);
            return Ok(());
        }
    }

    print!("{}", report::render(controller.state()));
    Ok(())
}
