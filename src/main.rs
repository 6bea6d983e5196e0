use std::process::ExitCode;
use tessera::inspect::inspect_file;
use tessera::LogSeverity::{Error, Info};
use tessera::{log, CodecConfig, CodecContext, Result, TileRegistry};

fn load_context(config_path: Option<&String>) -> Result<CodecContext> {
    let config = match config_path {
        Some(path) => CodecConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CodecConfig::default(),
    };
    CodecContext::new(TileRegistry::vanilla(), config)
}

#[tokio::main]
async fn main() -> ExitCode {
    log("Tessera init".to_string(), Info);

    let args: Vec<String> = std::env::args().collect();
    let Some(capture_path) = args.get(1) else {
        log("Usage: tessera <capture file> [config.json]".to_string(), Error);
        return ExitCode::FAILURE;
    };

    let context = match load_context(args.get(2)) {
        Ok(context) => context,
        Err(e) => {
            log(format!("Failed to load config: {}", e), Error);
            return ExitCode::FAILURE;
        }
    };

    match inspect_file(capture_path, context).await {
        Ok(summary) => {
            log(
                format!(
                    "{} messages: {} sections, {} tile squares, {} tile edits, {} other",
                    summary.messages(),
                    summary.sections,
                    summary.tile_squares,
                    summary.tile_edits,
                    summary.other
                ),
                Info,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log(format!("Failed to read capture: {}", e), Error);
            ExitCode::FAILURE
        }
    }
}
