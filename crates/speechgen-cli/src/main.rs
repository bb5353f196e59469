//! generate-speech - turn text into an audio file with whatever the host provides
//!
//! Prints exactly one JSON object on stdout and exits 0 on success, 1 otherwise.
//! Logs go to stderr.

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;
mod settings;

use speechgen_core::{Orchestrator, SynthesisRequest};

#[derive(Parser, Debug)]
#[command(name = "generate-speech", version)]
#[command(about = "Synthesize speech with a neural engine, falling back to the OS voice", long_about = None)]
struct Cli {
    /// Text to speak
    #[arg(required_unless_present = "capabilities", allow_hyphen_values = true)]
    text: Option<String>,

    /// Where to write the audio; the extension selects the container
    #[arg(required_unless_present = "capabilities")]
    output_path: Option<PathBuf>,

    /// Neural model to try first
    engine_id: Option<String>,

    /// Extra configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report which engines and converters this host can use, then exit
    #[arg(long)]
    capabilities: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generate_speech=info,speechgen_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => return output::emit(&output::usage_error(e.to_string().trim())),
    };

    let config = match settings::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return output::emit(&output::config_error(&e)),
    };
    debug!("Configuration: {:?}", config);

    let orchestrator = Orchestrator::new(&config);

    if cli.capabilities {
        output::print_json(&orchestrator.capabilities());
        return ExitCode::SUCCESS;
    }

    let (Some(text), Some(output_path)) = (cli.text, cli.output_path) else {
        return output::emit(&output::usage_error("missing <text> or <output_path>"));
    };
    let engine_id = cli
        .engine_id
        .unwrap_or_else(|| config.primary.default_model.clone());

    let request = match SynthesisRequest::new(text, output_path, engine_id) {
        Ok(request) => request,
        Err(e) => return output::emit(&output::usage_error(e.to_string())),
    };

    info!(
        "Synthesizing to {} with {}",
        request.output_path().display(),
        request.engine_id()
    );
    let result = orchestrator.synthesize(&request).await;
    output::emit(&result)
}
