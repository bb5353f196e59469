//! JSON output on stdout

use serde::Serialize;
use std::process::ExitCode;

use speechgen_core::SynthesisResult;

pub const USAGE: &str = "Usage: generate-speech <text> <output_path> [engine_id]";

/// Failure for a malformed invocation
pub fn usage_error(detail: impl Into<String>) -> SynthesisResult {
    SynthesisResult::failure_with_diagnostic(USAGE, detail)
}

/// Failure for a configuration that could not be loaded
pub fn config_error(err: &anyhow::Error) -> SynthesisResult {
    SynthesisResult::failure_with_diagnostic(err.to_string(), format!("{:#}", err))
}

/// Print `result` as one JSON line and map it to the exit status
pub fn emit(result: &SynthesisResult) -> ExitCode {
    print_json(result);
    ExitCode::from(result.exit_code())
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let fallback = serde_json::json!({
                "success": false,
                "error": format!("Failed to encode result: {}", e),
            });
            println!("{}", fallback);
        }
    }
}
