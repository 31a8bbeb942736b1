//! Convert a persisted model to XGBoost JSON.
//!
//! Usage: `convert-model [input_model_path] [output_json_path]`
//!
//! Without arguments a sample review-interval model is trained and converted.
//! Log output goes to stderr and is filtered with `RUST_LOG` (default `warn`).
//! The progress report is printed to stdout. Failures, including a missing
//! input (`Error: File not found: <path>`), go to stderr with exit code 1.

use std::process::ExitCode;

use gbdt_convert::cli::{Invocation, default_output_path, run};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let result = default_output_path().and_then(|default_output| {
        let invocation = Invocation::from_args(std::env::args().skip(1), default_output);
        run(&invocation)
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
