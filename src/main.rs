//! Thumbflow - Incremental Directory Thumbnail Streamer
//!
//! Entry point for the thumbflow CLI application.

use clap::Parser;
use thumbflow::{
    cli::Cli,
    error::{ExitCode, StructuredError},
    stream::StreamError,
    thumbs::ThumbError,
};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    // Run the application logic
    match thumbflow::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            // Determine appropriate exit code for errors
            let exit_code = if is_not_found(&err) {
                ExitCode::NotFound
            } else {
                ExitCode::GeneralError
            };

            // Report the error
            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}

/// Whether the error is a listed entry vanishing before it could be stat'd.
fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<StreamError>(),
        Some(StreamError::Thumb(ThumbError::NotFound(_)))
    )
}
