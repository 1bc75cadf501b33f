//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod progress;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

/// Print `err` in the requested format and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
