//! # Rex - Repository Explorer
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    apps/rex (THE BINARY)                  │
//! │                                                           │
//! │   ┌─────────┐    ┌──────────┐    ┌───────────────────┐    │
//! │   │  CLI    │    │ HTTP API │    │ Repository client │    │
//! │   │ (clap)  │    │ (axum)   │    │ (reqwest)         │    │
//! │   └────┬────┘    └────┬─────┘    └─────────┬─────────┘    │
//! │        └──────────────┼────────────────────┘              │
//! │                       ▼                                   │
//! │               ┌───────────────┐                           │
//! │               │   rex-core    │                           │
//! │               │  (THE LOGIC)  │                           │
//! │               └───────────────┘                           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! rex --config rex.toml serve --port 8080
//! rex replay --file recording.json --json-mode
//! rex resolve --provenance refCopy --server cocoMDS1 --platform platform --enterprise
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // REX_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("REX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rex=info,rex_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ██████╗ ███████╗██╗  ██╗
  ██╔══██╗██╔════╝╚██╗██╔╝
  ██████╔╝█████╗   ╚███╔╝
  ██╔══██╗██╔══╝   ██╔██╗
  ██║  ██║███████╗██╔╝ ██╗
  ╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝

  Repository Explorer v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
