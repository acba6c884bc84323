//! Command line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface for the Atelie routing engine
#[derive(Parser, Debug)]
#[command(name = "atelie")]
#[command(about = "Atelie - service routing and provider resolution")]
#[command(version)]
pub struct Cli {
    /// Catalog file (YAML or JSON), or a `postgres://` URL with the `postgres` feature
    #[arg(short, long, global = true, env = "ATELIE_CATALOG", default_value = "config/catalog.yaml")]
    pub catalog: String,

    /// Environment whose provider configs are used (defaults to the engine config)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Print compact JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a provider for a service type and execute it
    Resolve {
        /// Service type, e.g. SHIPPING or payment
        #[arg(short = 't', long = "type")]
        service_type: String,

        /// Request JSON object, or @path to read it from a file
        #[arg(short, long, default_value = "{}")]
        request: String,
    },

    /// List providers that pass rule evaluation, without executing them
    Eligible {
        #[arg(short = 't', long = "type")]
        service_type: String,

        #[arg(short, long, default_value = "{}")]
        request: String,
    },

    /// Quote shipping, falling back to the contingency provider
    Quote {
        #[arg(long)]
        cep: String,

        #[arg(long)]
        subtotal: f64,

        #[arg(long)]
        country: Option<String>,

        /// Provider code to use instead of routing rules
        #[arg(long = "provider")]
        forced_provider: Option<String>,
    },

    /// Evaluate one rule's match JSON against a request context
    Match {
        /// Rule match JSON, e.g. '{"expression": "orderTotal > 100"}'
        #[arg(long)]
        rule: String,

        /// Request JSON object the context is built from, or @path
        #[arg(long, default_value = "{}")]
        context: String,
    },

    /// List registered driver keys
    Drivers,
}

/// Inline JSON, or the content of the file after `@`
pub fn read_json_arg(raw: &str) -> anyhow::Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(PathBuf::from(path))
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid JSON argument: {}", e))
}
