//! Example service built on service-kit.
//!
//! Serves `/hello` plus the health and metrics endpoints until Ctrl+C.

use std::path::PathBuf;
use std::process::ExitCode;

use axum::{extract::Path, routing::get, Router};
use clap::Parser;

use service_kit::config::{load_config, ServiceConfig};
use service_kit::{HttpError, Logger, Service};

#[derive(Parser)]
#[command(name = "service-kit")]
#[command(about = "Example HTTP service with logging, tracing and metrics wired in", long_about = None)]
struct Cli {
    /// TOML configuration file. Other flags are ignored when set.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "service-kit")]
    name: String,

    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// OTLP collector endpoint (e.g., http://localhost:4317).
    #[arg(long)]
    otel_endpoint: Option<String>,

    #[arg(long)]
    sample_rate: Option<f64>,
}

impl Cli {
    fn into_config(self) -> Result<ServiceConfig, service_kit::config::ConfigError> {
        if let Some(path) = self.config {
            return load_config(&path);
        }

        let mut builder = ServiceConfig::builder(self.name).bind_address(self.bind);
        if let Some(endpoint) = self.otel_endpoint {
            builder = builder.otel_endpoint(endpoint);
        }
        if let Some(rate) = self.sample_rate {
            builder = builder.sample_rate(rate);
        }
        Ok(builder.build())
    }
}

async fn hello(logger: Logger, Path(name): Path<String>) -> Result<String, HttpError> {
    if name.trim().is_empty() {
        return Err(HttpError::bad_request("name must not be blank"));
    }
    logger.info("Greeting");
    Ok(format!("hello, {name}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let routes = Router::new().route("/hello/{name}", get(hello));

    match Service::new(config).run(routes).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Service terminated");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
