//! Main application entry point

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ct_core::Transport;
use ct_data::DataContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod http;
mod page;

use config::DashboardConfig;
use http::HttpTransport;
use page::{build_page, Page};

#[derive(Parser, Debug)]
#[command(name = "covid-tracker")]
#[command(about = "Fetch COVID-19 data and build the dashboard page model", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the page model here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Per-request timeout in seconds, overriding the configured one
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn write_page(page: &Page, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, page)?;
            writer.flush()?;
            info!("Wrote page model to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, page)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout carries the page model
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    let timeout = match args.timeout_secs {
        Some(secs) => Duration::from_secs(secs),
        None => config.request_timeout()?,
    };

    info!("Starting {} with a {} request timeout", config.title, humantime::format_duration(timeout));

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(timeout)?);
    let context = DataContext::load(transport, &config.endpoints, config.source.clone()).await;
    let page = build_page(&context, &config);

    write_page(&page, args.out.as_deref())
}
