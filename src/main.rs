//! Driver Behavior Service CLI
//!
//! Windows raw sensor recordings into feature tables and serves behavior
//! predictions over HTTP.

use anyhow::Context;
use clap::{Parser, Subcommand};
use driver_behavior_service::{
    config::Config,
    ingest::WindowingJob,
    model::ModelArtifact,
    server,
    service::PredictionService,
    VERSION,
};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "driver-behavior")]
#[command(version = VERSION)]
#[command(about = "Windowed motion features and driver behavior predictions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve predictions over HTTP
    Serve {
        /// Model artifact to load (defaults to the configured path)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Directory for daily prediction logs
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Address to bind to
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Turn a raw sensor CSV into a windowed feature table
    Windowize {
        /// Raw sensor CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Output feature CSV
        #[arg(long, short)]
        output: PathBuf,

        /// Also write the cleaned rows with derived magnitude columns
        #[arg(long)]
        cleaned: Option<PathBuf>,

        /// Samples per window
        #[arg(long)]
        window_size: Option<NonZeroUsize>,

        /// Rows in the trailing magnitude mean
        #[arg(long)]
        rolling_window: Option<NonZeroUsize>,
    },

    /// Show the feature schema stored in a model artifact
    Schema {
        /// Model artifact (defaults to the configured path)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Write the effective settings to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load configuration, using defaults: {}", e);
        Config::default()
    });

    match cli.command {
        Commands::Serve {
            model,
            log_dir,
            host,
            port,
        } => {
            let config = Config {
                model_path: model.unwrap_or(config.model_path),
                log_dir: log_dir.unwrap_or(config.log_dir),
                host: host.unwrap_or(config.host),
                port: port.unwrap_or(config.port),
                ..config
            };
            cmd_serve(config).await
        }
        Commands::Windowize {
            input,
            output,
            cleaned,
            window_size,
            rolling_window,
        } => cmd_windowize(WindowingJob {
            input,
            output,
            cleaned_output: cleaned,
            window_size: window_size.unwrap_or(config.window_size),
            rolling_window: rolling_window.unwrap_or(config.rolling_window),
        }),
        Commands::Schema { model } => cmd_schema(model.unwrap_or(config.model_path)),
        Commands::Config { save } => cmd_config(&config, save),
    }
}

async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    config
        .ensure_directories()
        .context("Could not create the prediction log directory")?;

    // A model that fails to load aborts before any traffic is accepted.
    let service = PredictionService::load(&config.model_path, config.log_dir.clone())
        .with_context(|| format!("Failed to load model from {:?}", config.model_path))?;
    let service = Arc::new(service);

    let (addr, shutdown_tx) = server::serve(Arc::clone(&service), config.bind_addr()).await?;
    println!("Driver Behavior Service v{VERSION}");
    println!("  Listening on: http://{addr}");
    println!("  Features expected: {}", service.schema().len());
    println!("  Prediction logs: {:?}", service.log().dir());
    println!();
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Error waiting for Ctrl+C")?;
    let _ = shutdown_tx.send(());

    println!();
    println!("{}", service.stats().summary());
    Ok(())
}

fn cmd_windowize(job: WindowingJob) -> anyhow::Result<()> {
    let report = job
        .run()
        .with_context(|| format!("Windowing {:?} failed", job.input))?;

    println!(
        "Read {} rows ({} dropped for missing values)",
        report.load.rows_read, report.load.rows_dropped
    );
    println!("Cleaned rows: {}", report.cleaned_rows);
    println!(
        "Wrote {} windows of {} samples to {:?}",
        report.windows, job.window_size, job.output
    );
    Ok(())
}

fn cmd_schema(model_path: PathBuf) -> anyhow::Result<()> {
    let artifact = ModelArtifact::load(&model_path)
        .with_context(|| format!("Failed to load model from {model_path:?}"))?;
    let schema = artifact.schema();

    println!("Model: {model_path:?}");
    println!("Features ({}):", schema.len());
    for (index, name) in schema.names().iter().enumerate() {
        println!("  {index:>2}  {name}");
    }
    if !schema.matches_pipeline() {
        println!();
        println!("Warning: schema does not match this pipeline's feature order");
    }
    Ok(())
}

fn cmd_config(config: &Config, save: bool) -> anyhow::Result<()> {
    if save {
        config.save().context("Could not write the config file")?;
        println!("Saved configuration to {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
