//! Hotel rating prediction API entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hotel_rating_api::api::handlers::predict_line;
use hotel_rating_api::api::{create_router, AppState};
use hotel_rating_api::config::Config;
use hotel_rating_api::error::AppError;
use hotel_rating_api::metrics;
use hotel_rating_api::predictor::build_predictor;
use hotel_rating_api::utils::shutdown_signal;

/// Hotel rating prediction API.
#[derive(Parser, Debug)]
#[command(name = "hotel-rating-api")]
#[command(about = "HTTP API predicting hotel ratings from coordinates")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Address to bind (overrides HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity and load the data set.
    CheckConfig,

    /// Run a single prediction and print the JSON response body.
    Predict {
        /// Longitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Latitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load().map_err(AppError::from)?;

    init_logging(&config, args.verbose);
    metrics::init_metrics();

    let result = match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config).await,
        Some(Command::Predict {
            longitude,
            latitude,
        }) => cmd_predict(config, longitude, latitude).await,
        Some(Command::Serve { host, port }) => cmd_serve(config, host, port).await,
        None => cmd_serve(config, None, None).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Exiting with error");
    }
    Ok(result?)
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hotel_rating_api=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(fmt::layer().json().flatten_event(true)).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().map_err(AppError::InvalidConfig)?;

    let predictor = build_predictor(&config)?;
    info!(predictor = predictor.name(), "Predictor ready");

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::install_exporter(metrics_addr)?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }

    let addr: SocketAddr = config.bind_addr().map_err(AppError::InvalidConfig)?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(AppState::new(predictor));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config(config: Config) -> Result<(), AppError> {
    println!("======================================================================");
    println!("HOTEL RATING API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    if let Err(e) = config.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(AppError::InvalidConfig(e));
    }
    println!("OK");

    print!("Loading predictor... ");
    let predictor = match build_predictor(&config) {
        Ok(p) => {
            println!("OK");
            p
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(e.into());
        }
    };

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind Address: {}:{}", config.host, config.port);
    println!("  Predictor: {}", predictor.name());
    println!("  Hotels Path: {}", config.hotels_path.display());
    println!("  Neighbours: {}", config.knn_neighbors);
    match config.metrics_port {
        Some(port) => println!("  Metrics Port: {}", port),
        None => println!("  Metrics: Disabled"),
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run one prediction locally.
async fn cmd_predict(config: Config, longitude: f64, latitude: f64) -> Result<(), AppError> {
    config.validate().map_err(AppError::InvalidConfig)?;

    let predictor = build_predictor(&config)?;
    println!("{}", predict_line(&predictor, longitude, latitude).await?);
    Ok(())
}
