mod config;
mod report;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use labelguard_analysis::{AnalysisPipeline, PipelineOptions};
use labelguard_catalog::CatalogClient;
use labelguard_core::AnalysisRequest;
use labelguard_gateway::{start_server, GatewayState, RateLimiter};
use labelguard_history::{AnalyticsSummary, HistoryRecord, HistoryStore};
use labelguard_providers::build_provider;

use config::Config;

#[derive(Parser)]
#[command(name = "labelguard")]
#[command(about = "LabelGuard: product label compliance analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze a product image from disk
    Analyze {
        /// Path to the product image
        image: PathBuf,
        /// Product name to give the model as context
        #[arg(short, long)]
        name: Option<String>,
        /// Product description to give the model as context
        #[arg(short, long)]
        description: Option<String>,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
        /// Do not append the result to history
        #[arg(long)]
        no_record: bool,
    },
    /// Show recent analysis history
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show compliance analytics over the history log
    Stats,
    /// Query a running server's health endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    labelguard_logging::init_logger(config.log_dir.as_deref(), &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Analyze {
            image,
            name,
            description,
            json,
            no_record,
        } => {
            run_analyze(&config, &image, name, description, json, !no_record).await?;
        }
        Commands::History { limit } => {
            let store = HistoryStore::open(&config.db_path)?;
            let records = store.recent(limit)?;
            if records.is_empty() {
                println!("No analyses recorded yet.");
            } else {
                print!("{}", report::render_history(&records, report::supports_color()));
            }
        }
        Commands::Stats => {
            let store = HistoryStore::open(&config.db_path)?;
            let summary = AnalyticsSummary::from_records(&store.list()?);
            print!("{}", report::render_analytics(&summary, report::supports_color()));
        }
        Commands::Status => {
            println!("LabelGuard status: checking...");
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("LabelGuard is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> AnalysisPipeline {
    let kind = config.provider_kind();
    let model = build_provider(kind, config.api_key(), config.model.as_deref());
    match &model {
        Some(model) => info!(provider = %kind, model = model.name(), "Vision provider configured"),
        None => warn!(provider = %kind, "No API key for the vision provider; analyses will fail with a configuration error"),
    }
    AnalysisPipeline::new(
        model,
        PipelineOptions {
            timeout: config.timeout(),
        },
    )
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                token.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        db = %config.db_path,
        "Starting LabelGuard server"
    );

    let history = HistoryStore::open(&config.db_path)?;
    let shutdown = CancellationToken::new();

    let mut state = GatewayState::new(build_pipeline(&config), history)
        .with_rate_limiter(RateLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window_secs,
        ))
        .with_shutdown(shutdown.clone());

    if let Some(url) = &config.catalog_url {
        info!(url = %url, "Product catalog configured");
        state = state.with_catalog(CatalogClient::new(url.clone()));
    }

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;

    cancel_on_ctrl_c(shutdown);
    start_server(addr, state, config.max_upload_bytes()).await
}

async fn run_analyze(
    config: &Config,
    image_path: &Path,
    name: Option<String>,
    description: Option<String>,
    json: bool,
    record: bool,
) -> Result<()> {
    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let mut request = AnalysisRequest::new(image, mime_for_path(image_path));
    request.product_name = name;
    request.product_description = description;

    let pipeline = build_pipeline(config);
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = match pipeline.analyze(&request, &cancel).await {
        Ok(result) => result,
        Err(err) => {
            let category = err.category();
            if category.retryable() {
                warn!(category = %category, "Transient analysis failure; retrying may succeed");
            }
            anyhow::bail!("Analysis failed ({}): {}", category, err.user_message());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render_result(&result, report::supports_color()));
    }

    if record {
        let label = request
            .product_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .or_else(|| image_path.file_name().map(|f| f.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "Product".to_string());
        let store = HistoryStore::open(&config.db_path)?;
        store.append(&HistoryRecord::from_result(label, &result))?;
    }

    Ok(())
}

/// MIME type from the file extension. Unknown extensions go through as
/// `application/octet-stream` and are rejected as non-image input.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
