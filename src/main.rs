use clap::{Parser, Subcommand};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pointlab::api;
use pointlab::assets::{AssetLoader, InitOutcome};
use pointlab::models::{AppConfig, ImageSource, OperatorSelection};
use pointlab::server;
use pointlab::services::{CommitOutcome, SurfaceStatus};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Parser)]
#[command(name = "pointlab")]
#[command(about = "Pointlab - interactive point-wise image processing backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Write the embedded config.yaml to CONFIG_FILE (or ./config.yaml)
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pointlab API",
        description = "Point-wise image processing: single-image transforms, two-image arithmetic and transfer curves",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_transform,
        api::handle_arithmetic,
        api::handle_status,
        api::handle_output_png,
        api::handle_input_png,
        api::handle_events,
        api::handle_transfer,
    ),
    components(schemas(
        api::TransformBody,
        api::ArithmeticBody,
        api::SurfaceUpdateResponse,
        api::TransferResponse,
        api::SamplePoint,
        ImageSource,
        OperatorSelection,
        CommitOutcome,
        SurfaceStatus,
    )),
    tags(
        (name = "Surfaces", description = "Pipeline invocations and their displayed results"),
        (name = "Transfer", description = "Transfer function samples for charts")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Init { force }) => run_init_command(force),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Extract the embedded config for customization
fn run_init_command(force: bool) -> anyhow::Result<()> {
    let loader = AssetLoader::from_env();

    match loader.init_config(force)? {
        InitOutcome::Written(path) => println!("Wrote {}", path.display()),
        InitOutcome::Skipped(path) => {
            println!(
                "Skipped {} (already exists, use --force to overwrite)",
                path.display()
            )
        }
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    println!("Pointlab v{VERSION}");
    println!("Interactive backend for point-wise image processing\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr
            .as_deref()
            .unwrap_or(&format!("{DEFAULT_BIND_ADDR} (default)"))
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );

    let loader = AssetLoader::from_env();
    let config_source = match loader.config_file() {
        Some(path) if loader.uses_external_config() => path.display().to_string(),
        Some(_) => "embedded (file not found)".to_string(),
        None => "embedded".to_string(),
    };
    println!("\nConfig:  {config_source}");

    let config = AppConfig::load_from_assets(&loader);
    println!(
        "  Transform:  width capped at {} px",
        config.transform.max_width
    );
    println!(
        "  Arithmetic: {}x{} px",
        config.arithmetic.width, config.arithmetic.height
    );
    println!(
        "  Gamma:      {} to {} (step {})",
        config.gamma.min, config.gamma.max, config.gamma.step
    );

    println!("\nCommands:");
    println!("  pointlab serve   Start the HTTP server");
    println!("  pointlab init    Extract the embedded config.yaml");
    println!("\nRun 'pointlab --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pointlab=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let asset_loader = AssetLoader::from_env();

    tracing::info!(
        config = ?asset_loader
            .config_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Config source"
    );

    let state = server::create_app_state(&asset_loader)?;

    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Static file serving (production only)
        .nest_service("/static", ServeDir::new("./static"));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Pointlab server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
