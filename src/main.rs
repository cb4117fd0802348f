use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use affiche::api;
use affiche::models::{ScheduleEntry, Weekday};
use affiche::server;

#[derive(Parser)]
#[command(name = "affiche")]
#[command(about = "Affiche - schedule poster renderer and server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Render a schedule directly to PNG files
    Render {
        /// Input JSON file with an array of schedule entries
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the rendered pages
        #[arg(short, long, default_value = "./posters")]
        out_dir: PathBuf,

        /// Theme name (default: configured default theme)
        #[arg(short, long)]
        theme: Option<String>,

        /// Poster width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Poster height in pixels
        #[arg(long)]
        height: Option<u32>,
    },
    /// Extract embedded assets to filesystem for customization
    Init {
        /// Extract theme templates
        #[arg(long)]
        themes: bool,

        /// Extract font files
        #[arg(long)]
        fonts: bool,

        /// Extract config.yaml
        #[arg(long)]
        config: bool,

        /// Extract all assets
        #[arg(long)]
        all: bool,

        /// Overwrite existing files
        #[arg(long, short)]
        force: bool,

        /// List embedded assets without extracting
        #[arg(long)]
        list: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Affiche API",
        description = "Schedule poster renderer - turns weekly schedules into paginated PNG posters",
        version = "0.3.0",
        license(name = "MIT")
    ),
    paths(api::handle_render_poster, api::handle_poster_image),
    components(schemas(
        api::PosterRequest,
        api::PosterResponse,
        api::PosterPage,
        api::PosterErrorResponse,
        ScheduleEntry,
        Weekday,
    )),
    tags(
        (name = "Posters", description = "Schedule poster rendering")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            out_dir,
            theme,
            width,
            height,
        }) => run_render_command(&input, &out_dir, theme.as_deref(), width, height).await,
        Some(Commands::Init {
            themes,
            fonts,
            config,
            all,
            force,
            list,
        }) => run_init_command(themes, fonts, config, all, force, list),
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Render a schedule directly to PNG files (no server needed)
async fn run_render_command(
    input: &PathBuf,
    out_dir: &PathBuf,
    theme: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> anyhow::Result<()> {
    use affiche::assets::AssetLoader;

    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "affiche=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    // Create asset loader with optional external paths from env vars
    let themes_dir = std::env::var("THEMES_DIR").ok().map(PathBuf::from);
    let fonts_dir = std::env::var("FONTS_DIR").ok().map(PathBuf::from);
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);

    let asset_loader = Arc::new(AssetLoader::new(themes_dir, fonts_dir, config_file));

    // Seed if configured paths are empty
    if let Err(e) = asset_loader.seed_if_configured() {
        tracing::warn!(%e, "Failed to seed assets");
    }

    let state = server::create_app_state(asset_loader)?;

    // Read the schedule from the input file
    let json = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", input.display()))?;
    let entries: Vec<ScheduleEntry> = serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("Invalid schedule in {}: {e}", input.display()))?;

    let pages = state
        .pipeline
        .render_schedule(entries, theme, width, height)
        .await
        .map_err(|e| anyhow::anyhow!("Render error: {e}"))?;

    std::fs::create_dir_all(out_dir)?;
    let mut total_bytes = 0usize;
    for page in &pages {
        let path = out_dir.join(format!("poster-{:02}.png", page.page_index));
        std::fs::write(&path, &page.png_bytes)?;
        total_bytes += page.png_bytes.len();
        println!("Rendered {} ({} bytes)", path.display(), page.png_bytes.len());
    }
    println!("{} pages, {total_bytes} bytes total", pages.len());

    state.pipeline.shutdown().await;

    Ok(())
}

/// Extract embedded assets to filesystem
fn run_init_command(
    themes: bool,
    fonts: bool,
    config: bool,
    all: bool,
    force: bool,
    list: bool,
) -> anyhow::Result<()> {
    use affiche::assets::{AssetCategory, AssetLoader};

    if list {
        println!("Embedded assets:\n");
        println!("Themes:");
        for f in AssetLoader::list_embedded(AssetCategory::Themes) {
            println!("  {f}");
        }
        println!("\nFonts:");
        for f in AssetLoader::list_embedded(AssetCategory::Fonts) {
            println!("  {f}");
        }
        println!("\nConfig:");
        for f in AssetLoader::list_embedded(AssetCategory::Config) {
            println!("  {f}");
        }
        return Ok(());
    }

    // Determine which categories to extract
    let mut categories = Vec::new();
    if all || themes {
        categories.push(AssetCategory::Themes);
    }
    if all || fonts {
        categories.push(AssetCategory::Fonts);
    }
    if all || config {
        categories.push(AssetCategory::Config);
    }

    if categories.is_empty() {
        eprintln!("No categories specified. Use --all, --themes, --fonts, or --config");
        eprintln!("\nRun 'affiche init --list' to see embedded assets.");
        std::process::exit(1);
    }

    // Create asset loader with paths from env vars (or defaults)
    let themes_dir = std::env::var("THEMES_DIR").ok().map(PathBuf::from);
    let fonts_dir = std::env::var("FONTS_DIR").ok().map(PathBuf::from);
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);

    let loader = AssetLoader::new(themes_dir, fonts_dir, config_file);

    // Extract assets
    let report = loader.init(&categories, force)?;

    if !report.written.is_empty() {
        println!("Extracted {} files:", report.written.len());
        for f in &report.written {
            println!("  + {f}");
        }
    }
    if !report.skipped.is_empty() {
        println!(
            "\nSkipped {} existing files (use --force to overwrite):",
            report.skipped.len()
        );
        for f in &report.skipped {
            println!("  - {f}");
        }
    }

    if report.written.is_empty() && report.skipped.is_empty() {
        println!("No files to extract.");
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    use affiche::assets::{AssetCategory, AssetLoader};

    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Read environment variables
    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let themes_dir = std::env::var("THEMES_DIR").ok();
    let fonts_dir = std::env::var("FONTS_DIR").ok();

    // Header
    println!("Affiche v{VERSION}");
    println!("Schedule poster renderer and server\n");

    // Environment variables section
    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  THEMES_DIR  = {}",
        themes_dir.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  FONTS_DIR   = {}",
        fonts_dir.as_deref().unwrap_or("(not set)")
    );

    // Asset sources section
    println!("\nAsset Sources:");

    // Create asset loader to check actual sources
    let loader = AssetLoader::new(
        themes_dir.clone().map(PathBuf::from),
        fonts_dir.clone().map(PathBuf::from),
        config_file.clone().map(PathBuf::from),
    );

    // Config source
    let config_source = if let Some(ref path) = config_file {
        let p = PathBuf::from(path);
        if p.exists() {
            path.to_string()
        } else {
            "embedded (file not found)".to_string()
        }
    } else {
        "embedded".to_string()
    };
    println!("  Config: {config_source}");

    // Helper for pluralization
    fn plural(n: usize) -> &'static str {
        if n == 1 {
            "file"
        } else {
            "files"
        }
    }

    // Themes source
    let themes_list = loader.list_themes();
    let themes_count = themes_list.len();
    let embedded_themes = AssetLoader::list_embedded(AssetCategory::Themes);
    let embedded_count = embedded_themes.len();

    if let Some(ref path) = themes_dir {
        let p = PathBuf::from(path);
        if p.exists() {
            println!(
                "  Themes: {path} ({themes_count} {}, {embedded_count} embedded)",
                plural(themes_count)
            );
        } else {
            println!(
                "  Themes: embedded ({embedded_count} {})",
                plural(embedded_count)
            );
        }
    } else {
        println!(
            "  Themes: embedded ({embedded_count} {})",
            plural(embedded_count)
        );
    }

    // Fonts source
    let fonts = loader.get_fonts();
    let fonts_count = fonts.len();
    let embedded_fonts = AssetLoader::list_embedded(AssetCategory::Fonts);
    let embedded_fonts_count = embedded_fonts.len();

    if let Some(ref path) = fonts_dir {
        let p = PathBuf::from(path);
        if p.exists() {
            println!(
                "  Fonts:  {path} ({fonts_count} {}, {embedded_fonts_count} embedded)",
                plural(fonts_count)
            );
        } else {
            println!(
                "  Fonts:  embedded ({embedded_fonts_count} {})",
                plural(embedded_fonts_count)
            );
        }
    } else {
        println!(
            "  Fonts:  embedded ({embedded_fonts_count} {})",
            plural(embedded_fonts_count)
        );
    }

    // Commands section
    println!("\nCommands:");
    println!("  affiche serve    Start the HTTP server");
    println!("  affiche render   Render a schedule to PNG files");
    println!("  affiche init     Extract embedded assets");
    println!("\nRun 'affiche --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    use affiche::assets::AssetLoader;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "affiche=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Create asset loader with optional external paths from env vars
    let themes_dir = std::env::var("THEMES_DIR").ok().map(PathBuf::from);
    let fonts_dir = std::env::var("FONTS_DIR").ok().map(PathBuf::from);
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let asset_loader = Arc::new(AssetLoader::new(
        themes_dir.clone(),
        fonts_dir.clone(),
        config_file.clone(),
    ));

    // Log asset sources
    tracing::info!(
        themes = ?themes_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
        fonts = ?fonts_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
        config = ?config_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
        "Asset sources configured"
    );

    // Seed if configured paths are empty
    match asset_loader.seed_if_configured() {
        Ok(report) if !report.is_empty() => {
            tracing::info!(
                themes = report.themes_seeded.len(),
                fonts = report.fonts_seeded.len(),
                config = report.config_seeded,
                "Seeded empty directories with embedded assets"
            );
        }
        Err(e) => {
            tracing::warn!(%e, "Failed to seed assets");
        }
        _ => {}
    }

    // Create application state using shared server module
    let state = server::create_app_state(asset_loader)?;
    let pipeline = state.pipeline.clone();

    // Build router: start with shared API routes, add the OpenAPI docs
    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Affiche server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued jobs and release the engine before exiting
    pipeline.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::warn!(%e, "Failed to listen for shutdown signal"),
    }
}
