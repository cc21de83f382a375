use clap::{Args, Parser, Subcommand};
use gridsmith::{
    imaging::{self, MAX_REFERENCE_BYTES},
    logger::{self, LogLevel, LogProfile, LoggerConfig},
    matrix::{preset_styles, resolve_styles},
    AspectRatio, AssetRef, CellPayload, GeminiConfig, GenerationClient, GenerationRequest,
    GenerationType, GridError, GridSize, ImageGenerator, MatrixCell, MatrixGenerator, MatrixJob,
    MatrixObserver, MatrixOptions, MatrixProgress, ReferenceImage, Resolution,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gridsmith")]
#[command(author, version, about = "Generate and slice game asset grids with the Gemini image API")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Logging preset: console, dev or prod (JSON lines plus gridsmith.log)
    #[arg(long, global = true, default_value = "console")]
    log_profile: LogProfile,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one composite image and slice it into cells
    Generate(GenerateArgs),
    /// Check that the endpoint and API key work
    Probe,
    /// Run a style x asset exploration matrix
    Matrix(MatrixArgs),
    /// List the built-in style presets
    Styles,
}

#[derive(Args)]
struct GenerateArgs {
    /// Theme of the assets, e.g. "fantasy potions"
    prompt: String,

    #[arg(short, long, default_value = gridsmith::prompt::DEFAULT_STYLE)]
    style: String,

    #[arg(long, default_value = gridsmith::prompt::DEFAULT_SUBJECT)]
    subject: String,

    /// 1024, 2048 or 4096
    #[arg(short, long, default_value_t = 1024)]
    resolution: u32,

    /// 1, 3 or 5; defaults to the generation type's layout
    #[arg(short, long)]
    grid: Option<u32>,

    #[arg(short, long, default_value = "1:1")]
    aspect: String,

    /// icon, character, scene, uiTemplate or colorPalette
    #[arg(short = 't', long = "type", default_value = "icon")]
    generation_type: String,

    /// Reference image for style transfer
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Extra template options as key=value (pose, background)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    #[arg(long, default_value = "output")]
    out: PathBuf,
}

#[derive(Args)]
struct MatrixArgs {
    /// Asset image files; each becomes a column
    #[arg(long = "asset", required = true)]
    assets: Vec<PathBuf>,

    /// Preset ids or free-form style text; each becomes a row. Defaults to every preset
    #[arg(long = "style")]
    styles: Vec<String>,

    #[arg(short = 't', long = "type", default_value = "icon")]
    generation_type: String,

    /// Extra text appended to every cell prompt
    #[arg(short, long)]
    prompt: Option<String>,

    #[arg(short, long, default_value_t = 1024)]
    resolution: u32,

    /// Run cells concurrently with at most this many in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    #[arg(long, default_value = "matrix-output")]
    out: PathBuf,
}

/// Logs each cell as it lands.
struct ProgressLog;

impl MatrixObserver for ProgressLog {
    fn on_progress(&mut self, progress: MatrixProgress) {
        log::info!(
            "📊 {}/{} cells ({}%)",
            progress.completed,
            progress.total,
            progress.percent
        );
    }

    fn on_cell_complete(&mut self, row: usize, col: usize, payload: &CellPayload) {
        log::info!(
            "✅ Cell ({}, {}) {} x {} done",
            row,
            col,
            payload.style_id,
            payload.asset_id
        );
    }

    fn on_cell_error(&mut self, row: usize, col: usize, error: &GridError) {
        log::error!("❌ Cell ({}, {}) failed: {}", row, col, error);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut log_config = LoggerConfig::from(cli.log_profile);
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    if cli.json_logs {
        log_config = log_config.with_json_output(true);
    }
    logger::init_with_config(log_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    match cli.command {
        Command::Styles => {
            for style in preset_styles() {
                println!("{:<14} {:<16} {}", style.id, style.name, style.prompt);
            }
            Ok(())
        }
        Command::Probe => {
            let client = connect()?;
            if client.test_connection().await {
                println!("ok");
                Ok(())
            } else {
                Err("could not reach the image API with the configured key".into())
            }
        }
        Command::Generate(args) => run_generate(args).await,
        Command::Matrix(args) => run_matrix(args).await,
    }
}

fn connect() -> Result<GenerationClient, GridError> {
    let config = GeminiConfig::from_env();
    logger::log_config_info(&config);
    GenerationClient::new(config)
}

/// Loads an image file, compressing it when it is too large to upload.
fn load_reference(path: &Path) -> Result<ReferenceImage, GridError> {
    let (data, mime) = imaging::file_to_base64(path)?;
    let (data, compressed_mime) = imaging::compress_to_size(&data, MAX_REFERENCE_BYTES)?;
    Ok(ReferenceImage::new(data, compressed_mime.unwrap_or(mime)))
}

fn parse_option(raw: &str) -> Result<(String, String), GridError> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| GridError::ConfigError(format!("option '{}' is not KEY=VALUE", raw)))
}

async fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let generation_type: GenerationType = args.generation_type.parse()?;
    let grid_size = match args.grid {
        Some(grid) => GridSize::try_from(grid)?,
        None => generation_type.default_grid_size(),
    };

    let mut request = GenerationRequest::new(args.prompt)
        .with_style(args.style)
        .with_subject(args.subject)
        .with_resolution(Resolution::try_from(args.resolution)?)
        .with_grid_size(grid_size)
        .with_aspect_ratio(args.aspect.parse::<AspectRatio>()?)
        .with_generation_type(generation_type);
    for raw in &args.options {
        let (key, value) = parse_option(raw)?;
        request = request.with_option(key, value);
    }
    if let Some(path) = &args.reference {
        request = request.with_reference_image(load_reference(path)?);
    }

    let client = connect()?;
    let result = client.generate(&request).await?;

    std::fs::create_dir_all(&args.out)?;
    let composite = args.out.join("composite.png");
    imaging::save_base64_image(&composite, &result.image_base64)?;
    log::info!("💾 Saved {}", composite.display());

    if result.grid_size.is_grid() {
        let slices = gridsmith::split_composite(&result)?;
        for (index, slice) in slices.iter().enumerate() {
            let path = args.out.join(format!("slice-{:02}.png", index + 1));
            imaging::save_base64_image(&path, slice)?;
        }
        log::info!("✂️  Saved {} slices to {}", slices.len(), args.out.display());
    }

    println!("{}", args.out.display());
    Ok(())
}

async fn run_matrix(args: MatrixArgs) -> Result<(), Box<dyn std::error::Error>> {
    let generation_type: GenerationType = args.generation_type.parse()?;

    let mut assets = Vec::with_capacity(args.assets.len());
    for path in &args.assets {
        let reference = load_reference(path)?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset")
            .to_string();
        assets.push(AssetRef::new(id, reference.data).with_mime_type(reference.mime_type));
    }

    let styles = if args.styles.is_empty() {
        preset_styles()
    } else {
        resolve_styles(&args.styles)
    };

    let mut job = MatrixJob::new(assets, styles)
        .with_generation_type(generation_type)
        .with_resolution(Resolution::try_from(args.resolution)?);
    job.custom_prompt = args.prompt;

    let options = match args.concurrency {
        Some(limit) => MatrixOptions::new().with_concurrency(limit),
        None => MatrixOptions::sequential(),
    };

    let client = Arc::new(connect()?);
    let matrix = MatrixGenerator::new(client, options);

    let abort = matrix.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("🛑 Interrupted, finishing in-flight cells");
            abort.abort();
        }
    });

    let result = matrix.generate(job, &mut ProgressLog).await?;

    std::fs::create_dir_all(&args.out)?;
    for (row, cells) in result.cells.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if let MatrixCell::Succeeded(payload) = cell {
                let path = args.out.join(format!("cell-{}-{}.png", row, col));
                imaging::save_base64_image(&path, &payload.image_base64)?;
            }
        }
    }

    println!(
        "{} succeeded, {} failed, {} skipped -> {}",
        result.success_count(),
        result.failure_count(),
        result.skipped_count(),
        args.out.display()
    );
    Ok(())
}
