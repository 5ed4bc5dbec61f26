use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkmap::keepout::{self, MaskMethod};
use inkmap::models::{AppConfig, MetricSetting, ModeSetting};
use inkmap::rendering;
use inkmap::services::{self, BatchOptions, Converter, SidecarDetector};

#[derive(Parser)]
#[command(name = "inkmap")]
#[command(about = "Photo conversion and keep-out maps for six-color e-paper frames")]
struct Cli {
    /// YAML configuration file (default: $INKMAP_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PNG images to palette-indexed PNGs
    Convert {
        /// Input PNG files or directories of PNGs
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Quantization mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeSetting>,

        /// Color distance metric
        #[arg(long, value_enum)]
        metric: Option<MetricSetting>,

        /// Write a keep-out map next to each converted image
        #[arg(long)]
        generate_maps: bool,

        /// How detections become keep-out pixels
        #[arg(long, value_enum)]
        map_method: Option<MaskMethod>,

        /// Pixels added around each detection
        #[arg(long)]
        map_expand: Option<u32>,

        /// Minimum detection confidence
        #[arg(long)]
        map_confidence: Option<f32>,

        /// Directory holding `<stem>.detections.json` files (default: next to each input)
        #[arg(long)]
        detections_dir: Option<PathBuf>,

        /// Images converted in parallel
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-image time limit in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip oxipng re-compression
        #[arg(long)]
        no_optimize: bool,
    },
    /// Check a keep-out map file and print its statistics
    Verify {
        /// Map file (.map)
        map: PathBuf,

        /// Draw the map over this PNG
        #[arg(long, value_name = "IMAGE")]
        visualize: Option<PathBuf>,

        /// Visualization output (default: <map stem>_viz.png next to the map)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of largest regions to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("INKMAP_CONFIG").ok().map(PathBuf::from));

    match cli.command {
        Some(Commands::Convert {
            inputs,
            output_dir,
            mode,
            metric,
            generate_maps,
            map_method,
            map_expand,
            map_confidence,
            detections_dir,
            jobs,
            timeout,
            no_optimize,
        }) => {
            init_logging("inkmap=info");
            let mut config = AppConfig::load(config_path.as_deref())?;

            if let Some(dir) = output_dir {
                config.output.directory = Some(dir);
            }
            if let Some(mode) = mode {
                config.quantize.mode = mode;
            }
            if let Some(metric) = metric {
                config.quantize.metric = metric;
            }
            if generate_maps {
                config.keepout.enabled = true;
            }
            if let Some(method) = map_method {
                config.keepout.method = method;
            }
            if let Some(margin) = map_expand {
                config.keepout.margin = margin;
            }
            if let Some(confidence) = map_confidence {
                config.keepout.min_confidence = confidence;
            }
            if let Some(jobs) = jobs {
                config.batch.jobs = jobs;
            }
            if let Some(secs) = timeout {
                config.batch.timeout_secs = secs;
            }
            if no_optimize {
                config.output.optimize_png = false;
            }

            run_convert_command(&config, &inputs, detections_dir).await
        }
        Some(Commands::Verify {
            map,
            visualize,
            output,
            top,
        }) => {
            // Output is user-facing text; keep logs quiet
            init_logging("inkmap=warn");
            run_verify_command(&map, visualize.as_deref(), output, top)
        }
        None => run_status_command(config_path.as_deref()),
    }
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

async fn run_convert_command(
    config: &AppConfig,
    inputs: &[PathBuf],
    detections_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut converter = Converter::from_config(config)?;
    if let Some(dir) = detections_dir {
        converter = converter.detector(Arc::new(SidecarDetector::in_dir(dir)));
    }

    let inputs = services::collect_inputs(inputs)?;
    if inputs.is_empty() {
        anyhow::bail!("no PNG images found");
    }
    tracing::info!(
        images = inputs.len(),
        jobs = config.batch.jobs,
        maps = config.keepout.enabled,
        "Starting conversion"
    );

    let options = BatchOptions {
        jobs: config.batch.jobs,
        timeout: Duration::from_secs(config.batch.timeout_secs),
    };
    let report = services::run_batch(Arc::new(converter), inputs, options).await;

    for outcome in &report.succeeded {
        match &outcome.map {
            Some(map) => println!(
                "  + {} (map {}, {:.1}% keep-out)",
                outcome.output.display(),
                map.path.display(),
                map.coverage
            ),
            None => println!("  + {}", outcome.output.display()),
        }
    }
    for failure in &report.failed {
        println!("  ! {}: {}", failure.input.display(), failure.error);
    }
    println!(
        "\nConverted {} of {} images",
        report.succeeded.len(),
        report.total()
    );

    if !report.is_success() {
        anyhow::bail!("{} images failed", report.failed.len());
    }
    Ok(())
}

fn run_verify_command(
    map_path: &Path,
    visualize: Option<&Path>,
    output: Option<PathBuf>,
    top: usize,
) -> anyhow::Result<()> {
    let file_len = std::fs::metadata(map_path)?.len();
    println!("File: {}", map_path.display());
    println!("Size: {file_len} bytes ({:.1} KB)\n", file_len as f64 / 1024.0);

    let decoded = keepout::read_map_file(map_path)?;
    let header = decoded.header;
    println!("Header:");
    println!("  Magic:    {}", String::from_utf8_lossy(keepout::codec::MAGIC));
    println!("  Version:  {}", header.version);
    println!("  Width:    {} px", header.width);
    println!("  Height:   {} px", header.height);
    println!("  Bitmap:   {} bytes", header.bitmap_len());
    if decoded.trailing > 0 {
        println!("  Trailing: {} bytes (ignored)", decoded.trailing);
    }

    let stats = keepout::analyze(&decoded.mask);
    println!("\nStatistics:");
    println!("  Total pixels:     {}", stats.total_pixels);
    println!("  Keep-out pixels:  {}", stats.keep_out_pixels);
    println!("  Coverage:         {:.2}%", stats.coverage);
    println!("  Regions:          {}", stats.regions.len());

    if !stats.regions.is_empty() && top > 0 {
        println!("\nLargest regions:");
        for (i, region) in stats.regions.iter().take(top).enumerate() {
            println!(
                "  #{}: [{},{}]-[{},{}] ({}×{}, {} px)",
                i + 1,
                region.x_min,
                region.y_min,
                region.x_max,
                region.y_max,
                region.width(),
                region.height(),
                region.area
            );
        }
    }

    if let Some(image_path) = visualize {
        let image = rendering::load_png(image_path)?;
        let overlay = rendering::render_overlay(&image, &decoded.mask, &stats.regions)?;
        let output = output.unwrap_or_else(|| default_viz_path(map_path));
        std::fs::write(&output, rendering::encode_rgb_png(&overlay)?)?;
        println!("\nVisualization saved: {}", output.display());
    }

    Ok(())
}

fn default_viz_path(map_path: &Path) -> PathBuf {
    let stem = map_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    map_path.with_file_name(format!("{stem}_viz.png"))
}

/// Show the active palette and defaults
fn run_status_command(config_path: Option<&Path>) -> anyhow::Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("Inkmap v{VERSION}");
    println!("Photo conversion for six-color e-paper frames\n");

    println!("Configuration:");
    let source = match config_path {
        Some(p) if p.exists() => p.display().to_string(),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "defaults (INKMAP_CONFIG not set)".to_string(),
    };
    println!("  Source: {source}");

    let config = AppConfig::load(config_path)?;
    println!("\nPalette:");
    match config.build_palette() {
        Ok(palette) => {
            for i in 0..palette.len() {
                let [r, g, b] = palette.official(i).to_bytes();
                let [ar, ag, ab] = palette.actual(i).to_bytes();
                println!("  {i}: #{r:02X}{g:02X}{b:02X}  (matched as #{ar:02X}{ag:02X}{ab:02X})");
            }
        }
        Err(e) => println!("  invalid: {e}"),
    }

    println!("\nQuantization:");
    println!("  Mode:   {:?}", config.quantize.mode);
    println!("  Metric: {:?}", config.quantize.metric);

    println!("\nKeep-out maps:");
    println!("  Enabled:        {}", config.keepout.enabled);
    println!("  Method:         {:?}", config.keepout.method);
    println!("  Margin:         {} px", config.keepout.margin);
    println!("  Min confidence: {}", config.keepout.min_confidence);

    println!("\nBatch:");
    println!("  Jobs:    {}", config.batch.jobs);
    println!("  Timeout: {} s", config.batch.timeout_secs);

    println!("\nCommands:");
    println!("  inkmap convert   Convert images (and write keep-out maps)");
    println!("  inkmap verify    Inspect a keep-out map");
    println!("\nRun 'inkmap --help' for more details.");
    Ok(())
}
