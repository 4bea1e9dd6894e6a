#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use vista::{
    resolver, CarouselController, ImageDescriptor, Point, RenditionRole, Size, SwipeDirection,
    UrlResolver, ViewerError, ViewerTunables, ZoomPanViewport,
};

/// Vista viewer CLI tools
#[derive(Parser)]
#[command(name = "vista")]
#[command(about = "Vista viewer CLI tools - inspect manifests, prefetch plans, and viewport geometry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Tunables override file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an image manifest and dump it
    Inspect {
        /// Manifest file (JSON)
        manifest: PathBuf,
        /// Output format (json, yaml, toml)
        #[arg(short, long, default_value = "json")]
        format: InspectFormat,
        /// Pretty print output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Check descriptor invariants across a manifest
    Validate {
        /// Manifest file (JSON)
        manifest: PathBuf,
    },
    /// Print the directional prefetch plan for an index
    Plan {
        /// Manifest file (JSON)
        manifest: PathBuf,
        /// Current carousel index
        #[arg(short, long, default_value = "0")]
        index: usize,
        /// Travel direction biasing the plan
        #[arg(short, long, default_value = "forward")]
        direction: Direction,
        /// Origin for root-relative rendition paths
        #[arg(long, default_value = "")]
        origin: String,
    },
    /// Compute viewport geometry, max zoom, and the minimap rectangle
    Geometry {
        #[arg(long)]
        container_width: f32,
        #[arg(long)]
        container_height: f32,
        #[arg(long)]
        natural_width: f32,
        #[arg(long)]
        natural_height: f32,
        /// Zoom level to evaluate
        #[arg(short, long, default_value = "1.0")]
        zoom: f32,
        #[arg(long, default_value = "0.0")]
        pan_x: f32,
        #[arg(long, default_value = "0.0")]
        pan_y: f32,
        #[arg(long, default_value = "1.0")]
        device_pixel_ratio: f32,
        /// Derive bounds for a touch-primary layout
        #[arg(long)]
        touch: bool,
    },
    /// Warm a local rendition tree through the prefetch scheduler
    #[cfg(feature = "streaming")]
    Warm {
        /// Manifest file (JSON)
        manifest: PathBuf,
        /// Root directory holding the rendition files
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(ValueEnum, Clone)]
enum InspectFormat {
    Json,
    Yaml,
    Toml,
}

#[derive(ValueEnum, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Image manifest as exported by the listing backend
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    title: String,
    images: Vec<ImageDescriptor>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.quiet {
        log::LevelFilter::Error
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.quiet && args.verbose {
        warn!("Both --quiet and --verbose specified, using --quiet");
    }

    // Run command
    if let Err(e) = run(args) {
        error!("Command failed: {}", e);

        // Map to appropriate exit codes
        let exit_code = match e.downcast_ref::<ViewerError>() {
            Some(ViewerError::InvalidDescriptor(_)) => 1,
            Some(ViewerError::NoDisplayableSource { .. }) => 1,
            Some(ViewerError::ManifestError(_)) => 1,
            Some(ViewerError::IoError(_)) => 1,
            _ => 2,
        };

        process::exit(exit_code);
    }
}

fn run(args: Args) -> Result<()> {
    let tunables = load_tunables(args.config.as_deref())?;

    match args.command {
        Commands::Inspect {
            manifest,
            format,
            pretty,
        } => cmd_inspect(manifest, format, pretty),
        Commands::Validate { manifest } => cmd_validate(manifest),
        Commands::Plan {
            manifest,
            index,
            direction,
            origin,
        } => cmd_plan(manifest, index, direction, origin, &tunables),
        Commands::Geometry {
            container_width,
            container_height,
            natural_width,
            natural_height,
            zoom,
            pan_x,
            pan_y,
            device_pixel_ratio,
            touch,
        } => cmd_geometry(
            Size::new(container_width, container_height),
            Size::new(natural_width, natural_height),
            zoom,
            Point::new(pan_x, pan_y),
            device_pixel_ratio,
            touch,
            &tunables,
        ),
        #[cfg(feature = "streaming")]
        Commands::Warm { manifest, root } => cmd_warm(manifest, root, &tunables),
    }
}

fn load_tunables(path: Option<&std::path::Path>) -> Result<ViewerTunables> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        }
        None => Ok(ViewerTunables::default()),
    }
}

fn load_manifest(path: &std::path::Path) -> Result<Manifest> {
    let text = fs::read_to_string(path)?;
    let mut manifest: Manifest =
        serde_json::from_str(&text).map_err(ViewerError::ManifestError)?;
    for descriptor in &mut manifest.images {
        descriptor.normalize();
    }
    Ok(manifest)
}

fn cmd_inspect(path: PathBuf, format: InspectFormat, pretty: bool) -> Result<()> {
    info!("Inspecting {}", path.display());

    let manifest = load_manifest(&path)?;

    let output = match format {
        InspectFormat::Json => {
            if pretty {
                serde_json::to_string_pretty(&manifest)?
            } else {
                serde_json::to_string(&manifest)?
            }
        }
        InspectFormat::Yaml => serde_yaml::to_string(&manifest)?,
        InspectFormat::Toml => toml::to_string_pretty(&manifest)?,
    };

    println!("{}", output);
    Ok(())
}

fn cmd_validate(path: PathBuf) -> Result<()> {
    info!("Validating {}", path.display());

    let manifest = load_manifest(&path)?;

    let mut failures = 0usize;
    for descriptor in &manifest.images {
        if let Err(e) = descriptor.validate() {
            error!("{}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} descriptors invalid", manifest.images.len());
    }

    info!("✓ {} descriptors valid", manifest.images.len());
    Ok(())
}

fn cmd_plan(
    path: PathBuf,
    index: usize,
    direction: Direction,
    origin: String,
    tunables: &ViewerTunables,
) -> Result<()> {
    let manifest = load_manifest(&path)?;
    let urls = UrlResolver::new(origin, "media");

    let mut carousel = CarouselController::new(manifest.images.len(), tunables);
    let _ = carousel.slide_to(index, 0.0);
    carousel.set_direction(match direction {
        Direction::Forward => SwipeDirection::Forward,
        Direction::Backward => SwipeDirection::Backward,
    });

    let mut plan = Vec::new();
    for neighbor in carousel.prefetch_plan() {
        let Some(descriptor) = manifest.images.get(neighbor) else {
            continue;
        };
        let url = resolver::resolve_display_url(
            descriptor,
            RenditionRole::Detail,
            tunables.detail_target_width,
        )
        .map(|u| urls.resolve(u));
        plan.push(serde_json::json!({
            "index": neighbor,
            "id": descriptor.id,
            "url": url,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_geometry(
    container: Size,
    natural: Size,
    zoom: f32,
    pan: Point,
    device_pixel_ratio: f32,
    touch: bool,
    tunables: &ViewerTunables,
) -> Result<()> {
    let mut viewport =
        ZoomPanViewport::new(container, device_pixel_ratio, touch, tunables.clone());
    viewport.set_natural_size(natural);
    viewport.set_zoom(zoom);
    viewport.set_pan(pan);

    let Some(geometry) = viewport.current_geometry() else {
        anyhow::bail!("container or image size is not renderable");
    };

    let output = serde_json::json!({
        "zoom": viewport.zoom(),
        "maxZoom": viewport.max_zoom(),
        "pan": { "x": viewport.pan().x, "y": viewport.pan().y },
        "geometry": geometry,
        "minimap": viewport.minimap(0.0),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "streaming")]
fn cmd_warm(path: PathBuf, root: PathBuf, tunables: &ViewerTunables) -> Result<()> {
    use std::sync::Arc;

    use vista::loader::{FileFetcher, PrefetchDriver};
    use vista::prefetch::{PrefetchReason, PrefetchRequest, PrefetchScheduler};

    let manifest = load_manifest(&path)?;
    info!(
        "Warming {} images under {}",
        manifest.images.len(),
        root.display()
    );

    let mut scheduler = PrefetchScheduler::new(tunables);
    let mut driver = PrefetchDriver::new(Arc::new(FileFetcher::new(root)));

    let mut warmed = 0usize;
    let mut dropped = 0usize;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let pb = create_progress_bar(manifest.images.len() as u64);

        // One enqueue call per image keeps each call inside the fan-out cap
        for (index, descriptor) in manifest.images.iter().enumerate() {
            let Some(url) = resolver::resolve_display_url(
                descriptor,
                RenditionRole::Detail,
                tunables.detail_target_width,
            ) else {
                pb.inc(1);
                continue;
            };
            let jobs = scheduler.enqueue(vec![PrefetchRequest {
                url: url.to_string(),
                index,
                reason: PrefetchReason::IndexChange,
            }]);
            driver.spawn_jobs(jobs);

            for completion in driver.run_to_idle(&mut scheduler).await {
                if completion.success {
                    warmed += 1;
                } else {
                    dropped += 1;
                }
                pb.set_message(completion.url.clone());
                pb.inc(1);
            }
        }

        pb.finish_with_message("done");
    });

    info!("✓ warmed {warmed} URLs ({dropped} dropped)");
    Ok(())
}

#[cfg(feature = "streaming")]
fn create_progress_bar(len: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("Failed to create progress bar template")
            .progress_chars("##-"),
    );
    pb
}
