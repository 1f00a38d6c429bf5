//! prism - command-line front end for the Prism model viewer core
//!
//! Renders gradient textures, inspects scene JSON and exports scenes to
//! GLB, glTF, OBJ or STL.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prism_export::{
    apply_positioning, compute_stats, BakeMode, ConversionOptions, ExportFormat, ExportOptions,
    FormatRegistry, WriteOptions,
};
use prism_material::MaterialRegistry;
use prism_paint::{generate, GradientSpec};
use prism_scene::Scene;
use tracing_subscriber::EnvFilter;

use crate::config::PrismConfig;

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Prism material and export tool")]
#[command(version)]
struct Cli {
    /// JSON config file with defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a gradient spec to a PNG
    Gradient {
        /// Gradient spec JSON
        spec: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Texture edge length in pixels (overrides config)
        #[arg(short, long)]
        size: Option<u32>,
    },

    /// Export a scene to GLB, glTF, OBJ or STL
    Export {
        /// Scene JSON
        input: PathBuf,

        /// Output file; its extension picks the format unless --format is given
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (glb, gltf, obj, stl)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Fold world transforms into vertex data
        #[arg(long, conflicts_with = "preserve")]
        bake: bool,

        /// Keep the node hierarchy's transforms
        #[arg(long)]
        preserve: bool,

        /// Write ASCII STL
        #[arg(long)]
        ascii: bool,
    },

    /// Print vertex, triangle, mesh and texture counts
    Stats {
        /// Scene JSON
        input: PathBuf,
    },

    /// Scan a scene and list its materials
    Materials {
        /// Scene JSON
        input: PathBuf,
    },

    /// Center, ground or reorient a scene
    Position {
        /// Scene JSON
        input: PathBuf,

        /// Output scene JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Leave the model where it was authored
        #[arg(long)]
        preserve_position: bool,

        /// Do not center on X/Z
        #[arg(long)]
        no_center: bool,

        /// Do not move the lowest point to Y = 0
        #[arg(long)]
        no_ground: bool,

        /// Rotate Z-up content to Y-up
        #[arg(long)]
        y_up: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PrismConfig::load(cli.config.as_deref())?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Gradient { spec, output, size } => {
            let text = std::fs::read_to_string(&spec)
                .with_context(|| format!("failed to read {}", spec.display()))?;
            let spec: GradientSpec = serde_json::from_str(&text)
                .with_context(|| format!("invalid gradient spec {}", spec.display()))?;
            let size = size.unwrap_or(config.texture_size);

            let image = generate(&spec, size)?;
            let png = image.encode_png()?;
            std::fs::write(&output, &png)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(kind = ?spec.kind, size, bytes = png.len(), "wrote {:?}", output);
        }

        Commands::Export {
            input,
            output,
            format,
            bake,
            preserve,
            ascii,
        } => {
            let scene = load_scene(&input)?;
            let format = format
                .or_else(|| ExportFormat::from_path(&output))
                .unwrap_or(config.export_format);
            let bake = match (bake, preserve) {
                (true, _) => BakeMode::Baked,
                (_, true) => BakeMode::Preserved,
                _ => config.bake,
            };
            let write = WriteOptions {
                pretty: config.pretty,
                ascii: ascii || config.stl_ascii,
            };

            tracing::info!("Exporting {:?} -> {:?} as {}", input, output, format);
            let options = ExportOptions::new(format)
                .with_bake(bake)
                .with_write_options(write);
            let exported = FormatRegistry::with_defaults()
                .export(&scene, &options)
                .with_context(|| format!("failed to export {}", input.display()))?;
            exported
                .write_to(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(bytes = exported.byte_size, "Done!");
        }

        Commands::Stats { input } => {
            let scene = load_scene(&input)?;
            print_json(&compute_stats(&scene), config.pretty)?;
        }

        Commands::Materials { input } => {
            let mut scene = load_scene(&input)?;
            let mut registry = MaterialRegistry::new();
            let entries = registry.scan(&mut scene);
            print_json(&entries, config.pretty)?;
        }

        Commands::Position {
            input,
            output,
            preserve_position,
            no_center,
            no_ground,
            y_up,
        } => {
            let mut scene = load_scene(&input)?;
            let options = ConversionOptions {
                preserve_position,
                center_model: !no_center,
                ground_model: !no_ground,
                rotate_to_y_up: y_up,
            };
            let bounds = apply_positioning(&mut scene, &options);
            std::fs::write(&output, scene.to_json(config.pretty)?)
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(min = ?bounds.min, max = ?bounds.max, "wrote {:?}", output);
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> Result<Scene> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Scene::from_json(&text).with_context(|| format!("invalid scene {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
