//! Command-line interface implementation

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::color::color_to_hex;
use crate::extended::{AutoPalette, GeneratedPalette};
use crate::output::{load_png, save_png, DEFAULT_PREVIEW_SCALE};
use crate::preview::scale_nearest;
use crate::spec::Spec;

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Pixelgrid - render pixel art from character-grid spec files
#[derive(Parser)]
#[command(name = "pxg")]
#[command(about = "Pixelgrid - render pixel art from character-grid spec files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render all sprites from a YAML spec file and save their outputs
    Render {
        /// Input YAML spec file
        spec: PathBuf,

        /// Only render the named sprite (repeatable)
        #[arg(short, long)]
        only: Vec<String>,

        /// Render without writing any files
        #[arg(long)]
        dry_run: bool,
    },
    /// Save a nearest-neighbor enlargement of a PNG
    Preview {
        /// Input PNG file
        input: PathBuf,

        /// Output file. Defaults to {input}_preview.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scale factor
        #[arg(long, default_value = "10")]
        scale: u32,
    },
    /// Print a PNG as an auto-generated palette plus character rows
    Export {
        /// Input PNG file
        input: PathBuf,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { spec, only, dry_run } => run_render(&spec, &only, dry_run),
        Commands::Preview { input, output, scale } => {
            run_preview(&input, output.as_deref(), scale)
        }
        Commands::Export { input } => run_export(&input),
    }
}

/// Execute the render command
fn run_render(spec_path: &Path, only: &[String], dry_run: bool) -> ExitCode {
    let mut spec = match Spec::load(spec_path) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error: cannot load spec '{}': {}", spec_path.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let only_set: Option<HashSet<String>> = if only.is_empty() {
        None
    } else {
        let set: HashSet<String> = only.iter().cloned().collect();
        for name in &set {
            if !spec.sprite_names().contains(&name.as_str()) {
                eprintln!("Error: no sprite named '{}' in spec", name);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        Some(set)
    };

    let results = match spec.render(only_set.as_ref()) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if dry_run {
        let mut names: Vec<&String> = results.keys().collect();
        names.sort();
        for name in names {
            let (w, h) = results[name].size();
            println!("{} ({}x{})", name, w, h);
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    match spec.save_all(&results) {
        Ok(paths) => {
            for path in paths {
                println!("wrote {}", path.display());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the preview command
fn run_preview(input: &Path, output: Option<&Path>, scale: u32) -> ExitCode {
    let sprite = match load_png(input) {
        Ok(sprite) => sprite,
        Err(e) => {
            eprintln!("Error: cannot open '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let scale = if scale == 0 { DEFAULT_PREVIEW_SCALE } else { scale };
    let scaled = match scale_nearest(&sprite, scale) {
        Ok(scaled) => scaled,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_preview_path(input),
    };

    match save_png(&scaled, &path) {
        Ok(()) => {
            println!("wrote {}", path.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the export command
fn run_export(input: &Path) -> ExitCode {
    let (palette, rows) = match AutoPalette::from_image(input) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: cannot open '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match palette {
        GeneratedPalette::Single(p) => {
            for (key, color) in p.iter() {
                println!("{} = {}", key, color_to_hex(color));
            }
        }
        GeneratedPalette::Multi(p) => {
            for (key, color) in p.iter() {
                println!("{} = {}", key, color_to_hex(color));
            }
        }
    }
    println!();
    for row in rows {
        println!("{}", row);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Default preview output path: {input_stem}_preview.png next to the
/// input file.
fn default_preview_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let parent = input.parent().unwrap_or(Path::new(""));
    if parent.as_os_str().is_empty() {
        PathBuf::from(format!("{}_preview.png", stem))
    } else {
        parent.join(format!("{}_preview.png", stem))
    }
}
