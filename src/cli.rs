// ============================================================================
// rasterpad CLI - replay input scripts onto a canvas and export the result
// ============================================================================
//
// Usage examples:
//   rasterpad --input sketch.paint --output sketch.png
//   rasterpad -i strokes/*.paint --output-dir renders/ --format jpeg --quality 85
//   rasterpad -i demo.paint -o demo.bmp --width 320 --height 240 -v
//
// Each script runs on a fresh canvas built from the saved settings.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::app::PaintApp;
use crate::error::PaintResult;
use crate::io::SaveFormat;
use crate::replay;
use crate::settings::Settings;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Headless raster paint engine.
///
/// Replays pointer / keyboard scripts onto a canvas and exports the pixels.
#[derive(Parser, Debug)]
#[command(
    name = "rasterpad",
    about = "Replay paint scripts onto a raster canvas",
    long_about = "Drive the paint engine with line-oriented input scripts (tool, size,\n\
                  color, down/move/up, type, key ...) and export the finished canvas\n\
                  as PNG, JPEG, BMP or TGA.\n\n\
                  Example:\n  \
                  rasterpad --input sketch.paint --output sketch.png\n  \
                  rasterpad -i *.paint --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Script file(s). Glob patterns accepted (e.g. "*.paint").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Canvas width; overrides the settings file.
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height; overrides the settings file.
    #[arg(long)]
    pub height: Option<u32>,

    /// Alternative settings file.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Print per-file timing and the final status line.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all scripts succeeded, `1` = one or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let mut settings = match &args.settings {
        Some(path) => match Settings::load_from(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: could not read settings '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::load(),
    };
    if let Some(w) = args.width {
        settings.canvas_width = w;
    }
    if let Some(h) = args.height {
        settings.canvas_height = h;
    }

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &settings, save_format, args.quality) {
            Ok(status) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
                if args.verbose && !status.is_empty() {
                    println!("  status: {}", status);
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

/// Replay one script and export.  Returns the app's final status line.
fn run_one(
    input: &Path,
    output: &Path,
    settings: &Settings,
    format: SaveFormat,
    quality: u8,
) -> PaintResult<String> {
    let source = std::fs::read_to_string(input)?;
    let mut app = PaintApp::from_settings(settings)?;
    let applied = replay::run_script(&mut app, &source)?;
    app.export(output, format, quality)?;
    log_info!("{}: {} command(s) → {}", input.display(), applied, output.display());
    Ok(app.status().to_string())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    format_arg
        .and_then(SaveFormat::from_name)
        .or_else(|| output.and_then(SaveFormat::from_path))
        .unwrap_or_default()
}

/// Compute the output path for a single script.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the script, same stem, image extension
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
