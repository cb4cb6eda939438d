use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use env_logger::Env;
use fpspatch::{PatchOptions, PatchOutcome};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  fpspatch detect input.mp4 --json\n  fpspatch patch input.mp4 --fps 60\n  fpspatch patch input.mp4 --from 24 --fps 48 --out fast.mp4\n  fpspatch reverse fast.mp4 --original 24 --target 48\n  fpspatch completions zsh > _fpspatch";

#[derive(Debug, Parser)]
#[command(
    name = "fpspatch",
    version,
    about = "Change the frame rate an MP4 file reports, losslessly",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show per-box diagnostics on stderr.
    #[arg(long, global = true)]
    verbose: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect the frame rate stored in an MP4 file.
    #[command(
        about = "Detect frame rate",
        after_help = "Examples:\n  fpspatch detect input.mp4\n  fpspatch detect input.mp4 --json"
    )]
    Detect {
        /// Input MP4 path.
        input: PathBuf,

        /// Output the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite timing boxes so the file reports a new frame rate.
    #[command(
        about = "Patch frame rate",
        after_help = "Examples:\n  fpspatch patch input.mp4 --fps 60\n  fpspatch patch input.mp4 --from 23.976 --fps 25 --dry-run"
    )]
    Patch {
        /// Input MP4 path.
        input: PathBuf,
        /// Frame rate the output should report.
        #[arg(long, value_parser = parse_fps)]
        fps: f64,
        /// Frame rate of the input. Detected when omitted.
        #[arg(long, value_parser = parse_fps)]
        from: Option<f64>,
        /// Output path. Defaults to `<input>_patched.mp4`.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Report what would change without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Output the patch log as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Undo a previous patch made with the same pair of rates.
    #[command(
        about = "Reverse a frame rate patch",
        after_help = "Examples:\n  fpspatch reverse fast.mp4 --original 24 --target 48"
    )]
    Reverse {
        /// Input MP4 path (a previously patched file).
        input: PathBuf,
        /// The `--from` rate used for the original patch.
        #[arg(long, value_parser = parse_fps)]
        original: f64,
        /// The `--fps` rate used for the original patch.
        #[arg(long, value_parser = parse_fps)]
        target: f64,
        /// Output path. Defaults to `<input>_patched.mp4`.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output the patch log as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate timing boxes and print a report.
    #[command(
        about = "Validate MP4 timing boxes",
        after_help = "Examples:\n  fpspatch validate input.mp4"
    )]
    Validate {
        /// Input MP4 path.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_fps(value: &str) -> Result<f64, String> {
    let fps: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {value}"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("frame rate must be a positive number, got {value}"));
    }
    Ok(fps)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = input
        .extension()
        .map(|extension| extension.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    input.with_file_name(format!("{stem}_patched.{extension}"))
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn outcome_json(outcome: &PatchOutcome, output: Option<&Path>) -> serde_json::Value {
    json!({
        "success": outcome.success,
        "patched_count": outcome.patched_count,
        "output": output.map(|path| path.display().to_string()),
        "changes": outcome.changes.iter().map(|change| json!({
            "box": change.before.tag.to_string(),
            "version": change.before.version,
            "offset": change.before.offset,
            "timescale": [change.before.timescale, change.after.timescale],
            "duration": [change.before.duration, change.after.duration],
        })).collect::<Vec<_>>(),
        "logs": outcome.logs,
    })
}

fn print_logs(outcome: &PatchOutcome) {
    for line in &outcome.logs {
        if line.starts_with("ERROR") {
            eprintln!("{}", line.red());
        } else {
            eprintln!("{}", line.dimmed());
        }
    }
}

fn finish_patch(
    outcome: PatchOutcome,
    output: &Path,
    write: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let written = (write && outcome.success).then_some(output);
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome_json(&outcome, written))?
        );
    } else {
        print_logs(&outcome);
    }

    if let Some(error) = outcome.failure() {
        return Err(error.clone().into());
    }

    if write {
        fs::write(output, &outcome.data)?;
        if !json {
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "patched {} box(es) -> {}",
                    outcome.patched_count,
                    output.display()
                )
                .green()
            );
        }
    } else if !json {
        println!(
            "{} {}",
            "dry run:".cyan().bold(),
            format!("{} box(es) would be patched", outcome.patched_count).cyan()
        );
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Detect { input, json } => {
            let data = fs::read(&input)?;
            let detection = fpspatch::detect(&data);
            if json {
                let payload = match &detection {
                    Ok(detection) => json!({
                        "fps": detection.fps,
                        "method": detection.method.to_string(),
                        "movie_timescale": detection.probe.movie.timescale,
                        "media_timescale": detection.probe.media.timescale,
                        "sample_delta": detection.probe.first_sample.map(|s| s.sample_delta),
                    }),
                    Err(error) => json!({
                        "fps": null,
                        "error": error.to_string(),
                    }),
                };
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            let detection = detection?;
            if !json {
                println!("Frame rate: {} fps", detection.fps);
                println!("Method: {}", detection.method);
                println!(
                    "Media timescale: {} (duration {})",
                    detection.probe.media.timescale, detection.probe.media.duration,
                );
            }
        }
        Commands::Patch {
            input,
            fps,
            from,
            out,
            dry_run,
            json,
        } => {
            let data = fs::read(&input)?;
            let original = match from {
                Some(original) => original,
                None => fpspatch::detect_fps(&data).ok_or(
                    "frame rate could not be detected; pass the input rate with --from",
                )?,
            };
            if cli.global.verbose {
                eprintln!("patching {} fps -> {} fps", original, fps);
            }

            let output = out.unwrap_or_else(|| default_output_path(&input));
            if !dry_run {
                ensure_writable_path(&output, cli.global.overwrite)?;
            }

            let options = PatchOptions::new().with_dry_run(dry_run);
            let outcome = fpspatch::apply_patch_with_options(&data, original, fps, &options);
            finish_patch(outcome, &output, !dry_run, json)?;
        }
        Commands::Reverse {
            input,
            original,
            target,
            out,
            json,
        } => {
            let data = fs::read(&input)?;
            let output = out.unwrap_or_else(|| default_output_path(&input));
            ensure_writable_path(&output, cli.global.overwrite)?;

            let outcome = fpspatch::reverse_patch(&data, original, target);
            finish_patch(outcome, &output, true, json)?;
        }
        Commands::Validate { input } => {
            let data = fs::read(&input)?;
            let report = fpspatch::validate(&data);
            print!("{report}");
            if !report.is_valid() {
                return Err("validation failed".into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "fpspatch", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Cli, default_output_path, ensure_writable_path, parse_fps};

    #[test]
    fn parse_fps_accepts_positive_numbers() {
        assert_eq!(parse_fps("24").unwrap(), 24.0);
        assert_eq!(parse_fps(" 29.97 ").unwrap(), 29.97);
        assert!(parse_fps("0").is_err());
        assert!(parse_fps("-30").is_err());
        assert!(parse_fps("inf").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn default_output_path_appends_suffix() {
        assert_eq!(
            default_output_path(Path::new("clips/holiday.mp4")),
            Path::new("clips/holiday_patched.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("movie.MOV")),
            Path::new("movie_patched.MOV")
        );
        assert_eq!(
            default_output_path(Path::new("raw")),
            Path::new("raw_patched.mp4")
        );
    }

    #[test]
    fn ensure_writable_path_respects_overwrite() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let path = directory.path().join("existing.mp4");
        assert!(ensure_writable_path(&path, false).is_ok());

        std::fs::write(&path, b"data").expect("Failed to write file");
        assert!(ensure_writable_path(&path, false).is_err());
        assert!(ensure_writable_path(&path, true).is_ok());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
