use clap::{Parser, ValueEnum};
use poketext::config::Configuration;
use poketext::coordinator::CoordinatorBuilder;
use poketext::error::AppError;
use poketext::pipeline::services::recognition::EngineRecognizer;
use poketext::Transcript;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    Template,
    Tesseract,
}

/// Extracts slow dialogue from Pokemon Diamond/Pearl/Platinum/HGSS recordings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directories of extracted frames, one recording each.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Game profile: diamond_pearl, platinum or hgss.
    #[arg(short, long)]
    game: Option<String>,

    /// Directory of glyph template PNGs.
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Frame rate the frames were extracted at.
    #[arg(long)]
    fps: Option<f64>,

    /// Skip everything before this many seconds.
    #[arg(long)]
    start: Option<f64>,

    /// Stop after this many seconds.
    #[arg(long)]
    end: Option<f64>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file. Only valid with a single input; defaults to `<input>_dialogue.txt`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = Engine::Template)]
    engine: Engine,

    /// Drop lines that look like recognition artefacts.
    #[arg(long)]
    discard_garbage: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    let extension = match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
    };
    input.with_file_name(format!("{}_dialogue.{}", stem, extension))
}

fn write_transcript(
    transcript: &Transcript,
    path: &Path,
    format: OutputFormat,
) -> Result<(), AppError> {
    let rendered = match format {
        OutputFormat::Text => transcript.render_text(),
        OutputFormat::Json => transcript.render_json()?,
    };
    std::fs::write(path, rendered).map_err(|e| AppError::Output(e, path.to_path_buf()))?;
    info!("Wrote {} entries to {}", transcript.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut configuration = Configuration::load(args.config.as_deref())?;
    if args.discard_garbage {
        configuration.discard_garbage = true;
    }
    if args.output.is_some() && args.inputs.len() > 1 {
        return Err(AppError::Config(poketext::error::ConfigError::Invalid(
            "--output needs exactly one input".to_string(),
        )));
    }

    let tesseract = configuration.tesseract();
    let mut builder = CoordinatorBuilder::new(configuration).window(args.start, args.end);
    if let Some(game) = args.game {
        builder = builder.game(game);
    }
    if let Some(templates) = args.templates {
        builder = builder.templates_dir(templates);
    }
    if let Some(fps) = args.fps {
        builder = builder.fps(fps);
    }
    if args.engine == Engine::Tesseract {
        builder = builder.recognizer(Arc::new(EngineRecognizer::new(tesseract)));
    }
    let coordinator = builder.build()?;

    let mut failures = 0;
    for (input, result) in coordinator.run(args.inputs).await {
        match result {
            Ok(transcript) => {
                let path = args
                    .output
                    .clone()
                    .unwrap_or_else(|| output_path(&input, args.format));
                write_transcript(&transcript, &path, args.format)?;
                println!("{}: {}", input.display(), transcript.summary());
            }
            Err(e) => {
                error!("{} failed: {}", input.display(), e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        error!("{} input(s) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}
