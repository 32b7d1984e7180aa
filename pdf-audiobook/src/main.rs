//! pdf-audio - Convert PDF files to a single audiobook file using text-to-speech

mod audio;
mod config;
mod error;
mod notify;
mod pdf;
mod pipeline;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{AudiobookConfig, MergeStrategy};
use error::{PipelineError, Stage};
use pipeline::{Collaborators, ConvertOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "pdf-audio")]
#[command(about = "Convert PDF files to a single audiobook file using text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    input: Option<PathBuf>,

    /// Output file path (default: <pdf-name>.mp3)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum characters per synthesis request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Seconds to wait between synthesis requests
    #[arg(long)]
    delay: Option<f64>,

    /// Language code for speech synthesis (e.g., "en", "sr")
    #[arg(short, long)]
    language: Option<String>,

    /// Speech provider (google-translate, openai)
    #[arg(short, long)]
    provider: Option<String>,

    /// How chunk audio is merged into the output
    #[arg(long, value_enum)]
    merge: Option<MergeStrategy>,

    /// Do not show completion notifications
    #[arg(long)]
    no_notify: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default chunk size
    SetChunkSize {
        /// Maximum characters per request
        value: usize,
    },
    /// Set default delay between requests
    SetDelay {
        /// Seconds
        value: f64,
    },
    /// Set default language
    SetLanguage {
        /// Language code (e.g., "en")
        language: String,
    },
    /// Set default speech provider
    SetProvider {
        /// Provider name (google-translate, openai)
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Exit status for a failed run, one per pipeline stage.
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<PipelineError>().map(PipelineError::stage) {
        Some(Stage::Input) => 2,
        Some(Stage::Extraction) => 3,
        Some(Stage::Synthesis) => 4,
        Some(Stage::Merge) => 5,
        None => 1,
    }
}

async fn run(args: Args) -> Result<()> {
    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let input = args
        .input
        .clone()
        .ok_or_else(|| anyhow::anyhow!("PDF file path is required. Run 'pdf-audio --help' for usage."))?;

    let config = load_config(&args)?;
    let output = args.output.clone().unwrap_or_else(|| default_output_path(&input));

    if args.debug {
        eprintln!("PDF: {}", input.display());
        eprintln!("Output: {}", output.display());
        eprintln!("Provider: {}", config.provider);
        eprintln!("Language: {}", config.language);
        eprintln!("Chunk size: {}", config.chunk_size);
        eprintln!("Delay: {}s", config.request_delay_secs);
        eprintln!("Merge: {:?}", config.merge_strategy);
    }

    let provider = tts_client::get_provider(&config.provider, &config.tts)
        .with_context(|| format!("Failed to create speech provider '{}'", config.provider))?;
    provider
        .is_available()
        .with_context(|| format!("Speech provider '{}' is not available", provider.name()))?;

    let codec = audio::select_codec(
        config.merge_strategy,
        config.ffmpeg_path.clone(),
        provider.audio_extension(),
        &output,
    )
    .map_err(|source| PipelineError::Merge {
        path: output.clone(),
        source,
    })?;
    let notifier = notify::default_notifier(config.notifications);

    let collaborators = Collaborators {
        opener: &pdf::LopdfOpener,
        provider: provider.as_ref(),
        codec: codec.as_ref(),
        notifier: notifier.as_ref(),
    };

    let report = pipeline::convert(&input, &output, &collaborators, &ConvertOptions::from_config(&config)).await?;

    let size_mb = report.bytes_written as f64 / (1024.0 * 1024.0);
    log::info!(
        "{} page(s), {} chunk(s), {:.1} MB written to {}",
        report.pages,
        report.chunks,
        size_mb,
        report.output_path.display()
    );

    Ok(())
}

/// Load the config file and apply command line overrides.
fn load_config(args: &Args) -> Result<AudiobookConfig> {
    let mut config = AudiobookConfig::load().context("Failed to load configuration")?;

    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(delay) = args.delay {
        config.request_delay_secs = delay;
    }
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    if let Some(provider) = &args.provider {
        config.provider = provider.clone();
    }
    if let Some(merge) = args.merge {
        config.merge_strategy = merge;
    }
    if args.no_notify {
        config.notifications = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// `<input-stem>.mp3` next to the input file.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    input.with_file_name(format!("{}.mp3", stem.to_string_lossy()))
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AudiobookConfig::load()?;
            println!("Configuration file: {:?}", AudiobookConfig::config_path()?);
            println!();
            println!("chunk_size = {}", config.chunk_size);
            println!("request_delay_secs = {}", config.request_delay_secs);
            println!("language = \"{}\"", config.language);
            println!("provider = \"{}\"", config.provider);
            println!("max_attempts = {}", config.max_attempts);
            println!("merge_strategy = {:?}", config.merge_strategy);
            println!("notifications = {}", config.notifications);
            if let Some(ffmpeg) = &config.ffmpeg_path {
                println!("ffmpeg_path = \"{}\"", ffmpeg.display());
            } else {
                println!("ffmpeg_path = (from PATH)");
            }
            println!("tts.tld = \"{}\"", config.tts.tld);
            println!("tts.slow = {}", config.tts.slow);
            println!("tts.timeout_secs = {}", config.tts.timeout_secs);
            if config.tts.api_key.is_some() {
                println!("tts.api_key = (set)");
            }
        }
        ConfigAction::SetChunkSize { value } => {
            let mut config = AudiobookConfig::load()?;
            config.chunk_size = *value;
            config.validate()?;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetDelay { value } => {
            let mut config = AudiobookConfig::load()?;
            config.request_delay_secs = *value;
            config.validate()?;
            config.save()?;
            println!("Default delay set to: {}s", config.request_delay_secs);
        }
        ConfigAction::SetLanguage { language } => {
            let mut config = AudiobookConfig::load()?;
            config.language = language.clone();
            config.validate()?;
            config.save()?;
            println!("Default language set to: {}", config.language);
        }
        ConfigAction::SetProvider { name } => {
            let mut config = AudiobookConfig::load()?;
            config.provider = name.clone();
            config.validate()?;
            config.save()?;
            println!("Default provider set to: {}", config.provider);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::parse_from([
            "pdf-audio",
            "book.pdf",
            "-o",
            "book.wav",
            "--chunk-size",
            "1000",
            "--merge",
            "ffmpeg",
            "--no-notify",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("book.pdf")));
        assert_eq!(args.output, Some(PathBuf::from("book.wav")));
        assert_eq!(args.chunk_size, Some(1000));
        assert_eq!(args.merge, Some(MergeStrategy::Ffmpeg));
        assert!(args.no_notify);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/books/novel.pdf")),
            PathBuf::from("/books/novel.mp3")
        );
    }

    #[test]
    fn test_exit_codes_per_stage() {
        let input: anyhow::Error = PipelineError::InvalidInput("missing".to_string()).into();
        assert_eq!(exit_code(&input), 2);

        let no_text: anyhow::Error = PipelineError::NoText {
            path: PathBuf::from("blank.pdf"),
        }
        .into();
        assert_eq!(exit_code(&no_text), 3);

        let other = anyhow::anyhow!("config is broken");
        assert_eq!(exit_code(&other), 1);
    }
}
