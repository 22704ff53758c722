// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use subtrans::app_config::{Config, LogLevel};
use subtrans::jellyfin::{JellyfinRenamer, RenameFlags};
use subtrans::language_utils;
use subtrans::pipeline::{Orchestrator, PipelineObserver, RunOutcome};
use subtrans::subtitle::{SubtitleDocument, SubtitleExtractor};
use subtrans::translation::TranslationClient;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// subtrans - subtitle extraction and AI translation
///
/// Extracts subtitles from video files and translates them with an
/// OpenAI-compatible chat API.
#[derive(Parser, Debug)]
#[command(name = "subtrans")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered subtitle translation tool")]
#[command(long_about = "subtrans extracts subtitles from video files and translates them.

EXAMPLES:
    subtrans translate movie.mkv                # Translate using default config
    subtrans translate -f movie.mkv             # Force overwrite existing files
    subtrans translate -t fr movie.mkv          # Translate into French
    subtrans translate /movies/                 # Process an entire directory
    subtrans translate subs.srt                 # Translate an existing SRT file
    subtrans extract --list movie.mkv           # List subtitle tracks
    subtrans extract --language en movie.mkv    # Extract English subtitles only
    subtrans shift subs.srt -- -1500            # Move all cues 1.5s earlier
    subtrans rename -l es /movies/show/         # Rename subtitles for Jellyfin

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically; set the API key there before translating.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: String,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitles from a video file, an SRT file or a directory
    Translate(TranslateArgs),

    /// Extract subtitles from a video file without translating
    Extract(ExtractArgs),

    /// Shift every cue of an SRT file by a millisecond offset
    Shift(ShiftArgs),

    /// Rename subtitle files to the Jellyfin naming convention
    Rename(RenameArgs),
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input video file, SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Translate only the first N cues, leaving the rest untranslated
    #[arg(long)]
    block_limit: Option<usize>,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input video file
    #[arg(value_name = "VIDEO_PATH")]
    video_path: PathBuf,

    /// Preferred subtitle track language
    #[arg(short, long)]
    language: Option<String>,

    /// List available subtitle tracks instead of extracting
    #[arg(long)]
    list: bool,

    /// Output SRT path (defaults next to the video)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ShiftArgs {
    /// Input SRT file
    #[arg(value_name = "SRT_PATH")]
    srt_path: PathBuf,

    /// Offset in milliseconds, positive or negative, at most one hour
    #[arg(value_name = "OFFSET_MS", allow_negative_numbers = true)]
    offset_ms: i64,

    /// Output path (defaults to <name>.shifted.srt)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenameArgs {
    /// Directory containing subtitle files
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// Language the subtitles are in
    #[arg(short, long)]
    language: String,

    /// Mark the subtitles as the default track
    #[arg(long)]
    default: bool,

    /// Mark the subtitles as forced
    #[arg(long)]
    forced: bool,

    /// Mark the subtitles as SDH (hearing impaired)
    #[arg(long)]
    sdh: bool,

    /// Show the renames without performing them
    #[arg(short, long)]
    preview: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} [{}] {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Observer rendering progress as an indicatif bar on stderr
struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for ProgressBarObserver {
    fn on_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default; the level is
    // updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = load_or_create_config(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(level_filter(&config.log_level));

    match cli.command {
        Commands::Translate(args) => run_translate(config, args).await,
        Commands::Extract(args) => run_extract(config, args).await,
        Commands::Shift(args) => run_shift(args),
        Commands::Rename(args) => run_rename(args),
    }
}

fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        Config::load(config_path)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)?;
        Ok(config)
    }
}

async fn run_translate(mut config: Config, args: TranslateArgs) -> Result<()> {
    if let Some(model) = &args.model {
        config.translation.model = model.clone();
    }
    if let Some(source_language) = &args.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &args.target_language {
        config.target_language = target_language.clone();
    }
    if args.block_limit.is_some() {
        config.pipeline.block_limit = args.block_limit;
    }

    config.validate().context("Configuration validation failed")?;

    let client = TranslationClient::new(&config.translation)?;
    let mut orchestrator = Orchestrator::new(client, config)?;

    // Ctrl-C requests cancellation; the current batch is allowed to finish
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, stopping after the current batch");
            cancel.cancel();
        }
    });

    let observer = ProgressBarObserver::new();

    if args.input_path.is_file() {
        let output_dir = args
            .output_dir
            .clone()
            .or_else(|| args.input_path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let result = orchestrator
            .run_file(&args.input_path, &output_dir, &observer)
            .await;
        observer.finish();
        let output_path = result?;
        info!("Translated subtitles saved to {}", output_path.display());
    } else if args.input_path.is_dir() {
        let result = orchestrator
            .run_folder(&args.input_path, args.force_overwrite, &observer)
            .await;
        observer.finish();
        for report in result? {
            match report.outcome {
                RunOutcome::Succeeded(path) => {
                    info!("ok      {} -> {}", report.file.display(), path.display());
                }
                RunOutcome::Skipped(reason) => {
                    info!("skipped {} ({})", report.file.display(), reason);
                }
                RunOutcome::Failed { kind, message } => {
                    warn!("failed  {} [{}]: {}", report.file.display(), kind, message);
                }
            }
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}

async fn run_extract(config: Config, args: ExtractArgs) -> Result<()> {
    if args.list {
        let tracks = SubtitleExtractor::list_subtitle_tracks(&args.video_path).await?;
        if tracks.is_empty() {
            warn!("No subtitle tracks found in {:?}", args.video_path);
            return Ok(());
        }
        for track in &tracks {
            let kind = if track.is_bitmap() { "bitmap" } else { "text" };
            println!(
                "track {:>2}  {:8}  {:5}  {}",
                track.index,
                track.language.as_deref().unwrap_or("?"),
                kind,
                track.title.as_deref().unwrap_or(&track.codec_name)
            );
        }
        return Ok(());
    }

    let language = args
        .language
        .clone()
        .unwrap_or_else(|| config.source_language.clone());
    let document = SubtitleExtractor::extract_auto(&args.video_path, &language).await?;

    let output_path = match args.output {
        Some(path) => path,
        None => {
            let code = language_utils::subtitle_code(&language)?;
            let stem = args
                .video_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            args.video_path
                .with_file_name(format!("{}.{}.srt", stem, code))
        }
    };
    document.write_to_srt(&output_path)?;
    info!("Extracted {} cues to {}", document.entries.len(), output_path.display());

    Ok(())
}

fn run_shift(args: ShiftArgs) -> Result<()> {
    let document = SubtitleDocument::open(&args.srt_path)?;
    let shifted = document.shift_by_ms(args.offset_ms)?;

    let output_path = match args.output {
        Some(path) => path,
        None => {
            let stem = args
                .srt_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            args.srt_path
                .with_file_name(format!("{}.shifted.srt", stem))
        }
    };

    let shifted_document = SubtitleDocument {
        source_file: args.srt_path.clone(),
        entries: shifted,
    };
    shifted_document.write_to_srt(&output_path)?;
    info!(
        "Shifted {} cues by {}ms, saved to {}",
        shifted_document.entries.len(),
        args.offset_ms,
        output_path.display()
    );

    Ok(())
}

fn run_rename(args: RenameArgs) -> Result<()> {
    let flags = RenameFlags {
        default: args.default,
        forced: args.forced,
        sdh: args.sdh,
    };
    let renamer = JellyfinRenamer::new(&args.language, flags)?;

    if args.preview {
        let changes = renamer.preview(&args.folder)?;
        if changes.is_empty() {
            info!("All subtitle files already conform");
            return Ok(());
        }
        for (old_path, new_path) in changes {
            println!("{} -> {}", old_path.display(), new_path.display());
        }
        return Ok(());
    }

    let report = renamer.apply(&args.folder)?;
    info!(
        "Renamed {} file(s), backed up {}, {} failed",
        report.renamed.len(),
        report.backed_up.len(),
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        warn!("failed to rename {}: {}", path.display(), reason);
    }

    Ok(())
}
