use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::Config;
use crate::errors::{AppError, ConfigError};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::subtitle::{SubtitleDocument, SubtitleExtractor};
use crate::translation::{Batcher, TranslateBatch, merge};

// @module: Pipeline orchestrator - drives batches sequentially per file

// @const: Markup stripped from cue text before translation (font/HTML tags,
// ASS override codes left behind by extraction)
static MARKUP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>|\{\\[^}]*\}").unwrap());

/// Strip font/HTML tags and ASS override codes from cue text, dropping
/// lines left empty by the stripping
pub fn clean_cue_text(text: &str) -> String {
    let stripped = MARKUP_REGEX.replace_all(text, "");
    stripped
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Phase of a single-file run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelinePhase {
    Idle,
    Extracting,
    Batching,
    Translating(usize),
    Merging(usize),
    Serializing,
    Done,
    Aborted,
    Failed,
}

/// Observer for progress and status updates.
///
/// Both methods are invoked synchronously by the orchestrator: progress
/// after every batch merge, status on phase transitions and retries. Each
/// call carries values copied out of the pipeline state, so an observer on
/// another thread sees immutable snapshots.
pub trait PipelineObserver: Send + Sync {
    /// Percentage of cues completed, monotonically non-decreasing per run
    fn on_progress(&self, percent: u8);

    /// Human-readable status line
    fn on_status(&self, message: &str);
}

/// Observer that ignores everything
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_progress(&self, _percent: u8) {}
    fn on_status(&self, _message: &str) {}
}

/// Per-run pipeline state; observers receive cloned snapshots
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Destination language for this run
    pub target_language: String,
    /// Cues scheduled for translation
    pub total_cues: usize,
    /// Cues merged so far
    pub completed_cues: usize,
    /// File currently being processed
    pub current_file: PathBuf,
    /// Last error seen, if any
    pub last_error: Option<String>,
    /// Current phase
    pub phase: PipelinePhase,
}

impl PipelineState {
    fn reset(&mut self, file: &Path, target_language: &str) {
        self.target_language = target_language.to_string();
        self.total_cues = 0;
        self.completed_cues = 0;
        self.current_file = file.to_path_buf();
        self.last_error = None;
        self.phase = PipelinePhase::Idle;
    }

    /// Completed cues as a rounded percentage
    pub fn percent(&self) -> u8 {
        if self.total_cues == 0 {
            return 100;
        }
        ((self.completed_cues as f64 / self.total_cues as f64) * 100.0).round() as u8
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            target_language: String::new(),
            total_cues: 0,
            completed_cues: 0,
            current_file: PathBuf::new(),
            last_error: None,
            phase: PipelinePhase::Idle,
        }
    }
}

/// Cooperative cancellation flag, checked at batch boundaries only; an
/// in-flight remote call is allowed to finish or time out first
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag for a new run
    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of one file in a folder run
#[derive(Debug)]
pub enum RunOutcome {
    /// Translated and written to this path
    Succeeded(PathBuf),
    /// Terminal failure for this file; the folder run continues
    Failed {
        /// Error kind from [`AppError::kind`]
        kind: &'static str,
        /// Human-readable message
        message: String,
    },
    /// Output already existed
    Skipped(String),
}

/// Per-file entry of a folder-run summary
#[derive(Debug)]
pub struct FileReport {
    /// The input file
    pub file: PathBuf,
    /// What happened to it
    pub outcome: RunOutcome,
}

/// Drives the full pipeline for one file at a time: extraction, batching,
/// translation with bounded retry, positional merge, serialization.
///
/// Batches are processed strictly in order with no concurrent in-flight
/// requests against the same file, which bounds the remote request rate and
/// keeps progress monotonic.
pub struct Orchestrator<C: TranslateBatch> {
    client: C,
    config: Config,
    cancel: CancelFlag,
    state: PipelineState,
}

impl<C: TranslateBatch> Orchestrator<C> {
    /// Create an orchestrator; fails fast on invalid pipeline settings
    pub fn new(client: C, config: Config) -> Result<Self, ConfigError> {
        if config.pipeline.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(config.pipeline.max_batch_size));
        }
        Ok(Self {
            client,
            config,
            cancel: CancelFlag::default(),
            state: PipelineState::default(),
        })
    }

    /// Handle for requesting cancellation from another task or thread
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Snapshot of the current pipeline state
    pub fn state(&self) -> PipelineState {
        self.state.clone()
    }

    /// Translate the cues of a document in place.
    ///
    /// Retries a batch on transient errors up to the configured retry limit
    /// with doubling backoff; alignment failures are terminal immediately.
    /// Cancellation between batches leaves previously merged batches in the
    /// document (callers that want partial output can serialize it
    /// themselves) but no file is written here.
    pub async fn translate(
        &mut self,
        document: &mut SubtitleDocument,
        observer: &dyn PipelineObserver,
    ) -> Result<(), AppError> {
        let target_language = language_utils::language_name(&self.config.target_language)
            .map_err(AppError::Config)?;

        self.state.phase = PipelinePhase::Batching;
        let batcher = Batcher::new(self.config.pipeline.max_batch_size)?;

        // Partial-translation mode: only the first block_limit cues are
        // sent; the rest keep their source text in the final output
        let scope = self
            .config
            .pipeline
            .block_limit
            .map(|n| n.min(document.entries.len()))
            .unwrap_or(document.entries.len());
        if scope < document.entries.len() {
            info!(
                "Block limit active: translating {} of {} cues",
                scope,
                document.entries.len()
            );
        }

        // Normalize away markup the model would mangle or drop; cues past
        // the block limit are never sent and keep their source text verbatim
        for entry in &mut document.entries[..scope] {
            let cleaned = clean_cue_text(&entry.text);
            if !cleaned.is_empty() {
                entry.text = cleaned;
            }
        }

        let batches: Vec<std::ops::Range<usize>> =
            batcher.split(&document.entries[..scope]).collect();
        let total_batches = batches.len();
        self.state.total_cues = scope;
        self.state.completed_cues = 0;

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.state.phase = PipelinePhase::Aborted;
                observer.on_status("Translation cancelled");
                return Err(AppError::Aborted);
            }

            self.state.phase = PipelinePhase::Translating(batch_idx);
            observer.on_status(&format!(
                "Translating batch {}/{} (cues {}-{} of {})",
                batch_idx + 1,
                total_batches,
                batch.start + 1,
                batch.end,
                scope
            ));

            let texts: Vec<String> = document.entries[batch.clone()]
                .iter()
                .map(|e| e.text.clone())
                .collect();

            let mut attempt: u32 = 0;
            let translated = loop {
                match self.client.translate_batch(&texts, &target_language).await {
                    Ok(translated) => break translated,
                    Err(e) if e.is_transient() && attempt < self.config.pipeline.retry_limit => {
                        attempt += 1;
                        let backoff = self.config.pipeline.retry_backoff_ms
                            << (attempt - 1).min(6);
                        warn!(
                            "Batch {}/{} failed transiently: {} (retry {}/{})",
                            batch_idx + 1,
                            total_batches,
                            e,
                            attempt,
                            self.config.pipeline.retry_limit
                        );
                        observer.on_status(&format!(
                            "Retrying batch {}/{} (attempt {}/{})",
                            batch_idx + 1,
                            total_batches,
                            attempt,
                            self.config.pipeline.retry_limit
                        ));
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                    Err(e) => {
                        self.state.phase = PipelinePhase::Failed;
                        self.state.last_error = Some(e.to_string());
                        error!("Batch {}/{} failed: {}", batch_idx + 1, total_batches, e);
                        return Err(AppError::Translation(e));
                    }
                }
            };

            self.state.phase = PipelinePhase::Merging(batch_idx);
            if let Err(e) = merge(&mut document.entries, batch.clone(), &translated) {
                self.state.phase = PipelinePhase::Failed;
                self.state.last_error = Some(e.to_string());
                return Err(AppError::Translation(e));
            }

            self.state.completed_cues += batch.len();
            observer.on_progress(self.state.percent());
            debug!("Progress: {}%", self.state.percent());
        }

        Ok(())
    }

    /// Process one input file end to end and write the translated SRT.
    ///
    /// Subtitle inputs are parsed directly; video inputs go through
    /// ffmpeg extraction first. On success returns the output path; on
    /// abort or failure no file is written.
    pub async fn run_file<P: AsRef<Path>>(
        &mut self,
        input_file: P,
        output_dir: P,
        observer: &dyn PipelineObserver,
    ) -> Result<PathBuf, AppError> {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        self.cancel.reset();
        self.state.reset(input_file, &self.config.target_language);

        if !input_file.exists() {
            return Err(AppError::File(format!(
                "input file does not exist: {}",
                input_file.display()
            )));
        }

        let mut document = match FileManager::detect_file_type(input_file) {
            FileType::Subtitle => {
                SubtitleDocument::open(input_file).map_err(AppError::Subtitle)?
            }
            FileType::Video => {
                self.state.phase = PipelinePhase::Extracting;
                observer.on_status("Extracting subtitles");
                let preferred = if self.config.pipeline.auto_select_source_track {
                    self.config.source_language.clone()
                } else {
                    // Without auto-selection the first text track wins, which
                    // select_track falls back to for an unmatchable tag
                    String::new()
                };
                SubtitleExtractor::extract_auto(input_file, &preferred)
                    .await
                    .map_err(AppError::Extraction)?
            }
            FileType::Other => {
                return Err(AppError::File(format!(
                    "unsupported input type: {}",
                    input_file.display()
                )));
            }
        };

        info!("Loaded {} cues from {}", document.entries.len(), input_file.display());

        self.translate(&mut document, observer).await?;

        self.state.phase = PipelinePhase::Serializing;
        let code = language_utils::subtitle_code(&self.config.target_language)
            .map_err(AppError::Config)?;
        let output_path = FileManager::generate_output_path(input_file, output_dir, &code, "srt");
        document.write_to_srt(&output_path)?;

        self.state.phase = PipelinePhase::Done;
        observer.on_status(&format!("Saved {}", output_path.display()));
        info!("Success: {}", output_path.display());

        Ok(output_path)
    }

    /// Process every video file under a directory, one at a time in
    /// lexicographic path order.
    ///
    /// A file's failure is recorded and the run moves on; the returned
    /// summary lists every file's outcome.
    pub async fn run_folder<P: AsRef<Path>>(
        &mut self,
        input_dir: P,
        force_overwrite: bool,
        observer: &dyn PipelineObserver,
    ) -> Result<Vec<FileReport>, AppError> {
        let input_dir = input_dir.as_ref();
        if !input_dir.is_dir() {
            return Err(AppError::File(format!(
                "input directory does not exist: {}",
                input_dir.display()
            )));
        }

        let video_files = FileManager::find_video_files(input_dir)
            .map_err(|e| AppError::File(e.to_string()))?;
        if video_files.is_empty() {
            return Err(AppError::File(format!(
                "no video files found in {}",
                input_dir.display()
            )));
        }

        let code = language_utils::subtitle_code(&self.config.target_language)
            .map_err(AppError::Config)?;

        let mut reports = Vec::with_capacity(video_files.len());
        for video_file in video_files {
            // A cancellation between files must not be erased by the next
            // run_file resetting the flag
            if self.cancel.is_cancelled() {
                warn!("Folder processing cancelled");
                break;
            }

            let output_dir = video_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| input_dir.to_path_buf());

            let output_path =
                FileManager::generate_output_path(&video_file, &output_dir, &code, "srt");
            if output_path.exists() && !force_overwrite {
                warn!(
                    "Skipping {}, translation already exists (use -f to overwrite)",
                    video_file.display()
                );
                reports.push(FileReport {
                    file: video_file,
                    outcome: RunOutcome::Skipped(format!(
                        "output exists: {}",
                        output_path.display()
                    )),
                });
                continue;
            }

            let outcome = match self.run_file(&video_file, &output_dir, observer).await {
                Ok(path) => RunOutcome::Succeeded(path),
                Err(AppError::Aborted) => {
                    // Cancellation ends the whole folder run
                    reports.push(FileReport {
                        file: video_file,
                        outcome: RunOutcome::Failed {
                            kind: "aborted",
                            message: "cancelled".to_string(),
                        },
                    });
                    break;
                }
                Err(e) => {
                    error!("Error processing {}: {}", video_file.display(), e);
                    RunOutcome::Failed { kind: e.kind(), message: e.to_string() }
                }
            };
            reports.push(FileReport { file: video_file, outcome });
        }

        let succeeded = reports
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Succeeded(_)))
            .count();
        let skipped = reports
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Skipped(_)))
            .count();
        let failed = reports.len() - succeeded - skipped;
        info!(
            "Folder processing completed: {} succeeded, {} skipped, {} failed",
            succeeded, skipped, failed
        );

        Ok(reports)
    }
}
