/*!
 * # subtrans - subtitle extraction and AI translation pipeline
 *
 * A Rust library for extracting embedded subtitles from video files and
 * translating them with an OpenAI-compatible chat API.
 *
 * ## Features
 *
 * - Extract text subtitle tracks from video containers via ffmpeg
 * - Parse and serialize SRT with encoding fallback
 * - Batch translation with positional markers and strict alignment checks
 * - Bounded retry with backoff on transient API failures
 * - Cooperative cancellation at batch boundaries
 * - Time-shifting of cue timestamps
 * - Jellyfin-convention renaming of subtitle files
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle`: Document model and ffmpeg extraction:
 *   - `subtitle::document`: SRT parsing, serialization, time-shift
 *   - `subtitle::extractor`: Track probing and extraction
 * - `translation`: Batch translation:
 *   - `translation::batch`: Splitting cue sequences into bounded batches
 *   - `translation::client`: Prompt assembly and reply splitting
 *   - `translation::reassemble`: Positional merge back onto the cues
 * - `pipeline`: Orchestration of the stages, retry and cancellation
 * - `providers`: OpenAI-compatible API client
 * - `jellyfin`: Subtitle file renaming for Jellyfin
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod jellyfin;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod subtitle;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{
    AppError, ConfigError, ExtractionError, ProviderError, SubtitleError, TranslationError,
};
pub use pipeline::{CancelFlag, Orchestrator, PipelineObserver, PipelineState};
pub use subtitle::{SubtitleDocument, SubtitleEntry};
pub use translation::{Batcher, TranslateBatch, TranslationClient};
