/*!
 * Subtitle handling: the SRT document model and ffmpeg-based extraction
 * of embedded subtitle tracks.
 */

pub mod document;
pub mod extractor;

pub use document::{SubtitleDocument, SubtitleEntry};
pub use extractor::{SubtitleExtractor, SubtitleTrack};
