use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::process::Command;

use crate::errors::ExtractionError;
use crate::language_utils;
use crate::subtitle::document::SubtitleDocument;

// @module: Embedded subtitle stream probing and extraction via ffmpeg

/// ffprobe time budget; probing metadata should never take this long
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);
/// ffmpeg extraction time budget
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(120);

/// One subtitle stream found in a video container
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    /// Stream index inside the container
    pub index: usize,
    /// Codec name reported by ffprobe
    pub codec_name: String,
    /// Language tag if the container carries one
    pub language: Option<String>,
    /// Stream title if the container carries one
    pub title: Option<String>,
}

impl SubtitleTrack {
    /// Bitmap subtitle codecs cannot be converted to text SRT without OCR
    pub fn is_bitmap(&self) -> bool {
        matches!(
            self.codec_name.as_str(),
            "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
        )
    }
}

/// Wrapper around ffmpeg/ffprobe for subtitle stream access
pub struct SubtitleExtractor;

impl SubtitleExtractor {
    /// List subtitle streams in a video file, in container order
    pub async fn list_subtitle_tracks<P: AsRef<Path>>(
        video_path: P,
    ) -> Result<Vec<SubtitleTrack>, ExtractionError> {
        let video_path = video_path.as_ref();
        if !video_path.exists() {
            return Err(ExtractionError::CommandFailed(format!(
                "video file not found: {}",
                video_path.display()
            )));
        }

        let probe = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "s",
                video_path.to_str().unwrap_or_default(),
            ])
            .output();

        let output = tokio::select! {
            result = probe => result.map_err(|e| {
                ExtractionError::ToolUnavailable(format!("failed to run ffprobe: {}", e))
            })?,
            _ = tokio::time::sleep(PROBE_TIMEOUT) => {
                return Err(ExtractionError::Timeout(PROBE_TIMEOUT.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::CommandFailed(format!("ffprobe failed: {}", stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }

        let json: Value = serde_json::from_str(&stdout).map_err(|e| {
            ExtractionError::CommandFailed(format!("unparsable ffprobe output: {}", e))
        })?;

        let mut tracks = Vec::new();
        if let Some(streams) = json.get("streams").and_then(|s| s.as_array()) {
            for stream in streams {
                let index = stream
                    .get("index")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize)
                    .unwrap_or(0);
                let codec_name = stream
                    .get("codec_name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                let language = stream
                    .get("tags")
                    .and_then(|t| t.get("language"))
                    .and_then(|l| l.as_str())
                    .map(|s| s.to_string());
                let title = stream
                    .get("tags")
                    .and_then(|t| t.get("title"))
                    .and_then(|l| l.as_str())
                    .map(|s| s.to_string());

                tracks.push(SubtitleTrack { index, codec_name, language, title });
            }
        }

        Ok(tracks)
    }

    /// Pick a text subtitle track matching the preferred language.
    ///
    /// Matches the container's language tag first, then a language name in
    /// the stream title; falls back to an English-tagged track, then to the
    /// first text track.
    pub fn select_track<'a>(
        tracks: &'a [SubtitleTrack],
        preferred_language: &str,
    ) -> Option<&'a SubtitleTrack> {
        let text_tracks: Vec<&SubtitleTrack> = tracks.iter().filter(|t| !t.is_bitmap()).collect();
        if text_tracks.is_empty() {
            return None;
        }

        let matches_language = |track: &SubtitleTrack, wanted: &str| -> bool {
            if let Some(tag) = &track.language {
                if language_utils::language_codes_match(tag, wanted) {
                    return true;
                }
            }
            if let Some(title) = &track.title {
                let title_lower = title.to_lowercase();
                if let Ok(name) = language_utils::language_name(wanted) {
                    if title_lower.contains(&name.to_lowercase()) {
                        return true;
                    }
                }
                if title_lower.contains(&wanted.to_lowercase()) {
                    return true;
                }
            }
            false
        };

        if let Some(track) = text_tracks.iter().find(|t| matches_language(t, preferred_language)) {
            return Some(track);
        }

        if !language_utils::language_codes_match(preferred_language, "en") {
            if let Some(track) = text_tracks.iter().find(|t| matches_language(t, "en")) {
                return Some(track);
            }
        }

        text_tracks.first().copied()
    }

    /// Extract one subtitle stream to an SRT file and parse it
    pub async fn extract_track<P: AsRef<Path>>(
        video_path: P,
        track_index: usize,
        output_path: P,
    ) -> Result<SubtitleDocument, ExtractionError> {
        let video_path = video_path.as_ref();
        let output_path = output_path.as_ref();

        let extract = Command::new("ffmpeg")
            .args([
                "-y",
                "-i",
                video_path.to_str().unwrap_or_default(),
                "-map",
                &format!("0:{}", track_index),
                "-c:s",
                "srt",
                output_path.to_str().unwrap_or_default(),
            ])
            .output();

        let result = tokio::select! {
            result = extract => result.map_err(|e| {
                ExtractionError::ToolUnavailable(format!("failed to run ffmpeg: {}", e))
            })?,
            _ = tokio::time::sleep(EXTRACT_TIMEOUT) => {
                return Err(ExtractionError::Timeout(EXTRACT_TIMEOUT.as_secs()));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ExtractionError::CommandFailed(Self::filter_ffmpeg_stderr(&stderr)));
        }

        let file_size = std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0);
        if file_size == 0 {
            return Err(ExtractionError::NoSubtitleStreams(format!(
                "extracted file is empty, track {} carries no cues",
                track_index
            )));
        }

        SubtitleDocument::open(output_path).map_err(|e| {
            ExtractionError::CommandFailed(format!(
                "extracted track {} is not parsable SRT: {}",
                track_index, e
            ))
        })
    }

    /// Extract with automatic track selection, to a temporary SRT file
    /// that is removed after parsing
    pub async fn extract_auto<P: AsRef<Path>>(
        video_path: P,
        preferred_language: &str,
    ) -> Result<SubtitleDocument, ExtractionError> {
        let video_path = video_path.as_ref();
        let tracks = Self::list_subtitle_tracks(video_path).await?;

        if tracks.is_empty() {
            return Err(ExtractionError::NoSubtitleStreams(format!(
                "no subtitle streams in {}",
                video_path.display()
            )));
        }

        let bitmap_count = tracks.iter().filter(|t| t.is_bitmap()).count();
        if bitmap_count > 0 && bitmap_count < tracks.len() {
            warn!(
                "Skipping {} bitmap subtitle track(s) (PGS/VobSub), only text tracks can be extracted",
                bitmap_count
            );
        }

        let track = Self::select_track(&tracks, preferred_language).ok_or_else(|| {
            let codec_list: Vec<String> = tracks
                .iter()
                .map(|t| {
                    format!(
                        "track {} ({}, {})",
                        t.index,
                        t.language.as_deref().unwrap_or("?"),
                        t.codec_name
                    )
                })
                .collect();
            ExtractionError::NoSubtitleStreams(format!(
                "all subtitle tracks are bitmap-based and need OCR: {}",
                codec_list.join(", ")
            ))
        })?;

        debug!(
            "Selected subtitle track {} ({}, {})",
            track.index,
            track.language.as_deref().unwrap_or("?"),
            track.codec_name
        );

        let temp_path = Self::temp_track_path(track.index);
        let result = Self::extract_track(video_path, track.index, temp_path.as_path()).await;

        if temp_path.exists() {
            let _ = std::fs::remove_file(&temp_path);
        }

        // The document should be identified by the video it came from,
        // not the deleted temp file
        result.map(|mut doc| {
            doc.source_file = video_path.to_path_buf();
            doc
        })
    }

    /// Scratch path for an extracted track, unique per process so
    /// concurrent runs on the same machine never clobber each other
    pub fn temp_track_path(track_index: usize) -> PathBuf {
        std::env::temp_dir().join(format!(
            "subtrans_{}_track_{}.srt",
            std::process::id(),
            track_index
        ))
    }

    /// Strip the ffmpeg version banner and stream metadata noise from stderr
    fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let noise_prefixes = [
            "ffmpeg version",
            "built with",
            "configuration:",
            "lib",
            "Input #",
            "Metadata:",
            "Duration:",
            "Chapter",
            "Stream #",
            "Output #",
            "Stream mapping:",
            "Press [q]",
            "title",
            "BPS",
            "DURATION",
            "NUMBER_OF",
            "_STATISTICS",
        ];

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| {
                !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p))
            })
            .collect();

        if meaningful.is_empty() {
            "unknown ffmpeg error".to_string()
        } else {
            meaningful.join("\n")
        }
    }
}
