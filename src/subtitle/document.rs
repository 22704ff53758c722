use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, ISO_8859_15, WINDOWS_1252};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: SRT document model - parse, serialize, time-shift

/// Maximum accepted time-shift magnitude (1 hour)
pub const MAX_SHIFT_MS: i64 = 3_600_000;

// @const: SRT timestamp line regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})")
        .unwrap()
});

/// Fallback single-byte encodings tried after strict UTF-8.
///
/// encoding_rs folds latin-1/ISO-8859-1 into windows-1252 per WHATWG, which
/// matches how real-world SRT files labelled latin-1 are actually encoded.
static FALLBACK_ENCODINGS: &[&Encoding] = &[WINDOWS_1252, ISO_8859_15];

/// One timed subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    /// 1-based ordinal position in the document (stable identity)
    pub index: usize,

    /// Start time in milliseconds
    pub start_time_ms: u64,

    /// End time in milliseconds
    pub end_time_ms: u64,

    /// Display text, one or more lines
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without validation - tests and fixtures
    pub fn new(index: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry { index, start_time_ms, end_time_ms, text }
    }

    // @creates: Validated subtitle entry
    // @validates: start < end
    pub fn new_validated(
        index: usize,
        start_time_ms: u64,
        end_time_ms: u64,
        text: String,
    ) -> Result<Self, SubtitleError> {
        if end_time_ms <= start_time_ms {
            return Err(SubtitleError::Format(format!(
                "cue {}: end time {} <= start time {}",
                index, end_time_ms, start_time_ms
            )));
        }
        Ok(SubtitleEntry { index, start_time_ms, end_time_ms, text })
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let parts: Vec<&str> = timestamp.split([':', ',', '.']).collect();
        if parts.len() != 4 {
            return Err(SubtitleError::Format(format!("invalid timestamp: {}", timestamp)));
        }

        let field = |s: &str, what: &str| -> Result<u64, SubtitleError> {
            s.trim()
                .parse()
                .map_err(|_| SubtitleError::Format(format!("invalid {} in timestamp: {}", what, timestamp)))
        };

        let hours = field(parts[0], "hours")?;
        let minutes = field(parts[1], "minutes")?;
        let seconds = field(parts[2], "seconds")?;
        let millis = field(parts[3], "milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(SubtitleError::Format(format!("invalid time components: {}", timestamp)));
        }

        Self::combine_time_fields(hours, minutes, seconds, millis)
    }

    /// Combine h/m/s/ms fields into total milliseconds, rejecting values
    /// that would overflow u64 (absurd hour counts in malformed files)
    fn combine_time_fields(
        hours: u64,
        minutes: u64,
        seconds: u64,
        millis: u64,
    ) -> Result<u64, SubtitleError> {
        hours
            .checked_mul(3_600_000)
            .and_then(|h| h.checked_add(minutes * 60_000))
            .and_then(|hm| hm.checked_add(seconds * 1_000))
            .and_then(|hms| hms.checked_add(millis))
            .ok_or_else(|| {
                SubtitleError::Format(format!("timestamp overflows: {} hours", hours))
            })
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;
        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Formatted start timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Formatted end timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// An ordered collection of subtitle cues backed by one source file
#[derive(Debug, Clone)]
pub struct SubtitleDocument {
    /// File the cues were parsed or extracted from
    pub source_file: PathBuf,

    /// Cues in ascending index order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleDocument {
    /// Create an empty document
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleDocument { source_file, entries: Vec::new() }
    }

    /// Parse raw bytes into a document, trying a prioritized list of
    /// text encodings (strict UTF-8 first, then windows-1252/latin-1,
    /// then ISO-8859-15)
    pub fn parse<P: AsRef<Path>>(source_file: P, bytes: &[u8]) -> Result<Self, SubtitleError> {
        let content = Self::decode_bytes(bytes)?;
        let entries = Self::parse_srt_string(&content)?;
        Ok(SubtitleDocument { source_file: source_file.as_ref().to_path_buf(), entries })
    }

    /// Read and parse an SRT file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| SubtitleError::Format(format!("cannot read {}: {}", path.as_ref().display(), e)))?;
        Self::parse(path, &bytes)
    }

    /// Decode subtitle bytes with encoding fallback
    fn decode_bytes(bytes: &[u8]) -> Result<String, SubtitleError> {
        // Strip a UTF-8 BOM if present
        let stripped = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

        if let Ok(text) = std::str::from_utf8(stripped) {
            return Ok(text.to_string());
        }

        for encoding in FALLBACK_ENCODINGS {
            let (decoded, _, had_errors) = encoding.decode(stripped);
            if !had_errors {
                warn!("Subtitle data is not UTF-8, decoded as {}", encoding.name());
                return Ok(decoded.into_owned());
            }
        }

        let tried: Vec<&str> = std::iter::once("UTF-8")
            .chain(FALLBACK_ENCODINGS.iter().map(|e| e.name()))
            .collect();
        Err(SubtitleError::Encoding { tried: tried.join(", ") })
    }

    /// Parse SRT text into cues.
    ///
    /// Cues are renumbered 1..n in document order after parsing; the stored
    /// index is the ordinal position, not whatever numbers the source file
    /// carried. A structurally broken block (unparsable index line,
    /// unparsable timestamp line, inverted time range) fails the whole parse.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();
        let content = content.replace("\r\n", "\n");

        for block in content.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
            let mut lines = block.lines().map(str::trim_end);

            let index_line = lines
                .next()
                .ok_or_else(|| SubtitleError::Format("empty cue block".to_string()))?;
            let declared_index: usize = index_line.trim().parse().map_err(|_| {
                SubtitleError::Format(format!("expected cue number, found: {:?}", index_line))
            })?;

            let timing_line = lines.next().ok_or_else(|| {
                SubtitleError::Format(format!("cue {}: missing timestamp line", declared_index))
            })?;
            let caps = TIMESTAMP_REGEX.captures(timing_line.trim()).ok_or_else(|| {
                SubtitleError::Format(format!(
                    "cue {}: invalid timestamp line: {:?}",
                    declared_index, timing_line
                ))
            })?;

            let start_ms = Self::capture_to_ms(&caps, 1)?;
            let end_ms = Self::capture_to_ms(&caps, 5)?;

            let text = lines.collect::<Vec<_>>().join("\n");
            if text.trim().is_empty() {
                // Empty cues carry no translatable content and some encoders
                // emit them as padding; drop them rather than fail.
                warn!("Skipping empty cue {}", declared_index);
                continue;
            }

            entries.push(SubtitleEntry::new_validated(
                declared_index,
                start_ms,
                end_ms,
                text,
            )?);
        }

        if entries.is_empty() {
            return Err(SubtitleError::Format(
                "no subtitle cues found in content".to_string(),
            ));
        }

        // 1-based ordinal identity, regardless of source numbering
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.index = i + 1;
        }

        Ok(entries)
    }

    fn capture_to_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64, SubtitleError> {
        let field = |i: usize| -> Result<u64, SubtitleError> {
            let m = caps
                .get(start_idx + i)
                .ok_or_else(|| SubtitleError::Format("incomplete timestamp".to_string()))?;
            m.as_str()
                .parse()
                .map_err(|_| SubtitleError::Format(format!("timestamp field out of range: {}", m.as_str())))
        };
        SubtitleEntry::combine_time_fields(field(0)?, field(1)?, field(2)?, field(3)?)
    }

    /// Serialize the document to SRT text, cues in ascending index order
    /// with normalized timestamps
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        let mut ordered: Vec<&SubtitleEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|e| e.index);
        for entry in ordered {
            out.push_str(&entry.to_string());
        }
        out
    }

    /// Write the document to an SRT file, creating parent directories
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(self.serialize().as_bytes())
    }

    /// Shift every cue by a signed millisecond offset, all-or-nothing.
    ///
    /// Offsets outside +/-1 hour are rejected, as is any shift that would
    /// drive a timestamp negative; no cue is mutated on rejection. Returns
    /// the shifted cue sequence, leaving this document untouched.
    pub fn shift_by_ms(&self, offset_ms: i64) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        if offset_ms.abs() > MAX_SHIFT_MS {
            return Err(SubtitleError::Range(format!(
                "offset {}ms exceeds the +/-{}ms limit",
                offset_ms, MAX_SHIFT_MS
            )));
        }

        if offset_ms < 0 {
            let magnitude = offset_ms.unsigned_abs();
            if let Some(entry) = self.entries.iter().find(|e| e.start_time_ms < magnitude) {
                return Err(SubtitleError::Range(format!(
                    "shift of {}ms would drive cue {} (start {}) negative",
                    offset_ms,
                    entry.index,
                    entry.format_start_time()
                )));
            }
        }

        let shifted = self
            .entries
            .iter()
            .map(|e| {
                let mut moved = e.clone();
                moved.start_time_ms = e.start_time_ms.checked_add_signed(offset_ms).unwrap_or(0);
                moved.end_time_ms = e.end_time_ms.checked_add_signed(offset_ms).unwrap_or(0);
                moved
            })
            .collect();

        Ok(shifted)
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Document")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.entries.len())?;
        Ok(())
    }
}
