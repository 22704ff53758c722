use std::path::{Path, PathBuf};

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ConfigError;
use crate::file_utils::FileManager;
use crate::language_utils;

// @module: Jellyfin-convention renaming of subtitle files

// @const: Extractor junk suffix left in subtitle file names
static STREAM_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_stream_\d+").unwrap());

/// Subtitle attribute flags recognized by Jellyfin, always emitted in
/// default/forced/sdh order
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameFlags {
    pub default: bool,
    pub forced: bool,
    pub sdh: bool,
}

impl RenameFlags {
    fn suffixes(&self) -> Vec<&'static str> {
        let mut parts = Vec::new();
        if self.default {
            parts.push("default");
        }
        if self.forced {
            parts.push("forced");
        }
        if self.sdh {
            parts.push("sdh");
        }
        parts
    }
}

/// Summary of an applied rename pass
#[derive(Debug, Default)]
pub struct RenameReport {
    /// (old path, new path) pairs that were renamed
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Existing files moved aside to `.bak` before being overwritten
    pub backed_up: Vec<PathBuf>,
    /// Files that could not be renamed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Renames `.srt` files to the `<name>.<lang>[.default][.forced][.sdh].srt`
/// convention Jellyfin uses to match external subtitles to media.
///
/// The language is always given explicitly by the caller rather than
/// guessed from file contents.
pub struct JellyfinRenamer {
    language_code: String,
    flags: RenameFlags,
}

impl JellyfinRenamer {
    /// Create a renamer for one language; Jellyfin prefers two-letter codes
    pub fn new(language: &str, flags: RenameFlags) -> Result<Self, ConfigError> {
        let language_code = language_utils::jellyfin_code(language)?;
        Ok(Self { language_code, flags })
    }

    /// The conforming name for a subtitle file, or `None` if the file
    /// already conforms.
    ///
    /// Strips `_stream_N` extractor suffixes and any trailing language or
    /// flag segments from the stem before rebuilding the name.
    pub fn target_name(&self, file_name: &str) -> Option<String> {
        let stem = file_name.strip_suffix(".srt")?;
        let stem = STREAM_SUFFIX_REGEX.replace_all(stem, "");

        let mut segments: Vec<&str> = stem.split('.').collect();
        while segments.len() > 1 {
            let last = segments[segments.len() - 1];
            let is_flag = matches!(last, "default" | "forced" | "sdh");
            let is_language =
                last.len() <= 3 && language_utils::resolve_language(last).is_ok();
            if is_flag || is_language {
                segments.pop();
            } else {
                break;
            }
        }

        let mut name = segments.join(".");
        name.push('.');
        name.push_str(&self.language_code);
        for suffix in self.flags.suffixes() {
            name.push('.');
            name.push_str(suffix);
        }
        name.push_str(".srt");

        if name == file_name { None } else { Some(name) }
    }

    /// Compute the renames a pass over `folder` would perform, without
    /// touching anything
    pub fn preview<P: AsRef<Path>>(
        &self,
        folder: P,
    ) -> Result<Vec<(PathBuf, PathBuf)>, std::io::Error> {
        let mut changes = Vec::new();
        for file in FileManager::find_subtitle_files(folder)? {
            let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(new_name) = self.target_name(file_name) {
                let new_path = file.with_file_name(new_name);
                changes.push((file, new_path));
            }
        }
        Ok(changes)
    }

    /// Rename every non-conforming subtitle file under `folder`.
    ///
    /// When the target name is already taken the existing file is moved to
    /// `<name>.bak` first, so a rename never silently destroys a subtitle.
    /// Individual failures are recorded and the pass continues.
    pub fn apply<P: AsRef<Path>>(&self, folder: P) -> Result<RenameReport, std::io::Error> {
        let mut report = RenameReport::default();

        for (old_path, new_path) in self.preview(folder)? {
            if new_path.exists() {
                let backup = new_path.with_extension("srt.bak");
                if let Err(e) = std::fs::rename(&new_path, &backup) {
                    warn!("Cannot back up {}: {}", new_path.display(), e);
                    report
                        .failed
                        .push((old_path, format!("backup failed: {}", e)));
                    continue;
                }
                report.backed_up.push(backup);
            }

            match std::fs::rename(&old_path, &new_path) {
                Ok(()) => {
                    info!("Renamed {} -> {}", old_path.display(), new_path.display());
                    report.renamed.push((old_path, new_path));
                }
                Err(e) => {
                    warn!("Cannot rename {}: {}", old_path.display(), e);
                    report.failed.push((old_path, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
