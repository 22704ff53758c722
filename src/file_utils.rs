use std::path::{Path, PathBuf};

use walkdir::WalkDir;

// @module: File system helpers - type detection, folder scans, output naming

/// Video container extensions the folder scanner picks up
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm"];

/// Subtitle extensions accepted as direct input
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt"];

/// Coarse classification of an input path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    Video,
    Subtitle,
    Other,
}

/// Utility struct for file operations
pub struct FileManager;

impl FileManager {
    /// Classify a path by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Video
        } else if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Subtitle
        } else {
            FileType::Other
        }
    }

    /// Recursively find video files under a directory, sorted by path so
    /// folder runs process files in a deterministic order
    pub fn find_video_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, std::io::Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", dir.display()),
            ));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| Self::detect_file_type(p) == FileType::Video)
            .collect();
        files.sort();

        Ok(files)
    }

    /// Recursively find subtitle files under a directory, sorted by path
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, std::io::Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", dir.display()),
            ));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| Self::detect_file_type(p) == FileType::Subtitle)
            .collect();
        files.sort();

        Ok(files)
    }

    /// Output path for a translated subtitle: `<stem>.<language>.<ext>` next
    /// to (or under) the requested output directory
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: P,
        language_code: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file
            .as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        output_dir
            .as_ref()
            .join(format!("{}.{}.{}", stem, language_code, extension))
    }

    /// Create a directory and its parents if missing
    pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<(), std::io::Error> {
        if !dir.as_ref().exists() {
            std::fs::create_dir_all(dir.as_ref())?;
        }
        Ok(())
    }
}
