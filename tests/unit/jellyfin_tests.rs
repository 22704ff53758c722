/*!
 * Tests for Jellyfin-convention renaming
 */

use anyhow::Result;

use subtrans::jellyfin::{JellyfinRenamer, RenameFlags};

use crate::common;

/// Test the basic name transformation
#[test]
fn test_target_name_withPlainName_shouldAppendLanguage() {
    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    assert_eq!(
        renamer.target_name("Show S01E01.srt"),
        Some("Show S01E01.es.srt".to_string())
    );
}

/// Test stripping extractor suffixes and stale language codes
#[test]
fn test_target_name_withStreamSuffixAndOldLanguage_shouldStripBoth() {
    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    assert_eq!(
        renamer.target_name("Movie_stream_3.eng.srt"),
        Some("Movie.es.srt".to_string())
    );
}

/// Test that flags are emitted in default/forced/sdh order
#[test]
fn test_target_name_withAllFlags_shouldOrderThem() {
    let flags = RenameFlags { default: true, forced: true, sdh: true };
    let renamer = JellyfinRenamer::new("spanish", flags).unwrap();
    assert_eq!(
        renamer.target_name("Movie.srt"),
        Some("Movie.es.default.forced.sdh.srt".to_string())
    );
}

/// Test that stale flag segments are replaced, not stacked
#[test]
fn test_target_name_withExistingFlags_shouldRebuildThem() {
    let flags = RenameFlags { forced: true, ..RenameFlags::default() };
    let renamer = JellyfinRenamer::new("fr", flags).unwrap();
    assert_eq!(
        renamer.target_name("Movie.en.default.sdh.srt"),
        Some("Movie.fr.forced.srt".to_string())
    );
}

/// Test that an already conforming file is left alone
#[test]
fn test_target_name_withConformingName_shouldReturnNone() {
    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    assert_eq!(renamer.target_name("Movie.es.srt"), None);
}

/// Test that non-SRT files are ignored
#[test]
fn test_target_name_withNonSrtFile_shouldReturnNone() {
    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    assert_eq!(renamer.target_name("Movie.mkv"), None);
}

/// Test that preview reports changes without touching the files
#[test]
fn test_preview_withNonConformingFiles_shouldNotRename() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_subtitle(temp_dir.path(), "Show.srt")?;

    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    let changes = renamer.preview(temp_dir.path())?;

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].1.file_name().unwrap(), "Show.es.srt");
    assert!(original.exists(), "preview must not rename anything");
    Ok(())
}

/// Test applying renames on disk
#[test]
fn test_apply_withNonConformingFile_shouldRenameIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "Show_stream_2.eng.srt")?;

    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    let report = renamer.apply(temp_dir.path())?;

    assert_eq!(report.renamed.len(), 1);
    assert!(report.failed.is_empty());
    assert!(temp_dir.path().join("Show.es.srt").exists());
    assert!(!temp_dir.path().join("Show_stream_2.eng.srt").exists());
    Ok(())
}

/// Test that an existing target is backed up before being overwritten
#[test]
fn test_apply_withNameCollision_shouldBackUpExistingFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "Show.srt")?;
    common::create_test_file(temp_dir.path(), "Show.es.srt", "old translation")?;

    let renamer = JellyfinRenamer::new("es", RenameFlags::default()).unwrap();
    let report = renamer.apply(temp_dir.path())?;

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.backed_up.len(), 1);
    assert!(temp_dir.path().join("Show.es.srt").exists());
    let backup = temp_dir.path().join("Show.es.srt.bak");
    assert!(backup.exists());
    assert_eq!(std::fs::read_to_string(backup)?, "old translation");
    Ok(())
}
