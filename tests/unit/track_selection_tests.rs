/*!
 * Tests for subtitle track selection
 */

use subtrans::subtitle::{SubtitleExtractor, SubtitleTrack};

fn track(index: usize, codec: &str, language: Option<&str>, title: Option<&str>) -> SubtitleTrack {
    SubtitleTrack {
        index,
        codec_name: codec.to_string(),
        language: language.map(String::from),
        title: title.map(String::from),
    }
}

/// Test bitmap codec classification
#[test]
fn test_is_bitmap_withKnownCodecs_shouldClassify() {
    assert!(track(0, "hdmv_pgs_subtitle", None, None).is_bitmap());
    assert!(track(0, "dvd_subtitle", None, None).is_bitmap());
    assert!(!track(0, "subrip", None, None).is_bitmap());
    assert!(!track(0, "ass", None, None).is_bitmap());
}

/// Test selection by container language tag
#[test]
fn test_select_track_withMatchingLanguageTag_shouldPickIt() {
    let tracks = vec![
        track(2, "subrip", Some("eng"), None),
        track(3, "subrip", Some("fre"), None),
    ];
    let selected = SubtitleExtractor::select_track(&tracks, "fr").unwrap();
    assert_eq!(selected.index, 3);
}

/// Test that equivalent code families match the tag
#[test]
fn test_select_track_withBibliographicTag_shouldMatchTwoLetterRequest() {
    let tracks = vec![track(1, "subrip", Some("ger"), None)];
    let selected = SubtitleExtractor::select_track(&tracks, "de").unwrap();
    assert_eq!(selected.index, 1);
}

/// Test selection by language name in the stream title
#[test]
fn test_select_track_withLanguageInTitle_shouldPickIt() {
    let tracks = vec![
        track(2, "subrip", None, Some("Signs only")),
        track(3, "subrip", None, Some("French (full)")),
    ];
    let selected = SubtitleExtractor::select_track(&tracks, "fr").unwrap();
    assert_eq!(selected.index, 3);
}

/// Test the English fallback when the preferred language is absent
#[test]
fn test_select_track_withNoMatch_shouldFallBackToEnglish() {
    let tracks = vec![
        track(2, "subrip", Some("jpn"), None),
        track(3, "subrip", Some("eng"), None),
    ];
    let selected = SubtitleExtractor::select_track(&tracks, "fr").unwrap();
    assert_eq!(selected.index, 3);
}

/// Test the first-text-track fallback
#[test]
fn test_select_track_withNoLanguageInfo_shouldPickFirstTextTrack() {
    let tracks = vec![
        track(1, "hdmv_pgs_subtitle", Some("fre"), None),
        track(2, "subrip", None, None),
        track(3, "subrip", None, None),
    ];
    let selected = SubtitleExtractor::select_track(&tracks, "fr").unwrap();
    assert_eq!(selected.index, 2);
}

/// Test that bitmap tracks are never selected
#[test]
fn test_select_track_withOnlyBitmapTracks_shouldReturnNone() {
    let tracks = vec![
        track(1, "hdmv_pgs_subtitle", Some("eng"), None),
        track(2, "dvd_subtitle", Some("fre"), None),
    ];
    assert!(SubtitleExtractor::select_track(&tracks, "fr").is_none());
}

/// Test that extraction scratch paths cannot collide across processes
#[test]
fn test_temp_track_path_withSameIndex_shouldEmbedProcessId() {
    let path = SubtitleExtractor::temp_track_path(3);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();

    assert_eq!(name, format!("subtrans_{}_track_3.srt", std::process::id()));
    assert_ne!(path, SubtitleExtractor::temp_track_path(4));
}
