/*!
 * Tests for pipeline helpers: text cleanup, cancellation, state
 */

use subtrans::errors::ConfigError;
use subtrans::pipeline::{CancelFlag, Orchestrator, PipelineState, clean_cue_text};
use subtrans::{Config, TranslateBatch};

use crate::common::mock_clients::EchoClient;

/// Test stripping HTML-style tags
#[test]
fn test_clean_cue_text_withFontTags_shouldStripThem() {
    let cleaned = clean_cue_text("<font color=\"#ffffff\">Hello</font>\n<i>world</i>");
    assert_eq!(cleaned, "Hello\nworld");
}

/// Test stripping ASS override codes
#[test]
fn test_clean_cue_text_withAssOverrides_shouldStripThem() {
    let cleaned = clean_cue_text("{\\an8}On the ceiling");
    assert_eq!(cleaned, "On the ceiling");
}

/// Test that plain text passes through unchanged
#[test]
fn test_clean_cue_text_withPlainText_shouldKeepIt() {
    let cleaned = clean_cue_text("Two lines\nof dialogue");
    assert_eq!(cleaned, "Two lines\nof dialogue");
}

/// Test that lines emptied by stripping are dropped
#[test]
fn test_clean_cue_text_withTagOnlyLine_shouldDropIt() {
    let cleaned = clean_cue_text("<b></b>\nKept line");
    assert_eq!(cleaned, "Kept line");
}

/// Test the cancellation flag lifecycle
#[test]
fn test_cancel_flag_shouldBeSharedAcrossClones() {
    let flag = CancelFlag::default();
    let clone = flag.clone();

    assert!(!flag.is_cancelled());
    clone.cancel();
    assert!(flag.is_cancelled());
}

/// Test the progress percentage calculation
#[test]
fn test_pipeline_state_percent_shouldRound() {
    let mut state = PipelineState::default();
    assert_eq!(state.percent(), 100, "empty work is complete work");

    state.total_cues = 3;
    state.completed_cues = 2;
    assert_eq!(state.percent(), 67);

    state.completed_cues = 3;
    assert_eq!(state.percent(), 100);
}

/// Test orchestrator construction validation
#[test]
fn test_orchestrator_new_withZeroBatchSize_shouldFail() {
    let mut config = Config::default();
    config.pipeline.max_batch_size = 0;
    let result = Orchestrator::new(EchoClient::new(), config);
    assert!(matches!(result, Err(ConfigError::InvalidBatchSize(0))));
}

/// Test that the echo mock honours the one-output-per-input contract
#[tokio::test]
async fn test_echo_client_shouldReturnOneSegmentPerInput() {
    let client = EchoClient::new();
    let texts = vec!["a".to_string(), "b".to_string()];
    let out = client.translate_batch(&texts, "Spanish").await.unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0], "[Spanish] a");
    assert_eq!(client.call_count(), 1);
}
