/*!
 * End-to-end pipeline tests against mock translation clients
 */

use std::path::PathBuf;

use anyhow::Result;

use subtrans::errors::AppError;
use subtrans::pipeline::{Orchestrator, PipelinePhase};
use subtrans::subtitle::SubtitleDocument;
use subtrans::{Config, TranslateBatch};

use crate::common;
use crate::common::mock_clients::{EchoClient, FlakyClient, MismatchClient, RecordingObserver};

/// Configuration suitable for fast orchestrator tests
fn test_config() -> Config {
    let mut config = Config::default();
    config.target_language = "es".to_string();
    config.pipeline.max_batch_size = 2;
    config.pipeline.retry_limit = 3;
    config.pipeline.retry_backoff_ms = 1;
    config
}

fn test_document(n: usize) -> SubtitleDocument {
    SubtitleDocument {
        source_file: PathBuf::from("test.srt"),
        entries: common::make_entries(n),
    }
}

/// Test the happy path: batches in order, monotonic progress
#[tokio::test]
async fn test_translate_withThreeCuesAndBatchSizeTwo_shouldProgressTo100() -> Result<()> {
    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let mut document = test_document(3);
    let observer = RecordingObserver::new();

    orchestrator.translate(&mut document, &observer).await?;

    assert_eq!(document.entries[0].text, "[Spanish] Line 1");
    assert_eq!(document.entries[2].text, "[Spanish] Line 3");
    // 2 of 3 cues after the first batch, all 3 after the second
    assert_eq!(observer.progress_values(), vec![67, 100]);
    Ok(())
}

/// Test that timestamps and indices survive translation untouched
#[tokio::test]
async fn test_translate_withEchoClient_shouldPreserveTimingAndOrder() -> Result<()> {
    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let mut document = test_document(5);
    let original: Vec<_> = document
        .entries
        .iter()
        .map(|e| (e.index, e.start_time_ms, e.end_time_ms))
        .collect();

    orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await?;

    let after: Vec<_> = document
        .entries
        .iter()
        .map(|e| (e.index, e.start_time_ms, e.end_time_ms))
        .collect();
    assert_eq!(original, after);
    Ok(())
}

/// Test that an empty document completes without any remote calls
#[tokio::test]
async fn test_translate_withNoCues_shouldSucceedWithoutCalls() -> Result<()> {
    let client = EchoClient::new();
    let reply = client.translate_batch(&[], "Spanish").await?;
    assert!(reply.is_empty());

    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let mut document = test_document(0);
    orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await?;
    Ok(())
}

/// Test that a segment count mismatch fails immediately without retry
#[tokio::test]
async fn test_translate_withMismatchedCounts_shouldFailWithoutRetry() -> Result<()> {
    let client = MismatchClient::new();
    let mut orchestrator = Orchestrator::new(&client, test_config())?;
    let mut document = test_document(3);

    let result = orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await;

    let error = result.expect_err("mismatch must fail the run");
    assert_eq!(error.kind(), "alignment");
    assert_eq!(orchestrator.state().phase, PipelinePhase::Failed);
    assert_eq!(client.call_count(), 1, "a structural mismatch is never retried");
    assert_eq!(document.entries[0].text, "Line 1", "no partial merge");
    Ok(())
}

/// Test recovery from transient failures within the retry budget
#[tokio::test]
async fn test_translate_withTransientFailures_shouldRetryAndSucceed() -> Result<()> {
    let config = test_config();
    // Fails twice, succeeds on the third attempt; retry_limit is 3
    let client = FlakyClient::new(2);
    let mut orchestrator = Orchestrator::new(&client, config)?;
    let mut document = test_document(2);

    orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await?;

    assert_eq!(document.entries[0].text, "ok Line 1");
    assert_eq!(client.call_count(), 3, "two failed attempts plus the success");
    Ok(())
}

/// Test that the retry budget is enforced
#[tokio::test]
async fn test_translate_withPersistentFailures_shouldExhaustRetries() -> Result<()> {
    let mut config = test_config();
    config.pipeline.retry_limit = 2;
    let client = FlakyClient::new(usize::MAX);
    let mut orchestrator = Orchestrator::new(&client, config)?;
    let mut document = test_document(2);

    let result = orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await;

    let error = result.expect_err("exhausted retries must fail the run");
    assert_eq!(error.kind(), "provider");
    assert_eq!(orchestrator.state().phase, PipelinePhase::Failed);
    assert_eq!(client.call_count(), 3, "the first attempt plus two retries");
    assert_eq!(document.entries[0].text, "Line 1");
    Ok(())
}

/// Test cooperative cancellation before the first batch
#[tokio::test]
async fn test_translate_withCancelledFlag_shouldAbortBeforeCalling() -> Result<()> {
    let client = EchoClient::new();
    let mut orchestrator = Orchestrator::new(&client, test_config())?;
    orchestrator.cancel_flag().cancel();

    let mut document = test_document(4);
    let result = orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await;

    assert!(matches!(result, Err(AppError::Aborted)));
    assert_eq!(orchestrator.state().phase, PipelinePhase::Aborted);
    assert_eq!(client.call_count(), 0, "no remote call after cancellation");
    assert_eq!(document.entries[0].text, "Line 1", "no cue was touched");
    Ok(())
}

/// Test the block-limit partial-translation mode
#[tokio::test]
async fn test_translate_withBlockLimit_shouldLeaveTailUntranslated() -> Result<()> {
    let mut config = test_config();
    config.pipeline.block_limit = Some(3);
    let mut orchestrator = Orchestrator::new(EchoClient::new(), config)?;
    let mut document = test_document(5);
    let observer = RecordingObserver::new();

    orchestrator.translate(&mut document, &observer).await?;

    assert_eq!(document.entries[0].text, "[Spanish] Line 1");
    assert_eq!(document.entries[2].text, "[Spanish] Line 3");
    assert_eq!(document.entries[3].text, "Line 4");
    assert_eq!(document.entries[4].text, "Line 5");
    // Progress is measured against the limited scope
    assert_eq!(observer.progress_values().last(), Some(&100));
    Ok(())
}

/// Test that markup cleanup stops at the block limit
#[tokio::test]
async fn test_translate_withBlockLimitAndMarkup_shouldNotCleanTailCues() -> Result<()> {
    let mut config = test_config();
    config.pipeline.block_limit = Some(2);
    let mut orchestrator = Orchestrator::new(EchoClient::new(), config)?;
    let mut document = test_document(4);
    document.entries[0].text = "<i>Line 1</i>".to_string();
    document.entries[3].text = "<i>Line 4</i>".to_string();

    orchestrator
        .translate(&mut document, &RecordingObserver::new())
        .await?;

    // In-scope cues are cleaned before translation
    assert_eq!(document.entries[0].text, "[Spanish] Line 1");
    // Cues past the limit keep their source text verbatim, markup included
    assert_eq!(document.entries[3].text, "<i>Line 4</i>");
    Ok(())
}

/// Test processing an SRT file end to end
#[tokio::test]
async fn test_run_file_withSrtInput_shouldWriteTranslatedOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;

    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let output = orchestrator
        .run_file(&input, &temp_dir.path().to_path_buf(), &RecordingObserver::new())
        .await?;

    assert_eq!(output.file_name().unwrap(), "episode.spa.srt");
    let written = SubtitleDocument::open(&output)?;
    assert_eq!(written.entries.len(), 3);
    assert!(written.entries[0].text.starts_with("[Spanish]"));
    assert_eq!(written.entries[0].start_time_ms, 1000);
    assert_eq!(orchestrator.state().phase, PipelinePhase::Done);
    Ok(())
}

/// Test that a failed run writes no output file
#[tokio::test]
async fn test_run_file_withFailingClient_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;

    let mut orchestrator = Orchestrator::new(MismatchClient::new(), test_config())?;
    let result = orchestrator
        .run_file(&input, &temp_dir.path().to_path_buf(), &RecordingObserver::new())
        .await;

    assert!(result.is_err());
    assert!(
        !temp_dir.path().join("episode.spa.srt").exists(),
        "failed runs must not leave partial output files"
    );
    Ok(())
}

/// Test that a missing input file is reported as a file error
#[tokio::test]
async fn test_run_file_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("nope.srt");

    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let result = orchestrator
        .run_file(&missing, &temp_dir.path().to_path_buf(), &RecordingObserver::new())
        .await;

    let error = result.expect_err("missing input must fail");
    assert_eq!(error.kind(), "file");
    Ok(())
}

/// Test that a folder without video files is rejected up front
#[tokio::test]
async fn test_run_folder_withNoVideos_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "nothing to see")?;

    let mut orchestrator = Orchestrator::new(EchoClient::new(), test_config())?;
    let result = orchestrator
        .run_folder(&temp_dir.path().to_path_buf(), false, &RecordingObserver::new())
        .await;

    assert!(result.is_err());
    Ok(())
}
