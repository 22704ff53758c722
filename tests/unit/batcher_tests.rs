/*!
 * Tests for batch splitting
 */

use subtrans::Batcher;
use subtrans::errors::ConfigError;

use crate::common;

/// Test that a zero batch size is rejected at construction
#[test]
fn test_batcher_new_withZeroSize_shouldFail() {
    assert!(matches!(Batcher::new(0), Err(ConfigError::InvalidBatchSize(0))));
}

/// Test splitting three cues with a batch size of two
#[test]
fn test_split_withThreeCuesAndSizeTwo_shouldYieldTwoBatches() {
    let batcher = Batcher::new(2).unwrap();
    let entries = common::make_entries(3);

    let batches: Vec<_> = batcher.split(&entries).collect();
    assert_eq!(batches, vec![0..2, 2..3]);
}

/// Test that concatenated batches cover the whole sequence in order
#[test]
fn test_split_withVariousSizes_shouldCoverSequenceExactly() {
    let entries = common::make_entries(7);

    for size in 1..=8 {
        let batcher = Batcher::new(size).unwrap();
        let batches: Vec<_> = batcher.split(&entries).collect();

        let mut next = 0;
        for batch in &batches {
            assert_eq!(batch.start, next, "batches must be contiguous");
            assert!(!batch.is_empty(), "no batch may be empty");
            assert!(batch.len() <= size, "batch exceeds the configured size");
            next = batch.end;
        }
        assert_eq!(next, entries.len());
        assert_eq!(batches.len(), batcher.batch_count(entries.len()));
    }
}

/// Test splitting an exact multiple of the batch size
#[test]
fn test_split_withExactMultiple_shouldYieldFullBatches() {
    let batcher = Batcher::new(3).unwrap();
    let entries = common::make_entries(6);

    let batches: Vec<_> = batcher.split(&entries).collect();
    assert_eq!(batches, vec![0..3, 3..6]);
}

/// Test splitting an empty sequence
#[test]
fn test_split_withNoCues_shouldYieldNothing() {
    let batcher = Batcher::new(5).unwrap();
    let batches: Vec<_> = batcher.split(&[]).collect();
    assert!(batches.is_empty());
    assert_eq!(batcher.batch_count(0), 0);
}

/// Test that splitting is restartable and deterministic
#[test]
fn test_split_calledTwice_shouldRestartFromFirstCue() {
    let batcher = Batcher::new(4).unwrap();
    let entries = common::make_entries(10);

    let first: Vec<_> = batcher.split(&entries).collect();
    let second: Vec<_> = batcher.split(&entries).collect();
    assert_eq!(first, second);
    assert_eq!(first[0], 0..4);
}

/// Test the exact-size iterator contract
#[test]
fn test_split_iterator_shouldReportExactLength() {
    let batcher = Batcher::new(4).unwrap();
    let entries = common::make_entries(10);

    let mut iter = batcher.split(&entries);
    assert_eq!(iter.len(), 3);
    iter.next();
    assert_eq!(iter.len(), 2);
}
