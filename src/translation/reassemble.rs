use std::ops::Range;

use crate::errors::TranslationError;
use crate::subtitle::SubtitleEntry;

// @module: Positional merge of translated text back onto the master cues

/// Replace the text of the cues in `batch` with `translated`, by position.
///
/// Cue index and timestamps are never touched. The length precondition is
/// guaranteed by the translation client's contract and re-checked here,
/// since writing misaligned text over the master sequence is the one
/// corruption this pipeline can never repair.
pub fn merge(
    entries: &mut [SubtitleEntry],
    batch: Range<usize>,
    translated: &[String],
) -> Result<(), TranslationError> {
    if translated.len() != batch.len() {
        return Err(TranslationError::Alignment {
            expected: batch.len(),
            actual: translated.len(),
        });
    }

    for (entry, text) in entries[batch].iter_mut().zip(translated) {
        entry.text = text.clone();
    }

    Ok(())
}
