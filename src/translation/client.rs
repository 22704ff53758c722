use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::TranslationConfig;
use crate::errors::{ConfigError, TranslationError};
use crate::providers::openai::{OpenAI, OpenAIRequest};

// @module: One batch in, one aligned list of translated strings out

// @const: Positional marker regex used to split the model's reply
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<<ENTRY_(\d+)>>").unwrap());

/// Terminator appended after the last entry so trailing model chatter
/// cannot leak into the final segment
const END_MARKER: &str = "<<END>>";

/// Seam between the orchestrator and the remote service.
///
/// Implementations must return exactly one translated string per input
/// text, in input order.
#[async_trait]
pub trait TranslateBatch: Send + Sync {
    /// Translate one batch of cue texts into the target language
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError>;
}

// A shared reference translates through the referent, so callers can hand
// the orchestrator a borrow and keep inspecting the client
#[async_trait]
impl<T: TranslateBatch + ?Sized> TranslateBatch for &T {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        (**self).translate_batch(texts, target_language).await
    }
}

/// Translation client backed by an OpenAI-compatible chat API
pub struct TranslationClient {
    provider: OpenAI,
    model: String,
    temperature: f32,
}

impl TranslationClient {
    /// Build a client from the translation configuration
    pub fn new(config: &TranslationConfig) -> Result<Self, ConfigError> {
        if config.api_key.is_empty() && !config.is_local_endpoint() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            provider: OpenAI::new(
                config.api_key.clone(),
                config.endpoint.clone(),
                config.timeout_secs,
            ),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Combine cue texts into one marker-tagged blob.
    ///
    /// Every cue is preceded by a numbered marker so the reply can be split
    /// back into the same count of segments no matter how the model reflows
    /// the text around each one.
    fn build_prompt(texts: &[String]) -> String {
        let mut combined = String::new();
        for (idx, text) in texts.iter().enumerate() {
            combined.push_str(&format!("<<ENTRY_{}>>\n", idx));
            combined.push_str(text);
            combined.push('\n');
        }
        combined.push_str(END_MARKER);
        combined
    }

    fn system_prompt(target_language: &str) -> String {
        format!(
            "You are a professional subtitle translator. Translate each numbered entry \
             into {}. Keep every <<ENTRY_n>> marker exactly as written and keep the \
             entries in the same order. Preserve each entry's line breaks. Reply with \
             only the markers and the translated text, ending with {}.",
            target_language, END_MARKER
        )
    }

    /// Split a model reply back into exactly `expected` segments.
    ///
    /// The reply is scanned for `<<ENTRY_n>>` markers; anything after
    /// `<<END>>` is discarded. A marker count or ordering that disagrees
    /// with the request is an alignment failure — this function never
    /// guesses which segment belongs to which cue.
    pub fn split_reply(reply: &str, expected: usize) -> Result<Vec<String>, TranslationError> {
        let body = match reply.find(END_MARKER) {
            Some(pos) => &reply[..pos],
            None => reply,
        };

        let markers: Vec<(usize, usize, usize)> = MARKER_REGEX
            .captures_iter(body)
            .filter_map(|caps| {
                let m = caps.get(0)?;
                let id: usize = caps.get(1)?.as_str().parse().ok()?;
                Some((m.start(), m.end(), id))
            })
            .collect();

        if markers.len() != expected
            || markers.iter().enumerate().any(|(i, (_, _, id))| *id != i)
        {
            return Err(TranslationError::Alignment {
                expected,
                actual: markers.len(),
            });
        }

        let mut segments = Vec::with_capacity(expected);
        for (i, (_, seg_start, _)) in markers.iter().enumerate() {
            let seg_end = markers.get(i + 1).map(|(next_start, _, _)| *next_start).unwrap_or(body.len());
            segments.push(body[*seg_start..seg_end].trim().to_string());
        }

        Ok(segments)
    }
}

#[async_trait]
impl TranslateBatch for TranslationClient {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Nothing translatable: skip the remote call entirely rather than
        // invite the model to invent content for blank cues
        if texts.iter().all(|t| t.trim().is_empty()) {
            debug!("Batch contains only whitespace, skipping remote call");
            return Ok(texts.to_vec());
        }

        let request = OpenAIRequest::new(&self.model)
            .add_message("system", Self::system_prompt(target_language))
            .add_message("user", Self::build_prompt(texts))
            .temperature(self.temperature);

        let response = self.provider.complete(request).await.map_err(TranslationError::Provider)?;
        let reply = OpenAI::extract_text_from_response(&response);

        Self::split_reply(&reply, texts.len())
    }
}
