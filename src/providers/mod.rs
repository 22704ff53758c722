/*!
 * Provider implementations for the remote translation service.
 *
 * One client is enough: the OpenAI chat-completions wire format is also
 * spoken by local servers such as LM Studio, so any OpenAI-compatible
 * endpoint can be configured.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for LLM providers
///
/// Allows the translation client to be tested against mock providers
/// without external API calls.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract the generated text from a provider response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod openai;
