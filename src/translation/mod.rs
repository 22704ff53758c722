/*!
 * The translation pipeline stages that sit between a parsed subtitle
 * document and the remote model: batching, the translation client, and
 * positional reassembly of translated text.
 */

pub mod batch;
pub mod client;
pub mod reassemble;

pub use batch::Batcher;
pub use client::{TranslateBatch, TranslationClient};
pub use reassemble::merge;
