//! LLM provider adapters.

pub mod catalog;
pub mod mock;
pub mod openai_compatible;
pub mod sse;

pub use mock::{MockProvider, MockResponse};
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
