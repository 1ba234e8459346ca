//! Generation side of the pipeline
//!
//! Prompt rendering, the provider backends and the completion cleaner.

pub mod client;
pub mod context;
pub mod parser;
pub mod provider;

pub use client::{AnthropicClient, GoogleClient, OpenAiClient};
pub use context::{build_prompt, template, PromptContext, PromptTemplate, CURRENT_TEMPLATE_VERSION};
pub use parser::parse_completion;
pub use provider::{
    parse_model_override, CompletionBackend, GenerationParams, Provider, ProviderKind,
    SYSTEM_INSTRUCTION,
};
