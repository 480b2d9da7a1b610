//! Model access: the gateway seam, its HTTP implementation, and prompt templates
//!
//! - `ModelGateway`: prompt or conversation in, raw text out
//! - `ChatClient`: OpenAI-compatible chat completions over HTTPS
//! - `PromptTemplate`: `{placeholder}` substitution with partial variables

mod client;
mod gateway;
pub mod prompts;
mod template;

pub use client::ChatClient;
pub use gateway::{ChatMessage, ModelGateway};
pub use template::PromptTemplate;

#[cfg(test)]
pub use gateway::{Role, testing};
