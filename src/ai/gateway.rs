//! The model gateway seam: prompt in, raw text out

use async_trait::async_trait;
use serde::Serialize;

use super::template::PromptTemplate;
use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language model that turns prompts into text.
///
/// Implementations report every failure (transport, status, timeout, empty
/// reply) as [`TriageError::Gateway`]. Callers never retry.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send a conversation and return the assistant's reply
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, TriageError>;

    /// Single-prompt completion
    async fn generate(&self, prompt: &str) -> Result<String, TriageError> {
        self.chat(&[ChatMessage::user(prompt)]).await
    }

    /// Render `template` with `vars`, then complete it
    async fn generate_with(
        &self,
        template: &PromptTemplate,
        vars: &[(&str, &str)],
    ) -> Result<String, TriageError> {
        let prompt = template.render(vars)?;
        self.generate(&prompt).await
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory gateway that replays scripted replies and records prompts

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, TriageError>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push_back(Ok(text.into()));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(TriageError::Gateway(message.to_string())));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Concatenated content of the n-th call's messages
        pub fn prompt(&self, n: usize) -> String {
            self.calls.lock().unwrap()[n]
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        }

        pub fn messages(&self, n: usize) -> Vec<ChatMessage> {
            self.calls.lock().unwrap()[n].clone()
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String, TriageError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TriageError::Gateway("no scripted reply left".into())))
        }
    }
}
