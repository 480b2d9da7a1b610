//! Follow-up questions about a finished analysis

use crate::ai::prompts::SITE_FOLLOW_UP_SYSTEM;
use crate::ai::{ChatMessage, ModelGateway, PromptTemplate};
use crate::error::TriageError;

use super::analysis::{ExpertRole, WebsiteAnalysis};

/// Chat history for one analyzed site. The system prompt is rebuilt per turn
/// and never stored in the history.
pub struct Conversation {
    system: String,
    history: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(
        url: &str,
        role: ExpertRole,
        analysis: &WebsiteAnalysis,
    ) -> Result<Self, TriageError> {
        let system = PromptTemplate::new(SITE_FOLLOW_UP_SYSTEM).render(&[("role", role.as_str())])?;
        let seed = format!(
            "I have just completed an analysis of {} from the perspective of a {}. \
             Here is a summary of my findings: {}",
            url,
            role,
            analysis.summary()
        );
        Ok(Self {
            system,
            history: vec![ChatMessage::assistant(seed)],
        })
    }

    #[cfg(test)]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Ask one question. On failure the question is dropped from history.
    pub async fn ask<G: ModelGateway + ?Sized>(
        &mut self,
        gateway: &G,
        question: &str,
    ) -> Result<String, TriageError> {
        self.history.push(ChatMessage::user(question));

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::system(self.system.as_str()));
        messages.extend(self.history.iter().cloned());

        match gateway.chat(&messages).await {
            Ok(answer) => {
                let answer = answer.trim().to_string();
                self.history.push(ChatMessage::assistant(answer.as_str()));
                Ok(answer)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;
    use crate::ai::testing::ScriptedGateway;

    fn analysis() -> WebsiteAnalysis {
        WebsiteAnalysis {
            bot_introduction: "Hi".to_string(),
            strengths: vec!["Portfolio".to_string()],
            improvements: vec!["Testimonials".to_string()],
            strategic_recommendations: vec!["Referrals".to_string()],
            homepage_redesign_prompt: "Bigger hero".to_string(),
        }
    }

    #[test]
    fn test_history_seeded_with_summary() {
        let conv = Conversation::new("https://example.com", ExpertRole::UxDesigner, &analysis())
            .unwrap();
        assert_eq!(conv.history().len(), 1);
        assert_eq!(conv.history()[0].role, Role::Assistant);
        assert!(conv.history()[0].content.contains("https://example.com"));
        assert!(conv.history()[0].content.contains("Testimonials"));
    }

    #[tokio::test]
    async fn test_ask_sends_system_history_and_question() {
        let gateway = ScriptedGateway::new().reply(" Add reviews. ").reply("Yes.");
        let mut conv =
            Conversation::new("https://example.com", ExpertRole::MarketingExpert, &analysis())
                .unwrap();

        let answer = conv.ask(&gateway, "What first?").await.unwrap();
        assert_eq!(answer, "Add reviews.");
        conv.ask(&gateway, "Really?").await.unwrap();

        let second = gateway.messages(1);
        assert_eq!(second[0].role, Role::System);
        assert!(second[0].content.contains("Marketing Expert"));
        assert_eq!(second.len(), 5);
        assert_eq!(second[2], ChatMessage::user("What first?"));
        assert_eq!(second[3], ChatMessage::assistant("Add reviews."));
        assert_eq!(second[4], ChatMessage::user("Really?"));
        assert_eq!(conv.history().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_ask_drops_question() {
        let gateway = ScriptedGateway::new().fail("timeout");
        let mut conv =
            Conversation::new("https://example.com", ExpertRole::BusinessAnalyst, &analysis())
                .unwrap();

        let err = conv.ask(&gateway, "Pricing?").await.unwrap_err();
        assert!(matches!(err, TriageError::Gateway(_)));
        assert_eq!(conv.history().len(), 1);
    }
}
