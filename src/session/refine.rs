//! Human-in-the-loop draft refinement

use crate::ai::prompts::REVISION_TEMPLATE;
use crate::ai::{ModelGateway, PromptTemplate};
use crate::command::{ReviewInput, parse_review_input};
use crate::error::TriageError;

use super::state::SessionState;

/// What the operator's input did to the item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `newly` is false when the item was already approved
    Approved { newly: bool },
    /// The draft was replaced with a model revision
    Revised,
    Back,
    Exit,
    SendRequested,
    /// Blank input, nothing to do
    Ignored,
}

/// Drives revision turns for items in a [`SessionState`].
///
/// Each feedback input costs exactly one model call. A failed call leaves the
/// draft untouched.
pub struct RefinementLoop<'a, G: ModelGateway + ?Sized> {
    gateway: &'a G,
    template: PromptTemplate,
}

impl<'a, G: ModelGateway + ?Sized> RefinementLoop<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            template: PromptTemplate::new(REVISION_TEMPLATE),
        }
    }

    /// Apply one line of operator input to item `index`.
    ///
    /// `original_email` is the customer's message, always sent unchanged so
    /// revisions never drift from what was actually asked.
    pub async fn handle_input(
        &self,
        session: &mut SessionState,
        index: usize,
        original_email: &str,
        input: &str,
    ) -> Result<Outcome, TriageError> {
        match parse_review_input(input) {
            ReviewInput::Approve => {
                let newly = session.approve(index)?;
                if newly {
                    tracing::info!("Item {} approved", index + 1);
                }
                Ok(Outcome::Approved { newly })
            }
            ReviewInput::Back => Ok(Outcome::Back),
            ReviewInput::Exit => Ok(Outcome::Exit),
            ReviewInput::Send => Ok(Outcome::SendRequested),
            ReviewInput::Empty => Ok(Outcome::Ignored),
            ReviewInput::Feedback(feedback) => {
                self.revise(session, index, original_email, &feedback).await?;
                Ok(Outcome::Revised)
            }
        }
    }

    /// Ask the model for a revised draft and install it on success.
    pub async fn revise(
        &self,
        session: &mut SessionState,
        index: usize,
        original_email: &str,
        feedback: &str,
    ) -> Result<(), TriageError> {
        let item = session.get(index).ok_or_else(|| {
            TriageError::OperatorInput(format!("no item {}", index + 1))
        })?;
        if item.is_approved() {
            return Err(TriageError::OperatorInput(
                "this draft is already approved and can no longer be revised".to_string(),
            ));
        }

        tracing::debug!("Revising item {} with feedback: {}", index + 1, feedback);
        let revised = self
            .gateway
            .generate_with(
                &self.template,
                &[
                    ("original_email", original_email),
                    ("current_draft", &item.current_draft),
                    ("feedback", feedback),
                ],
            )
            .await?;

        let revised = revised.trim();
        if revised.is_empty() {
            return Err(TriageError::Gateway(
                "model returned an empty draft".to_string(),
            ));
        }

        session.replace_draft(index, revised.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGateway;
    use crate::session::DraftStatus;
    use crate::triage::TriageBatch;
    use crate::triage::parser::parse;

    fn session(n: usize) -> SessionState {
        let items: Vec<String> = (1..=n)
            .map(|i| {
                format!(
                    r#"{{"email_id": "e{i}", "classification": "Return Request", "priority": "Medium",
                        "priority_reasoning": "r", "draft_response": "Original draft {i}."}}"#
                )
            })
            .collect();
        let batch: TriageBatch =
            parse(&format!(r#"{{"analyses": [{}]}}"#, items.join(","))).unwrap();
        SessionState::from_batch(&batch)
    }

    #[tokio::test]
    async fn test_feedback_on_item_two_of_three() {
        let mut state = session(3);
        let gateway = ScriptedGateway::new().reply("Short draft.");
        let refine = RefinementLoop::new(&gateway);

        state.open(1).unwrap();
        let outcome = refine
            .handle_input(&mut state, 1, "I want to return my lamp.", "make it shorter")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Revised);
        assert_eq!(state.current_draft(1), Some("Short draft."));
        assert_eq!(state.current_draft(0), Some("Original draft 1."));
        assert_eq!(state.current_draft(2), Some("Original draft 3."));
        assert_eq!(gateway.call_count(), 1);

        let prompt = gateway.prompt(0);
        assert!(prompt.contains("I want to return my lamp."));
        assert!(prompt.contains("Original draft 2."));
        assert!(prompt.contains("make it shorter"));
    }

    #[tokio::test]
    async fn test_nth_output_becomes_draft_trimmed() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new()
            .reply("  first  ")
            .reply("\nsecond\n")
            .reply(" third ");
        let refine = RefinementLoop::new(&gateway);

        for feedback in ["a", "b", "c"] {
            refine
                .handle_input(&mut state, 0, "email", feedback)
                .await
                .unwrap();
        }

        assert_eq!(state.current_draft(0), Some("third"));
        assert_eq!(state.get(0).unwrap().revisions, 3);
        // Each revision sees the previous draft, not the original
        assert!(gateway.prompt(2).contains("second"));
        assert!(!gateway.prompt(2).contains("Original draft 1."));
    }

    #[tokio::test]
    async fn test_failed_revision_keeps_previous_draft() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new().reply("better").fail("timeout");
        let refine = RefinementLoop::new(&gateway);

        refine.handle_input(&mut state, 0, "email", "improve").await.unwrap();
        let err = refine
            .handle_input(&mut state, 0, "email", "again")
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::Gateway(_)));
        assert_eq!(state.current_draft(0), Some("better"));
        assert_eq!(state.get(0).unwrap().status, DraftStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_empty_model_reply_keeps_draft() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new().reply("   ");
        let refine = RefinementLoop::new(&gateway);

        let err = refine
            .handle_input(&mut state, 0, "email", "improve")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Gateway(_)));
        assert_eq!(state.current_draft(0), Some("Original draft 1."));
    }

    #[tokio::test]
    async fn test_approve_makes_no_model_call_and_is_idempotent() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new();
        let refine = RefinementLoop::new(&gateway);

        let first = refine.handle_input(&mut state, 0, "email", "APPROVE").await.unwrap();
        let second = refine.handle_input(&mut state, 0, "email", "approve").await.unwrap();

        assert_eq!(first, Outcome::Approved { newly: true });
        assert_eq!(second, Outcome::Approved { newly: false });
        assert_eq!(state.current_draft(0), Some("Original draft 1."));
        assert!(state.get(0).unwrap().is_approved());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_feedback_after_approval_refused() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new().reply("unused");
        let refine = RefinementLoop::new(&gateway);

        state.approve(0).unwrap();
        let err = refine
            .handle_input(&mut state, 0, "email", "one more change")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::OperatorInput(_)));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_control_tokens() {
        let mut state = session(1);
        let gateway = ScriptedGateway::new();
        let refine = RefinementLoop::new(&gateway);

        for (input, expected) in [
            ("back", Outcome::Back),
            ("exit", Outcome::Exit),
            ("send", Outcome::SendRequested),
            ("", Outcome::Ignored),
        ] {
            let outcome = refine.handle_input(&mut state, 0, "email", input).await.unwrap();
            assert_eq!(outcome, expected);
        }
        assert_eq!(gateway.call_count(), 0);
        assert!(!state.get(0).unwrap().is_approved());
    }
}
