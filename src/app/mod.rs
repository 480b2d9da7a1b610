//! Interactive triage session: email list, per-item review loop, dispatch

mod render;

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::ai::ModelGateway;
use crate::command::{MenuChoice, ReviewInput, parse_menu_choice, parse_review_input};
use crate::mail::MailTransport;
use crate::session::{Outcome, RefinementLoop, SessionState};
use crate::triage::{EmailRecord, TriageBatch};

/// Whether the operator wants to keep going after leaving an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct TriageApp<'a, G: ModelGateway + ?Sized, R: BufRead, W: Write> {
    records: &'a [EmailRecord],
    batch: TriageBatch,
    session: SessionState,
    refine: RefinementLoop<'a, G>,
    /// None when sender credentials are not configured
    transport: Option<&'a dyn MailTransport>,
    subject_prefix: String,
    input: R,
    output: W,
}

impl<'a, G: ModelGateway + ?Sized, R: BufRead, W: Write> TriageApp<'a, G, R, W> {
    pub fn new(
        gateway: &'a G,
        records: &'a [EmailRecord],
        batch: TriageBatch,
        input: R,
        output: W,
    ) -> Self {
        let session = SessionState::from_batch(&batch);
        Self {
            records,
            batch,
            session,
            refine: RefinementLoop::new(gateway),
            transport: None,
            subject_prefix: "Re: ".to_string(),
            input,
            output,
        }
    }

    pub fn with_transport(mut self, transport: Option<&'a dyn MailTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_subject_prefix(mut self, prefix: &str) -> Self {
        self.subject_prefix = prefix.to_string();
        self
    }

    #[cfg(test)]
    fn session(&self) -> &SessionState {
        &self.session
    }

    /// Prompt and read one line. `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read operator input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Run the batch-level menu until the operator exits.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            render::menu(&mut self.output, &self.batch, &self.session)?;

            let Some(line) = self.read_line(
                "\nWhich email would you like to handle? (Enter number, or type 'exit' to quit): ",
            )?
            else {
                break;
            };

            match parse_menu_choice(&line, self.batch.len()) {
                Ok(MenuChoice::Exit) => break,
                Ok(MenuChoice::Select(index)) => {
                    if self.review(index).await? == Flow::Exit {
                        break;
                    }
                }
                Err(e) => writeln!(self.output, "--> {}. Please try again.\n", e)?,
            }
        }

        writeln!(
            self.output,
            "Exiting the triage session ({} of {} approved, {} sent). Goodbye!",
            self.session.approved_count(),
            self.session.len(),
            self.session.dispatched_count()
        )?;
        Ok(())
    }

    /// Review loop for one item. Leaving without approval keeps its state.
    async fn review(&mut self, index: usize) -> Result<Flow> {
        self.session.open(index)?;

        let records = self.records;
        let item_id = self
            .batch
            .get(index)
            .map(|item| item.item_id.clone())
            .context("Selected item missing from batch")?;
        let original = records
            .iter()
            .find(|r| r.id == item_id)
            .map(|r| r.content.as_str())
            .with_context(|| format!("No input email with id {}", item_id))?;

        self.render_item(index)?;

        loop {
            let Some(line) = self.read_line("Your feedback: ")? else {
                return Ok(Flow::Exit);
            };

            let is_feedback = matches!(parse_review_input(&line), ReviewInput::Feedback(_));
            let approved = self.session.get(index).is_some_and(|s| s.is_approved());
            if is_feedback && !approved {
                writeln!(self.output, "\nEva is revising the draft...")?;
            }

            match self
                .refine
                .handle_input(&mut self.session, index, original, &line)
                .await
            {
                Ok(Outcome::Approved { newly }) => {
                    if newly {
                        writeln!(self.output, "\nDraft approved.")?;
                    } else {
                        writeln!(self.output, "\nThis draft is already approved.")?;
                    }
                    writeln!(
                        self.output,
                        "Type 'send' to email it to the customer, or 'back' to return to the list.\n"
                    )?;
                }
                Ok(Outcome::Revised) => {
                    if let Some(session) = self.session.get(index) {
                        render::draft(&mut self.output, "Revised Draft", session)?;
                    }
                    writeln!(
                        self.output,
                        "Type more feedback, 'approve' to accept, or 'back' to return to the list."
                    )?;
                }
                Ok(Outcome::Back) => return Ok(Flow::Continue),
                Ok(Outcome::Exit) => return Ok(Flow::Exit),
                Ok(Outcome::SendRequested) => self.dispatch(index).await?,
                Ok(Outcome::Ignored) => {}
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Review input on item {} failed: {}", index + 1, e);
                    writeln!(self.output, "--> {}", e)?;
                    if is_feedback && !approved {
                        writeln!(self.output, "The previous draft is kept.\n")?;
                    }
                }
            }
        }
    }

    fn render_item(&mut self, index: usize) -> Result<()> {
        if let (Some(item), Some(session)) = (self.batch.get(index), self.session.get(index)) {
            render::item(&mut self.output, item, session)?;
        }
        Ok(())
    }

    /// Send an approved reply. Missing credentials or address skip the send;
    /// transport failures are reported and never retried.
    async fn dispatch(&mut self, index: usize) -> Result<()> {
        let Some(session) = self.session.get(index) else {
            return Ok(());
        };
        if !session.is_approved() {
            writeln!(self.output, "--> Approve the draft before sending it.\n")?;
            return Ok(());
        }
        let already_sent = session.dispatched;
        let body = session.current_draft.clone();

        let Some(transport) = self.transport else {
            writeln!(
                self.output,
                "--> Sending skipped: sender credentials are not configured \
                 (set SENDER_EMAIL and SENDER_APP_CREDENTIAL).\n"
            )?;
            return Ok(());
        };

        let Some(item) = self.batch.get(index) else {
            return Ok(());
        };
        let Some(recipient) = item
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
        else {
            writeln!(
                self.output,
                "--> Sending skipped: no customer email address was found for this message.\n"
            )?;
            return Ok(());
        };
        let subject = format!("{}{}", self.subject_prefix, item.classification);

        if already_sent {
            let answer = self
                .read_line("This reply was already sent. Send it again? [y/N]: ")?
                .unwrap_or_default();
            if !answer.eq_ignore_ascii_case("y") {
                writeln!(self.output, "Not sent.\n")?;
                return Ok(());
            }
        }

        writeln!(self.output, "Sending reply to {}...", recipient)?;
        match transport.send(&subject, &body, &recipient).await {
            Ok(()) => {
                self.session.mark_dispatched(index)?;
                writeln!(self.output, "Reply sent to {}.\n", recipient)?;
            }
            Err(e) => {
                tracing::warn!("Dispatch of item {} failed: {}", index + 1, e);
                writeln!(self.output, "--> {}\n", e)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGateway;
    use crate::mail::testing::RecordingTransport;
    use crate::triage::parser::parse;
    use std::io::Cursor;

    fn records() -> Vec<EmailRecord> {
        vec![
            EmailRecord::new("e1", "Where is my order?"),
            EmailRecord::new("e2", "I want to return my lamp."),
            EmailRecord::new("e3", "Do you ship to Canada?"),
        ]
    }

    fn batch() -> TriageBatch {
        parse(
            r#"{"analyses": [
                {"email_id": "e1", "classification": "Missing Order", "priority": "High",
                 "priority_reasoning": "r", "draft_response": "Draft one.",
                 "customer_email": "one@example.com"},
                {"email_id": "e2", "classification": "Return Request", "priority": "Medium",
                 "priority_reasoning": "r", "draft_response": "Draft two.",
                 "customer_email": "two@example.com"},
                {"email_id": "e3", "classification": "Enquiry", "priority": "Low",
                 "priority_reasoning": "r", "draft_response": "Draft three."}
            ]}"#,
        )
        .unwrap()
    }

    fn output_text(out: &[u8]) -> String {
        String::from_utf8_lossy(out).to_string()
    }

    #[tokio::test]
    async fn test_exit_with_nothing_approved_sends_nothing() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let transport = RecordingTransport::default();
        let mut out = Vec::new();

        let mut app = TriageApp::new(&gateway, &records, batch(), Cursor::new("exit\n"), &mut out)
            .with_transport(Some(&transport));
        app.run().await.unwrap();
        assert_eq!(app.session().approved_count(), 0);
        drop(app);

        assert_eq!(transport.sent_count(), 0);
        assert_eq!(gateway.call_count(), 0);
        assert!(output_text(&out).contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_revise_item_two_then_back() {
        let records = records();
        let gateway = ScriptedGateway::new().reply("Short draft.");
        let mut out = Vec::new();

        let input = Cursor::new("2\nmake it shorter\nback\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out);
        app.run().await.unwrap();

        let session = app.session();
        assert_eq!(session.current_draft(1), Some("Short draft."));
        assert_eq!(session.current_draft(0), Some("Draft one."));
        assert_eq!(session.current_draft(2), Some("Draft three."));
        assert!(!session.get(1).unwrap().is_approved());
        drop(app);

        assert!(gateway.prompt(0).contains("I want to return my lamp."));
        assert!(output_text(&out).contains("--- Revised Draft ---"));
    }

    #[tokio::test]
    async fn test_approve_and_send() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let transport = RecordingTransport::default();
        let mut out = Vec::new();

        let input = Cursor::new("1\napprove\nsend\nback\nquit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out)
            .with_transport(Some(&transport))
            .with_subject_prefix("Re: ");
        app.run().await.unwrap();
        assert_eq!(app.session().dispatched_count(), 1);
        drop(app);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            (
                "Re: Missing Order".to_string(),
                "Draft one.".to_string(),
                "one@example.com".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_send_without_credentials_is_soft_failure() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let mut out = Vec::new();

        let input = Cursor::new("1\napprove\nsend\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out);
        app.run().await.unwrap();
        assert_eq!(app.session().dispatched_count(), 0);
        assert_eq!(app.session().approved_count(), 1);
        drop(app);

        assert!(output_text(&out).contains("Sending skipped"));
    }

    #[tokio::test]
    async fn test_send_requires_approval_and_address() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let transport = RecordingTransport::default();
        let mut out = Vec::new();

        // Item 3 has no customer address
        let input = Cursor::new("3\nsend\napprove\nsend\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out)
            .with_transport(Some(&transport));
        app.run().await.unwrap();
        drop(app);

        let text = output_text(&out);
        assert!(text.contains("Approve the draft before sending it."));
        assert!(text.contains("no customer email address"));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_reported_not_marked_sent() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let transport = RecordingTransport::failing();
        let mut out = Vec::new();

        let input = Cursor::new("2\napprove\nsend\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out)
            .with_transport(Some(&transport));
        app.run().await.unwrap();
        assert_eq!(app.session().dispatched_count(), 0);
        drop(app);

        assert!(output_text(&out).contains("mail transport error"));
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_draft_and_loop_continues() {
        let records = records();
        let gateway = ScriptedGateway::new().fail("timed out").reply("Better draft.");
        let mut out = Vec::new();

        let input = Cursor::new("1\nfriendlier please\nfriendlier please\napprove\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out);
        app.run().await.unwrap();

        let item = app.session().get(0).unwrap();
        assert_eq!(item.current_draft, "Better draft.");
        assert!(item.is_approved());
        drop(app);

        let text = output_text(&out);
        assert!(text.contains("timed out"));
        assert!(text.contains("The previous draft is kept."));
    }

    #[tokio::test]
    async fn test_invalid_menu_input_reprompts() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let mut out = Vec::new();

        let input = Cursor::new("seven\n9\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out);
        app.run().await.unwrap();
        drop(app);

        let text = output_text(&out);
        assert!(text.contains("'seven' is not a valid number"));
        assert!(text.contains("between 1 and 3"));
        assert_eq!(text.matches("--- EMAILS PENDING ---").count(), 3);
    }

    #[tokio::test]
    async fn test_resume_item_after_back() {
        let records = records();
        let gateway = ScriptedGateway::new().reply("v1").reply("v2");
        let mut out = Vec::new();

        let input = Cursor::new("1\nshorter\nback\n3\nback\n1\nwarmer\napprove\nexit\n");
        let mut app = TriageApp::new(&gateway, &records, batch(), input, &mut out);
        app.run().await.unwrap();

        assert_eq!(app.session().current_draft(0), Some("v2"));
        assert!(app.session().get(0).unwrap().is_approved());
        drop(app);
        assert!(gateway.prompt(1).contains("v1"));
    }

    #[tokio::test]
    async fn test_end_of_input_exits_gracefully() {
        let records = records();
        let gateway = ScriptedGateway::new();
        let mut out = Vec::new();

        let mut app = TriageApp::new(&gateway, &records, batch(), Cursor::new("1\n"), &mut out);
        app.run().await.unwrap();
        drop(app);
        assert!(output_text(&out).contains("Goodbye!"));
    }
}
