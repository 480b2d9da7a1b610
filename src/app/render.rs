//! Console rendering of the email list and of a single item under review

use std::io::{self, Write};

use crate::command::review_commands;
use crate::session::{DraftStatus, ItemSession, SessionState};
use crate::triage::{AnalysisItem, TriageBatch};

const RULE_WIDTH: usize = 24;

fn status_tag(session: Option<&ItemSession>) -> &'static str {
    match session {
        Some(s) if s.dispatched => "[SENT]",
        Some(s) if s.status == DraftStatus::Approved => "[APPROVED]",
        Some(s) if s.status == DraftStatus::UnderReview => "[IN REVIEW]",
        _ => "",
    }
}

pub fn menu<W: Write>(out: &mut W, batch: &TriageBatch, session: &SessionState) -> io::Result<()> {
    writeln!(out, "--- EMAILS PENDING ---")?;
    for (i, item) in batch.items().iter().enumerate() {
        writeln!(
            out,
            "{}. ID: {} | Priority: {} | {} {}",
            i + 1,
            item.item_id,
            item.priority,
            item.classification,
            status_tag(session.get(i))
        )?;
    }
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

pub fn item<W: Write>(out: &mut W, item: &AnalysisItem, session: &ItemSession) -> io::Result<()> {
    writeln!(out, "\n--- HANDLING EMAIL ---")?;
    writeln!(out, "ID:         {}", item.item_id)?;
    if let Some(ref name) = item.customer_name {
        writeln!(out, "Customer:   {}", name)?;
    }
    if let Some(ref email) = item.customer_email {
        writeln!(out, "Email:      {}", email)?;
    }
    writeln!(
        out,
        "Priority:   {} ({})",
        item.priority, item.priority_reasoning
    )?;
    writeln!(out, "Category:   {}", item.classification)?;
    if let Some(ref phone) = item.support_phone_number {
        writeln!(out, "Support #:  {}", phone)?;
    }
    draft(out, "Suggested Draft Response", session)?;

    let tokens = review_commands()
        .iter()
        .map(|c| format!("'{}' {}", c.name, c.description.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(out, "Type feedback to revise the draft, or: {}", tokens)
}

pub fn draft<W: Write>(out: &mut W, title: &str, session: &ItemSession) -> io::Result<()> {
    writeln!(out, "\n--- {} ---", title)?;
    writeln!(out, "{}", session.current_draft)?;
    writeln!(out, "{}\n", "-".repeat(RULE_WIDTH))
}
