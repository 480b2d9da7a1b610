//! One-shot batch triage: prompt, single model call, validated batch

use std::collections::HashMap;

use crate::ai::prompts::TRIAGE_INSTRUCTIONS;
use crate::ai::{ModelGateway, PromptTemplate};
use crate::constants::LOG_SNIPPET_CHARS;
use crate::error::TriageError;

use super::parser::{self, StructuredOutput};
use super::prompt;
use super::schema::{EmailRecord, TriageBatch};

pub struct TriageOrchestrator<'a, G: ModelGateway + ?Sized> {
    gateway: &'a G,
    instructions: PromptTemplate,
    strict_priority: bool,
}

impl<'a, G: ModelGateway + ?Sized> TriageOrchestrator<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            instructions: PromptTemplate::new(TRIAGE_INSTRUCTIONS),
            strict_priority: false,
        }
    }

    /// Reject batches whose priorities break the classification mapping
    pub fn strict_priority(mut self, strict: bool) -> Self {
        self.strict_priority = strict;
        self
    }

    /// Triage `records` with exactly one model call.
    ///
    /// The batch either fully validates (one item per record, in record order)
    /// or the whole run fails. Gateway errors propagate unchanged.
    pub async fn run(&self, records: &[EmailRecord]) -> Result<TriageBatch, TriageError> {
        let prompt = prompt::build(
            records,
            &self.instructions,
            &TriageBatch::format_instructions(),
        )?;

        tracing::info!("Triaging {} email(s)", records.len());
        let raw = self.gateway.generate(&prompt).await?;

        let batch = parser::parse::<TriageBatch>(&raw).inspect_err(|e| {
            tracing::warn!("Triage output rejected: {} (output: {})", e, snippet(&raw));
        })?;
        let batch = align_to_records(batch, records)?;

        let violations = batch.policy_violations();
        if self.strict_priority && !violations.is_empty() {
            let details = violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TriageError::SchemaViolation(format!(
                "priority does not follow classification: {}",
                details
            )));
        }
        for violation in &violations {
            tracing::warn!("Priority policy: {}", violation);
        }

        tracing::info!("Triage complete: {} item(s)", batch.len());
        Ok(batch)
    }
}

/// Check the batch covers each record exactly once and reorder it to match
/// the input order.
fn align_to_records(
    batch: TriageBatch,
    records: &[EmailRecord],
) -> Result<TriageBatch, TriageError> {
    let positions: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();

    let mut slots = vec![None; records.len()];
    for item in batch.into_items() {
        let Some(&pos) = positions.get(item.item_id.as_str()) else {
            return Err(TriageError::SchemaViolation(format!(
                "analysis refers to unknown email id '{}'",
                item.item_id
            )));
        };
        if slots[pos].is_some() {
            return Err(TriageError::SchemaViolation(format!(
                "email id '{}' analyzed more than once",
                item.item_id
            )));
        }
        slots[pos] = Some(item);
    }

    let missing: Vec<&str> = records
        .iter()
        .zip(&slots)
        .filter(|(_, slot)| slot.is_none())
        .map(|(r, _)| r.id.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(TriageError::SchemaViolation(format!(
            "no analysis returned for: {}",
            missing.join(", ")
        )));
    }

    Ok(TriageBatch::from_items(slots.into_iter().flatten().collect()))
}

fn snippet(raw: &str) -> String {
    let mut out: String = raw.chars().take(LOG_SNIPPET_CHARS).collect();
    if raw.chars().count() > LOG_SNIPPET_CHARS {
        out.push_str("...");
    }
    out
}
