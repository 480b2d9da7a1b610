//! Per-item review state for one triage session
//!
//! Each item moves `Drafted -> UnderReview -> Approved`. State lives only for
//! the process run.

use crate::error::TriageError;
use crate::triage::TriageBatch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftStatus {
    #[default]
    Drafted,
    UnderReview,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSession {
    pub status: DraftStatus,
    pub current_draft: String,
    /// Number of accepted model revisions
    pub revisions: usize,
    /// Whether the approved reply has been sent
    pub dispatched: bool,
}

impl ItemSession {
    fn new(draft: &str) -> Self {
        Self {
            status: DraftStatus::Drafted,
            current_draft: draft.to_string(),
            revisions: 0,
            dispatched: false,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DraftStatus::Approved
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    items: Vec<ItemSession>,
}

impl SessionState {
    /// One `Drafted` entry per batch item, seeded with the model's draft
    pub fn from_batch(batch: &TriageBatch) -> Self {
        Self {
            items: batch
                .items()
                .iter()
                .map(|item| ItemSession::new(&item.draft_response))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&ItemSession> {
        self.items.get(index)
    }

    #[cfg(test)]
    pub fn current_draft(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|i| i.current_draft.as_str())
    }

    pub fn approved_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_approved()).count()
    }

    pub fn dispatched_count(&self) -> usize {
        self.items.iter().filter(|i| i.dispatched).count()
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut ItemSession, TriageError> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| TriageError::OperatorInput(format!("no item {} of {}", index + 1, len)))
    }

    /// Start (or resume) reviewing an item. Approved items stay approved.
    pub fn open(&mut self, index: usize) -> Result<DraftStatus, TriageError> {
        let item = self.item_mut(index)?;
        if item.status == DraftStatus::Drafted {
            item.status = DraftStatus::UnderReview;
        }
        Ok(item.status)
    }

    /// Approve the current draft. Returns false if it was already approved.
    pub fn approve(&mut self, index: usize) -> Result<bool, TriageError> {
        let item = self.item_mut(index)?;
        if item.is_approved() {
            return Ok(false);
        }
        item.status = DraftStatus::Approved;
        Ok(true)
    }

    /// Replace the draft with a model revision. Approved drafts are frozen.
    pub fn replace_draft(&mut self, index: usize, draft: String) -> Result<(), TriageError> {
        let item = self.item_mut(index)?;
        if item.is_approved() {
            return Err(TriageError::OperatorInput(
                "this draft is already approved and can no longer be revised".to_string(),
            ));
        }
        item.status = DraftStatus::UnderReview;
        item.current_draft = draft;
        item.revisions += 1;
        Ok(())
    }

    pub fn mark_dispatched(&mut self, index: usize) -> Result<(), TriageError> {
        let item = self.item_mut(index)?;
        if !item.is_approved() {
            return Err(TriageError::OperatorInput(
                "approve the draft before sending it".to_string(),
            ));
        }
        item.dispatched = true;
        Ok(())
    }
}
