//! Review session: per-item draft state and the refinement loop that mutates it

mod refine;
mod state;

pub use refine::{Outcome, RefinementLoop};
pub use state::{DraftStatus, ItemSession, SessionState};
