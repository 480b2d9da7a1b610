//! Parsing of free-text operator input at each console prompt

use crate::constants::{APPROVE_TOKEN, BACK_TOKENS, EXIT_TOKENS, SEND_TOKEN};
use crate::error::TriageError;

/// Input at the batch-level menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    /// Zero-based item index
    Select(usize),
    Exit,
}

/// Input while reviewing one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewInput {
    Approve,
    Back,
    Exit,
    Send,
    Empty,
    /// Anything else is revision feedback for the model
    Feedback(String),
}

/// Help information for a review token
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn is_exit(input: &str) -> bool {
    let trimmed = input.trim();
    EXIT_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Parse a menu selection. Numbers are 1-based as shown to the operator.
pub fn parse_menu_choice(input: &str, item_count: usize) -> Result<MenuChoice, TriageError> {
    let trimmed = input.trim();
    if is_exit(trimmed) {
        return Ok(MenuChoice::Exit);
    }

    let number: usize = trimmed.parse().map_err(|_| {
        TriageError::OperatorInput(format!("'{}' is not a valid number", trimmed))
    })?;

    if number == 0 || number > item_count {
        return Err(TriageError::OperatorInput(format!(
            "Please pick a number between 1 and {}",
            item_count
        )));
    }

    Ok(MenuChoice::Select(number - 1))
}

pub fn parse_review_input(input: &str) -> ReviewInput {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ReviewInput::Empty;
    }
    if trimmed.eq_ignore_ascii_case(APPROVE_TOKEN) {
        return ReviewInput::Approve;
    }
    if trimmed.eq_ignore_ascii_case(SEND_TOKEN) {
        return ReviewInput::Send;
    }
    if BACK_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        return ReviewInput::Back;
    }
    if is_exit(trimmed) {
        return ReviewInput::Exit;
    }
    ReviewInput::Feedback(trimmed.to_string())
}

/// Tokens accepted while reviewing an item, for the help line
pub fn review_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "approve",
            description: "Accept the current draft",
        },
        CommandHelp {
            name: "send",
            description: "Email an approved draft to the customer",
        },
        CommandHelp {
            name: "back",
            description: "Return to the email list without approving",
        },
        CommandHelp {
            name: "exit",
            description: "Leave the triage session",
        },
    ]
}
