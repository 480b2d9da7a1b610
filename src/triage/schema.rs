//! Declared shape of one analyzed email and of the batch result

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use super::parser::{StructuredOutput, json_kind};

/// One customer email to triage. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: String,
    pub content: String,
}

impl EmailRecord {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Enquiry,
    #[serde(rename = "Missing Order")]
    MissingOrder,
    #[serde(rename = "Canceling Order")]
    CancelingOrder,
    #[serde(rename = "Waiting for Refund")]
    WaitingForRefund,
    #[serde(rename = "Item Not Delivered (but marked as delivered)")]
    ItemNotDelivered,
    #[serde(rename = "Return Request")]
    ReturnRequest,
    #[serde(rename = "Technical Issue")]
    TechnicalIssue,
    #[serde(rename = "Happy Customer")]
    HappyCustomer,
}

impl Classification {
    pub const ALL: [Classification; 8] = [
        Self::Enquiry,
        Self::MissingOrder,
        Self::CancelingOrder,
        Self::WaitingForRefund,
        Self::ItemNotDelivered,
        Self::ReturnRequest,
        Self::TechnicalIssue,
        Self::HappyCustomer,
    ];

    /// The exact literal the model must emit
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enquiry => "Enquiry",
            Self::MissingOrder => "Missing Order",
            Self::CancelingOrder => "Canceling Order",
            Self::WaitingForRefund => "Waiting for Refund",
            Self::ItemNotDelivered => "Item Not Delivered (but marked as delivered)",
            Self::ReturnRequest => "Return Request",
            Self::TechnicalIssue => "Technical Issue",
            Self::HappyCustomer => "Happy Customer",
        }
    }

    /// Priority the triage instructions ask the model to assign
    pub fn expected_priority(self) -> Priority {
        match self {
            Self::MissingOrder | Self::CancelingOrder | Self::ItemNotDelivered => Priority::High,
            Self::WaitingForRefund | Self::ReturnRequest | Self::TechnicalIssue => {
                Priority::Medium
            }
            Self::Enquiry | Self::HappyCustomer => Priority::Low,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The model's analysis of one email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisItem {
    /// Id of the [`EmailRecord`] this analysis belongs to
    #[serde(rename = "email_id")]
    pub item_id: String,
    pub classification: Classification,
    pub priority: Priority,
    pub priority_reasoning: String,
    pub draft_response: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub support_phone_number: Option<String>,
}

/// Priority that disagrees with the classification mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    pub item_id: String,
    pub classification: Classification,
    pub declared: Priority,
    pub expected: Priority,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: '{}' should be {} priority, model said {}",
            self.item_id, self.classification, self.expected, self.declared
        )
    }
}

/// Every analysis produced by one triage run, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageBatch {
    analyses: Vec<AnalysisItem>,
}

impl TriageBatch {
    pub fn items(&self) -> &[AnalysisItem] {
        &self.analyses
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisItem> {
        self.analyses.get(index)
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn policy_violations(&self) -> Vec<PolicyViolation> {
        self.analyses
            .iter()
            .filter(|item| item.priority != item.classification.expected_priority())
            .map(|item| PolicyViolation {
                item_id: item.item_id.clone(),
                classification: item.classification,
                declared: item.priority,
                expected: item.classification.expected_priority(),
            })
            .collect()
    }

    pub(super) fn into_items(self) -> Vec<AnalysisItem> {
        self.analyses
    }

    pub(super) fn from_items(analyses: Vec<AnalysisItem>) -> Self {
        Self { analyses }
    }
}

impl StructuredOutput for TriageBatch {
    fn json_schema() -> Value {
        let categories: Vec<&str> = Classification::ALL.iter().map(|c| c.as_str()).collect();
        let priorities: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();

        json!({
            "type": "object",
            "properties": {
                "analyses": {
                    "type": "array",
                    "minItems": 1,
                    "description": "The analysis for each email, one entry per input email, in input order.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "email_id": {
                                "type": "string",
                                "description": "The original id of the email from the input list"
                            },
                            "classification": {
                                "type": "string",
                                "enum": categories,
                                "description": "The category chosen from the predefined list"
                            },
                            "priority": {
                                "type": "string",
                                "enum": priorities,
                                "description": "Priority from the prioritization rules"
                            },
                            "priority_reasoning": {
                                "type": "string",
                                "description": "One sentence explaining the priority"
                            },
                            "draft_response": {
                                "type": "string",
                                "description": "The complete, well-formatted reply to the customer"
                            },
                            "customer_name": {
                                "type": ["string", "null"],
                                "description": "The customer's name if stated in the email"
                            },
                            "customer_email": {
                                "type": ["string", "null"],
                                "description": "The customer's email address if stated in the email"
                            },
                            "support_phone_number": {
                                "type": ["string", "null"],
                                "description": "Customer service phone number offered in the reply"
                            }
                        },
                        "required": [
                            "email_id",
                            "classification",
                            "priority",
                            "priority_reasoning",
                            "draft_response"
                        ]
                    }
                }
            },
            "required": ["analyses"]
        })
    }

    /// Item-by-item decoding so a violation names the offending entry
    fn from_json(value: Value) -> Result<Self, String> {
        let mut root = match value {
            Value::Object(map) => map,
            other => {
                return Err(format!(
                    "expected a JSON object at the top level, found {}",
                    json_kind(&other)
                ));
            }
        };

        let entries = match root.remove("analyses") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(format!(
                    "`analyses` must be an array, found {}",
                    json_kind(&other)
                ));
            }
            None => return Err("missing field `analyses`".to_string()),
        };

        let analyses = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::from_value::<AnalysisItem>(entry)
                    .map_err(|e| format!("analyses[{}]: {}", i, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { analyses })
    }

    fn validate(&self) -> Result<(), String> {
        if self.analyses.is_empty() {
            return Err("`analyses` must contain at least one item".to_string());
        }
        for (i, item) in self.analyses.iter().enumerate() {
            if item.item_id.trim().is_empty() {
                return Err(format!("analyses[{}]: `email_id` is empty", i));
            }
            if item.draft_response.trim().is_empty() {
                return Err(format!("analyses[{}]: `draft_response` is empty", i));
            }
        }
        Ok(())
    }
}
