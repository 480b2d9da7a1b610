//! Triage prompt assembly

use crate::ai::PromptTemplate;
use crate::error::TriageError;

use super::schema::EmailRecord;

/// Render records as delimited blocks. Ids and contents are embedded verbatim
/// (no escaping) so nothing the customer wrote is lost or altered.
pub fn render_email_list(records: &[EmailRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "Email {} (id: {})\n<<<\n{}\n>>>",
                i + 1,
                record.id,
                record.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the batch triage prompt.
///
/// `instructions` must use the `{email_list}` and `{format_instructions}`
/// placeholders; `schema_description` is inserted unchanged.
pub fn build(
    records: &[EmailRecord],
    instructions: &PromptTemplate,
    schema_description: &str,
) -> Result<String, TriageError> {
    if records.is_empty() {
        return Err(TriageError::OperatorInput(
            "there are no emails to triage".to_string(),
        ));
    }

    let email_list = render_email_list(records);
    instructions.render(&[
        ("email_list", &email_list),
        ("format_instructions", schema_description),
    ])
}
