//! Input email sets: the built-in samples or a JSON file of records

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::schema::EmailRecord;

/// Demo inbox used when no file is given
pub fn sample_records() -> Vec<EmailRecord> {
    vec![
        EmailRecord::new(
            "email_001",
            "Hi, I ordered a blue sweater last week (order #123) and the tracking says it was delivered, but I never got it! Can you help? This is very frustrating. - Angry Anna",
        ),
        EmailRecord::new(
            "email_002",
            "Just wanted to say I LOVE the new headphones I bought. The sound quality is amazing and they arrived a day early. You guys are the best! - Happy Henry",
        ),
        EmailRecord::new(
            "email_003",
            "Hello, I was wondering if you ship to Canada? Thanks. - Curious Carla",
        ),
        EmailRecord::new(
            "email_004",
            "Hello, I need help with setting up my sound system. - Jimmy",
        ),
        EmailRecord::new(
            "email_005",
            "Hello, I need to return my order, item is not working as expected. - John",
        ),
        EmailRecord::new(
            "email_006",
            "I need my refund ASAP, the item broke into pieces and the packing was horrible. I am not happy with the seller and am going to leave a negative review. - Jane",
        ),
    ]
}

/// Load records from a JSON array of `{"id": ..., "content": ...}` objects.
pub fn load_records(path: &Path) -> Result<Vec<EmailRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read email file: {}", path.display()))?;
    let records: Vec<EmailRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse email file: {}", path.display()))?;
    check_records(&records)?;
    Ok(records)
}

/// A batch must be non-empty with unique, non-blank ids
pub fn check_records(records: &[EmailRecord]) -> Result<()> {
    if records.is_empty() {
        anyhow::bail!("No emails to triage");
    }
    let mut seen = HashSet::new();
    for record in records {
        if record.id.trim().is_empty() {
            anyhow::bail!("Email with blank id");
        }
        if !seen.insert(record.id.as_str()) {
            anyhow::bail!("Duplicate email id: {}", record.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_valid() {
        let records = sample_records();
        assert_eq!(records.len(), 6);
        assert!(check_records(&records).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![EmailRecord::new("a", "x"), EmailRecord::new("a", "y")];
        let err = check_records(&records).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_empty_and_blank_rejected() {
        assert!(check_records(&[]).is_err());
        assert!(check_records(&[EmailRecord::new("  ", "x")]).is_err());
    }

    #[test]
    fn test_load_records_from_file() {
        let path = std::env::temp_dir().join(format!(
            "mailtriage_records_{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"[{"id": "e1", "content": "Where is my parcel?"}, {"id": "e2", "content": "Thanks!"}]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], EmailRecord::new("e2", "Thanks!"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_records_bad_json() {
        let path = std::env::temp_dir().join(format!(
            "mailtriage_bad_records_{}.json",
            std::process::id()
        ));
        fs::write(&path, "not json").unwrap();
        assert!(load_records(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
