//! YAML frontmatter parsing and serialization.
//!
//! Ticket files are markdown documents opening with a `---` delimited YAML
//! block. The frontmatter carries the structured record; everything after
//! the closing delimiter is free-form markdown body and passes through
//! untouched.

use serde_json::Value;

use crate::validation::Record;
use crate::{Error, Result};

/// Split a document into its raw frontmatter and body.
///
/// Returns `None` when the document does not open with a `---` fence or the
/// closing fence is missing.
pub fn extract(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n')?;

    if let Some(index) = rest.find("\n---\n") {
        Some((&rest[..index + 1], &rest[index + 5..]))
    } else {
        // Closing fence at end of file without a trailing newline
        rest.strip_suffix("\n---").map(|fm| (fm, ""))
    }
}

/// Parse a ticket document into its record and markdown body.
///
/// `source` is the file's display path, used in error messages.
pub fn parse(content: &str, source: &str) -> Result<(Record, String)> {
    let (raw, body) = extract(content)
        .ok_or_else(|| Error::InvalidFrontmatter(source.to_string()))?;

    let value: Value = serde_yaml::from_str(raw)?;
    match value {
        // The blank separator line after the fence is layout, not body
        Value::Object(record) => Ok((record, body.trim_start_matches('\n').to_string())),
        _ => Err(Error::InvalidInput(format!(
            "frontmatter in {} is not a mapping",
            source
        ))),
    }
}

/// Serialize a record and body back into a ticket document.
pub fn serialize(record: &Record, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(record)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body.trim_start_matches('\n')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "---\nid: TSK-0002\ntitle: \"Fix connection pool\"\nstatus: open\npriority: critical\ncreated_at: 2025-07-11T10:00:00\nupdated_at: 2025-07-11T10:00:00\ntags:\n  - database\n---\n\n# Fix Connection Pool\n\nBody text.\n";

    #[test]
    fn test_extract_splits_frontmatter_and_body() {
        let (fm, body) = extract(SAMPLE).unwrap();
        assert!(fm.contains("id: TSK-0002"));
        assert!(body.starts_with("\n# Fix Connection Pool"));
    }

    #[test]
    fn test_extract_without_fence() {
        assert!(extract("# Just markdown\n").is_none());
        assert!(extract("--- not a fence\n").is_none());
    }

    #[test]
    fn test_extract_unclosed_fence() {
        assert!(extract("---\nid: TSK-0001\n").is_none());
    }

    #[test]
    fn test_extract_fence_at_eof() {
        let (fm, body) = extract("---\nid: TSK-0001\n---").unwrap();
        assert_eq!(fm, "id: TSK-0001");
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_sample() {
        let (record, body) = parse(SAMPLE, "tsk/TSK-0002.md").unwrap();
        assert_eq!(record.get("id").unwrap(), "TSK-0002");
        assert_eq!(record.get("priority").unwrap(), "critical");
        assert_eq!(
            record.get("tags").unwrap(),
            &serde_json::json!(["database"])
        );
        // Unquoted YAML timestamps stay strings
        assert_eq!(record.get("created_at").unwrap(), "2025-07-11T10:00:00");
        assert!(body.contains("Body text."));
    }

    #[test]
    fn test_parse_missing_frontmatter_names_source() {
        let err = parse("# no frontmatter\n", "tsk/TSK-0001.md").unwrap_err();
        assert!(err.to_string().contains("tsk/TSK-0001.md"));
    }

    #[test]
    fn test_parse_non_mapping_frontmatter() {
        let err = parse("---\n- a\n- b\n---\nbody\n", "x.md").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse("---\nkey: [unclosed\n---\nbody\n", "x.md");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let record: Record = match json!({
            "id": "ISS-0001",
            "title": "Login broken",
            "status": "open",
            "priority": "high",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "issue_type": "bug",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let doc = serialize(&record, "# Login broken\n\nDetails.\n").unwrap();
        assert!(doc.starts_with("---\n"));

        let (back, body) = parse(&doc, "x.md").unwrap();
        assert_eq!(back, record);
        assert_eq!(body, "# Login broken\n\nDetails.\n");
    }
}
