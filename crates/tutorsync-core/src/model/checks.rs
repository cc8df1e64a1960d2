//! Field-level validation helpers shared by the entity models

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::entity::EntityKind;
use crate::errors::ValidationError;

type Check = std::result::Result<(), ValidationError>;

pub fn non_empty(kind: EntityKind, field: &str, value: &str) -> Check {
    if value.trim().is_empty() {
        return Err(ValidationError::field(
            kind,
            field,
            "cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Every entry must be a non-empty reference and appear once
pub fn id_list(kind: EntityKind, field: &str, ids: &[String]) -> Check {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::field(kind, field, "contains an empty id"));
        }
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::field(
                kind,
                field,
                format!("contains duplicate id {}", id),
            ));
        }
    }
    Ok(())
}

/// Free-form labels (subjects, languages) must not be blank
pub fn labels(kind: EntityKind, field: &str, values: &[String]) -> Check {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ValidationError::field(kind, field, "contains an empty entry"));
    }
    Ok(())
}

/// Empty is allowed; anything else needs a local part and a dotted domain
pub fn email(kind: EntityKind, field: &str, value: &str) -> Check {
    if value.is_empty() {
        return Ok(());
    }
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::field(
            kind,
            field,
            format!("{} is not an email address", value),
        ));
    }
    Ok(())
}

/// Empty is allowed; anything else must be an http(s) URL
pub fn url(kind: EntityKind, field: &str, value: &str) -> Check {
    if value.is_empty() || value.starts_with("https://") || value.starts_with("http://") {
        return Ok(());
    }
    Err(ValidationError::field(
        kind,
        field,
        format!("{} is not an http(s) URL", value),
    ))
}

pub fn ordered(
    kind: EntityKind,
    field: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Check {
    if from >= to {
        return Err(ValidationError::field(
            kind,
            field,
            format!("start {} must precede end {}", from.to_rfc3339(), to.to_rfc3339()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(non_empty(EntityKind::User, "name", "Ada").is_ok());
        assert!(non_empty(EntityKind::User, "name", "  ").is_err());
    }

    #[test]
    fn test_id_list_rejects_duplicates() {
        let ids = vec!["u1".to_string(), "u1".to_string()];
        let err = id_list(EntityKind::Org, "members", &ids).unwrap_err();
        assert!(err.to_string().contains("duplicate id u1"));
    }

    #[test]
    fn test_email() {
        assert!(email(EntityKind::User, "email", "").is_ok());
        assert!(email(EntityKind::User, "email", "ada@example.org").is_ok());
        assert!(email(EntityKind::User, "email", "ada.example.org").is_err());
        assert!(email(EntityKind::User, "email", "ada@localhost").is_err());
        assert!(email(EntityKind::User, "email", "@example.org").is_err());
    }

    #[test]
    fn test_url() {
        assert!(url(EntityKind::Meeting, "venue.url", "https://zoom.us/j/1").is_ok());
        assert!(url(EntityKind::Meeting, "venue.url", "zoom.us/j/1").is_err());
    }
}
