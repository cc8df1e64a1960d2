use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::errors::ValidationError;

/// A time span, optionally repeating per an RFC 5545 recurrence rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeslot {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// `RRULE:FREQ=WEEKLY;...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recur: Option<String>,
    /// End of the recurring series; `None` means open-ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<DateTime<Utc>>,
}

impl Timeslot {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            recur: None,
            last: None,
        }
    }

    pub fn recurring(mut self, rule: impl Into<String>) -> Self {
        self.recur = Some(rule.into());
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recur.is_some()
    }

    /// Latest instant this slot (or its series) can occupy, `None` if unbounded
    pub fn series_end(&self) -> Option<DateTime<Utc>> {
        match (&self.recur, self.last) {
            (Some(_), last) => last,
            (None, _) => Some(self.to),
        }
    }

    /// # Errors
    ///
    /// `InvalidField` on `field` when the span is empty or inverted, the
    /// rule is not an RRULE, or the series ends before its first occurrence.
    pub fn validate(&self, kind: EntityKind, field: &str) -> std::result::Result<(), ValidationError> {
        super::checks::ordered(kind, field, self.from, self.to)?;

        if let Some(rule) = &self.recur {
            let body = rule.strip_prefix("RRULE:").unwrap_or("");
            if !body.split(';').any(|part| part.starts_with("FREQ=")) {
                return Err(ValidationError::field(
                    kind,
                    format!("{}.recur", field),
                    format!("{} is not an RRULE with a FREQ part", rule),
                ));
            }
        }

        if let Some(last) = self.last {
            if last < self.to {
                return Err(ValidationError::field(
                    kind,
                    format!("{}.last", field),
                    "series cannot end before its first occurrence",
                ));
            }
        }

        Ok(())
    }
}
