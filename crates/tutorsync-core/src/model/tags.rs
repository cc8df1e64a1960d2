//! Derived tag vocabularies
//!
//! Tags are never accepted from callers; each entity recomputes them from
//! its own fields before every store write. Declaration order is the
//! canonical order tags are stored in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTag {
    Tutor,
    Tutee,
    Mentor,
    Mentee,
    Vetted,
}

impl UserTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTag::Tutor => "tutor",
            UserTag::Tutee => "tutee",
            UserTag::Mentor => "mentor",
            UserTag::Mentee => "mentee",
            UserTag::Vetted => "vetted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTag {
    Tutoring,
    Mentoring,
}

impl MatchTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTag::Tutoring => "tutoring",
            MatchTag::Mentoring => "mentoring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingTag {
    Recurring,
}

impl MeetingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingTag::Recurring => "recurring",
        }
    }
}

/// Collect the tags whose condition holds, in canonical order
pub fn derive<T: Copy + Ord>(rules: &[(T, bool)]) -> Vec<T> {
    let mut tags: Vec<T> = rules
        .iter()
        .filter(|(_, holds)| *holds)
        .map(|(tag, _)| *tag)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_keeps_canonical_order() {
        let tags = derive(&[
            (UserTag::Vetted, true),
            (UserTag::Tutor, true),
            (UserTag::Mentee, false),
        ]);
        assert_eq!(tags, vec![UserTag::Tutor, UserTag::Vetted]);
    }

    #[test]
    fn test_tag_serialization() {
        let json = serde_json::to_string(&MeetingTag::Recurring).unwrap();
        assert_eq!(json, "\"recurring\"");
        assert_eq!(MatchTag::Mentoring.as_str(), "mentoring");
    }
}
