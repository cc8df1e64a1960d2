//! Facet filter expressions
//!
//! A [`Filter`] is a conjunction of clauses. Each clause is either an
//! OR-group of facet terms or a single numeric comparison, which is the
//! shape faceted search engines accept:
//!
//! ```text
//! org:o1 AND (subjects:Algebra OR subjects:Geometry) AND _timeFrom <= 1767225600000
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::projection::IndexObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTerm {
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "=",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
        }
    }

    fn holds(&self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => left == right,
            Comparison::Ge => left >= right,
            Comparison::Gt => left > right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericTerm {
    pub attribute: String,
    pub op: Comparison,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clause {
    /// Satisfied when any term matches
    AnyOf(Vec<FacetTerm>),
    Numeric(NumericTerm),
}

impl Clause {
    pub fn matches(&self, object: &IndexObject) -> bool {
        match self {
            Clause::AnyOf(terms) => terms.iter().any(|term| facet_matches(term, object)),
            Clause::Numeric(term) => object
                .get(&term.attribute)
                .and_then(Value::as_i64)
                .is_some_and(|v| term.op.holds(v, term.value)),
        }
    }
}

/// Conjunction of clauses; the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND an OR-group of `attribute:value` terms.
    ///
    /// An empty value set adds nothing, so optional query fields can be
    /// passed straight through.
    pub fn facet<I, S>(mut self, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<FacetTerm> = values
            .into_iter()
            .map(|v| FacetTerm {
                attribute: attribute.to_string(),
                value: v.into(),
            })
            .collect();
        if !terms.is_empty() {
            self.clauses.push(Clause::AnyOf(terms));
        }
        self
    }

    /// AND `attribute <op> value`
    pub fn numeric(mut self, attribute: &str, op: Comparison, value: i64) -> Self {
        self.clauses.push(Clause::Numeric(NumericTerm {
            attribute: attribute.to_string(),
            op,
            value,
        }));
        self
    }

    /// AND every clause of `other`
    pub fn and(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, object: &IndexObject) -> bool {
        self.clauses.iter().all(|clause| clause.matches(object))
    }
}

fn facet_matches(term: &FacetTerm, object: &IndexObject) -> bool {
    match object.get(&term.attribute) {
        Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, &term.value)),
        Some(value) => scalar_eq(value, &term.value),
        None => false,
    }
}

fn scalar_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '"' | '(' | ')' | '\''))
}

impl fmt::Display for FacetTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quotes(&self.value) {
            write!(f, "{}:\"{}\"", self.attribute, self.value.replace('"', "\\\""))
        } else {
            write!(f, "{}:{}", self.attribute, self.value)
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::AnyOf(terms) if terms.len() == 1 => write!(f, "{}", terms[0]),
            Clause::AnyOf(terms) => {
                f.write_str("(")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{}", term)?;
                }
                f.write_str(")")
            }
            Clause::Numeric(term) => {
                write!(f, "{} {} {}", term.attribute, term.op.as_str(), term.value)
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}
