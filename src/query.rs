//! Query builder for collection scans
//!
//! Handlers assemble a [`Query`] from optional request parameters; predicates
//! are only added when a parameter carries a value. The store evaluates the
//! query against each JSON document while scanning a collection, then applies
//! the optional sort. All predicates combine with AND; [`Query::search`] adds a
//! single predicate that is itself an OR over several fields.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value, or the field is a list containing it.
    Eq { field: String, value: String },
    /// Field is a list containing the value.
    Contains { field: String, value: String },
    /// Numeric field within inclusive bounds.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Case-insensitive substring match on a string field or any list entry.
    /// `needle` is stored lowercased.
    Matches { field: String, needle: String },
    AnyOf(Vec<Predicate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    sort: Option<Sort>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = non_empty(value) {
            self.predicates.push(Predicate::Eq {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    pub fn contains(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = non_empty(value) {
            self.predicates.push(Predicate::Contains {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    pub fn range(mut self, field: &str, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.predicates.push(Predicate::Range {
                field: field.to_string(),
                min,
                max,
            });
        }
        self
    }

    /// Free-text search over `fields`. The term is trimmed; blank terms add nothing.
    pub fn search(mut self, fields: &[&str], term: Option<&str>) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        let needle = term.to_lowercase();
        let any = fields
            .iter()
            .map(|field| Predicate::Matches {
                field: field.to_string(),
                needle: needle.clone(),
            })
            .collect();
        self.predicates.push(Predicate::AnyOf(any));
        self
    }

    pub fn sort_by(mut self, field: &str, direction: Direction) -> Self {
        self.sort = Some(Sort {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }

    /// Orders matched documents in place. The sort is stable, so ties keep
    /// store (insertion) order.
    pub fn sort(&self, docs: &mut [Value]) {
        let Some(sort) = &self.sort else {
            return;
        };
        docs.sort_by(|a, b| {
            let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
            match sort.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
}

impl Predicate {
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Predicate::Eq { field, value } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, value)),
                Some(v) => scalar_eq(v, value),
                None => false,
            },
            Predicate::Contains { field, value } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, value)),
                _ => false,
            },
            Predicate::Range { field, min, max } => {
                let Some(n) = doc.get(field).and_then(Value::as_f64) else {
                    return false;
                };
                min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
            }
            Predicate::Matches { field, needle } => match doc.get(field) {
                Some(Value::String(s)) => s.to_lowercase().contains(needle.as_str()),
                Some(Value::Array(items)) => items.iter().any(|item| {
                    item.as_str()
                        .map_or(false, |s| s.to_lowercase().contains(needle.as_str()))
                }),
                _ => false,
            },
            Predicate::AnyOf(predicates) => predicates.iter().any(|p| p.matches(doc)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn scalar_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

/// Missing values sort first; RFC 3339 timestamps compare as instants.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}
