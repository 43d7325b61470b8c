//! Filter requests and their evaluation against field tables.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::fields::FieldTable;
use super::value::{FieldKind, FieldValue};

/// How the children of a filter group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

/// A group of typed filters combined by a single logic operator.
///
/// Mixed logic is expressed with nested `groups`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub logic: LogicOperator,
    #[serde(default)]
    pub filters: Vec<TypedFilter>,
    #[serde(default)]
    pub groups: Vec<FilterRequest>,
}

impl FilterRequest {
    pub fn all(filters: Vec<TypedFilter>) -> Self {
        Self {
            logic: LogicOperator::And,
            filters,
            groups: Vec::new(),
        }
    }

    pub fn any(filters: Vec<TypedFilter>) -> Self {
        Self {
            logic: LogicOperator::Or,
            filters,
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: FilterRequest) -> Self {
        self.groups.push(group);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.groups.is_empty()
    }

    /// Every field name referenced by this tree, depth first.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.iter().map(|f| f.field.as_str()).collect();
        for group in &self.groups {
            names.extend(group.field_names());
        }
        names
    }

    /// Every typed filter in this tree, depth first.
    pub fn flatten(&self) -> Vec<&TypedFilter> {
        let mut out: Vec<&TypedFilter> = self.filters.iter().collect();
        for group in &self.groups {
            out.extend(group.flatten());
        }
        out
    }

    /// Evaluates the tree for one item. An empty group matches everything.
    pub fn matches<T>(&self, table: &FieldTable<T>, item: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut children = self
            .filters
            .iter()
            .map(|f| f.matches(table, item))
            .chain(self.groups.iter().map(|g| g.matches(table, item)));
        match self.logic {
            LogicOperator::And => children.all(|m| m),
            LogicOperator::Or => children.any(|m| m),
        }
    }
}

/// A predicate bound to a field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedFilter {
    pub field: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl TypedFilter {
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    pub fn string(field: impl Into<String>, op: StringOp, value: impl Into<String>) -> Self {
        Self::new(
            field,
            Predicate::String {
                op,
                value: value.into(),
                case_sensitive: false,
            },
        )
    }

    pub fn boolean(field: impl Into<String>, value: bool) -> Self {
        Self::new(field, Predicate::Boolean { value })
    }

    pub fn number(field: impl Into<String>, op: NumberOp, value: f64) -> Self {
        Self::new(field, Predicate::Number { op, value })
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Predicate::IsNull)
    }

    /// Unknown fields never match.
    pub fn matches<T>(&self, table: &FieldTable<T>, item: &T) -> bool {
        table
            .get(item, &self.field)
            .is_some_and(|value| self.predicate.evaluate(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringOp {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampOp {
    Eq,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
}

/// Typed predicate applied to a single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    String {
        op: StringOp,
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Boolean {
        value: bool,
    },
    Number {
        op: NumberOp,
        value: f64,
    },
    NumberRange {
        min: f64,
        max: f64,
    },
    Timestamp {
        op: TimestampOp,
        value: Timestamp,
    },
    TimestampRange {
        from: Timestamp,
        to: Timestamp,
    },
    In {
        values: Vec<String>,
        #[serde(default)]
        negate: bool,
    },
    IsNull,
    IsNotNull,
}

impl Predicate {
    /// Whether this predicate can apply to a field of the given kind.
    pub fn accepts(&self, kind: FieldKind) -> bool {
        match self {
            Predicate::String { .. } => kind == FieldKind::Text,
            Predicate::Boolean { .. } => kind == FieldKind::Bool,
            Predicate::Number { .. } | Predicate::NumberRange { .. } => kind.is_numeric(),
            Predicate::Timestamp { .. } | Predicate::TimestampRange { .. } => {
                kind == FieldKind::Timestamp
            }
            Predicate::In { .. } | Predicate::IsNull | Predicate::IsNotNull => true,
        }
    }

    pub fn evaluate(&self, value: &FieldValue) -> bool {
        match self {
            Predicate::IsNull => value.is_null(),
            Predicate::IsNotNull => !value.is_null(),
            Predicate::In { values, negate } => {
                let found = !value.is_null() && {
                    let text = value.to_string();
                    values.iter().any(|v| *v == text)
                };
                found != *negate
            }
            Predicate::String {
                op,
                value: expected,
                case_sensitive,
            } => value
                .as_text()
                .is_some_and(|actual| string_matches(*op, actual, expected, *case_sensitive)),
            Predicate::Boolean { value: expected } => value.as_bool() == Some(*expected),
            Predicate::Number { op, value: expected } => value
                .as_f64()
                .is_some_and(|actual| number_matches(*op, actual, *expected)),
            Predicate::NumberRange { min, max } => value
                .as_f64()
                .is_some_and(|actual| actual >= *min && actual <= *max),
            Predicate::Timestamp { op, value: expected } => value
                .as_timestamp()
                .is_some_and(|actual| timestamp_matches(*op, actual, *expected)),
            Predicate::TimestampRange { from, to } => value
                .as_timestamp()
                .is_some_and(|actual| actual >= *from && actual <= *to),
        }
    }
}

fn string_matches(op: StringOp, actual: &str, expected: &str, case_sensitive: bool) -> bool {
    let (actual, expected) = if case_sensitive {
        (actual.to_string(), expected.to_string())
    } else {
        (actual.to_lowercase(), expected.to_lowercase())
    };
    match op {
        StringOp::Equals => actual == expected,
        StringOp::NotEquals => actual != expected,
        StringOp::Contains => actual.contains(&expected),
        StringOp::StartsWith => actual.starts_with(&expected),
        StringOp::EndsWith => actual.ends_with(&expected),
    }
}

#[allow(clippy::float_cmp)]
fn number_matches(op: NumberOp, actual: f64, expected: f64) -> bool {
    match op {
        NumberOp::Eq => actual == expected,
        NumberOp::Ne => actual != expected,
        NumberOp::Gt => actual > expected,
        NumberOp::Gte => actual >= expected,
        NumberOp::Lt => actual < expected,
        NumberOp::Lte => actual <= expected,
    }
}

fn timestamp_matches(op: TimestampOp, actual: Timestamp, expected: Timestamp) -> bool {
    match op {
        TimestampOp::Eq => actual == expected,
        TimestampOp::Before => actual < expected,
        TimestampOp::After => actual > expected,
        TimestampOp::OnOrBefore => actual <= expected,
        TimestampOp::OnOrAfter => actual >= expected,
    }
}
