//! Composite, null-aware sort keys.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::fields::FieldTable;
use super::value::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Where null (or unknown) values go, regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullOrder {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub nulls: NullOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            nulls: NullOrder::Last,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            nulls: NullOrder::Last,
        }
    }

    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrder::First;
        self
    }
}

/// Ordered sort fields; earlier fields take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub fields: Vec<SortField>,
}

impl SortRequest {
    pub fn by(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads the composite key of one item. Unknown fields read as null.
    pub(crate) fn key_of<T>(&self, table: &FieldTable<T>, item: &T) -> Vec<FieldValue> {
        self.fields
            .iter()
            .map(|f| table.get(item, &f.field).unwrap_or(FieldValue::Null))
            .collect()
    }

    /// Lexicographic comparison of two keys produced by [`Self::key_of`].
    pub(crate) fn compare_keys(&self, a: &[FieldValue], b: &[FieldValue]) -> Ordering {
        for (spec, (x, y)) in self.fields.iter().zip(a.iter().zip(b)) {
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => match spec.nulls {
                    NullOrder::First => Ordering::Less,
                    NullOrder::Last => Ordering::Greater,
                },
                (false, true) => match spec.nulls {
                    NullOrder::First => Ordering::Greater,
                    NullOrder::Last => Ordering::Less,
                },
                (false, false) => match spec.direction {
                    SortDirection::Asc => x.compare(y),
                    SortDirection::Desc => y.compare(x),
                },
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[FieldValue]) -> Vec<FieldValue> {
        values.to_vec()
    }

    #[test]
    fn test_nulls_last_holds_for_desc() {
        let request = SortRequest::by(vec![SortField::desc("n")]);
        let null = keys(&[FieldValue::Null]);
        let one = keys(&[FieldValue::Integer(1)]);
        assert_eq!(request.compare_keys(&null, &one), Ordering::Greater);
        assert_eq!(request.compare_keys(&one, &null), Ordering::Less);
    }

    #[test]
    fn test_nulls_first() {
        let request = SortRequest::by(vec![SortField::asc("n").nulls_first()]);
        let null = keys(&[FieldValue::Null]);
        let one = keys(&[FieldValue::Integer(1)]);
        assert_eq!(request.compare_keys(&null, &one), Ordering::Less);
    }

    #[test]
    fn test_second_field_breaks_ties() {
        let request = SortRequest::by(vec![SortField::asc("status"), SortField::desc("name")]);
        let a = keys(&[FieldValue::from("active"), FieldValue::from("a")]);
        let b = keys(&[FieldValue::from("active"), FieldValue::from("b")]);
        assert_eq!(request.compare_keys(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_sort_field_defaults_from_json() {
        let field: SortField = serde_json::from_str(r#"{"field":"name"}"#).unwrap();
        assert_eq!(field, SortField::asc("name"));
    }
}
