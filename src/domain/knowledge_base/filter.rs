//! Metadata filtering for knowledge base queries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::metadata_keys;
use crate::domain::DomainError;

/// Filter value as supplied by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of values (membership test)
    List(Vec<FilterValue>),
    /// Null value
    Null,
}

impl FilterValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Null => "null",
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(list: Vec<T>) -> Self {
        Self::List(list.into_iter().map(|v| v.into()).collect())
    }
}

/// Caller-facing filter: metadata key to scalar (equality) or list (membership)
///
/// All key conditions are AND-combined. Keys name entries of the document
/// metadata map, without the `metadata.` payload prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCondition(BTreeMap<String, FilterValue>);

impl FilterCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key condition
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterCondition {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Scalar a store-side match can compare against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchValue {
    Keyword(String),
    Integer(i64),
    Boolean(bool),
}

impl MatchValue {
    /// Whether a JSON metadata value equals this scalar
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Keyword(expected), serde_json::Value::String(actual)) => expected == actual,
            (Self::Integer(expected), serde_json::Value::Number(actual)) => {
                actual.as_i64() == Some(*expected)
            }
            (Self::Boolean(expected), serde_json::Value::Bool(actual)) => expected == actual,
            _ => false,
        }
    }
}

/// Homogeneous value set for a membership test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchAny {
    Keywords(Vec<String>),
    Integers(Vec<i64>),
}

impl MatchAny {
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Keywords(set), serde_json::Value::String(actual)) => set.contains(actual),
            (Self::Integers(set), serde_json::Value::Number(actual)) => actual
                .as_i64()
                .is_some_and(|actual| set.contains(&actual)),
            _ => false,
        }
    }
}

/// How a single payload field is matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// `field = value`
    Eq(MatchValue),
    /// `field ∈ values`
    In(MatchAny),
}

/// A single field condition on a payload path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    /// Full payload path, e.g. `metadata.file_id`
    pub path: String,
    pub matcher: FieldMatch,
}

impl FieldCondition {
    /// Metadata key this condition applies to, with the payload prefix stripped
    pub fn metadata_key(&self) -> &str {
        self.path
            .strip_prefix(metadata_keys::METADATA)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.path)
    }
}

/// Store-facing filter: conjunction of validated field conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub must: Vec<FieldCondition>,
}

impl MetadataFilter {
    /// Build the store-side filter for a caller filter
    ///
    /// List values become membership tests and scalars become equality
    /// tests, each on `metadata.{key}`. Floats, nulls and nested lists have
    /// no payload match equivalent and are rejected.
    pub fn from_condition(condition: &FilterCondition) -> Result<Self, DomainError> {
        let must = condition
            .iter()
            .map(|(key, value)| {
                Ok(FieldCondition {
                    path: metadata_keys::payload_path(key),
                    matcher: field_match(key, value)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Self { must })
    }

    /// `metadata.{key} ∈ values` over string values
    pub fn keyword_in(key: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            must: vec![FieldCondition {
                path: metadata_keys::payload_path(key),
                matcher: FieldMatch::In(MatchAny::Keywords(
                    values.into_iter().map(Into::into).collect(),
                )),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }
}

fn field_match(key: &str, value: &FilterValue) -> Result<FieldMatch, DomainError> {
    match value {
        FilterValue::List(items) => membership(key, items).map(FieldMatch::In),
        scalar => scalar_match(key, scalar).map(FieldMatch::Eq),
    }
}

fn scalar_match(key: &str, value: &FilterValue) -> Result<MatchValue, DomainError> {
    match value {
        FilterValue::String(s) => Ok(MatchValue::Keyword(s.clone())),
        FilterValue::Integer(n) => Ok(MatchValue::Integer(*n)),
        FilterValue::Boolean(b) => Ok(MatchValue::Boolean(*b)),
        other => Err(DomainError::validation(format!(
            "Filter value for '{}' must be a string, integer or boolean, got {}",
            key,
            other.type_name()
        ))),
    }
}

fn membership(key: &str, items: &[FilterValue]) -> Result<MatchAny, DomainError> {
    let mut keywords = Vec::new();
    let mut integers = Vec::new();

    for item in items {
        match item {
            FilterValue::String(s) => keywords.push(s.clone()),
            FilterValue::Integer(n) => integers.push(*n),
            other => {
                return Err(DomainError::validation(format!(
                    "Filter list for '{}' may only hold strings or integers, got {}",
                    key,
                    other.type_name()
                )));
            }
        }
    }

    match (keywords.is_empty(), integers.is_empty()) {
        (_, true) => Ok(MatchAny::Keywords(keywords)),
        (true, false) => Ok(MatchAny::Integers(integers)),
        (false, false) => Err(DomainError::validation(format!(
            "Filter list for '{}' mixes strings and integers",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_becomes_membership() {
        let condition = FilterCondition::new().with("file_id", vec!["A", "B"]);
        let filter = MetadataFilter::from_condition(&condition).unwrap();

        assert_eq!(filter.must.len(), 1);
        assert_eq!(filter.must[0].path, "metadata.file_id");
        assert_eq!(filter.must[0].metadata_key(), "file_id");
        assert_eq!(
            filter.must[0].matcher,
            FieldMatch::In(MatchAny::Keywords(vec!["A".to_string(), "B".to_string()]))
        );
    }

    #[test]
    fn test_scalars_become_equality_and_are_anded() {
        let condition = FilterCondition::new()
            .with("file_id", "A")
            .with("order_index", 3)
            .with("draft", false);
        let filter = MetadataFilter::from_condition(&condition).unwrap();

        assert_eq!(filter.must.len(), 3);
        // BTreeMap keys are ordered
        assert_eq!(filter.must[0].path, "metadata.draft");
        assert_eq!(filter.must[0].matcher, FieldMatch::Eq(MatchValue::Boolean(false)));
        assert_eq!(
            filter.must[1].matcher,
            FieldMatch::Eq(MatchValue::Keyword("A".to_string()))
        );
        assert_eq!(filter.must[2].matcher, FieldMatch::Eq(MatchValue::Integer(3)));
    }

    #[test]
    fn test_empty_condition_builds_empty_filter() {
        let filter = MetadataFilter::from_condition(&FilterCondition::new()).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_unsupported_values_rejected() {
        for value in [
            FilterValue::Float(1.5),
            FilterValue::Null,
            FilterValue::List(vec![FilterValue::List(vec![])]),
            FilterValue::List(vec!["a".into(), 1.into()]),
            FilterValue::List(vec![true.into()]),
        ] {
            let condition = FilterCondition::new().with("k", value);
            let err = MetadataFilter::from_condition(&condition).unwrap_err();
            assert!(matches!(err, DomainError::Validation { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_deserialize_from_json() {
        let condition: FilterCondition =
            serde_json::from_str(r#"{"file_id": ["A", "B"], "page": 2}"#).unwrap();

        assert_eq!(condition.len(), 2);
        let filter = MetadataFilter::from_condition(&condition).unwrap();
        assert_eq!(
            filter.must[1].matcher,
            FieldMatch::Eq(MatchValue::Integer(2))
        );
    }

    #[test]
    fn test_match_json() {
        let keyword = MatchValue::Keyword("A".to_string());
        assert!(keyword.matches_json(&serde_json::json!("A")));
        assert!(!keyword.matches_json(&serde_json::json!(1)));

        let ints = MatchAny::Integers(vec![1, 2]);
        assert!(ints.matches_json(&serde_json::json!(2)));
        assert!(!ints.matches_json(&serde_json::json!(2.5)));
        assert!(!ints.matches_json(&serde_json::json!("2")));
    }

    #[test]
    fn test_keyword_in() {
        let filter = MetadataFilter::keyword_in("parent_id", ["P1", "P2"]);
        assert_eq!(filter.must[0].path, "metadata.parent_id");
    }
}
