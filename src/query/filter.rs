//! Filter expression model and lenient parsing.
//!
//! A filter is a recursive boolean tree: an `AND`/`OR` node holding child
//! filters, or a leaf condition comparing one field (fixed column or dynamic
//! attribute) against one or more values. The wire format is a JSON5-tolerant
//! object — unquoted keys, trailing commas, single quotes and comments are
//! all accepted, matching the lenient read configuration of the service this
//! engine replaces.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{OneOrMany, serde_as};
use thiserror::Error;

/// Defensive bound on filter nesting. Trees deeper than this are rejected
/// before compilation rather than recursed into.
pub const MAX_FILTER_DEPTH: usize = 50;

/// Errors raised while parsing or compiling a filter expression.
///
/// All variants are client errors: they are reported before any query is
/// issued to the store.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("malformed filter: {0}")]
    Malformed(String),

    #[error("condition on {key:?} has an empty value list")]
    EmptyValues { key: String },

    #[error("unknown filter operator {0:?}")]
    UnknownOperator(String),

    #[error("value {value:?} is not valid for field {key:?}")]
    InvalidValue { key: String, value: String },

    #[error("operator {op} cannot be applied to field {key:?}")]
    UnsupportedOperator { key: String, op: &'static str },

    #[error("filter exceeds the maximum nesting depth of {MAX_FILTER_DEPTH}")]
    TooDeep,
}

/// A node in the boolean filter tree. Exactly one form per node; input that
/// mixes forms (or matches none) fails to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Condition(Condition),
}

/// A leaf comparison. `value` accepts a single string or a list of strings
/// on the wire; `op` stays a raw token here so that resolution can honor the
/// configured [`OperatorMode`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub key: String,
    #[serde(default)]
    pub op: Option<String>,
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(rename = "value")]
    pub values: Vec<String>,
    #[serde(default, rename = "not")]
    pub negate: bool,
    #[serde(default = "default_ignore_case", rename = "ignoreCase")]
    pub ignore_case: bool,
}

const fn default_ignore_case() -> bool {
    true
}

/// How an unrecognized operator token is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorMode {
    /// Fall back to [`Operator::Eq`] with a warning. Compatible with the
    /// historical behavior of this API.
    #[default]
    Lenient,
    /// Reject the filter with [`FilterError::UnknownOperator`].
    Strict,
}

/// Comparison operators accepted in a leaf condition.
///
/// The ordering operators compare attribute values lexicographically — the
/// attribute table stores strings, so `"10" < "9"`. This is a known
/// limitation kept for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    Eq,
    In,
    Contains,
    Starts,
    Ends,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Parse an operator token, case-insensitively. Returns `None` for
    /// unknown tokens; the caller decides between fallback and rejection.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "in" => Some(Self::In),
            "contains" => Some(Self::Contains),
            "starts" => Some(Self::Starts),
            "ends" => Some(Self::Ends),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// Name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Starts => "starts",
            Self::Ends => "ends",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    #[must_use]
    pub const fn is_substring(self) -> bool {
        matches!(self, Self::Contains | Self::Starts | Self::Ends)
    }
}

impl Condition {
    /// Resolve the raw operator token. An absent token means `eq`; an
    /// unknown token either falls back to `eq` (lenient) or is rejected
    /// (strict).
    pub fn operator(&self, mode: OperatorMode) -> Result<Operator, FilterError> {
        let Some(token) = self.op.as_deref() else {
            return Ok(Operator::Eq);
        };
        match Operator::parse(token) {
            Some(op) => Ok(op),
            None => match mode {
                OperatorMode::Lenient => {
                    tracing::warn!(
                        operator = token,
                        key = %self.key,
                        "unknown filter operator, falling back to eq"
                    );
                    Ok(Operator::Eq)
                }
                OperatorMode::Strict => Err(FilterError::UnknownOperator(token.to_owned())),
            },
        }
    }
}

/// Parse an optional filter string into a filter tree. An absent string
/// means "match everything" and parses to `None`.
pub fn parse_filter(input: Option<&str>) -> Result<Option<Filter>, FilterError> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let value: Value = json5::from_str(raw).map_err(|e| FilterError::Malformed(e.to_string()))?;
    filter_from_value(&value, 0).map(Some)
}

fn filter_from_value(value: &Value, depth: usize) -> Result<Filter, FilterError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(FilterError::TooDeep);
    }
    let map = value
        .as_object()
        .ok_or_else(|| FilterError::Malformed("filter node must be an object".to_owned()))?;

    match (map.get("AND"), map.get("OR")) {
        (Some(_), Some(_)) => Err(FilterError::Malformed(
            "filter node mixes AND and OR".to_owned(),
        )),
        (Some(children), None) => {
            if map.len() > 1 {
                return Err(FilterError::Malformed(
                    "AND node carries extra fields".to_owned(),
                ));
            }
            Ok(Filter::And(children_from(children, "AND", depth)?))
        }
        (None, Some(children)) => {
            if map.len() > 1 {
                return Err(FilterError::Malformed(
                    "OR node carries extra fields".to_owned(),
                ));
            }
            Ok(Filter::Or(children_from(children, "OR", depth)?))
        }
        (None, None) => {
            let condition: Condition = serde_json::from_value(value.clone())
                .map_err(|e| FilterError::Malformed(e.to_string()))?;
            if condition.values.is_empty() {
                return Err(FilterError::EmptyValues {
                    key: condition.key,
                });
            }
            Ok(Filter::Condition(condition))
        }
    }
}

fn children_from(value: &Value, form: &str, depth: usize) -> Result<Vec<Filter>, FilterError> {
    let items = value
        .as_array()
        .ok_or_else(|| FilterError::Malformed(format!("{form} must hold an array of filters")))?;
    items
        .iter()
        .map(|child| filter_from_value(child, depth + 1))
        .collect()
}
