//! Request and response models for the user search API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::user;

/// Query parameters for searching users by fixed fields and attributes.
///
/// # Filtering
/// The `filter` parameter accepts a JSON-encoded boolean tree (JSON5
/// leniencies such as unquoted keys, single quotes, trailing commas and
/// comments are tolerated). A node is one of:
/// - `{"AND": [ ...filters ]}` — all children must match
/// - `{"OR": [ ...filters ]}` — any child must match
/// - a leaf condition:
///   ```json
///   {"key": "department", "op": "contains", "value": "eng",
///    "not": false, "ignoreCase": true}
///   ```
///
/// `key` is either a fixed user field (`username`, `email`, `firstName`,
/// `lastName`, `emailVerified`, `enabled`, `createdTimestamp`) or any
/// attribute name. `value` is a string or a list of strings. Operators:
/// `eq`, `in`, `contains`, `starts`, `ends`, `gt`, `gte`, `lt`, `lte`.
///
/// # Sorting
/// The `sort` parameter is a comma-separated list of keys; a leading `-`
/// sorts that key descending. Keys may name fixed fields or attributes.
///
/// # Pagination
/// `limit` is clamped to a server maximum; `offset` defaults to 0.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// JSON-encoded filter tree.
    #[param(example = r#"{"AND":[{"key":"enabled","value":"true"},{"key":"department","op":"contains","value":"eng"}]}"#)]
    pub filter: Option<String>,
    /// Comma-separated sort keys, `-` prefix for descending.
    #[param(example = "-createdTimestamp,username")]
    pub sort: Option<String>,
    /// Maximum number of results per page.
    #[param(example = 10)]
    pub limit: Option<u64>,
    /// Number of matching users to skip.
    #[param(example = 0)]
    pub offset: Option<u64>,
}

/// One page of search results.
///
/// `count` is the exact number of distinct matching users across the whole
/// filtered set, independent of the page bounds. `limit` and `offset` are
/// the effective values actually applied after clamping and defaulting.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: i64,
    pub limit: u64,
    pub offset: u64,
}

/// Wire representation of a user. Unset optional fields are omitted from
/// the serialized form; `attributes` and `groups` are always present, empty
/// when the user has none.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email_verified: bool,
    pub enabled: bool,
    pub created_timestamp: i64,
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Paths of the realm groups the user belongs to, e.g.
    /// `/engineering/platform`.
    pub groups: Vec<String>,
}

impl UserRepresentation {
    #[must_use]
    pub fn from_model(
        model: user::Model,
        attributes: BTreeMap<String, Vec<String>>,
        groups: Vec<String>,
    ) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            email_verified: model.email_verified,
            enabled: model.enabled,
            created_timestamp: model.created_timestamp,
            attributes,
            groups,
        }
    }
}
