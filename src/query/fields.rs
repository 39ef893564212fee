//! Field resolution for the hybrid schema.
//!
//! Both the predicate compiler and the sort resolver classify keys through
//! this one table, so a key can never resolve as a fixed column in one and a
//! dynamic attribute in the other within a single query.

use crate::entities::user;

/// Fixed (native) user columns addressable by API key.
pub const FIXED_FIELDS: &[(&str, user::Column)] = &[
    ("username", user::Column::Username),
    ("email", user::Column::Email),
    ("firstName", user::Column::FirstName),
    ("lastName", user::Column::LastName),
    ("emailVerified", user::Column::EmailVerified),
    ("enabled", user::Column::Enabled),
    ("createdTimestamp", user::Column::CreatedTimestamp),
    ("realmId", user::Column::RealmId),
];

/// How values compare against a fixed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Textual column: folded string comparison, substring operators allowed.
    Text,
    /// Boolean column: values coerce from `true`/`false`.
    Boolean,
    /// Epoch-millisecond column: values coerce to i64.
    EpochMillis,
}

/// Resolve an API key to a fixed column, or `None` for a dynamic attribute.
#[must_use]
pub fn fixed_field(key: &str) -> Option<user::Column> {
    FIXED_FIELDS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, column)| column)
}

/// Every key outside the fixed-field table is a dynamic attribute name.
#[must_use]
pub fn is_attribute(key: &str) -> bool {
    fixed_field(key).is_none()
}

#[must_use]
pub fn storage(column: user::Column) -> Storage {
    match column {
        user::Column::EmailVerified | user::Column::Enabled => Storage::Boolean,
        user::Column::CreatedTimestamp => Storage::EpochMillis,
        _ => Storage::Text,
    }
}
