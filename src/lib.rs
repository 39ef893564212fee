//! Attribute-aware user directory search over Axum and Sea-ORM.
//!
//! Users live in a hybrid schema: a fixed set of typed columns plus an
//! open-ended name/value attribute table. This crate compiles
//! client-supplied boolean filter trees, sort specifications and pagination
//! bounds into realm-scoped queries that return a deterministically ordered
//! page together with an exact distinct-match count — the one-to-many
//! attribute join never duplicates or over-counts a user.

pub mod auth;
pub mod entities;
pub mod errors;
pub mod models;
pub mod query;
pub mod routes;

pub use auth::{AllowAll, PermissionEvaluator};
pub use errors::ApiError;
pub use models::{Page, SearchParams, UserRepresentation};
pub use query::{DEFAULT_LIMIT, MAX_LIMIT, OperatorMode, search_users};
pub use routes::{AppState, router};
