//! The query engine: filter parsing, field resolution, predicate and sort
//! compilation, page/count execution, and result enrichment.
//!
//! The engine is stateless and request-scoped. Each search parses its
//! inputs once, compiles them against the hybrid schema, runs exactly two
//! queries (page + count) plus two batched enrichment lookups, and returns
//! a [`crate::models::Page`].

pub mod enrich;
pub mod executor;
pub mod fields;
pub mod filter;
pub mod predicate;
pub mod sort;

pub use executor::{DEFAULT_LIMIT, MAX_LIMIT, search_users};
pub use filter::{Filter, FilterError, Operator, OperatorMode, parse_filter};
pub use sort::{SortKey, compile_sort, parse_sort};
