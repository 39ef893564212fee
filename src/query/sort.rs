//! Sort specification parsing and order-clause compilation.
//!
//! Sort keys arrive as a comma-separated string; a leading `-` marks a key
//! descending. Keys resolve through the same fixed-field table as the
//! predicate compiler. Attribute-backed keys are aggregated per user
//! (MIN for ascending, MAX for descending) across the one-to-many join so
//! that every user occupies exactly one ordering position no matter how many
//! values it holds; users without the attribute sort last in either
//! direction.

use sea_orm::Order;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};

use crate::entities::{user, user_attribute};

use super::fields::fixed_field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub key: String,
    pub ascending: bool,
}

/// One aliased left join against the attribute table, scoped to a single
/// attribute name in its ON clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortJoin {
    pub alias: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum OrderClause {
    /// Direct ordering on a fixed user column.
    Column { column: user::Column, order: Order },
    /// Ordering on a selected per-user aggregate of joined attribute values.
    Aggregate { select_alias: String, order: Order },
}

/// Compiled ordering: joins and selected aggregates to add to the page
/// query, plus the ORDER BY clauses in input precedence.
#[derive(Debug, Default)]
pub struct SortPlan {
    pub joins: Vec<SortJoin>,
    pub selects: Vec<(SimpleExpr, String)>,
    pub orders: Vec<OrderClause>,
}

impl SortPlan {
    /// Whether the page query must group by user id to collapse the
    /// attribute-join fan-out under the aggregates.
    #[must_use]
    pub fn aggregated(&self) -> bool {
        !self.joins.is_empty()
    }
}

/// Parse the sort string. Empty and bare-`-` tokens are skipped; order of
/// appearance is the ORDER BY precedence.
#[must_use]
pub fn parse_sort(input: Option<&str>) -> Vec<SortKey> {
    let Some(raw) = input else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && *token != "-")
        .map(|token| match token.strip_prefix('-') {
            Some(key) => SortKey {
                key: key.to_owned(),
                ascending: false,
            },
            None => SortKey {
                key: token.to_owned(),
                ascending: true,
            },
        })
        .collect()
}

/// Compile sort keys into a [`SortPlan`]. With no usable keys the plan
/// falls back to newest-first on the creation timestamp.
#[must_use]
pub fn compile_sort(keys: &[SortKey]) -> SortPlan {
    let mut plan = SortPlan::default();
    for key in keys {
        let order = if key.ascending { Order::Asc } else { Order::Desc };
        match fixed_field(&key.key) {
            Some(column) => plan.orders.push(OrderClause::Column { column, order }),
            None => {
                let idx = plan.joins.len();
                let join_alias = format!("sa{idx}");
                let select_alias = format!("sort{idx}");
                let value_col =
                    Expr::col((Alias::new(&join_alias), user_attribute::Column::Value));
                let aggregate = if key.ascending {
                    Func::min(value_col)
                } else {
                    Func::max(value_col)
                };
                plan.joins.push(SortJoin {
                    alias: join_alias,
                    name: key.key.clone(),
                });
                plan.selects
                    .push((SimpleExpr::FunctionCall(aggregate), select_alias.clone()));
                plan.orders.push(OrderClause::Aggregate {
                    select_alias,
                    order,
                });
            }
        }
    }
    if plan.orders.is_empty() {
        plan.orders.push(OrderClause::Column {
            column: user::Column::CreatedTimestamp,
            order: Order::Desc,
        });
    }
    plan
}
