//! Page and count execution.
//!
//! Assembles the compiled predicate and sort plan into two queries: a
//! DISTINCT, bounded page query and an independent `COUNT(DISTINCT id)`
//! query over the same predicate. The count never derives from the
//! truncated page, and the attribute-join fan-out is collapsed in both, so
//! a user matching through several attribute rows is returned and counted
//! exactly once.

use sea_orm::sea_query::{Alias, Expr, Func, IntoCondition, NullOrdering};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::entities::{user, user_attribute};
use crate::errors::ApiError;
use crate::models::{Page, SearchParams, UserRepresentation};

use super::enrich::{load_attribute_map, load_group_paths};
use super::filter::{OperatorMode, parse_filter};
use super::predicate::{CompiledFilter, compile_filter};
use super::sort::{OrderClause, SortPlan, compile_sort, parse_sort};

/// Page size applied when the caller sends no limit.
pub const DEFAULT_LIMIT: u64 = 10;
/// Hard ceiling on the page size; larger requests are clamped, not rejected.
pub const MAX_LIMIT: u64 = 1000;

#[must_use]
pub fn effective_limit(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

/// Every query is scoped to the caller's realm and excludes service
/// accounts, regardless of the caller-supplied filter.
fn base_predicate(realm_id: &str) -> Condition {
    Condition::all()
        .add(ColumnTrait::eq(&user::Column::RealmId, realm_id))
        .add(user::Column::ServiceAccountClientLink.is_null())
}

/// Execute a user search: compile the filter and sort input, run the bounded
/// page query and the count query, and enrich the page with attributes and
/// group paths.
///
/// # Errors
///
/// Client errors ([`ApiError::BadRequest`] / [`ApiError::ValidationFailed`])
/// for unparsable or invalid filter input — raised before any query is
/// issued — and [`ApiError::Database`] for store failures.
pub async fn search_users(
    db: &DatabaseConnection,
    realm_id: &str,
    params: &SearchParams,
    mode: OperatorMode,
) -> Result<Page<UserRepresentation>, ApiError> {
    let tree = parse_filter(params.filter.as_deref())?;
    let compiled = compile_filter(tree.as_ref(), mode)?;
    let plan = compile_sort(&parse_sort(params.sort.as_deref()));

    let limit = effective_limit(params.limit);
    let offset = params.offset.unwrap_or(0);
    let condition = base_predicate(realm_id).add(compiled.condition.clone());

    let models = page_query(&compiled, &plan, condition.clone())
        .offset(offset)
        .limit(limit)
        .all(db)
        .await
        .map_err(ApiError::database)?;

    let count = count_query(&compiled, condition)
        .into_tuple::<i64>()
        .one(db)
        .await
        .map_err(ApiError::database)?
        .unwrap_or(0);

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut attributes = load_attribute_map(db, &ids).await.map_err(ApiError::database)?;
    let mut groups = load_group_paths(db, realm_id, &ids)
        .await
        .map_err(ApiError::database)?;

    let results = models
        .into_iter()
        .map(|model| {
            let attrs = attributes.remove(&model.id).unwrap_or_default();
            let paths = groups.remove(&model.id).unwrap_or_default();
            UserRepresentation::from_model(model, attrs, paths)
        })
        .collect();

    Ok(Page {
        results,
        count,
        limit,
        offset,
    })
}

/// The bounded results query: DISTINCT user rows, predicate joins, sort
/// joins with their per-user aggregates in the select list (the aggregate
/// must be selected so DISTINCT and ORDER BY agree on every backend), and
/// the ORDER BY clauses in input precedence.
fn page_query(
    compiled: &CompiledFilter,
    plan: &SortPlan,
    condition: Condition,
) -> sea_orm::Select<user::Entity> {
    let mut query = user::Entity::find().distinct();

    query = apply_predicate_joins(query, compiled);

    for join in &plan.joins {
        let name = join.name.clone();
        let relation = user::Relation::Attributes.def().on_condition(move |_left, right| {
            Expr::col((right, user_attribute::Column::Name))
                .eq(name.clone())
                .into_condition()
        });
        query = query.join_as(JoinType::LeftJoin, relation, Alias::new(&join.alias));
    }
    for (aggregate, select_alias) in &plan.selects {
        query = query.expr_as(aggregate.clone(), select_alias.as_str());
    }
    if plan.aggregated() {
        query = query.group_by(Expr::col((user::Entity, user::Column::Id)));
    }

    query = query.filter(condition);

    for clause in &plan.orders {
        query = match clause {
            OrderClause::Column { column, order } => query.order_by(*column, order.clone()),
            OrderClause::Aggregate {
                select_alias,
                order,
            } => query.order_by_with_nulls(
                Expr::col(Alias::new(select_alias)),
                order.clone(),
                NullOrdering::Last,
            ),
        };
    }
    query
}

/// The count query: `COUNT(DISTINCT users.id)` over the same predicate and
/// predicate joins, with no ordering and no bounds.
fn count_query(compiled: &CompiledFilter, condition: Condition) -> sea_orm::Select<user::Entity> {
    let query = user::Entity::find().select_only().expr_as(
        Func::count_distinct(Expr::col((user::Entity, user::Column::Id))),
        "match_count",
    );
    apply_predicate_joins(query, compiled).filter(condition)
}

fn apply_predicate_joins(
    mut query: sea_orm::Select<user::Entity>,
    compiled: &CompiledFilter,
) -> sea_orm::Select<user::Entity> {
    for join in &compiled.joins {
        query = query.join_as(
            JoinType::LeftJoin,
            user::Relation::Attributes.def(),
            Alias::new(&join.alias),
        );
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(effective_limit(None), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some(25)), 25);
        assert_eq!(effective_limit(Some(5000)), MAX_LIMIT);
        assert_eq!(effective_limit(Some(0)), 0);
    }
}
