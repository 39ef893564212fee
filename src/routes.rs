//! Axum transport layer for the user search engine.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::DatabaseConnection;

use crate::auth::PermissionEvaluator;
use crate::errors::ApiError;
use crate::models::{Page, SearchParams, UserRepresentation};
use crate::query::executor::search_users;
use crate::query::filter::OperatorMode;

/// Shared state for the search routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: Arc<dyn PermissionEvaluator>,
    pub operator_mode: OperatorMode,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, auth: Arc<dyn PermissionEvaluator>) -> Self {
        Self {
            db,
            auth,
            operator_mode: OperatorMode::default(),
        }
    }

    #[must_use]
    pub fn with_operator_mode(mut self, mode: OperatorMode) -> Self {
        self.operator_mode = mode;
        self
    }
}

/// Build the search router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/admin/realms/{realm}/users-by-attribute",
            get(get_users_by_attribute),
        )
        .with_state(state)
}

/// Search users in a realm by fixed fields and attributes.
///
/// The permission check runs before the filter string is even parsed; a
/// denied caller learns nothing about the filter's validity.
///
/// # Errors
///
/// 403 when the permission check fails, 400/422 for invalid filter input,
/// 500 for store failures.
pub async fn get_users_by_attribute(
    State(state): State<AppState>,
    Path(realm): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<UserRepresentation>>, ApiError> {
    state.auth.require_view_users().await?;

    let page = search_users(&state.db, &realm, &params, state.operator_mode).await?;
    Ok(Json(page))
}
