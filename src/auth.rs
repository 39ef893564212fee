//! Authorization boundary.
//!
//! The engine never decides who may search; it only insists that the check
//! runs before any filter is compiled or any query executed. Deployments
//! plug their own evaluator in through [`PermissionEvaluator`].

use async_trait::async_trait;

use crate::errors::ApiError;

/// Capability object gating read access to the user directory.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    /// Succeeds if the caller may query users.
    ///
    /// # Errors
    ///
    /// [`ApiError::Forbidden`] when the caller lacks permission; the request
    /// stops before any query is built.
    async fn require_view_users(&self) -> Result<(), ApiError>;
}

/// Evaluator that grants every request. Useful for trusted internal
/// deployments and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionEvaluator for AllowAll {
    async fn require_view_users(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
