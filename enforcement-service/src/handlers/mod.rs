pub mod admin;
pub mod classes;
pub mod grades;
pub mod tasks;
pub mod users;

use authz_core::Claims;
use serde::Serialize;

use crate::audit::AuditRecord;
use crate::error::EnforcementError;
use crate::store::StoreError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub(crate) fn map_store(e: StoreError) -> EnforcementError {
    EnforcementError::Storage(e.to_string())
}

/// Append the single audit record for a successful privileged mutation.
pub(crate) async fn write_audit(
    state: &AppState,
    actor: &Claims,
    action: &str,
    resource: &str,
    resource_id: Option<String>,
    details: serde_json::Value,
) -> Result<(), EnforcementError> {
    state
        .store
        .append_audit(AuditRecord::new(actor, action, resource, resource_id, details))
        .await
        .map_err(map_store)?;
    tracing::info!(actor = %actor.sub, action, resource, "Privileged mutation audited");
    Ok(())
}
