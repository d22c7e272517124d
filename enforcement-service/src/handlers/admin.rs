//! School-scoped export and audit listing.

use authz_core::Permission;
use axum::{extract::State, Json};
use serde_json::json;

use super::{map_store, write_audit};
use crate::audit::AuditRecord;
use crate::error::EnforcementError;
use crate::middleware::Caller;
use crate::models::{SchoolExport, SchoolStats};
use crate::AppState;

/// Export the caller's school. Tenant isolation is structural here: the
/// export is keyed by the caller's own school id, so there is nothing
/// cross-tenant to request.
pub async fn export_school(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<SchoolExport>, EnforcementError> {
    caller.require(Permission::ExportData)?;

    let export = state
        .store
        .export_school(&caller.0.school_id)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "export_data",
        "school",
        Some(caller.0.school_id.clone()),
        json!({
            "users": export.users.len(),
            "classes": export.classes.len(),
            "submissions": export.submissions.len(),
        }),
    )
    .await?;

    Ok(Json(export))
}

/// Headcounts and activity counters for the caller's school. Read-only,
/// not audited, and structurally tenant-scoped like the export.
pub async fn school_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<SchoolStats>, EnforcementError> {
    caller.require(Permission::ViewSchoolReports)?;

    let stats = state
        .store
        .school_stats(&caller.0.school_id)
        .await
        .map_err(map_store)?;
    Ok(Json(stats))
}

/// List the caller's school audit trail. Read-only, not itself audited.
pub async fn list_audit(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<AuditRecord>>, EnforcementError> {
    caller.require(Permission::ViewAuditLogs)?;

    let records = state
        .store
        .audit_for_school(&caller.0.school_id)
        .await
        .map_err(map_store)?;
    Ok(Json(records))
}
