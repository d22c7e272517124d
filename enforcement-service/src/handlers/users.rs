//! Privileged user administration: role assignment, approval, deletion.
//!
//! Role and school are read from the caller's token claims only; the
//! request payload is never trusted for authorization.

use authz_core::{Permission, Role};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{map_store, write_audit, MutationResponse};
use crate::error::EnforcementError;
use crate::middleware::{deny_cross_tenant, Caller};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
    pub school_id: String,
}

pub async fn set_user_role(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::ManageUsers)?;

    // Unknown role strings fail closed.
    let role: Role = req
        .role
        .parse()
        .map_err(|_| EnforcementError::InvalidArgument(format!("Invalid role: {}", req.role)))?;
    if req.school_id.is_empty() {
        return Err(EnforcementError::InvalidArgument(
            "school_id is required".to_string(),
        ));
    }

    // Directors manage only their own school.
    if req.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &req.school_id, "set_user_role"));
    }

    let target = state
        .store
        .user(&user_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("User not found".to_string()))?;
    // Fresh signups have no school yet; anyone else must already be ours.
    if !target.school_id.is_empty() && target.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &target.school_id, "set_user_role"));
    }

    state
        .store
        .set_user_role(&user_id, role, &req.school_id)
        .await
        .map_err(map_store)?;

    // A role change invalidates any previously derived permission set;
    // the claims mirror is recomputed from the table at next token issue.
    write_audit(
        &state,
        &caller.0,
        "set_user_role",
        "user",
        Some(user_id),
        json!({ "new_role": role, "school_id": req.school_id }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Role updated")))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

pub async fn approve_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::ManageUsers)?;

    let target = state
        .store
        .user(&user_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("User not found".to_string()))?;
    if !target.school_id.is_empty() && target.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &target.school_id, "approve_user"));
    }

    state
        .store
        .set_user_active(&user_id, req.approved, &caller.0.sub)
        .await
        .map_err(map_store)?;

    let action = if req.approved { "approve_user" } else { "reject_user" };
    write_audit(
        &state,
        &caller.0,
        action,
        "user",
        Some(user_id),
        json!({ "approved": req.approved }),
    )
    .await?;

    let message = if req.approved {
        "User approved"
    } else {
        "User rejected"
    };
    Ok(Json(MutationResponse::ok(message)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::ManageUsers)?;

    let target = state
        .store
        .user(&user_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("User not found".to_string()))?;
    if target.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &target.school_id, "delete_user"));
    }

    state
        .store
        .soft_delete_user(&user_id, &caller.0.sub)
        .await
        .map_err(map_store)?;
    let removed_from = state
        .store
        .remove_student_everywhere(&user_id)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "delete_user",
        "user",
        Some(user_id),
        json!({ "user_name": target.name, "removed_from_classes": removed_from }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("User removed")))
}
