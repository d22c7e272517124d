//! Class management: create, update, delete, roster mutation.
//!
//! Ownership checks go through the same evaluator the client gates with:
//! teachers act on their own classes, directors bypass ownership inside
//! their school, and nothing crosses a school boundary.

use authz_core::{Action, Permission, Resource, ResourceContext};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{map_store, write_audit, MutationResponse};
use crate::error::EnforcementError;
use crate::middleware::{deny_cross_tenant, Caller};
use crate::models::{ClassRecord, ClassUpdate};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateClassResponse {
    pub id: String,
    pub success: bool,
}

pub async fn create_class(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateClassRequest>,
) -> Result<Json<CreateClassResponse>, EnforcementError> {
    caller.require(Permission::CreateClass)?;
    if req.name.trim().is_empty() {
        return Err(EnforcementError::InvalidArgument(
            "Class name is required".to_string(),
        ));
    }

    // The caller becomes the owning teacher; the class lives in the
    // caller's school regardless of anything in the payload.
    let teacher_name = state
        .store
        .user(&caller.0.sub)
        .await
        .map_err(map_store)?
        .map(|u| u.name)
        .unwrap_or_else(|| caller.0.email.clone());

    let now = Utc::now();
    let class = ClassRecord {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        subject: req.subject,
        description: req.description,
        teacher_id: caller.0.sub.clone(),
        teacher_name,
        student_ids: Vec::new(),
        school_id: caller.0.school_id.clone(),
        is_active: true,
        deleted_by: None,
        created_at: now,
        updated_at: now,
    };
    let id = class.id.clone();
    let name = class.name.clone();
    state.store.insert_class(class).await.map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "create_class",
        "class",
        Some(id.clone()),
        json!({ "class_name": name }),
    )
    .await?;

    Ok(Json(CreateClassResponse { id, success: true }))
}

async fn load_owned_class(
    state: &AppState,
    caller: &Caller,
    class_id: &str,
    action: &str,
) -> Result<ClassRecord, EnforcementError> {
    let class = state
        .store
        .class(class_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Class not found".to_string()))?;

    if class.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &class.school_id, action));
    }
    let ctx = ResourceContext::owned_by(class.teacher_id.clone()).with_school(class.school_id.clone());
    if !caller.view().can_access_resource(Resource::Class, Action::Edit, &ctx) {
        tracing::warn!(actor = %caller.0.sub, class_id, action, "Ownership denied");
        return Err(EnforcementError::Forbidden);
    }
    Ok(class)
}

pub async fn update_class(
    State(state): State<AppState>,
    caller: Caller,
    Path(class_id): Path<String>,
    Json(update): Json<ClassUpdate>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::EditClass)?;
    load_owned_class(&state, &caller, &class_id, "update_class").await?;

    state
        .store
        .update_class(&class_id, update)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "update_class",
        "class",
        Some(class_id),
        json!({}),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Class updated")))
}

pub async fn delete_class(
    State(state): State<AppState>,
    caller: Caller,
    Path(class_id): Path<String>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    // Directors only; the table grants delete_class to no other role.
    caller.require(Permission::DeleteClass)?;
    let class = state
        .store
        .class(&class_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Class not found".to_string()))?;
    if class.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &class.school_id, "delete_class"));
    }

    state
        .store
        .soft_delete_class(&class_id, &caller.0.sub)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "delete_class",
        "class",
        Some(class_id),
        json!({ "class_name": class.name }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Class removed")))
}

#[derive(Debug, Deserialize)]
pub struct AddStudentRequest {
    pub student_id: String,
}

pub async fn add_student(
    State(state): State<AppState>,
    caller: Caller,
    Path(class_id): Path<String>,
    Json(req): Json<AddStudentRequest>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::ManageStudents)?;
    let class = load_owned_class(&state, &caller, &class_id, "add_student").await?;

    let student = state
        .store
        .user(&req.student_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Student not found".to_string()))?;
    if student.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &student.school_id, "add_student"));
    }
    if class.student_ids.iter().any(|s| s == &req.student_id) {
        return Err(EnforcementError::Conflict(
            "Student already enrolled".to_string(),
        ));
    }

    state
        .store
        .add_student(&class_id, &req.student_id)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "add_student_to_class",
        "class",
        Some(class_id),
        json!({ "student_id": req.student_id, "student_name": student.name }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Student added")))
}

pub async fn remove_student(
    State(state): State<AppState>,
    caller: Caller,
    Path((class_id, student_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::ManageStudents)?;
    let class = load_owned_class(&state, &caller, &class_id, "remove_student").await?;

    // A no-op removal is not a mutation and must not be audited as one.
    if !class.student_ids.iter().any(|s| s == &student_id) {
        return Err(EnforcementError::NotFound(
            "Student not enrolled".to_string(),
        ));
    }

    state
        .store
        .remove_student(&class_id, &student_id)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "remove_student_from_class",
        "class",
        Some(class_id),
        json!({ "student_id": student_id }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Student removed")))
}
