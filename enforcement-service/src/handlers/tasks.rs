//! Task management: create, update, delete.
//!
//! Tasks live inside a class; authoring them requires ownership of that
//! class, with the director bypass scoped to the caller's school like
//! everywhere else.

use authz_core::{Action, Permission, Resource, ResourceContext};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{map_store, write_audit, MutationResponse};
use crate::error::EnforcementError;
use crate::middleware::{deny_cross_tenant, Caller};
use crate::models::{TaskRecord, TaskUpdate};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub class_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub id: String,
    pub success: bool,
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<CreateTaskResponse>, EnforcementError> {
    caller.require(Permission::CreateTask)?;
    if req.title.trim().is_empty() {
        return Err(EnforcementError::InvalidArgument(
            "Task title is required".to_string(),
        ));
    }

    let class = state
        .store
        .class(&req.class_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Class not found".to_string()))?;
    if class.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &class.school_id, "create_task"));
    }
    // Only the owning teacher publishes into a class; directors bypass.
    let ctx = ResourceContext::owned_by(class.teacher_id.clone()).with_school(class.school_id.clone());
    if !caller.view().can_access_resource(Resource::Task, Action::Edit, &ctx) {
        tracing::warn!(actor = %caller.0.sub, class_id = %req.class_id, "Task authoring denied");
        return Err(EnforcementError::Forbidden);
    }

    let now = Utc::now();
    let task = TaskRecord {
        id: Uuid::new_v4().to_string(),
        class_id: req.class_id,
        title: req.title,
        description: req.description,
        teacher_id: class.teacher_id,
        school_id: caller.0.school_id.clone(),
        due_date: req.due_date,
        is_active: true,
        deleted_by: None,
        created_at: now,
        updated_at: now,
    };
    let id = task.id.clone();
    let title = task.title.clone();
    let class_id = task.class_id.clone();
    state.store.insert_task(task).await.map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "create_task",
        "task",
        Some(id.clone()),
        json!({ "task_title": title, "class_id": class_id }),
    )
    .await?;

    Ok(Json(CreateTaskResponse { id, success: true }))
}

async fn load_owned_task(
    state: &AppState,
    caller: &Caller,
    task_id: &str,
    action: &str,
) -> Result<TaskRecord, EnforcementError> {
    let task = state
        .store
        .task(task_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Task not found".to_string()))?;

    if task.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &task.school_id, action));
    }
    let ctx = ResourceContext::owned_by(task.teacher_id.clone()).with_school(task.school_id.clone());
    if !caller.view().can_access_resource(Resource::Task, Action::Edit, &ctx) {
        tracing::warn!(actor = %caller.0.sub, task_id, action, "Ownership denied");
        return Err(EnforcementError::Forbidden);
    }
    Ok(task)
}

pub async fn update_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    caller.require(Permission::EditTask)?;
    load_owned_task(&state, &caller, &task_id, "update_task").await?;

    state
        .store
        .update_task(&task_id, update)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "update_task",
        "task",
        Some(task_id),
        json!({}),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Task updated")))
}

pub async fn delete_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
) -> Result<Json<MutationResponse>, EnforcementError> {
    // Directors only; the table grants delete_task to no other role.
    caller.require(Permission::DeleteTask)?;
    let task = state
        .store
        .task(&task_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Task not found".to_string()))?;
    if task.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &task.school_id, "delete_task"));
    }

    state
        .store
        .soft_delete_task(&task_id, &caller.0.sub)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "delete_task",
        "task",
        Some(task_id),
        json!({ "task_title": task.title }),
    )
    .await?;

    Ok(Json(MutationResponse::ok("Task removed")))
}
