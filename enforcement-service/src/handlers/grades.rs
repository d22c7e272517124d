//! Grade release.

use authz_core::{Action, Permission, Resource, ResourceContext};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::{map_store, write_audit};
use crate::error::EnforcementError;
use crate::middleware::{deny_cross_tenant, Caller};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReleaseGradesResponse {
    pub success: bool,
    pub released: usize,
}

/// Release all graded submissions of a class to its students.
pub async fn release_grades(
    State(state): State<AppState>,
    caller: Caller,
    Path(class_id): Path<String>,
) -> Result<Json<ReleaseGradesResponse>, EnforcementError> {
    caller.require(Permission::GradeSubmissions)?;

    let class = state
        .store
        .class(&class_id)
        .await
        .map_err(map_store)?
        .ok_or_else(|| EnforcementError::NotFound("Class not found".to_string()))?;
    if class.school_id != caller.0.school_id {
        return Err(deny_cross_tenant(&caller.0, &class.school_id, "release_grades"));
    }
    // Grading is scoped to the owning teacher; directors bypass.
    let ctx = ResourceContext::owned_by(class.teacher_id.clone()).with_school(class.school_id.clone());
    if !caller
        .view()
        .can_access_resource(Resource::Submission, Action::Grade, &ctx)
    {
        tracing::warn!(actor = %caller.0.sub, class_id, "Grade release denied");
        return Err(EnforcementError::Forbidden);
    }

    let released = state
        .store
        .release_grades(&class_id)
        .await
        .map_err(map_store)?;

    write_audit(
        &state,
        &caller.0,
        "release_grades",
        "class",
        Some(class_id),
        json!({ "released": released }),
    )
    .await?;

    Ok(Json(ReleaseGradesResponse {
        success: true,
        released,
    }))
}
