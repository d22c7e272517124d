//! Document models mirrored from the backing store.

use authz_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `users/{id}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub school_id: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        school_id: impl Into<String>,
        is_active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
            school_id: school_id.into(),
            is_active,
            approved_by: None,
            rejected_by: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A `classes/{id}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub description: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub student_ids: Vec<String>,
    pub school_id: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a class; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
}

/// A `tasks/{id}` document. Tasks belong to a class and are owned by the
/// teacher who created them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub description: String,
    pub teacher_id: String,
    pub school_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a task; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A task submission awaiting or carrying a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub class_id: String,
    pub student_id: String,
    pub school_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    /// Graded by the teacher but not yet visible to the student.
    Graded,
    /// Grade released to the student.
    Released,
}

/// School-scoped export produced by the backup operation.
#[derive(Debug, Clone, Serialize)]
pub struct SchoolExport {
    pub school_id: String,
    pub users: Vec<UserRecord>,
    pub classes: Vec<ClassRecord>,
    pub submissions: Vec<SubmissionRecord>,
    pub exported_at: DateTime<Utc>,
}

/// School-scoped headcounts and activity counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolStats {
    pub school_id: String,
    pub total_users: usize,
    pub active_users: usize,
    pub students: usize,
    pub teachers: usize,
    pub directors: usize,
    pub total_classes: usize,
    pub active_classes: usize,
    pub total_submissions: usize,
}
