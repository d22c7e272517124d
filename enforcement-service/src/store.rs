//! Directory store abstraction over the backing document database.
//!
//! The document database itself is an external dependency; handlers see
//! only this trait. `MemoryDirectory` is the in-process implementation
//! used by tests and the demo binary.

use crate::audit::AuditRecord;
use crate::models::{
    ClassRecord, ClassUpdate, SchoolExport, SchoolStats, SubmissionRecord, SubmissionStatus,
    TaskRecord, TaskUpdate, UserRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn upsert_user(&self, user: UserRecord) -> Result<(), StoreError>;
    async fn set_user_role(&self, id: &str, role: authz_core::Role, school_id: &str)
        -> Result<(), StoreError>;
    async fn set_user_active(
        &self,
        id: &str,
        active: bool,
        actor_id: &str,
    ) -> Result<(), StoreError>;
    /// Soft delete: deactivate and stamp, never physically remove.
    async fn soft_delete_user(&self, id: &str, actor_id: &str) -> Result<(), StoreError>;

    async fn class(&self, id: &str) -> Result<Option<ClassRecord>, StoreError>;
    async fn insert_class(&self, class: ClassRecord) -> Result<(), StoreError>;
    async fn update_class(&self, id: &str, update: ClassUpdate) -> Result<(), StoreError>;
    async fn soft_delete_class(&self, id: &str, actor_id: &str) -> Result<(), StoreError>;
    async fn add_student(&self, class_id: &str, student_id: &str) -> Result<(), StoreError>;
    async fn remove_student(&self, class_id: &str, student_id: &str) -> Result<(), StoreError>;
    /// Remove a student from every roster, as part of user deletion.
    async fn remove_student_everywhere(&self, student_id: &str) -> Result<usize, StoreError>;

    async fn task(&self, id: &str) -> Result<Option<TaskRecord>, StoreError>;
    async fn insert_task(&self, task: TaskRecord) -> Result<(), StoreError>;
    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<(), StoreError>;
    async fn soft_delete_task(&self, id: &str, actor_id: &str) -> Result<(), StoreError>;

    async fn insert_submission(&self, submission: SubmissionRecord) -> Result<(), StoreError>;
    /// Flip graded submissions of a class to released; returns how many.
    async fn release_grades(&self, class_id: &str) -> Result<usize, StoreError>;

    async fn append_audit(&self, record: AuditRecord) -> Result<(), StoreError>;
    async fn audit_for_school(&self, school_id: &str) -> Result<Vec<AuditRecord>, StoreError>;

    async fn export_school(&self, school_id: &str) -> Result<SchoolExport, StoreError>;
    async fn school_stats(&self, school_id: &str) -> Result<SchoolStats, StoreError>;
}

/// In-memory directory keyed by document id.
#[derive(Default)]
pub struct MemoryDirectory {
    users: DashMap<String, UserRecord>,
    classes: DashMap<String, ClassRecord>,
    tasks: DashMap<String, TaskRecord>,
    submissions: DashMap<String, SubmissionRecord>,
    audit: DashMap<String, AuditRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: UserRecord) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn seed_class(&self, class: ClassRecord) {
        self.classes.insert(class.id.clone(), class);
    }

    pub fn seed_task(&self, task: TaskRecord) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn seed_submission(&self, submission: SubmissionRecord) {
        self.submissions.insert(submission.id.clone(), submission);
    }

    pub fn audit_count(&self) -> usize {
        self.audit.len()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(id).map(|r| r.clone()))
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn set_user_role(
        &self,
        id: &str,
        role: authz_core::Role,
        school_id: &str,
    ) -> Result<(), StoreError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("user {id} not found")))?;
        user.role = role;
        user.school_id = school_id.to_string();
        user.is_active = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_user_active(
        &self,
        id: &str,
        active: bool,
        actor_id: &str,
    ) -> Result<(), StoreError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("user {id} not found")))?;
        user.is_active = active;
        if active {
            user.approved_by = Some(actor_id.to_string());
        } else {
            user.rejected_by = Some(actor_id.to_string());
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete_user(&self, id: &str, actor_id: &str) -> Result<(), StoreError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("user {id} not found")))?;
        user.is_active = false;
        user.deleted_by = Some(actor_id.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn class(&self, id: &str) -> Result<Option<ClassRecord>, StoreError> {
        Ok(self.classes.get(id).map(|r| r.clone()))
    }

    async fn insert_class(&self, class: ClassRecord) -> Result<(), StoreError> {
        self.classes.insert(class.id.clone(), class);
        Ok(())
    }

    async fn update_class(&self, id: &str, update: ClassUpdate) -> Result<(), StoreError> {
        let mut class = self
            .classes
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("class {id} not found")))?;
        if let Some(name) = update.name {
            class.name = name;
        }
        if let Some(subject) = update.subject {
            class.subject = subject;
        }
        if let Some(description) = update.description {
            class.description = description;
        }
        class.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete_class(&self, id: &str, actor_id: &str) -> Result<(), StoreError> {
        let mut class = self
            .classes
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("class {id} not found")))?;
        class.is_active = false;
        class.deleted_by = Some(actor_id.to_string());
        class.updated_at = Utc::now();
        Ok(())
    }

    async fn add_student(&self, class_id: &str, student_id: &str) -> Result<(), StoreError> {
        let mut class = self
            .classes
            .get_mut(class_id)
            .ok_or_else(|| StoreError(format!("class {class_id} not found")))?;
        if !class.student_ids.iter().any(|s| s == student_id) {
            class.student_ids.push(student_id.to_string());
            class.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn remove_student(&self, class_id: &str, student_id: &str) -> Result<(), StoreError> {
        let mut class = self
            .classes
            .get_mut(class_id)
            .ok_or_else(|| StoreError(format!("class {class_id} not found")))?;
        class.student_ids.retain(|s| s != student_id);
        class.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_student_everywhere(&self, student_id: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for mut class in self.classes.iter_mut() {
            let before = class.student_ids.len();
            class.student_ids.retain(|s| s != student_id);
            if class.student_ids.len() != before {
                class.updated_at = Utc::now();
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn task(&self, id: &str) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.tasks.get(id).map(|r| r.clone()))
    }

    async fn insert_task(&self, task: TaskRecord) -> Result<(), StoreError> {
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<(), StoreError> {
        let mut task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("task {id} not found")))?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete_task(&self, id: &str, actor_id: &str) -> Result<(), StoreError> {
        let mut task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError(format!("task {id} not found")))?;
        task.is_active = false;
        task.deleted_by = Some(actor_id.to_string());
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_submission(&self, submission: SubmissionRecord) -> Result<(), StoreError> {
        self.submissions.insert(submission.id.clone(), submission);
        Ok(())
    }

    async fn release_grades(&self, class_id: &str) -> Result<usize, StoreError> {
        let mut released = 0;
        for mut submission in self.submissions.iter_mut() {
            if submission.class_id == class_id && submission.status == SubmissionStatus::Graded {
                submission.status = SubmissionStatus::Released;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn append_audit(&self, record: AuditRecord) -> Result<(), StoreError> {
        self.audit.insert(record.id.clone(), record);
        Ok(())
    }

    async fn audit_for_school(&self, school_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let mut records: Vec<AuditRecord> = self
            .audit
            .iter()
            .filter(|r| r.school_id == school_id)
            .map(|r| r.clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn export_school(&self, school_id: &str) -> Result<SchoolExport, StoreError> {
        Ok(SchoolExport {
            school_id: school_id.to_string(),
            users: self
                .users
                .iter()
                .filter(|u| u.school_id == school_id)
                .map(|u| u.clone())
                .collect(),
            classes: self
                .classes
                .iter()
                .filter(|c| c.school_id == school_id)
                .map(|c| c.clone())
                .collect(),
            submissions: self
                .submissions
                .iter()
                .filter(|s| s.school_id == school_id)
                .map(|s| s.clone())
                .collect(),
            exported_at: Utc::now(),
        })
    }

    async fn school_stats(&self, school_id: &str) -> Result<SchoolStats, StoreError> {
        let mut stats = SchoolStats {
            school_id: school_id.to_string(),
            total_users: 0,
            active_users: 0,
            students: 0,
            teachers: 0,
            directors: 0,
            total_classes: 0,
            active_classes: 0,
            total_submissions: 0,
        };
        for user in self.users.iter().filter(|u| u.school_id == school_id) {
            stats.total_users += 1;
            if user.is_active {
                stats.active_users += 1;
            }
            match user.role {
                authz_core::Role::Student => stats.students += 1,
                authz_core::Role::Teacher => stats.teachers += 1,
                authz_core::Role::Director => stats.directors += 1,
            }
        }
        for class in self.classes.iter().filter(|c| c.school_id == school_id) {
            stats.total_classes += 1;
            if class.is_active {
                stats.active_classes += 1;
            }
        }
        stats.total_submissions = self
            .submissions
            .iter()
            .filter(|s| s.school_id == school_id)
            .count();
        Ok(stats)
    }
}
