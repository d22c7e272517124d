//! The permission catalog.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named capability gating one privileged action.
///
/// Closed catalog: permissions exist only as variants here, so a
/// misspelled permission name is a compile error rather than a silently
/// always-false check. Permissions are always derived from a role through
/// the table in [`crate::table`]; they are never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Base capabilities every authenticated user has
    ReadOwnData,
    SubmitTasks,
    ViewOwnGrades,
    ParticipateInClassChat,

    // Class management
    CreateClass,
    EditClass,
    DeleteClass,
    ManageStudents,

    // Task management
    CreateTask,
    EditTask,
    DeleteTask,
    GradeSubmissions,

    // Progress and analytics
    ViewStudentProgress,
    ViewClassAnalytics,

    // School administration
    ManageUsers,
    ViewAllUsers,
    ViewSchoolReports,
    SendSchoolAnnouncements,
    ModerateChat,
    ConfigureSchool,
    ManageSchoolSettings,
    ViewAuditLogs,
    ExportData,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadOwnData => "read_own_data",
            Permission::SubmitTasks => "submit_tasks",
            Permission::ViewOwnGrades => "view_own_grades",
            Permission::ParticipateInClassChat => "participate_in_class_chat",
            Permission::CreateClass => "create_class",
            Permission::EditClass => "edit_class",
            Permission::DeleteClass => "delete_class",
            Permission::ManageStudents => "manage_students",
            Permission::CreateTask => "create_task",
            Permission::EditTask => "edit_task",
            Permission::DeleteTask => "delete_task",
            Permission::GradeSubmissions => "grade_submissions",
            Permission::ViewStudentProgress => "view_student_progress",
            Permission::ViewClassAnalytics => "view_class_analytics",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAllUsers => "view_all_users",
            Permission::ViewSchoolReports => "view_school_reports",
            Permission::SendSchoolAnnouncements => "send_school_announcements",
            Permission::ModerateChat => "moderate_chat",
            Permission::ConfigureSchool => "configure_school",
            Permission::ManageSchoolSettings => "manage_school_settings",
            Permission::ViewAuditLogs => "view_audit_logs",
            Permission::ExportData => "export_data",
        }
    }

    /// Every permission in the catalog.
    pub const ALL: [Permission; 23] = [
        Permission::ReadOwnData,
        Permission::SubmitTasks,
        Permission::ViewOwnGrades,
        Permission::ParticipateInClassChat,
        Permission::CreateClass,
        Permission::EditClass,
        Permission::DeleteClass,
        Permission::ManageStudents,
        Permission::CreateTask,
        Permission::EditTask,
        Permission::DeleteTask,
        Permission::GradeSubmissions,
        Permission::ViewStudentProgress,
        Permission::ViewClassAnalytics,
        Permission::ManageUsers,
        Permission::ViewAllUsers,
        Permission::ViewSchoolReports,
        Permission::SendSchoolAnnouncements,
        Permission::ModerateChat,
        Permission::ConfigureSchool,
        Permission::ManageSchoolSettings,
        Permission::ViewAuditLogs,
        Permission::ExportData,
    ];
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}
