//! The canonical role-to-permission table.
//!
//! This is the single source of truth for what each role may do. The
//! client derives UI gating from it and the server re-derives claims from
//! it on every role change; since both link this crate there is exactly
//! one copy of the table.

use crate::permission::Permission;
use crate::role::Role;

const STUDENT_PERMISSIONS: &[Permission] = &[
    Permission::ReadOwnData,
    Permission::SubmitTasks,
    Permission::ViewOwnGrades,
    Permission::ParticipateInClassChat,
];

const TEACHER_PERMISSIONS: &[Permission] = &[
    Permission::ReadOwnData,
    Permission::SubmitTasks,
    Permission::ViewOwnGrades,
    Permission::ParticipateInClassChat,
    Permission::CreateClass,
    Permission::EditClass,
    Permission::CreateTask,
    Permission::EditTask,
    Permission::GradeSubmissions,
    Permission::ViewStudentProgress,
    Permission::ViewClassAnalytics,
    Permission::ManageStudents,
];

// Directors hold the full catalog. Kept as the full-catalog constant so
// the superset invariant holds structurally.
const DIRECTOR_PERMISSIONS: &[Permission] = &Permission::ALL;

/// Permissions granted to a role. Total over all three roles.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Student => STUDENT_PERMISSIONS,
        Role::Teacher => TEACHER_PERMISSIONS,
        Role::Director => DIRECTOR_PERMISSIONS,
    }
}

/// Permissions for a role given as a raw string.
///
/// Fails closed: an unrecognized role gets the empty set, never the most
/// privileged one.
pub fn permissions_for_str(role: &str) -> &'static [Permission] {
    match role.parse::<Role>() {
        Ok(role) => permissions_for(role),
        Err(_) => &[],
    }
}

/// Whether a role grants a permission.
pub fn role_grants(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}
