//! Pure permission evaluator.
//!
//! Stateless checks over a snapshot of the current session. Every check
//! denies when the session is uninitialized, anonymous, or inactive, and
//! an uncovered (resource, action) combination denies rather than
//! panicking, so gating code can call these unconditionally.

use crate::permission::Permission;
use crate::role::Role;
use crate::table;
use crate::tabs::{self, Tab, ANONYMOUS_TABS};
use serde::{Deserialize, Serialize};

/// The authorization-relevant view of a session.
///
/// Deliberately small: the evaluator does not see tokens, timestamps or
/// profile details, only what gating decisions depend on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    /// Id of the authenticated user, if any
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub school_id: Option<String>,
    pub is_authenticated: bool,
    /// False until the persisted/stream identity resolution has finished
    pub is_initialized: bool,
}

impl SessionView {
    /// An anonymous but initialized session.
    pub fn anonymous() -> Self {
        Self {
            is_initialized: true,
            ..Self::default()
        }
    }

    /// An authenticated session for a resolved identity.
    pub fn authenticated(user_id: impl Into<String>, role: Role, school_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Some(role),
            school_id: Some(school_id.into()),
            is_authenticated: true,
            is_initialized: true,
        }
    }

    fn active_role(&self) -> Option<Role> {
        if !self.is_initialized || !self.is_authenticated {
            return None;
        }
        self.role
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.active_role() == Some(role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match self.active_role() {
            Some(role) => table::role_grants(role, permission),
            None => false,
        }
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn can_access_tab(&self, tab: Tab) -> bool {
        match self.active_role() {
            Some(role) => tabs::tabs_for(role).contains(&tab),
            None => ANONYMOUS_TABS.contains(&tab),
        }
    }

    /// Contextual ownership check layered on top of role permissions.
    pub fn can_access_resource(&self, resource: Resource, action: Action, ctx: &ResourceContext) -> bool {
        let (role, user_id) = match (self.active_role(), self.user_id.as_deref()) {
            (Some(role), Some(id)) => (role, id),
            _ => return false,
        };

        // Tenant isolation applies to everyone, directors included.
        if let (Some(session_school), Some(resource_school)) =
            (self.school_id.as_deref(), ctx.school_id.as_deref())
        {
            if session_school != resource_school {
                return false;
            }
        }

        match (resource, action) {
            (Resource::Class, Action::View) => match role {
                Role::Director | Role::Teacher => true,
                Role::Student => ctx.member_ids.iter().any(|m| m == user_id),
            },
            (Resource::Class, Action::Create) => self.has_permission(Permission::CreateClass),
            (Resource::Class, Action::Edit) => match role {
                Role::Director => true,
                Role::Teacher => ctx.owner_id.as_deref() == Some(user_id),
                Role::Student => false,
            },
            (Resource::Class, Action::Delete) => self.has_permission(Permission::DeleteClass),

            (Resource::Task, Action::View) => true,
            (Resource::Task, Action::Create) => self.has_permission(Permission::CreateTask),
            (Resource::Task, Action::Edit) => match role {
                Role::Director => true,
                Role::Teacher => ctx.owner_id.as_deref() == Some(user_id),
                Role::Student => false,
            },
            (Resource::Task, Action::Delete) => self.has_permission(Permission::DeleteTask),

            (Resource::Submission, Action::View) => match role {
                Role::Director | Role::Teacher => true,
                // Students see only their own submissions.
                Role::Student => ctx.owner_id.as_deref() == Some(user_id),
            },
            (Resource::Submission, Action::Create) => self.has_permission(Permission::SubmitTasks),
            (Resource::Submission, Action::Grade) => match role {
                Role::Director => true,
                Role::Teacher => {
                    self.has_permission(Permission::GradeSubmissions)
                        && ctx.owner_id.as_deref() == Some(user_id)
                }
                Role::Student => false,
            },

            (Resource::User, Action::View) => {
                ctx.owner_id.as_deref() == Some(user_id) || self.has_permission(Permission::ViewAllUsers)
            }
            (Resource::User, Action::Edit | Action::Delete) => {
                self.has_permission(Permission::ManageUsers)
            }

            // Anything not covered above is denied.
            _ => false,
        }
    }
}

/// Resource kinds subject to contextual authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Class,
    Task,
    Submission,
    User,
}

/// Actions on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Grade,
}

/// Ownership context for a resource access check.
///
/// `owner_id` is the resource's owning principal: the class's teacher for
/// class, task and grading checks, the submission's student for submission
/// views, the profile's subject for user checks. `member_ids` is the class
/// roster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceContext {
    pub owner_id: Option<String>,
    pub school_id: Option<String>,
    pub member_ids: Vec<String>,
}

impl ResourceContext {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    pub fn with_school(mut self, school_id: impl Into<String>) -> Self {
        self.school_id = Some(school_id.into());
        self
    }

    pub fn with_members(mut self, member_ids: Vec<String>) -> Self {
        self.member_ids = member_ids;
        self
    }
}
