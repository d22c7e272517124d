//! UI authorization gate.
//!
//! Pure decisions over session snapshots. Reactivity comes from the
//! store's watch channel: the UI re-evaluates its gates on every new
//! snapshot. Denied elements and tabs are omitted entirely, never
//! rendered disabled.

use crate::store::SessionSnapshot;
use authz_core::{tabs, Permission, Role, Tab};

/// What a gated route or element requires.
///
/// All present conditions must hold; `required_any_permissions` passes
/// when at least one of its permissions is granted.
#[derive(Debug, Clone, Default)]
pub struct GateRequirement {
    pub required_role: Option<Role>,
    pub required_permission: Option<Permission>,
    pub required_any_permissions: Option<Vec<Permission>>,
}

impl GateRequirement {
    /// Requires only an authenticated session.
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    pub fn permission(permission: Permission) -> Self {
        Self {
            required_permission: Some(permission),
            ..Self::default()
        }
    }

    pub fn any_permission(permissions: impl Into<Vec<Permission>>) -> Self {
        Self {
            required_any_permissions: Some(permissions.into()),
            ..Self::default()
        }
    }
}

/// Outcome of evaluating a gate against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the gated content.
    Allow,
    /// Render the fallback / redirect; never crash.
    Deny(DenyReason),
    /// Session not yet initialized; render a loading state, not content.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    MissingRole,
    MissingPermission,
}

/// Screen-level gate.
#[derive(Debug, Clone, Default)]
pub struct RouteGate {
    pub requirement: GateRequirement,
}

impl RouteGate {
    pub fn new(requirement: GateRequirement) -> Self {
        Self { requirement }
    }

    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> GateDecision {
        if !snapshot.is_initialized {
            return GateDecision::Pending;
        }
        let view = snapshot.view();
        if !view.is_authenticated {
            return GateDecision::Deny(DenyReason::NotAuthenticated);
        }
        if let Some(role) = self.requirement.required_role {
            if !view.has_role(role) {
                return GateDecision::Deny(DenyReason::MissingRole);
            }
        }
        if let Some(permission) = self.requirement.required_permission {
            if !view.has_permission(permission) {
                return GateDecision::Deny(DenyReason::MissingPermission);
            }
        }
        if let Some(any) = &self.requirement.required_any_permissions {
            if !view.has_any_permission(any) {
                return GateDecision::Deny(DenyReason::MissingPermission);
            }
        }
        GateDecision::Allow
    }
}

/// Element-level gate: whether a control should exist at all.
pub fn element_visible(snapshot: &SessionSnapshot, requirement: &GateRequirement) -> bool {
    RouteGate::new(requirement.clone()).evaluate(snapshot) == GateDecision::Allow
}

/// The tab set for a session. Denied tabs are absent, not disabled;
/// anonymous and uninitialized sessions get the reduced public set.
pub fn visible_tabs(snapshot: &SessionSnapshot) -> Vec<Tab> {
    let view = snapshot.view();
    match (view.is_initialized && view.is_authenticated, view.role) {
        (true, Some(role)) => tabs::tabs_for(role).to_vec(),
        _ => tabs::ANONYMOUS_TABS.to_vec(),
    }
}

/// Tab gate by route name, callable unconditionally from navigation code;
/// unknown names deny rather than erroring.
pub fn can_access_tab(snapshot: &SessionSnapshot, tab_name: &str) -> bool {
    match tab_name.parse::<Tab>() {
        Ok(tab) => snapshot.view().can_access_tab(tab),
        Err(_) => false,
    }
}
