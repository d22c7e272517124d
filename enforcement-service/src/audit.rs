//! Audit records for privileged mutations.
//!
//! Exactly one record per successful privileged mutation, written after
//! the mutation and before the success response. Records are immutable
//! once appended.

use authz_core::{Claims, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub actor_id: String,
    pub actor_role: Role,
    pub action: String,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
    pub school_id: String,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        actor: &Claims,
        action: &str,
        resource: &str,
        resource_id: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor_id: actor.sub.clone(),
            actor_role: actor.role,
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id,
            details,
            school_id: actor.school_id.clone(),
            created_at: Utc::now(),
        }
    }
}
