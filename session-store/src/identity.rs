//! The authenticated principal.

use authz_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated principal, mirroring the `users/{id}` document.
///
/// `role` and `school_id` are read-only for the client; they change only
/// through the privileged server functions. An identity with
/// `is_active == false` is treated as unauthenticated everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque stable id issued by the auth backend
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub school_id: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Device push token, if registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    /// A fresh identity as created at signup time.
    ///
    /// Students activate immediately; teacher and director accounts stay
    /// inactive until a director approves them. Self-service elevation to
    /// a privileged role must never self-activate.
    pub fn new_signup(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
            school_id: String::new(),
            is_active: role == Role::Student,
            avatar: None,
            push_token: None,
            created_at: now,
            updated_at: now,
            last_login: Some(now),
        }
    }
}
