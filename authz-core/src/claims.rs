//! Server-issued claims.

use crate::permission::Permission;
use crate::role::Role;
use crate::table;
use serde::{Deserialize, Serialize};

/// Claims embedded in the auth token.
///
/// The server-trusted, tamper-resistant copy of role/tenant/permissions.
/// Server-side enforcement reads role and school exclusively from here,
/// never from request payloads. The client holds a provisional mirror that
/// must stay consistent with the profile document; on mismatch the session
/// is treated as stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id issued by the auth backend)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub school_id: String,
    /// Derived from the role through the canonical table
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims for a user, deriving permissions from the role table.
    pub fn for_user(
        sub: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        school_id: impl Into<String>,
        is_active: bool,
        issued_at: chrono::DateTime<chrono::Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            role,
            school_id: school_id.into(),
            permissions: table::permissions_for(role).to_vec(),
            is_active,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}
