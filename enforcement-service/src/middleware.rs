//! Authentication middleware and caller extraction.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use authz_core::{table, Claims, Permission, SessionView};

use crate::{error::EnforcementError, AppState};

/// Middleware requiring a valid, active claims token on every request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, EnforcementError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(EnforcementError::Unauthenticated)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected claims token");
        EnforcementError::Unauthenticated
    })?;

    // Inactive identities are unauthenticated for all purposes.
    if !claims.is_active {
        return Err(EnforcementError::Unauthenticated);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extractor for the authenticated caller's claims.
pub struct Caller(pub Claims);

impl Caller {
    /// Require a permission, derived from the caller's role through the
    /// canonical table. The token's embedded permission list is a mirror
    /// for clients; authorization here re-derives from the role.
    pub fn require(&self, permission: Permission) -> Result<(), EnforcementError> {
        if table::role_grants(self.0.role, permission) {
            Ok(())
        } else {
            tracing::warn!(
                actor = %self.0.sub,
                role = %self.0.role,
                permission = %permission,
                "Permission denied"
            );
            Err(EnforcementError::Forbidden)
        }
    }

    /// The evaluator's view of this caller, for ownership checks shared
    /// with the client.
    pub fn view(&self) -> SessionView {
        SessionView::authenticated(self.0.sub.clone(), self.0.role, self.0.school_id.clone())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = EnforcementError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(EnforcementError::Unauthenticated)?;
        Ok(Caller(claims))
    }
}

/// Log and reject a cross-tenant access attempt. The response is the same
/// generic denial as a permission failure so foreign resource ids leak
/// nothing.
pub fn deny_cross_tenant(claims: &Claims, target_school: &str, action: &str) -> EnforcementError {
    tracing::warn!(
        actor = %claims.sub,
        actor_school = %claims.school_id,
        target_school,
        action,
        "Cross-tenant access attempt"
    );
    EnforcementError::Forbidden
}
