//! The auth backend contract.
//!
//! Narrow trait over the hosted auth provider. The session store is the
//! only consumer; UI code never talks to the backend directly.

use crate::identity::Identity;
use authz_core::{Claims, Role};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors surfaced by the auth backend, mapped from the provider's error
/// codes. Credential failures never reveal which of email/password was
/// wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("too many attempts")]
    RateLimited,
    #[error("email already in use")]
    EmailInUse,
    #[error("weak password")]
    WeakPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("network error: {0}")]
    Network(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl AuthError {
    /// User-facing message for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Email ou senha incorretos",
            AuthError::AccountDisabled => "Conta desativada",
            AuthError::RateLimited => "Muitas tentativas. Tente novamente mais tarde",
            AuthError::EmailInUse => "Este email já está em uso",
            AuthError::WeakPassword => "A senha deve ter pelo menos 6 caracteres",
            AuthError::InvalidEmail => "Email inválido",
            AuthError::Network(_) => "Erro de conexão. Verifique sua internet",
            AuthError::Backend(_) => "Erro ao processar a solicitação",
        }
    }

    /// Whether this error is transient connectivity rather than a
    /// definitive answer about the identity.
    pub fn is_network(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }
}

/// An upstream identity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// The backend reports an authenticated user with this id.
    SignedIn { uid: String },
    /// The backend reports no authenticated user.
    SignedOut,
}

/// Handle for an identity-change subscription.
///
/// Single-owner lifetime: dropping (or cancelling) the handle
/// unsubscribes the listener. The session store holds at most one of
/// these per process; re-initialization cancels the previous handle
/// before acquiring a new one.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// The hosted auth provider, reduced to what the session store needs.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Authenticate and return the user id.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Create a new account and its profile document.
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Read the `users/{uid}` profile document. `Ok(None)` means the
    /// profile definitively does not exist (as opposed to a network
    /// failure, which is `Err(Network)`).
    async fn fetch_identity(&self, uid: &str) -> Result<Option<Identity>, AuthError>;

    /// Read the server-issued claims for a user. `force_refresh` bypasses
    /// any cached token.
    async fn get_claims(&self, uid: &str, force_refresh: bool) -> Result<Claims, AuthError>;

    /// Record a successful login on the profile document. Best effort.
    async fn touch_last_login(&self, uid: &str) -> Result<(), AuthError>;

    /// Subscribe to identity changes. The backend emits the current state
    /// immediately, then one event per change, until the subscription is
    /// cancelled.
    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<IdentityEvent>);
}
