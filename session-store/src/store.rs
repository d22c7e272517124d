//! The process-wide session store.
//!
//! All session mutation funnels through this type: login, signup, logout,
//! password reset, cache restore, and the identity-change listener.
//! Snapshots are published through a single `watch` channel, so readers
//! always observe a complete session state, never a half-updated one.

use crate::backend::{AuthBackend, AuthError, IdentityEvent, Subscription};
use crate::identity::Identity;
use crate::persistence::{SessionPersistence, StoredSession};
use authz_core::{table, Permission, Role, SessionView};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(10);

/// An atomic view of the session at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub is_initialized: bool,
    /// True for sessions restored from cache or gone stale after a
    /// connectivity loss; such sessions render UI but may not perform
    /// privileged actions until the live stream revalidates them.
    pub provisional: bool,
    pub permissions: Vec<Permission>,
}

impl SessionSnapshot {
    /// Process-start state, before restore or the first stream event.
    pub fn uninitialized() -> Self {
        Self {
            identity: None,
            is_authenticated: false,
            is_loading: false,
            is_initialized: false,
            provisional: false,
            permissions: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            is_initialized: true,
            ..Self::uninitialized()
        }
    }

    fn authenticated(identity: Identity, provisional: bool) -> Self {
        let permissions = table::permissions_for(identity.role).to_vec();
        Self {
            identity: Some(identity),
            is_authenticated: true,
            is_loading: false,
            is_initialized: true,
            provisional,
            permissions,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    pub fn school_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.school_id.as_str())
    }

    /// Whether this session may trigger privileged mutations. Restored or
    /// stale sessions must be revalidated by the live stream first.
    pub fn can_act_privileged(&self) -> bool {
        self.is_initialized && self.is_authenticated && !self.provisional
    }

    /// The evaluator's view of this snapshot.
    pub fn view(&self) -> SessionView {
        match &self.identity {
            Some(identity) if self.is_authenticated => SessionView {
                user_id: Some(identity.id.clone()),
                role: Some(identity.role),
                school_id: Some(identity.school_id.clone()),
                is_authenticated: true,
                is_initialized: self.is_initialized,
            },
            _ => SessionView {
                is_initialized: self.is_initialized,
                ..SessionView::default()
            },
        }
    }
}

struct Shared {
    backend: Arc<dyn AuthBackend>,
    cache: Arc<dyn SessionPersistence>,
    network_timeout: Duration,
    tx: watch::Sender<SessionSnapshot>,
    /// Generation counter for last-write-wins: each mutating operation
    /// takes a token at start and may only commit while still current.
    generation: AtomicU64,
    commit_lock: Mutex<()>,
}

impl Shared {
    fn begin_op(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a snapshot if `op` is still the latest operation.
    ///
    /// The generation check, the watch publish, and the cache write happen
    /// under one lock, so a superseded operation can never clobber a newer
    /// session or its persisted blob.
    fn commit(&self, op: u64, snapshot: SessionSnapshot) -> bool {
        let _guard = self.commit_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != op {
            tracing::debug!(op, "Discarding superseded session transition");
            return false;
        }
        if let Some(identity) = snapshot.identity.as_ref().filter(|_| snapshot.is_authenticated) {
            if let Err(e) = self.cache.save(&StoredSession::from_identity(identity.clone())) {
                tracing::warn!(error = %e, "Failed to persist session cache");
            }
        } else if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "Failed to clear session cache");
        }
        self.tx.send_replace(snapshot);
        true
    }

    /// Mark the current session provisional without replacing it.
    fn mark_stale(&self, op: u64) {
        let _guard = self.commit_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != op {
            return;
        }
        self.tx.send_modify(|snapshot| {
            snapshot.is_initialized = true;
            if snapshot.is_authenticated {
                snapshot.provisional = true;
            }
        });
    }

    /// Flip the loading flag, but only while `op` is still the latest
    /// operation; a superseded login must not touch the snapshot that
    /// replaced it.
    fn set_loading(&self, op: u64, loading: bool) {
        let _guard = self.commit_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != op {
            return;
        }
        self.tx.send_modify(|snapshot| snapshot.is_loading = loading);
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.network_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Network("request timed out".into())),
        }
    }

    /// Resolve a uid to a verified identity: profile present, active, and
    /// consistent with the server-issued claims.
    async fn resolve(&self, uid: &str) -> Result<Identity, AuthError> {
        let identity = self
            .with_timeout(self.backend.fetch_identity(uid))
            .await?
            .ok_or_else(|| AuthError::Backend(format!("profile missing for {uid}")))?;

        if !identity.is_active {
            let _ = self.with_timeout(self.backend.sign_out()).await;
            return Err(AuthError::AccountDisabled);
        }

        let claims = self.with_timeout(self.backend.get_claims(uid, false)).await?;
        let consistent = |c: &authz_core::Claims| {
            c.role == identity.role && c.school_id == identity.school_id
        };
        let claims = if consistent(&claims) {
            claims
        } else {
            // Stale token; one forced refresh before giving up.
            tracing::info!(uid, "Claims diverge from profile, forcing refresh");
            self.with_timeout(self.backend.get_claims(uid, true)).await?
        };
        if !consistent(&claims) {
            tracing::warn!(uid, "Claims still diverge after refresh, invalidating session");
            let _ = self.with_timeout(self.backend.sign_out()).await;
            return Err(AuthError::Backend("profile/claims mismatch".into()));
        }

        Ok(identity)
    }

    async fn handle_identity_event(&self, event: IdentityEvent) {
        let op = self.begin_op();
        match event {
            IdentityEvent::SignedOut => {
                self.commit(op, SessionSnapshot::anonymous());
            }
            IdentityEvent::SignedIn { uid } => match self.resolve(&uid).await {
                Ok(identity) => {
                    tracing::debug!(uid = %identity.id, role = %identity.role, "Identity stream confirmed session");
                    self.commit(op, SessionSnapshot::authenticated(identity, false));
                }
                Err(e) if e.is_network() => {
                    // Connectivity loss is not a logout; keep the last-known
                    // session but require revalidation before privileged acts.
                    tracing::warn!(error = %e, uid, "Identity resolution failed, keeping stale session");
                    self.mark_stale(op);
                }
                Err(e) => {
                    tracing::warn!(error = %e, uid, "Identity rejected, session is anonymous");
                    self.commit(op, SessionSnapshot::anonymous());
                }
            },
        }
    }
}

struct ListenerState {
    subscription: Option<Subscription>,
    task: Option<JoinHandle<()>>,
}

/// The session store.
///
/// One instance per process, constructed explicitly and passed to the UI
/// layer; tests build isolated instances with in-memory collaborators.
pub struct SessionStore {
    shared: Arc<Shared>,
    listener: Mutex<ListenerState>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>, cache: Arc<dyn SessionPersistence>) -> Self {
        Self::with_network_timeout(backend, cache, DEFAULT_NETWORK_TIMEOUT)
    }

    pub fn with_network_timeout(
        backend: Arc<dyn AuthBackend>,
        cache: Arc<dyn SessionPersistence>,
        network_timeout: Duration,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::uninitialized());
        Self {
            shared: Arc::new(Shared {
                backend,
                cache,
                network_timeout,
                tx,
                generation: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
            }),
            listener: Mutex::new(ListenerState {
                subscription: None,
                task: None,
            }),
        }
    }

    /// The current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.tx.borrow().clone()
    }

    /// Subscribe to session changes. Gates re-evaluate on every received
    /// snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Restore the persisted session, if any, as a provisional session.
    ///
    /// Returns whether a cached session was restored. Either way the
    /// session counts as initialized afterwards, so the UI can render.
    pub fn restore(&self) -> bool {
        let op = self.shared.begin_op();
        match self.shared.cache.load() {
            Ok(Some(stored)) => {
                tracing::info!(role = %stored.role, "Restored provisional session from cache");
                self.shared
                    .commit(op, SessionSnapshot::authenticated(stored.identity, true))
            }
            Ok(None) => {
                self.shared.commit(op, SessionSnapshot::anonymous());
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session cache");
                self.shared.commit(op, SessionSnapshot::anonymous());
                false
            }
        }
    }

    /// Acquire the identity-change subscription and start the listener.
    ///
    /// Idempotent: calling again cancels the previous subscription first,
    /// so there is never more than one live listener per store.
    pub fn initialize(&self) {
        let mut state = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(subscription) = state.subscription.take() {
            subscription.cancel();
        }
        if let Some(task) = state.task.take() {
            task.abort();
        }

        let (subscription, mut events) = self.shared.backend.subscribe();
        let shared = Arc::clone(&self.shared);
        state.subscription = Some(subscription);
        state.task = Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                shared.handle_identity_event(event).await;
            }
        }));
    }

    /// Release the identity subscription, for app teardown.
    pub fn teardown(&self) {
        let mut state = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(subscription) = state.subscription.take() {
            subscription.cancel();
        }
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    /// Authenticate with email and password.
    ///
    /// `Ok(true)` once the session reflects the logged-in identity;
    /// `Ok(false)` if a concurrent transition (e.g. logout) superseded
    /// this login. Credential errors do not reveal which of
    /// email/password was wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        let op = self.shared.begin_op();
        self.shared.set_loading(op, true);
        let result = self.login_inner(email, password).await;
        self.shared.set_loading(op, false);

        match result {
            Ok(identity) => {
                let uid = identity.id.clone();
                if self.shared.commit(op, SessionSnapshot::authenticated(identity, false)) {
                    return Ok(true);
                }
                // Superseded: the listener may have already committed this
                // same identity; only then does the login still count.
                let current = self.shared.tx.borrow();
                Ok(current.is_authenticated
                    && current.identity.as_ref().map(|i| i.id.as_str()) == Some(uid.as_str()))
            }
            Err(e) => {
                tracing::info!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let shared = &self.shared;
        let uid = shared.with_timeout(shared.backend.sign_in(email, password)).await?;
        if let Err(e) = shared.with_timeout(shared.backend.touch_last_login(&uid)).await {
            // Last-login bookkeeping must not fail the login.
            tracing::debug!(error = %e, "Failed to record last login");
        }
        shared.resolve(&uid).await
    }

    /// Create a new account.
    ///
    /// Students are active immediately and end up with an authenticated
    /// session; teacher and director signups stay inactive pending
    /// director approval and leave the session anonymous.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<bool, AuthError> {
        let op = self.shared.begin_op();
        self.shared.set_loading(op, true);
        let result = self
            .shared
            .with_timeout(self.shared.backend.sign_up(name, email, password, role))
            .await;
        self.shared.set_loading(op, false);

        let identity = result?;
        if identity.is_active {
            self.shared.commit(op, SessionSnapshot::authenticated(identity, false));
        } else {
            tracing::info!(role = %role, "Signup pending director approval");
            self.shared.commit(op, SessionSnapshot::anonymous());
        }
        Ok(true)
    }

    /// Clear the session. Best effort: backend failures are logged, the
    /// local session always ends anonymous and the cache cleared.
    pub async fn logout(&self) {
        let op = self.shared.begin_op();
        if let Err(e) = self.shared.with_timeout(self.shared.backend.sign_out()).await {
            tracing::warn!(error = %e, "Backend sign-out failed, clearing local session anyway");
        }
        self.shared.commit(op, SessionSnapshot::anonymous());
    }

    /// Trigger the out-of-band password reset flow.
    pub async fn reset_password(&self, email: &str) -> Result<bool, AuthError> {
        self.shared
            .with_timeout(self.shared.backend.send_password_reset(email))
            .await?;
        Ok(true)
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.teardown();
    }
}
