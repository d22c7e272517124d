//! In-memory auth backend and session cache.
//!
//! Seedable test doubles for the hosted auth provider and the durable
//! local store. Also used by demos; production wiring supplies real
//! implementations of the same traits.

use crate::backend::{AuthBackend, AuthError, IdentityEvent, Subscription};
use crate::identity::Identity;
use crate::persistence::{SessionPersistence, StoredSession};
use authz_core::{Claims, Role};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

struct UserRecord {
    identity: Identity,
    password: String,
}

struct Inner {
    users: RwLock<HashMap<String, UserRecord>>,
    current: RwLock<Option<String>>,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<IdentityEvent>>>,
    next_subscriber: AtomicU64,
    next_uid: AtomicU64,
    network_down: AtomicBool,
    sign_in_delay: RwLock<Option<Duration>>,
}

/// Seedable in-memory auth backend.
#[derive(Clone)]
pub struct MemoryAuthBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: RwLock::new(HashMap::new()),
                current: RwLock::new(None),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber: AtomicU64::new(0),
                next_uid: AtomicU64::new(0),
                network_down: AtomicBool::new(false),
                sign_in_delay: RwLock::new(None),
            }),
        }
    }

    /// Seed an identity with a login password.
    pub fn seed_user(&self, identity: Identity, password: &str) {
        self.inner.users.write().unwrap_or_else(|e| e.into_inner()).insert(
            identity.id.clone(),
            UserRecord {
                identity,
                password: password.to_string(),
            },
        );
    }

    /// Simulate connectivity loss: every call fails with a network error.
    pub fn set_network_down(&self, down: bool) {
        self.inner.network_down.store(down, Ordering::SeqCst);
    }

    /// Delay `sign_in` completions, for testing in-flight cancellation.
    pub fn set_sign_in_delay(&self, delay: Duration) {
        *self
            .inner
            .sign_in_delay
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Flip a user's active flag, as the approval function would.
    pub fn set_active(&self, uid: &str, active: bool) {
        if let Some(record) = self
            .inner
            .users
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(uid)
        {
            record.identity.is_active = active;
            record.identity.updated_at = Utc::now();
        }
    }

    /// Re-emit the current identity state to all subscribers, as the
    /// provider does after a token refresh.
    pub fn notify(&self) {
        let event = match &*self.inner.current.read().unwrap_or_else(|e| e.into_inner()) {
            Some(uid) => IdentityEvent::SignedIn { uid: uid.clone() },
            None => IdentityEvent::SignedOut,
        };
        self.broadcast(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn broadcast(&self, event: IdentityEvent) {
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    fn check_network(&self) -> Result<(), AuthError> {
        if self.inner.network_down.load(Ordering::SeqCst) {
            Err(AuthError::Network("simulated outage".into()))
        } else {
            Ok(())
        }
    }

    fn find_by_email(&self, email: &str) -> Option<(String, String, bool)> {
        let users = self.inner.users.read().unwrap_or_else(|e| e.into_inner());
        users.values().find(|r| r.identity.email == email).map(|r| {
            (
                r.identity.id.clone(),
                r.password.clone(),
                r.identity.is_active,
            )
        })
    }
}

#[async_trait]
impl AuthBackend for MemoryAuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let delay = *self
            .inner
            .sign_in_delay
            .read()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_network()?;

        // Same error for unknown email and wrong password.
        let (uid, stored_password, is_active) = self
            .find_by_email(email)
            .ok_or(AuthError::InvalidCredentials)?;
        if stored_password != password {
            return Err(AuthError::InvalidCredentials);
        }
        if !is_active {
            return Err(AuthError::AccountDisabled);
        }

        *self.inner.current.write().unwrap_or_else(|e| e.into_inner()) = Some(uid.clone());
        self.broadcast(IdentityEvent::SignedIn { uid: uid.clone() });
        Ok(uid)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, AuthError> {
        self.check_network()?;
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        if self.find_by_email(email).is_some() {
            return Err(AuthError::EmailInUse);
        }

        let uid = format!("user-{}", self.inner.next_uid.fetch_add(1, Ordering::SeqCst) + 1);
        let identity = Identity::new_signup(uid.clone(), email, name, role);
        self.seed_user(identity.clone(), password);

        if identity.is_active {
            *self.inner.current.write().unwrap_or_else(|e| e.into_inner()) = Some(uid.clone());
            self.broadcast(IdentityEvent::SignedIn { uid });
        }
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_network()?;
        *self.inner.current.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.broadcast(IdentityEvent::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.check_network()?;
        // No account enumeration: unknown emails succeed silently.
        let _ = email;
        Ok(())
    }

    async fn fetch_identity(&self, uid: &str) -> Result<Option<Identity>, AuthError> {
        self.check_network()?;
        let users = self.inner.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(uid).map(|r| r.identity.clone()))
    }

    async fn get_claims(&self, uid: &str, _force_refresh: bool) -> Result<Claims, AuthError> {
        self.check_network()?;
        let users = self.inner.users.read().unwrap_or_else(|e| e.into_inner());
        let record = users.get(uid).ok_or(AuthError::InvalidCredentials)?;
        Ok(Claims::for_user(
            &record.identity.id,
            &record.identity.email,
            record.identity.role,
            &record.identity.school_id,
            record.identity.is_active,
            Utc::now(),
            chrono::Duration::hours(1),
        ))
    }

    async fn touch_last_login(&self, uid: &str) -> Result<(), AuthError> {
        self.check_network()?;
        if let Some(record) = self
            .inner
            .users
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(uid)
        {
            record.identity.last_login = Some(Utc::now());
        }
        Ok(())
    }

    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<IdentityEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);

        // Emit the current state immediately, as the provider does.
        let initial = match &*self.inner.current.read().unwrap_or_else(|e| e.into_inner()) {
            Some(uid) => IdentityEvent::SignedIn { uid: uid.clone() },
            None => IdentityEvent::SignedOut,
        };
        let _ = tx.send(initial);

        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);

        let inner = Arc::clone(&self.inner);
        let subscription = Subscription::new(move || {
            inner
                .subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
        });
        (subscription, rx)
    }
}

/// In-memory session cache.
#[derive(Default)]
pub struct MemorySessionCache {
    blob: RwLock<Option<StoredSession>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionPersistence for MemorySessionCache {
    fn save(&self, session: &StoredSession) -> io::Result<()> {
        *self.blob.write().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> io::Result<Option<StoredSession>> {
        Ok(self.blob.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn clear(&self) -> io::Result<()> {
        *self.blob.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
