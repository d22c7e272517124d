//! session-store: client-side session model and authorization gate.
//!
//! Owns the process-wide session: restoring a persisted identity, driving
//! login/signup/logout against the auth backend, consuming the backend's
//! identity-change stream, and publishing atomic session snapshots that
//! the UI gate evaluates reactively.

pub mod backend;
pub mod gate;
pub mod identity;
pub mod memory;
pub mod persistence;
pub mod store;

pub use backend::{AuthBackend, AuthError, IdentityEvent, Subscription};
pub use gate::{GateDecision, GateRequirement, RouteGate};
pub use identity::Identity;
pub use memory::{MemoryAuthBackend, MemorySessionCache};
pub use persistence::{FileSessionCache, SessionPersistence, StoredSession};
pub use store::{SessionSnapshot, SessionStore};
