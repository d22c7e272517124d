//! authz-core: shared authorization catalog and evaluator.
//!
//! Holds the closed role and permission enumerations, the canonical
//! role-to-permission table, the navigation tab catalog, and the pure
//! evaluator answering "can this session do X". Both the client session
//! crate and the server enforcement crate link this crate, so there is a
//! single table on both sides by construction.

pub mod claims;
pub mod evaluator;
pub mod permission;
pub mod role;
pub mod table;
pub mod tabs;

pub use claims::Claims;
pub use evaluator::{Action, Resource, ResourceContext, SessionView};
pub use permission::Permission;
pub use role::Role;
pub use tabs::Tab;
