//! Domain services: persistence, visibility, permission resolution,
//! authorization policy and the credential flow.

mod auth;
mod database;
pub mod error;
mod memory;
pub mod policy;
pub mod resolver;
mod store;
pub mod visibility;

pub use auth::{normalize_email, AuthService, IssuedToken};
pub use database::Database;
pub use error::AuthError;
pub use memory::MemoryStore;
pub use policy::{authorize, is_authorized, require, Action, Decision, Scope};
pub use resolver::resolve_effective_permissions;
pub use store::Store;
pub use visibility::ArchivedFilter;
