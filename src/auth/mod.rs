//! Authentication: credential checks, signed markers, cookie scopes

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use credentials::CredentialValidator;
pub use jwt::{Claims, MarkerCodec};
pub use middleware::{require_session, CookieScope, CookieSessionStore, RequestSession};
pub use models::{Credential, Permission, User, UserRole};
