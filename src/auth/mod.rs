//! Authentication and Authorization
//!
//! This module holds the security core of the Usher API: password hashing,
//! stateless JWT sessions, credential checks, the per-request principal
//! filter and the route policy.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id hashing behind the `PasswordHasher` trait
//! - [`auth::jwt`](crate::auth::jwt) - Token issue, signature check and expiry check
//! - [`auth::gate`](crate::auth::gate) - Username/password authentication and principal lookup
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and extractors
//! - [`auth::policy`](crate::auth::policy) - Static per-route role requirements
//! - [`auth::principal`](crate::auth::principal) - Request principal and role-to-authority mapping
//!
//! # Request Flow
//!
//! ```text
//! request ─▶ authenticate_request ─▶ enforce_policy ─▶ handler
//!            (attach Principal?)      (401 / 403?)
//! ```
//!
//! A bad, expired or orphaned token never fails a request by itself; the request
//! simply continues without a principal and the policy decides whether the route
//! can be served anonymously.
//!
//! # Configuration
//!
//! Configure via `usher.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"  # Name of the env var holding the signing key
//! token_ttl_secs = 3600          # Token validity
//! leeway_secs = 0                # Clock skew tolerance
//! ```

/// Username/password authentication and principal lookup.
pub mod gate;
/// JWT token issue and validation.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing.
pub mod password;
/// Per-route authorization table.
pub mod policy;
/// Request principal and authorities.
pub mod principal;

pub use gate::AuthenticationGate;
pub use jwt::TokenService;
pub use password::{hash_blocking, verify_blocking, Argon2Cost, Argon2Hasher, PasswordHasher};
pub use policy::{Access, RoutePolicy};
pub use principal::{Authority, Principal};
