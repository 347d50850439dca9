//! User record storage.
//!
//! - **Turso/SQLite** via libsql: in-memory, local file, or remote (`turso` feature)
//! - [`UserStore`]: the trait the rest of the crate talks to

pub mod traits;
pub mod turso;

pub use traits::{DatabaseProvider, UserStore};
pub use turso::TursoClient;
