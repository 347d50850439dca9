//! Shared fixtures for integration tests.
//!
//! Builds the full application over an in-memory store and exposes helpers to
//! seed users and mint tokens.

#![allow(dead_code)]

use axum_test::TestServer;
use std::sync::Arc;
use usher::{
    api::routes::create_app,
    auth::password::Argon2Cost,
    db::TursoClient,
    types::{NewUser, Result, Role, User},
    AppState, Argon2Hasher, PasswordHasher, TokenService, UserStore, UsherConfig,
};

pub const SECRET: &str = "integration-test-signing-key-0123456789";

/// Argon2 with the smallest legal cost, so seeding stays fast.
pub fn cheap_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(
        Argon2Hasher::new(Argon2Cost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid argon2 params"),
    )
}

/// Hasher that always produces the literal `"hashed"` and accepts any
/// password against it.
pub struct StubHasher;

impl PasswordHasher for StubHasher {
    fn hash(&self, _password: &str) -> Result<String> {
        Ok("hashed".to_string())
    }

    fn verify(&self, _password: &str, hash: &str) -> Result<bool> {
        Ok(hash == "hashed")
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(UsherConfig::default(), cheap_hasher()).await
    }

    pub async fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self::build(UsherConfig::default(), hasher).await
    }

    pub async fn with_config(config: UsherConfig) -> Self {
        Self::build(config, cheap_hasher()).await
    }

    async fn build(config: UsherConfig, hasher: Arc<dyn PasswordHasher>) -> Self {
        let store = Arc::new(
            TursoClient::new_memory()
                .await
                .expect("Failed to create in-memory database"),
        );
        let tokens = TokenService::new(SECRET, 3600, 0).expect("token service");
        let state = AppState::new(config, store, tokens, hasher);
        let app = create_app(state.clone()).expect("app");

        Self {
            server: TestServer::new(app).expect("Failed to create test server"),
            state,
        }
    }

    pub async fn seed_user(&self, email: &str, password: &str, role: Role) -> User {
        let password_hash = self.state.password_hasher.hash(password).expect("hash");
        self.state
            .store
            .create_user(&NewUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .expect("seed user")
    }

    pub fn token_for(&self, email: &str) -> String {
        self.state.token_service.issue(email).expect("issue token")
    }

    /// Seeds a user with the given role and returns a token for it.
    pub async fn login_as(&self, email: &str, role: Role) -> String {
        self.seed_user(email, "password", role).await;
        self.token_for(email)
    }
}
