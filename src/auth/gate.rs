use super::password::{hash_blocking, verify_blocking, PasswordHasher};
use super::principal::Principal;
use crate::db::UserStore;
use crate::types::{AppError, Result, User};
use std::sync::{Arc, OnceLock};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Checks credentials against the user store and resolves principals.
pub struct AuthenticationGate {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: OnceLock<String>,
}

impl AuthenticationGate {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            hasher,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Validates a username (email) and password.
    ///
    /// Unknown users and wrong passwords fail with the same `AppError::Auth`
    /// so callers cannot tell which emails are registered.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal> {
        let Some(user) = self.store.get_user_by_email(username).await? else {
            // Spend a verification anyway so both failures take similar time.
            self.verify_against_dummy(password).await;
            tracing::debug!("login rejected: unknown user");
            return Err(invalid_credentials());
        };

        if user.password_hash.is_empty() {
            tracing::error!(user_id = user.id, "stored user has no password hash");
            return Err(invalid_credentials());
        }

        match verify_blocking(&self.hasher, password, &user.password_hash).await {
            Ok(true) => Ok(principal_for(&user)),
            Ok(false) => {
                tracing::debug!(user_id = user.id, "login rejected: wrong password");
                Err(invalid_credentials())
            }
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "stored password hash is unreadable");
                Err(invalid_credentials())
            }
        }
    }

    /// Resolves the principal for a token subject without checking a password.
    ///
    /// Fails with `NotFound` when the user no longer exists.
    pub async fn load_principal(&self, email: &str) -> Result<Principal> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.password_hash.is_empty() {
            return Err(AppError::Database(format!(
                "User {} has no password hash",
                user.id
            )));
        }

        Ok(principal_for(&user))
    }

    async fn verify_against_dummy(&self, password: &str) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => match hash_blocking(&self.hasher, "usher-timing-equaliser").await {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash),
                Err(_) => return,
            },
        };
        let _ = verify_blocking(&self.hasher, password, hash).await;
    }
}

fn invalid_credentials() -> AppError {
    AppError::Auth(INVALID_CREDENTIALS.to_string())
}

fn principal_for(user: &User) -> Principal {
    Principal {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::MockPasswordHasher;
    use crate::db::traits::MockUserStore;
    use crate::types::Role;
    use rstest::rstest;

    fn stored_user(role: Role, hash: &str) -> User {
        User {
            id: 1,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: hash.to_string(),
            role,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn gate(store: MockUserStore, hasher: MockPasswordHasher) -> AuthenticationGate {
        AuthenticationGate::new(Arc::new(store), Arc::new(hasher))
    }

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Admin)]
    #[tokio::test]
    async fn test_authenticate_returns_stored_role(#[case] role: Role) {
        let mut store = MockUserStore::new();
        store
            .expect_get_user_by_email()
            .times(1)
            .returning(move |_| Ok(Some(stored_user(role, "hashed"))));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().times(1).returning(|_, _| Ok(true));

        let principal = gate(store, hasher)
            .authenticate("test@example.com", "password")
            .await
            .expect("should authenticate");

        assert_eq!(principal.role, role);
        assert_eq!(principal.email, "test@example.com");
        assert_eq!(principal.user_id, 1);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let mut missing_store = MockUserStore::new();
        missing_store
            .expect_get_user_by_email()
            .returning(|_| Ok(None));
        let mut missing_hasher = MockPasswordHasher::new();
        missing_hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("dummy".to_string()));
        missing_hasher
            .expect_verify()
            .times(1)
            .returning(|_, _| Ok(false));

        let mut wrong_store = MockUserStore::new();
        wrong_store
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(Role::User, "hashed"))));
        let mut wrong_hasher = MockPasswordHasher::new();
        wrong_hasher.expect_verify().returning(|_, _| Ok(false));

        let missing = gate(missing_store, missing_hasher)
            .authenticate("nobody@example.com", "password")
            .await
            .unwrap_err();
        let wrong = gate(wrong_store, wrong_hasher)
            .authenticate("test@example.com", "nope")
            .await
            .unwrap_err();

        assert!(matches!(missing, AppError::Auth(_)));
        assert!(matches!(wrong, AppError::Auth(_)));
        assert_eq!(missing.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_dummy_hash_is_computed_once() {
        let mut store = MockUserStore::new();
        store.expect_get_user_by_email().returning(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("dummy".to_string()));
        hasher.expect_verify().times(3).returning(|_, _| Ok(false));

        let gate = gate(store, hasher);
        for _ in 0..3 {
            assert!(gate.authenticate("ghost@example.com", "pw").await.is_err());
        }
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_plain_auth_failure() {
        let mut store = MockUserStore::new();
        store
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(Role::User, "garbage"))));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .returning(|_, _| Err(AppError::Internal("bad hash".to_string())));

        let err = gate(store, hasher)
            .authenticate("test@example.com", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_empty_hash_never_authenticates() {
        let mut store = MockUserStore::new();
        store
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(Role::Admin, ""))));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().never();

        let err = gate(store, hasher)
            .authenticate("test@example.com", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_load_principal() {
        let mut store = MockUserStore::new();
        store
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(Role::Admin, "hashed"))));

        let principal = gate(store, MockPasswordHasher::new())
            .load_principal("test@example.com")
            .await
            .unwrap();
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_load_principal_for_deleted_user() {
        let mut store = MockUserStore::new();
        store.expect_get_user_by_email().returning(|_| Ok(None));

        let err = gate(store, MockPasswordHasher::new())
            .load_principal("deleted@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_principal_rejects_missing_hash() {
        let mut store = MockUserStore::new();
        store
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(stored_user(Role::User, ""))));

        let err = gate(store, MockPasswordHasher::new())
            .load_principal("test@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
