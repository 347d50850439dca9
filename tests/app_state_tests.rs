//! Startup wiring: building state from configuration and seeding the
//! initial administrator.

use usher::{
    types::Role,
    utils::toml_config::InitialAdminConfig,
    AppError, AppState, UsherConfig,
};

fn memory_config(secret_env: &str) -> UsherConfig {
    let mut config = UsherConfig::from_toml_str(
        r#"
        [auth.password]
        memory_kib = 8
        iterations = 1
        parallelism = 1

        [database]
        url = ":memory:"
        "#,
    )
    .unwrap();
    config.auth.jwt_secret_env = secret_env.to_string();
    config
}

#[tokio::test]
async fn test_missing_secret_fails_startup() {
    let config = memory_config("USHER_STATE_TEST_UNSET_SECRET");

    let result = AppState::from_config(config).await;
    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn test_from_config_builds_working_state() {
    std::env::set_var(
        "USHER_STATE_TEST_SECRET",
        "state-test-signing-key-0123456789abcdef",
    );
    let config = memory_config("USHER_STATE_TEST_SECRET");

    let state = AppState::from_config(config).await.unwrap();
    let token = state.token_service.issue("someone@example.com").unwrap();
    assert_eq!(
        state.token_service.extract_subject(&token).unwrap(),
        "someone@example.com"
    );
    assert!(state.store.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_initial_admin_is_seeded_once() {
    std::env::set_var(
        "USHER_STATE_TEST_SEED_SECRET",
        "state-test-signing-key-0123456789abcdef",
    );
    std::env::set_var("USHER_STATE_TEST_ADMIN_PASSWORD", "bootstrap-pw");
    let mut config = memory_config("USHER_STATE_TEST_SEED_SECRET");
    config.auth.initial_admin = Some(InitialAdminConfig {
        email: "root@example.com".to_string(),
        name: "Root".to_string(),
        password_env: "USHER_STATE_TEST_ADMIN_PASSWORD".to_string(),
    });

    let state = AppState::from_config(config).await.unwrap();
    let principal = state
        .gate
        .authenticate("root@example.com", "bootstrap-pw")
        .await
        .unwrap();
    assert_eq!(principal.role, Role::Admin);

    state.ensure_initial_admin().await.unwrap();
    assert_eq!(state.store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_initial_admin_without_password_fails_startup() {
    std::env::set_var(
        "USHER_STATE_TEST_NOPW_SECRET",
        "state-test-signing-key-0123456789abcdef",
    );
    let mut config = memory_config("USHER_STATE_TEST_NOPW_SECRET");
    config.auth.initial_admin = Some(InitialAdminConfig {
        email: "root@example.com".to_string(),
        name: "Root".to_string(),
        password_env: "USHER_STATE_TEST_ADMIN_PASSWORD_UNSET".to_string(),
    });

    let result = AppState::from_config(config).await;
    assert!(matches!(result, Err(AppError::Configuration(_))));
}
