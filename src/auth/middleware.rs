use super::gate::AuthenticationGate;
use super::jwt::TokenService;
use super::principal::Principal;
use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;

/// Why a request continues without a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousReason {
    /// No `Authorization: Bearer` header
    NoCredentials,
    /// Bad signature, wrong algorithm or malformed token
    InvalidToken,
    /// Correctly signed but past its expiry
    ExpiredToken,
    /// Token subject no longer exists in the store
    UnknownSubject,
    /// The store failed while resolving the subject
    LookupFailed,
}

/// Outcome of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(Principal),
    Anonymous(AnonymousReason),
}

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Maps a bearer token to a principal.
///
/// Every credential fault ends in `Resolution::Anonymous`; nothing here fails
/// the request.
pub async fn resolve_principal(
    tokens: &TokenService,
    gate: &AuthenticationGate,
    token: Option<&str>,
) -> Resolution {
    let Some(token) = token else {
        return Resolution::Anonymous(AnonymousReason::NoCredentials);
    };

    let subject = match tokens.extract_subject(token) {
        Ok(subject) => subject,
        Err(_) => return Resolution::Anonymous(AnonymousReason::InvalidToken),
    };

    match tokens.is_expired(token) {
        Ok(false) => {}
        Ok(true) => return Resolution::Anonymous(AnonymousReason::ExpiredToken),
        Err(_) => return Resolution::Anonymous(AnonymousReason::InvalidToken),
    }

    match gate.load_principal(&subject).await {
        Ok(principal) => Resolution::Authenticated(principal),
        Err(AppError::NotFound(_)) => Resolution::Anonymous(AnonymousReason::UnknownSubject),
        Err(e) => {
            tracing::warn!(error = %e, "principal lookup failed, continuing unauthenticated");
            Resolution::Anonymous(AnonymousReason::LookupFailed)
        }
    }
}

/// Attaches a [`Principal`] to the request when a usable bearer token is present.
///
/// A principal already present in the extensions is left alone.
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<Principal>().is_none() {
        let token = bearer_token(req.headers()).map(str::to_owned);

        match resolve_principal(&state.token_service, &state.gate, token.as_deref()).await {
            Resolution::Authenticated(principal) => {
                tracing::debug!(user_id = principal.user_id, role = %principal.role, "request authenticated");
                req.extensions_mut().insert(principal);
            }
            Resolution::Anonymous(reason) => {
                tracing::debug!(?reason, "request continues unauthenticated");
            }
        }
    }

    next.run(req).await
}

/// Rejects the request unless the route policy admits its principal.
pub async fn enforce_policy(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let decision = state.policy.check(
        req.method(),
        req.uri().path(),
        req.extensions().get::<Principal>(),
    );

    match decision {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::debug!(method = %req.method(), path = req.uri().path(), error = %e, "request denied");
            e.into_response()
        }
    }
}

/// Extractor for the authenticated principal.
///
/// Use `Option<AuthUser>` on routes that also serve anonymous callers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned().map(AuthUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::MockPasswordHasher;
    use crate::db::{TursoClient, UserStore};
    use crate::types::{NewUser, Role};
    use axum::http::HeaderValue;
    use std::sync::Arc;

    const SECRET: &str = "middleware-test-secret-at-least-32-chars";

    async fn setup() -> (TokenService, AuthenticationGate, Arc<TursoClient>) {
        let store = Arc::new(TursoClient::new_memory().await.unwrap());
        store
            .create_user(&NewUser {
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: "hashed".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let gate = AuthenticationGate::new(store.clone(), Arc::new(MockPasswordHasher::new()));
        let tokens = TokenService::new(SECRET, 900, 0).unwrap();
        (tokens, gate, store)
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[tokio::test]
    async fn test_valid_token_resolves_principal() {
        let (tokens, gate, _) = setup().await;
        let token = tokens.issue("admin@example.com").unwrap();

        match resolve_principal(&tokens, &gate, Some(&token)).await {
            Resolution::Authenticated(principal) => {
                assert_eq!(principal.email, "admin@example.com");
                assert_eq!(principal.role, Role::Admin);
            }
            other => panic!("expected principal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_anonymous() {
        let (tokens, gate, _) = setup().await;
        assert_eq!(
            resolve_principal(&tokens, &gate, None).await,
            Resolution::Anonymous(AnonymousReason::NoCredentials)
        );
    }

    #[tokio::test]
    async fn test_forged_token_is_anonymous() {
        let (tokens, gate, _) = setup().await;
        let forger = TokenService::new("some-other-secret-that-is-32-chars!", 900, 0).unwrap();
        let forged = forger.issue("admin@example.com").unwrap();

        assert_eq!(
            resolve_principal(&tokens, &gate, Some(&forged)).await,
            Resolution::Anonymous(AnonymousReason::InvalidToken)
        );
        assert_eq!(
            resolve_principal(&tokens, &gate, Some("garbage")).await,
            Resolution::Anonymous(AnonymousReason::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous() {
        let (_, gate, _) = setup().await;
        let tokens = TokenService::new(SECRET, 0, 0).unwrap();
        let token = tokens.issue("admin@example.com").unwrap();

        assert_eq!(
            resolve_principal(&tokens, &gate, Some(&token)).await,
            Resolution::Anonymous(AnonymousReason::ExpiredToken)
        );
    }

    #[tokio::test]
    async fn test_deleted_user_is_anonymous() {
        let (tokens, gate, store) = setup().await;
        let token = tokens.issue("admin@example.com").unwrap();
        let user = store
            .get_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        store.delete_user(user.id).await.unwrap();

        assert_eq!(
            resolve_principal(&tokens, &gate, Some(&token)).await,
            Resolution::Anonymous(AnonymousReason::UnknownSubject)
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_anonymous() {
        let mut store = crate::db::traits::MockUserStore::new();
        store
            .expect_get_user_by_email()
            .returning(|_| Err(AppError::Database("connection lost".to_string())));
        let gate = AuthenticationGate::new(Arc::new(store), Arc::new(MockPasswordHasher::new()));
        let tokens = TokenService::new(SECRET, 900, 0).unwrap();
        let token = tokens.issue("admin@example.com").unwrap();

        assert_eq!(
            resolve_principal(&tokens, &gate, Some(&token)).await,
            Resolution::Anonymous(AnonymousReason::LookupFailed)
        );
    }
}
