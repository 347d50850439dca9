//! Route-level authorization.
//!
//! A static table maps `(method, path pattern)` to the access a route needs.
//! Rules are checked in order and the first match wins. Paths no rule covers
//! need an authenticated principal.
//!
//! Pattern segments:
//! - `users` matches literally
//! - `{id}` matches any single non-empty segment
//! - `*.html` matches a single segment with that suffix
//! - `**` matches everything that follows, including nothing

use super::principal::{Authority, Principal};
use crate::types::{AppError, Result, Role};
use axum::http::Method;

/// What a route requires from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyRole(Vec<Role>),
}

#[derive(Debug, Clone)]
struct Rule {
    method: Option<Method>,
    pattern: Vec<&'static str>,
    access: Access,
}

/// Ordered per-route access table.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<Rule>,
    fallback: Access,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RoutePolicy {
    /// Empty table; every path falls back to `fallback`.
    pub fn new(fallback: Access) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// The table for the user-management API.
    pub fn standard() -> Self {
        let readers = Access::AnyRole(vec![Role::User, Role::Admin]);
        let admins = Access::AnyRole(vec![Role::Admin]);

        Self::new(Access::Authenticated)
            // CORS preflight never carries credentials
            .rule(Some(Method::OPTIONS), "/**", Access::Public)
            .rule(Some(Method::POST), "/auth/login", Access::Public)
            .rule(Some(Method::POST), "/users", Access::Public)
            .rule(Some(Method::GET), "/health", Access::Public)
            .rule(None, "/api-docs/**", Access::Public)
            .rule(None, "/swagger-ui/**", Access::Public)
            .rule(None, "/*.html", Access::Public)
            .rule(None, "/css/**", Access::Public)
            .rule(None, "/js/**", Access::Public)
            .rule(Some(Method::GET), "/users", readers.clone())
            .rule(Some(Method::GET), "/users/{id}", readers)
            .rule(Some(Method::PUT), "/users/{id}", admins.clone())
            .rule(Some(Method::DELETE), "/users/{id}", admins)
    }

    /// Appends a rule. `method: None` matches every method.
    pub fn rule(mut self, method: Option<Method>, pattern: &'static str, access: Access) -> Self {
        self.rules.push(Rule {
            method,
            pattern: split_path(pattern),
            access,
        });
        self
    }

    /// Looks up the access required for a request.
    pub fn required_access(&self, method: &Method, path: &str) -> &Access {
        let segments = split_path(path);

        self.rules
            .iter()
            .find(|rule| {
                rule.method.as_ref().is_none_or(|m| m == method)
                    && pattern_matches(&rule.pattern, &segments)
            })
            .map(|rule| &rule.access)
            .unwrap_or(&self.fallback)
    }

    /// Decides whether `principal` may use a route needing `access`.
    ///
    /// A missing principal holds no roles: it gets `Unauthorized`, while a known
    /// principal without a matching authority gets `Forbidden`.
    pub fn authorize(principal: Option<&Principal>, access: &Access) -> Result<()> {
        match (access, principal) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::AnyRole(roles), Some(principal)) => {
                let required: Vec<Authority> = roles.iter().copied().map(Authority::from).collect();
                if principal.has_any_authority(&required) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden("Insufficient role".to_string()))
                }
            }
        }
    }

    /// Convenience wrapper over [`RoutePolicy::required_access`] and
    /// [`RoutePolicy::authorize`].
    pub fn check(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Result<()> {
        Self::authorize(principal, self.required_access(method, path))
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn pattern_matches(pattern: &[&str], segments: &[&str]) -> bool {
    match (pattern.split_first(), segments.split_first()) {
        (None, None) => true,
        (Some((&"**", _)), _) => true,
        (Some((p, rest_p)), Some((s, rest_s))) => {
            segment_matches(p, s) && pattern_matches(rest_p, rest_s)
        }
        _ => false,
    }
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    if pattern.starts_with('{') && pattern.ends_with('}') {
        return !segment.is_empty();
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return segment.len() > suffix.len() && segment.ends_with(suffix);
    }
    pattern == segment
}
