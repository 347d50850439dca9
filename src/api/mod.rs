//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Usher, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions, middleware and CORS
//! - [`api::docs`](crate::api::docs) - OpenAPI document
//!
//! # API Endpoints
//!
//! ## Authentication
//! - `POST /auth/login` - Exchange email and password for a bearer token
//!
//! ## Users
//! - `POST /users` - Register a user (public; elevated roles need an administrator)
//! - `GET /users` - List users (USER or ADMIN)
//! - `GET /users/{id}` - Get a user (USER or ADMIN)
//! - `PUT /users/{id}` - Update a user (ADMIN)
//! - `DELETE /users/{id}` - Delete a user (ADMIN)
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Protected endpoints require a valid JWT token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! A missing or unusable token leaves the request anonymous; anonymous
//! requests to protected routes get `401`, authenticated requests lacking the
//! required role get `403`.
//!
//! # OpenAPI Documentation
//!
//! The document is served at `/api-docs/openapi.json`. When the `swagger-ui`
//! feature is enabled, interactive API documentation is available at
//! `/swagger-ui/`.

/// OpenAPI document.
pub mod docs;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
