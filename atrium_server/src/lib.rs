//! # Atrium Back Office server
//!
//! This crate hosts the HTTP surface of the Atrium back office. It is responsible for:
//! * Issuing and verifying the signed access tokens that authenticate every protected request.
//! * Gating protected routes behind the bearer-token middleware and the role-based ACL
//!   middleware.
//! * The login flow, session revocation (logout, password change, admin-forced) and the related
//!   account routes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information. The process refuses to start without a valid token signing key.
//!
//! ## Routes
//! * `/health`: liveness probe, public.
//! * `/auth`: login, public.
//! * `/api/*`: everything else, behind the auth middleware; the user-management routes
//!   additionally require the admin role.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
