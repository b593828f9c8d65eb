//! Middleware
//!
//! Este módulo contiene los middleware de la aplicación.

pub mod auth;
pub mod cors;

pub use auth::AuthenticatedUser;
