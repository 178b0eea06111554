//! Shared types, configuration, and services for Expenza.
//!
//! This crate holds the pieces every other crate needs:
//! - Application configuration (`AppConfig`)
//! - The application-wide error taxonomy (`AppError`)
//! - JWT claims and token service
//! - Email notification service

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;

pub use auth::Claims;
pub use config::{AppConfig, DatabaseConfig, EmailConfig, JwtConfig, RatesConfig, ServerConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
