//! Core business logic for Expenza.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the approval workflow engine live here.
//!
//! # Modules
//!
//! - `workflow` - Approval workflow engine (rules, compiler, state machine)
//! - `currency` - Currency conversion math and rate snapshots
//! - `auth` - Password hashing and user roles

pub mod auth;
pub mod currency;
pub mod workflow;
