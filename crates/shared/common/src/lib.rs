//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - Unified error handling for the store client and the auth service
//! - Shared configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult};
