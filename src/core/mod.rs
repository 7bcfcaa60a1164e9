//! Core types and functionality for viewmill
//!
//! This module forms the foundation of viewmill's type system. It defines the
//! error contracts used throughout the codebase.
//!
//! # Error Management
//!
//! viewmill uses an error handling system designed for both developer ergonomics
//! and end-user experience:
//! - **Strongly-typed errors** ([`ViewmillError`]) for precise error handling in code
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//! - **Automatic error conversion** from common library errors
//! - **Contextual suggestions** tailored to specific error conditions
//!
//! Configuration and validation errors are fatal to the registry build; lookup,
//! access, and provider errors are scoped to a single render call. See
//! [`error`] for the full taxonomy.

pub mod error;

pub use error::{ErrorContext, IntoAnyhowWithContext, ViewmillError, user_friendly_error};
