//! # Quill Core
//!
//! The domain layer of the quill blog engine.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod ports;
pub mod slug;

pub use error::{DomainError, ValidationErrors};
pub use lifecycle::PostLifecycle;
