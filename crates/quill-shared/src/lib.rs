//! # Quill Shared
//!
//! Types shared between frontend and backend.
//! In a full-stack Rust setup, this crate is compiled for both server and
//! WASM; the theme controller lives here for exactly that reason.

pub mod dto;
pub mod response;
pub mod theme;

pub use response::{ApiResponse, ErrorResponse};
pub use theme::{Theme, ThemeController};
