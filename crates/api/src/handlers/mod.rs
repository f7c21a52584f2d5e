//! Request handlers for the relay endpoints.
//!
//! Each submodule validates its input, calls the relevant provider from
//! [`AppState`](crate::state::AppState) and maps failures via
//! [`AppError`](crate::error::AppError).

pub mod advice;
pub mod tryon;
