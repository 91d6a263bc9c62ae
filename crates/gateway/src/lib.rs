//! HTTP boundary: the router, handlers, and the error-to-status mapping.
//!
//! Handlers are thin; everything interesting happens in the orchestrator
//! and comes back as an `IntegrationError` whose stable code drives the
//! response status.

pub mod error;
pub mod server;

pub use server::{AppState, build_app, serve};
