//! Integration orchestrator: connects the credential vault, OAuth
//! exchange, stores, and publisher behind one service type.
//!
//! This crate owns the end-to-end flows (connect, disconnect, publish) and
//! the error taxonomy the HTTP layer exposes. It talks to collaborators
//! only through their traits so every flow is testable with mocks.

pub mod error;
pub mod service;

pub use {
    error::{IntegrationError, Result},
    service::{AuthorizationUrl, ConnectionResult, IntegrationService},
};
