//! OAuth authorization-code exchange for external providers.
//!
//! Covers the server side of the connect flow: building the provider
//! authorization URL, verifying the signed `state` round-tripped through
//! the redirect, exchanging the code for an access token, and fetching the
//! authorized account's identity. Token storage is the caller's concern.

pub mod error;
pub mod exchange;
pub mod state;
pub mod types;

pub use {
    error::{OAuthError, Result},
    exchange::{DemoExchange, HttpExchange, TokenExchange},
    state::StateSigner,
    types::{ExchangedToken, Provider, ProviderConfig, ProviderIdentity},
};
