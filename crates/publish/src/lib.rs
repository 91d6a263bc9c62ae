//! Platform publishing: caption assembly, media validation, and the
//! provider publish call.
//!
//! The publisher is deliberately side-effect free beyond its outbound HTTP
//! calls — persisting the publish outcome belongs to the orchestrator, so
//! this crate can be tested in isolation against a mocked transport.

pub mod caption;
pub mod error;
pub mod instagram;
pub mod platform;
pub mod publisher;

pub use {
    caption::{format_caption, validate_media_url},
    error::PublishError,
    instagram::InstagramPublisher,
    platform::Platform,
    publisher::{DemoPublisher, MediaPublisher, PublishRequest, PublishedPost},
};
