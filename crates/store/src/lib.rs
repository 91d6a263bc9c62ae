//! Persistence boundary for users and campaigns.
//!
//! The orchestrator consumes these traits; the sqlite implementations keep
//! every state transition a single-row write so no half-connected or
//! half-published state is ever observable to concurrent readers.

pub mod campaign;
pub mod schema;
pub mod types;
pub mod user;

pub use {
    campaign::{CampaignStore, SqliteCampaignStore},
    schema::init_schema,
    types::{Campaign, CampaignStatus, Connection, User},
    user::{SqliteUserStore, UserStore},
};
