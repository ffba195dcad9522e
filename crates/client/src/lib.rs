//! Client side of the Choose Me Auto admin panel.
//!
//! - [`ApiClient`]: typed reqwest client for the REST API.
//! - [`AdminSession`] / [`SessionStore`]: the logged-in admin token and
//!   where it is persisted between runs.
//! - [`ImportWorkflow`]: the CSV import dialog as a state machine.
//! - [`create_listing`]: create a vehicle, then upload its photos.

pub mod api;
pub mod config;
pub mod error;
pub mod import_workflow;
pub mod listing;
pub mod session;

pub use api::{ApiClient, ImportApi, ListingApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use import_workflow::{ImportStep, ImportWorkflow};
pub use listing::{create_listing, ListingOutcome, PhotoOutcome};
pub use session::{AdminSession, SessionStore};
