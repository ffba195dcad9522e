//! Pure domain logic for the Choose Me Auto dealership platform.
//!
//! Nothing in this crate touches the database, the network, or the
//! filesystem. The API server, the DB layer and the client-side workflow
//! crate all build on these types.

pub mod csv_import;
pub mod error;
pub mod gallery;
pub mod images;
pub mod leads;
pub mod lightbox;
pub mod login_throttle;
pub mod photos;
pub mod types;
pub mod vehicle;
