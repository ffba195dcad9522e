//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers delegate rules to `chooseme_core`, persistence to the
//! repositories in `chooseme_db`, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod admin_vehicles;
pub mod auth;
pub mod csv_import;
pub mod leads;
pub mod notifications;
pub mod photos;
pub mod vehicles;
