//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod lead_repo;
pub mod vehicle_repo;

pub use lead_repo::LeadRepo;
pub use vehicle_repo::VehicleRepo;
