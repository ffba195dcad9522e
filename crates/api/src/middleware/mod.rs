//! Request extractors that guard routes.
//!
//! - [`admin::RequireAdmin`] -- requires a valid admin token in `x-admin-token`.
//! - [`admin::ClientIp`] -- the caller's IP from the proxy headers or the socket peer.

pub mod admin;
