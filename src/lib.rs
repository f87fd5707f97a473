//! Data-access layer for a campus social network.
//!
//! [`CampusHub`] opens the document store, blob store and identity service
//! and exposes one repository per feature. Operations that act for a user
//! take the [`Session`] returned by sign-in.

pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod identity;
pub mod models;
pub mod repos;
pub mod session;

#[cfg(test)]
mod test_support;

pub use error::{Error, ErrorKind, Result};
pub use hub::CampusHub;
pub use session::Session;
