//! Repository implementations module.
//!
//! This module contains the implementations of the repository traits:
//! - `local`: In-memory implementation for unit testing and local development
//! - `rest`: Hosted backend over PostgREST and `/rpc` procedures
#[cfg(feature = "local-repo")]
pub mod local;
#[cfg(feature = "rest-repo")]
pub mod rest;

#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
#[cfg(feature = "rest-repo")]
pub use rest::{RestConfig, RestRepository};
