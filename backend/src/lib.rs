//! # Brokerdesk
//!
//! Back office for an insurance brokerage.
//!
//! The crate keeps the brokerage's client and policy portfolio, derives
//! commissions from activated policies, posts double-entry movements to a
//! financial ledger and reconciles them against imported bank statements.
//! Claims, the appointment agenda and the sales pipeline round out the daily
//! operations. A REST API is exposed via Axum for the web frontend.
//!
//! ## Architecture
//!
//! - [`models`]: Domain records and their typed identifiers
//! - [`db`]: Repository traits, backends (in-memory, hosted REST) and workflows
//! - [`services`]: Pure computations: filters, KPIs, validation, messages
//! - [`auth`]: Rate-limited sign-in, sign-up and password recovery
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
