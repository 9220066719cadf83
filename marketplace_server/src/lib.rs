//! # Marketplace server
//! This module hosts the REST front-end for the marketplace settlement gateway. It is responsible for:
//! Authenticating users and issuing short-lived access tokens.
//! Exposing the RFQ, quote, order, QC and settlement flows over HTTP.
//! Fanning marketplace events out as notifications to the affected parties.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` and `POST /auth` are open. Everything under `/api` requires a valid access token in the
//! `tms_access_token` header; see [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
