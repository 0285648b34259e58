//! HTTP API: server configuration, routing, and request/response mapping.
//!
//! A thin adapter over the order workflow; no workflow logic lives here.

pub mod app;
pub mod config;
pub mod middleware;
