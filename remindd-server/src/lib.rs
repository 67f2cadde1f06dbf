//! Library interface for the remindd server, exposing the HTTP API and
//! configuration so integration tests can run the server in-process.

pub mod api;
pub mod config;
