//! GreenGrid energy prediction service
//!
//! Library surface for the server binary, exposed so integration tests can
//! build the router and application state without binding a socket.

pub mod api;
pub mod config;
