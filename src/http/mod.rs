//! HTTP client module
//!
//! Sends case payloads to the endpoints under comparison.

mod client;

pub use client::EndpointClient;
