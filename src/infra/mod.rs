//! Host-facing plumbing: HTTP responses and telemetry bootstrap.

pub mod error;
pub mod http;
pub mod telemetry;
