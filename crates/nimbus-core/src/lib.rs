//! Shared service plumbing: response envelope, health handlers,
//! request-id middleware, tracing init.

pub mod health;
pub mod middleware;
pub mod response;
pub mod tracing;
