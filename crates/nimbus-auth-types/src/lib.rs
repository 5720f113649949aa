//! Auth types shared between the auth service and the API client.
//!
//! Provides JWT claim validation and the cookie policy builders.

pub mod cookie;
pub mod token;
