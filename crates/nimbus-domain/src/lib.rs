//! Domain types shared between the auth service and the API client.
//!
//! Pure types only: no database, HTTP, or framework dependencies.

pub mod email;
pub mod user;
