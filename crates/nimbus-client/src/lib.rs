//! Client-side session plumbing for the auth service.
//!
//! The centerpiece is [`RefreshCoordinator`]: every API call goes
//! through it, and when a call fails because the access token expired,
//! exactly one refresh round-trip runs no matter how many calls hit the
//! expiry at once. The rest ([`AuthApi`]) is a thin reqwest wrapper that
//! keeps the session cookies in a cookie store.

#![allow(async_fn_in_trait)]

pub mod coordinator;
pub mod error;
pub mod http;

pub use coordinator::{RefreshCoordinator, RefreshTransport};
pub use error::ClientError;
pub use http::AuthApi;
