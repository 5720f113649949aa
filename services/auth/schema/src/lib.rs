//! sea-orm entities owned by the auth service.

pub mod oauth_connections;
pub mod profiles;
pub mod users;
