pub mod auth;
pub mod rate_limit;

pub use auth::{AuthContext, require_auth};
pub use rate_limit::{auth_rate_limit, global_rate_limit};
