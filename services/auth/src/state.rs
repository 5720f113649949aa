use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use nimbus_auth_types::cookie::CookiePolicy;

use crate::infra::cache::RedisRateLimitStore;
use crate::infra::db::{DbConnectionRepository, DbProfileRepository, DbUserRepository};
use crate::infra::email::HttpEmailSender;
use crate::oauth::github::GitHubOAuth;
use crate::oauth::google::GoogleOAuth;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub jwt_secret: String,
    pub cookies: CookiePolicy,
    pub frontend_origin: String,
    pub google: GoogleOAuth,
    pub github: GitHubOAuth,
    pub email: HttpEmailSender,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn profile_repo(&self) -> DbProfileRepository {
        DbProfileRepository {
            db: self.db.clone(),
        }
    }

    pub fn connection_repo(&self) -> DbConnectionRepository {
        DbConnectionRepository {
            db: self.db.clone(),
        }
    }

    pub fn rate_limits(&self) -> RedisRateLimitStore {
        RedisRateLimitStore {
            pool: self.redis.clone(),
        }
    }
}
