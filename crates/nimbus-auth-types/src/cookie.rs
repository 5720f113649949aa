//! Cookie builders for the session and OAuth-state cookies.
//!
//! Cookie names carry an environment-specific prefix so staging and
//! production deployments under one parent domain never clobber each
//! other. Production cookies are `Secure; SameSite=None` (the frontend
//! is served from a different origin); everything else is `SameSite=Lax`
//! and non-secure so local HTTP development works.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Access-token JWT and cookie lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: u64 = 900;

/// Refresh-token JWT and cookie lifetime in seconds (7 days).
pub const REFRESH_TOKEN_TTL_SECS: u64 = 604_800;

/// OAuth state-nonce cookie lifetime in seconds (10 minutes).
pub const OAUTH_STATE_TTL_SECS: u64 = 600;

/// Per-deployment cookie attributes, derived from service config once
/// at startup and shared through app state.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    /// Environment-specific name prefix, e.g. `"nimbus_"`.
    pub prefix: String,
    /// Cookie Domain attribute (root domain, e.g. `"example.com"`).
    pub domain: String,
    /// True in production: `Secure` + `SameSite=None`.
    pub secure: bool,
}

impl CookiePolicy {
    pub fn access_token_name(&self) -> String {
        format!("{}access_token", self.prefix)
    }

    pub fn refresh_token_name(&self) -> String {
        format!("{}refresh_token", self.prefix)
    }

    pub fn oauth_state_name(&self) -> String {
        format!("{}oauth_state", self.prefix)
    }

    fn build(&self, name: String, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .domain(self.domain.clone())
            .max_age(Duration::seconds(max_age_secs))
            .http_only(true)
            .secure(self.secure)
            .same_site(if self.secure {
                SameSite::None
            } else {
                SameSite::Lax
            })
            .build()
    }

    /// Set the access-token cookie on the jar.
    ///
    /// ```
    /// use axum_extra::extract::cookie::CookieJar;
    /// use nimbus_auth_types::cookie::CookiePolicy;
    ///
    /// let policy = CookiePolicy {
    ///     prefix: "nimbus_".into(),
    ///     domain: "example.com".into(),
    ///     secure: true,
    /// };
    /// let jar = policy.set_access_token(CookieJar::new(), "token_value".into());
    /// let cookie = jar.get("nimbus_access_token").unwrap();
    /// assert_eq!(cookie.path(), Some("/"));
    /// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
    /// assert!(cookie.http_only().unwrap_or(false));
    /// assert!(cookie.secure().unwrap_or(false));
    /// ```
    pub fn set_access_token(&self, jar: CookieJar, value: String) -> CookieJar {
        jar.add(self.build(
            self.access_token_name(),
            value,
            ACCESS_TOKEN_TTL_SECS as i64,
        ))
    }

    /// Set the refresh-token cookie on the jar.
    pub fn set_refresh_token(&self, jar: CookieJar, value: String) -> CookieJar {
        jar.add(self.build(
            self.refresh_token_name(),
            value,
            REFRESH_TOKEN_TTL_SECS as i64,
        ))
    }

    /// Set the OAuth CSRF state cookie on the jar.
    pub fn set_oauth_state(&self, jar: CookieJar, value: String) -> CookieJar {
        jar.add(self.build(self.oauth_state_name(), value, OAUTH_STATE_TTL_SECS as i64))
    }

    /// Clear both session cookies by setting Max-Age to 0.
    ///
    /// ```
    /// use axum_extra::extract::cookie::CookieJar;
    /// use nimbus_auth_types::cookie::CookiePolicy;
    ///
    /// let policy = CookiePolicy {
    ///     prefix: "nimbus_".into(),
    ///     domain: "example.com".into(),
    ///     secure: false,
    /// };
    /// let jar = policy.set_access_token(CookieJar::new(), "a".into());
    /// let jar = policy.set_refresh_token(jar, "r".into());
    /// let jar = policy.clear_session(jar);
    /// assert_eq!(jar.get("nimbus_access_token").unwrap().max_age(), Some(time::Duration::ZERO));
    /// assert_eq!(jar.get("nimbus_refresh_token").unwrap().max_age(), Some(time::Duration::ZERO));
    /// ```
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        let access = self.build(self.access_token_name(), String::new(), 0);
        let refresh = self.build(self.refresh_token_name(), String::new(), 0);
        jar.add(access).add(refresh)
    }

    /// Clear the OAuth state cookie once the callback has consumed it.
    pub fn clear_oauth_state(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(self.oauth_state_name(), String::new(), 0))
    }
}
