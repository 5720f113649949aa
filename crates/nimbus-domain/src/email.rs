//! Email normalization and shape validation.
//!
//! Every path that stores or looks up an email goes through
//! [`normalize_email`] so that `Alice@Example.COM ` and
//! `alice@example.com` resolve to the same account.

/// Lower-case and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal structural check: one `@`, non-empty local part, a dot in the
/// domain. Deliverability is the email provider's problem.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.contains(char::is_whitespace)
}
