use chrono::{Duration, Utc};

use nimbus_auth::domain::types::AuthUser;
use nimbus_auth::error::AuthServiceError;
use nimbus_auth::usecase::verify_email::{ResendVerificationUseCase, VerifyEmailUseCase};
use nimbus_auth_types::token::validate_access_token;

use crate::helpers::{
    MockEmailSender, MockProfileRepo, MockUserRepo, TEST_JWT_SECRET, test_user, unverified_user,
};

// ── VerifyEmailUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_email_and_auto_login() {
    let user = unverified_user("tok-123");
    let users = MockUserRepo::new(vec![user.clone()]);
    let profiles = MockProfileRepo::empty();
    let usecase = VerifyEmailUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let out = usecase.execute("tok-123").await.unwrap();

    assert!(out.user.email_verified);
    validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();

    let stored = users.users.lock().unwrap()[0].clone();
    assert!(stored.email_verified);
    // Single-use: the token columns are cleared in the same update.
    assert!(stored.verification_token.is_none());
    assert_eq!(stored.refresh_token.as_deref(), Some(out.refresh_token.as_str()));

    // First login of the account.
    let profile = profiles.profiles.lock().unwrap()[0].clone();
    assert_eq!(profile.login_count, 1);
}

#[tokio::test]
async fn should_reject_unknown_verification_token() {
    let users = MockUserRepo::new(vec![unverified_user("tok-123")]);
    let profiles = MockProfileRepo::empty();
    let usecase = VerifyEmailUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute("tok-999").await;
    assert!(matches!(result, Err(AuthServiceError::InvalidVerificationToken)));
}

#[tokio::test]
async fn should_reject_expired_verification_token() {
    let user = AuthUser {
        verification_token_expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..unverified_user("tok-123")
    };
    let users = MockUserRepo::new(vec![user]);
    let profiles = MockProfileRepo::empty();
    let usecase = VerifyEmailUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute("tok-123").await;
    assert!(matches!(result, Err(AuthServiceError::VerificationTokenExpired)));
    assert!(!users.users.lock().unwrap()[0].email_verified);
}

#[tokio::test]
async fn should_keep_login_count_when_already_verified() {
    // Double-click on the verification link: the second call re-runs
    // after the first one consumed the token but this row kept it
    // (e.g. resend raced). Count is not reset.
    let user = AuthUser {
        email_verified: true,
        verification_token: Some("tok-123".to_owned()),
        verification_token_expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..test_user()
    };
    let users = MockUserRepo::new(vec![user.clone()]);
    let mut profile = crate::helpers::test_profile(user.id);
    profile.login_count = 7;
    let profiles = MockProfileRepo::new(vec![profile]);
    let usecase = VerifyEmailUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let out = usecase.execute("tok-123").await.unwrap();
    assert!(out.user.email_verified);
    assert_eq!(profiles.profiles.lock().unwrap()[0].login_count, 8);
}

// ── ResendVerificationUseCase ────────────────────────────────────────────────

#[tokio::test]
async fn should_overwrite_outstanding_token_on_resend() {
    let users = MockUserRepo::new(vec![unverified_user("tok-old")]);
    let email = MockEmailSender::working();
    let usecase = ResendVerificationUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    usecase.execute("user@example.com").await.unwrap();

    let stored = users.users.lock().unwrap()[0].clone();
    let new_token = stored.verification_token.unwrap();
    // Overwrite, never append: the old link is dead.
    assert_ne!(new_token, "tok-old");

    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].2.contains(&new_token));
}

#[tokio::test]
async fn should_answer_generically_for_unknown_email() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::working();
    let usecase = ResendVerificationUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    // No error, no email: the endpoint gives away nothing.
    usecase.execute("ghost@example.com").await.unwrap();
    assert!(email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_skip_resend_for_verified_account() {
    let users = MockUserRepo::new(vec![test_user()]);
    let email = MockEmailSender::working();
    let usecase = ResendVerificationUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    usecase.execute("user@example.com").await.unwrap();
    assert!(email.sent.lock().unwrap().is_empty());
}
