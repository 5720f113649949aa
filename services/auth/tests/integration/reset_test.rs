use chrono::{Duration, Utc};

use nimbus_auth::domain::types::AuthUser;
use nimbus_auth::error::AuthServiceError;
use nimbus_auth::password::verify_password;
use nimbus_auth::usecase::reset::{ForgotPasswordUseCase, ResetPasswordUseCase};

use crate::helpers::{MockEmailSender, MockUserRepo, TEST_PASSWORD, test_user};

fn user_with_reset_token(token: &str) -> AuthUser {
    AuthUser {
        reset_token: Some(token.to_owned()),
        reset_token_expires_at: Some(Utc::now() + Duration::hours(1)),
        ..test_user()
    }
}

// ── ForgotPasswordUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_reset_token_and_email_the_link() {
    let users = MockUserRepo::new(vec![test_user()]);
    let email = MockEmailSender::working();
    let usecase = ForgotPasswordUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    usecase.execute("User@example.com ").await.unwrap();

    let stored = users.users.lock().unwrap()[0].clone();
    let token = stored.reset_token.unwrap();
    assert!(stored.reset_token_expires_at.unwrap() > Utc::now());

    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].2.contains(&format!("https://app.example.com/reset-password/{token}")));
}

#[tokio::test]
async fn should_answer_generically_for_unknown_email() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::working();
    let usecase = ForgotPasswordUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    usecase.execute("ghost@example.com").await.unwrap();
    assert!(email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_swallow_email_failure_without_leaking_it() {
    let users = MockUserRepo::new(vec![test_user()]);
    let email = MockEmailSender::failing();
    let usecase = ForgotPasswordUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    // Same generic answer as the unknown-email path.
    usecase.execute("user@example.com").await.unwrap();
}

// ── ResetPasswordUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_and_kill_every_session() {
    let user = AuthUser {
        refresh_token: Some("live-session".to_owned()),
        refresh_token_expires_at: Some(Utc::now() + Duration::days(3)),
        ..user_with_reset_token("rst-123")
    };
    let users = MockUserRepo::new(vec![user]);
    let usecase = ResetPasswordUseCase { users: &users };

    let before = Utc::now();
    usecase.execute("rst-123", "Fresh1Password").await.unwrap();

    let stored = users.users.lock().unwrap()[0].clone();
    assert!(verify_password("Fresh1Password", stored.password_hash.as_deref().unwrap()));
    assert!(!verify_password(TEST_PASSWORD, stored.password_hash.as_deref().unwrap()));
    // Token consumed, refresh session revoked, watermark stamped.
    assert!(stored.reset_token.is_none());
    assert!(stored.refresh_token.is_none());
    assert!(stored.last_token_invalidation.unwrap() >= before);
}

#[tokio::test]
async fn should_reject_unknown_reset_token() {
    let users = MockUserRepo::new(vec![user_with_reset_token("rst-123")]);
    let usecase = ResetPasswordUseCase { users: &users };

    let result = usecase.execute("rst-999", "Fresh1Password").await;
    assert!(matches!(result, Err(AuthServiceError::InvalidResetToken)));
}

#[tokio::test]
async fn should_reject_expired_reset_token() {
    let user = AuthUser {
        reset_token_expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..user_with_reset_token("rst-123")
    };
    let users = MockUserRepo::new(vec![user]);
    let usecase = ResetPasswordUseCase { users: &users };

    let result = usecase.execute("rst-123", "Fresh1Password").await;
    assert!(matches!(result, Err(AuthServiceError::ResetTokenExpired)));
}

#[tokio::test]
async fn should_apply_password_policy_to_the_new_password() {
    let users = MockUserRepo::new(vec![user_with_reset_token("rst-123")]);
    let usecase = ResetPasswordUseCase { users: &users };

    let result = usecase.execute("rst-123", "weak").await;
    assert!(matches!(result, Err(AuthServiceError::Validation(_))));

    // Old password still works; nothing was cleared.
    let stored = users.users.lock().unwrap()[0].clone();
    assert!(verify_password(TEST_PASSWORD, stored.password_hash.as_deref().unwrap()));
    assert!(stored.reset_token.is_some());
}
