use nimbus_auth::error::AuthServiceError;
use nimbus_auth::password::verify_password;
use nimbus_auth::usecase::register::{RegisterInput, RegisterUseCase};

use crate::helpers::{MockEmailSender, MockUserRepo, test_user};

fn input(email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        email: email.to_owned(),
        password: password.to_owned(),
        display_name: Some("New User".to_owned()),
    }
}

#[tokio::test]
async fn should_register_unverified_user_and_send_verification_email() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::working();
    let usecase = RegisterUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    let user = usecase
        .execute(input("New.User@Example.com ", "Sup3rSecret"))
        .await
        .unwrap();

    assert_eq!(user.email, "new.user@example.com");
    assert!(!user.email_verified);
    assert!(user.is_active);
    assert!(verify_password("Sup3rSecret", user.password_hash.as_deref().unwrap()));

    let token = user.verification_token.clone().unwrap();
    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (to, _subject, html) = &sent[0];
    assert_eq!(to, "new.user@example.com");
    assert!(html.contains(&format!("https://app.example.com/verify-email/{token}")));

    assert_eq!(users.users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_duplicate_email() {
    let users = MockUserRepo::new(vec![test_user()]);
    let email = MockEmailSender::working();
    let usecase = RegisterUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    let result = usecase.execute(input("user@example.com", "Sup3rSecret")).await;
    assert!(matches!(result, Err(AuthServiceError::UserAlreadyExists)));
    assert!(email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_policy_violating_password() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::working();
    let usecase = RegisterUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    for bad in ["short1A", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
        let result = usecase.execute(input("new@example.com", bad)).await;
        assert!(
            matches!(result, Err(AuthServiceError::Validation(_))),
            "password {bad:?} should be rejected"
        );
    }
    assert!(users.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_email() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::working();
    let usecase = RegisterUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    let result = usecase.execute(input("not-an-email", "Sup3rSecret")).await;
    assert!(matches!(result, Err(AuthServiceError::Validation(_))));
}

#[tokio::test]
async fn should_roll_back_user_when_verification_email_fails() {
    let users = MockUserRepo::empty();
    let email = MockEmailSender::failing();
    let usecase = RegisterUseCase {
        users: &users,
        email: &email,
        frontend_origin: "https://app.example.com".to_owned(),
    };

    let result = usecase.execute(input("new@example.com", "Sup3rSecret")).await;
    assert!(matches!(result, Err(AuthServiceError::EmailVerificationFailed)));
    // All-or-nothing: no half-created account survives a send failure.
    assert!(users.users.lock().unwrap().is_empty());
}
