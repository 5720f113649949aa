use nimbus_auth::error::AuthServiceError;
use nimbus_auth::usecase::login::{LoginInput, LoginUseCase};
use nimbus_auth_types::token::{validate_access_token, validate_refresh_token};

use crate::helpers::{MockProfileRepo, MockUserRepo, TEST_JWT_SECRET, TEST_PASSWORD, test_profile, test_user};

fn input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[tokio::test]
async fn should_login_with_valid_credentials() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let mut profile = test_profile(user.id);
    profile.login_count = 3;
    let profiles = MockProfileRepo::new(vec![profile]);
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let out = usecase
        .execute(input(" User@Example.COM", TEST_PASSWORD))
        .await
        .unwrap();

    assert_eq!(out.user.id, user.id);

    let access = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(access.user_id, user.id);
    assert_eq!(access.expires_at, out.access_token_exp);

    let refresh = validate_refresh_token(&out.refresh_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(refresh.user_id, user.id);

    // Refresh token mirrored onto the user row.
    let stored = users.users.lock().unwrap()[0].clone();
    assert_eq!(stored.refresh_token.as_deref(), Some(out.refresh_token.as_str()));
    assert!(stored.refresh_token_expires_at.is_some());

    // Activity counters bumped, not reset.
    let profile = profiles.profiles.lock().unwrap()[0].clone();
    assert_eq!(profile.login_count, 4);
    assert!(profile.last_successful_login.is_some());
}

#[tokio::test]
async fn should_reject_unknown_email() {
    let users = MockUserRepo::empty();
    let profiles = MockProfileRepo::empty();
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute(input("ghost@example.com", TEST_PASSWORD)).await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_reject_wrong_password() {
    let users = MockUserRepo::new(vec![test_user()]);
    let profiles = MockProfileRepo::empty();
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute(input("user@example.com", "Wrong1password")).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    assert!(users.users.lock().unwrap()[0].refresh_token.is_none());
}

#[tokio::test]
async fn should_reject_password_login_for_oauth_only_account() {
    let user = nimbus_auth::domain::types::AuthUser {
        password_hash: None,
        ..test_user()
    };
    let users = MockUserRepo::new(vec![user]);
    let profiles = MockProfileRepo::empty();
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute(input("user@example.com", TEST_PASSWORD)).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_reject_unverified_email_before_issuing_tokens() {
    let user = nimbus_auth::domain::types::AuthUser {
        email_verified: false,
        ..test_user()
    };
    let users = MockUserRepo::new(vec![user]);
    let profiles = MockProfileRepo::empty();
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute(input("user@example.com", TEST_PASSWORD)).await;
    assert!(matches!(result, Err(AuthServiceError::EmailNotVerified)));
    assert!(users.users.lock().unwrap()[0].refresh_token.is_none());
}

#[tokio::test]
async fn should_reject_disabled_account() {
    let user = nimbus_auth::domain::types::AuthUser {
        is_active: false,
        ..test_user()
    };
    let users = MockUserRepo::new(vec![user]);
    let profiles = MockProfileRepo::empty();
    let usecase = LoginUseCase {
        users: &users,
        profiles: &profiles,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let result = usecase.execute(input("user@example.com", TEST_PASSWORD)).await;
    assert!(matches!(result, Err(AuthServiceError::AccountDisabled)));
}
