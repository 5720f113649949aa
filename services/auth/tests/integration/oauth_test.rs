use chrono::Utc;
use uuid::Uuid;

use nimbus_auth::domain::types::{AuthUser, NormalizedProfile, OAuthConnection, UserProfile};
use nimbus_auth::usecase::oauth_login::{OAuthLoginUseCase, ResolveError};
use nimbus_auth_types::token::validate_access_token;

use crate::helpers::{
    MockConnectionRepo, MockProfileRepo, MockUserRepo, TEST_JWT_SECRET, test_user,
};

fn google_profile() -> NormalizedProfile {
    NormalizedProfile {
        provider: "google",
        provider_user_id: "goog-1001".to_owned(),
        email: Some("user@example.com".to_owned()),
        name: Some("Provider Name".to_owned()),
        picture: Some("https://lh3.example/avatar.png".to_owned()),
    }
}

fn connection(user_id: Uuid, provider: &str, provider_user_id: &str) -> OAuthConnection {
    OAuthConnection {
        id: Uuid::now_v7(),
        user_id,
        provider: provider.to_owned(),
        provider_user_id: provider_user_id.to_owned(),
        created_at: Utc::now(),
    }
}

struct Fixture {
    users: MockUserRepo,
    profiles: MockProfileRepo,
    connections: MockConnectionRepo,
}

impl Fixture {
    /// The three mocks share one backing store so the transactional
    /// create on the user repo is visible through the others, like rows
    /// in one database.
    fn new(users: Vec<AuthUser>, profiles: Vec<UserProfile>, links: Vec<OAuthConnection>) -> Self {
        let user_repo = MockUserRepo::new(users);
        *user_repo.profiles.lock().unwrap() = profiles;
        *user_repo.connections.lock().unwrap() = links;
        let profile_repo = MockProfileRepo {
            profiles: user_repo.profiles.clone(),
        };
        let connection_repo = MockConnectionRepo {
            connections: user_repo.connections.clone(),
        };
        Self {
            users: user_repo,
            profiles: profile_repo,
            connections: connection_repo,
        }
    }

    fn usecase(&self) -> OAuthLoginUseCase<&MockUserRepo, &MockProfileRepo, &MockConnectionRepo> {
        OAuthLoginUseCase {
            users: &self.users,
            profiles: &self.profiles,
            connections: &self.connections,
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        }
    }
}

#[tokio::test]
async fn should_login_through_existing_connection() {
    let user = test_user();
    let fx = Fixture::new(
        vec![user.clone()],
        vec![UserProfile::empty(user.id)],
        vec![connection(user.id, "google", "goog-1001")],
    );

    let out = fx.usecase().execute(&google_profile()).await.unwrap();

    assert_eq!(out.user.id, user.id);
    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);

    // Nothing new was created.
    assert_eq!(fx.users.users.lock().unwrap().len(), 1);
    assert_eq!(fx.connections.connections.lock().unwrap().len(), 1);

    // Rotation happened.
    let stored = fx.users.users.lock().unwrap()[0].clone();
    assert_eq!(stored.refresh_token.as_deref(), Some(out.refresh_token.as_str()));
}

#[tokio::test]
async fn should_prefer_connection_over_email_match() {
    // The linked account's email on the provider side changed to
    // another user's address. The link wins; email never migrates an
    // established identity.
    let linked = AuthUser {
        email: "original@example.com".to_owned(),
        ..test_user()
    };
    let other = test_user(); // owns user@example.com
    let fx = Fixture::new(
        vec![linked.clone(), other.clone()],
        vec![UserProfile::empty(linked.id), UserProfile::empty(other.id)],
        vec![connection(linked.id, "google", "goog-1001")],
    );

    let out = fx.usecase().execute(&google_profile()).await.unwrap();
    assert_eq!(out.user.id, linked.id);
}

#[tokio::test]
async fn should_link_to_existing_user_by_email() {
    let user = test_user();
    let fx = Fixture::new(
        vec![user.clone()],
        vec![UserProfile::empty(user.id)],
        vec![],
    );

    let out = fx.usecase().execute(&google_profile()).await.unwrap();

    assert_eq!(out.user.id, user.id);
    // Linked, not duplicated.
    assert_eq!(fx.users.users.lock().unwrap().len(), 1);
    let links = fx.connections.connections.lock().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].user_id, user.id);
    assert_eq!(links[0].provider, "google");
    assert_eq!(links[0].provider_user_id, "goog-1001");
}

#[tokio::test]
async fn should_create_user_profile_and_connection_for_unknown_identity() {
    let fx = Fixture::new(vec![], vec![], vec![]);

    let out = fx.usecase().execute(&google_profile()).await.unwrap();

    assert_eq!(out.user.email, "user@example.com");
    // Provider-attested address needs no verification round-trip.
    assert!(out.user.email_verified);
    assert!(out.user.password_hash.is_none());

    assert_eq!(fx.users.users.lock().unwrap().len(), 1);
    assert_eq!(fx.connections.connections.lock().unwrap().len(), 1);

    // First login: count starts at 1.
    let profiles = fx.profiles.profiles.lock().unwrap();
    assert_eq!(profiles[0].login_count, 1);
}

#[tokio::test]
async fn should_fail_when_provider_gives_no_email_for_unlinked_identity() {
    let fx = Fixture::new(vec![], vec![], vec![]);
    let profile = NormalizedProfile {
        email: None,
        ..google_profile()
    };

    let result = fx.usecase().execute(&profile).await;
    assert!(matches!(result, Err(ResolveError::EmailMissing)));
    assert!(fx.users.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_login_linked_identity_even_without_provider_email() {
    // A link resolves before the email is ever needed.
    let user = test_user();
    let fx = Fixture::new(
        vec![user.clone()],
        vec![UserProfile::empty(user.id)],
        vec![connection(user.id, "google", "goog-1001")],
    );
    let profile = NormalizedProfile {
        email: None,
        ..google_profile()
    };

    let out = fx.usecase().execute(&profile).await.unwrap();
    assert_eq!(out.user.id, user.id);
}

#[tokio::test]
async fn should_fill_only_empty_profile_fields_from_provider() {
    let user = test_user();
    let mut profile = UserProfile::empty(user.id);
    profile.display_name = Some("My Chosen Name".to_owned());
    let fx = Fixture::new(
        vec![user.clone()],
        vec![profile],
        vec![connection(user.id, "google", "goog-1001")],
    );

    fx.usecase().execute(&google_profile()).await.unwrap();

    let profiles = fx.profiles.profiles.lock().unwrap();
    // User edits survive; the hole gets filled.
    assert_eq!(profiles[0].display_name.as_deref(), Some("My Chosen Name"));
    assert_eq!(
        profiles[0].avatar_url.as_deref(),
        Some("https://lh3.example/avatar.png"),
    );
}

#[tokio::test]
async fn should_keep_first_link_when_same_provider_reappears_with_new_account() {
    // Same email, same provider, different provider-side account id.
    // The existing link stays; no second row for the provider.
    let user = test_user();
    let fx = Fixture::new(
        vec![user.clone()],
        vec![UserProfile::empty(user.id)],
        vec![connection(user.id, "google", "goog-OLD")],
    );

    let out = fx.usecase().execute(&google_profile()).await.unwrap();

    assert_eq!(out.user.id, user.id);
    let links = fx.connections.connections.lock().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].provider_user_id, "goog-OLD");
}

#[tokio::test]
async fn should_be_idempotent_across_repeated_logins() {
    let fx = Fixture::new(vec![], vec![], vec![]);

    let first = fx.usecase().execute(&google_profile()).await.unwrap();
    let second = fx.usecase().execute(&google_profile()).await.unwrap();

    assert_eq!(first.user.id, second.user.id);
    assert_eq!(fx.users.users.lock().unwrap().len(), 1);
    assert_eq!(fx.connections.connections.lock().unwrap().len(), 1);
    // Second login increments instead of resetting.
    assert_eq!(fx.profiles.profiles.lock().unwrap()[0].login_count, 2);
}
