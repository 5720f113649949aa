use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use nimbus_auth_schema::{oauth_connections, profiles, users};

use crate::domain::repository::{ConnectionRepository, ProfileRepository, UserRepository};
use crate::domain::types::{AuthUser, OAuthConnection, UserProfile};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::VerificationToken.eq(token))
            .one(&self.db)
            .await
            .context("find user by verification token")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::ResetToken.eq(token))
            .one(&self.db)
            .await
            .context("find user by reset token")?;
        Ok(model.map(user_from_model))
    }

    async fn create_with_profile(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let user = user.clone();
                let profile = profile.clone();
                Box::pin(async move {
                    insert_user(txn, &user).await?;
                    insert_profile(txn, &profile).await?;
                    Ok(())
                })
            })
            .await
            .context("create user with profile")?;
        Ok(())
    }

    async fn create_oauth_user(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
        connection: &OAuthConnection,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let user = user.clone();
                let profile = profile.clone();
                let connection = connection.clone();
                Box::pin(async move {
                    insert_user(txn, &user).await?;
                    insert_profile(txn, &profile).await?;
                    insert_connection(txn, &connection).await?;
                    Ok(())
                })
            })
            .await
            .context("create oauth user")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError> {
        users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            refresh_token: Set(token.map(|(t, _)| t.to_owned())),
            refresh_token_expires_at: Set(token.map(|(_, exp)| exp)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set refresh token")?;
        Ok(())
    }

    async fn set_last_token_invalidation(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            last_token_invalidation: Set(Some(at)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set last token invalidation")?;
        Ok(())
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            verification_token: Set(token.map(|(t, _)| t.to_owned())),
            verification_token_expires_at: Set(token.map(|(_, exp)| exp)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set verification token")?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            email_verified: Set(true),
            verification_token: Set(None),
            verification_token_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark email verified")?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(&str, DateTime<Utc>)>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            reset_token: Set(token.map(|(t, _)| t.to_owned())),
            reset_token_expires_at: Set(token.map(|(_, exp)| exp)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set reset token")?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(Some(hash.to_owned())),
            reset_token: Set(None),
            reset_token_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set password hash")?;
        Ok(())
    }
}

async fn insert_user(txn: &DatabaseTransaction, user: &AuthUser) -> Result<(), sea_orm::DbErr> {
    users::ActiveModel {
        id: Set(user.id),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role as i16),
        email_verified: Set(user.email_verified),
        verification_token: Set(user.verification_token.clone()),
        verification_token_expires_at: Set(user.verification_token_expires_at),
        reset_token: Set(user.reset_token.clone()),
        reset_token_expires_at: Set(user.reset_token_expires_at),
        refresh_token: Set(user.refresh_token.clone()),
        refresh_token_expires_at: Set(user.refresh_token_expires_at),
        last_token_invalidation: Set(user.last_token_invalidation),
        is_active: Set(user.is_active),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_profile(
    txn: &DatabaseTransaction,
    profile: &UserProfile,
) -> Result<(), sea_orm::DbErr> {
    profiles::ActiveModel {
        user_id: Set(profile.user_id),
        display_name: Set(profile.display_name.clone()),
        bio: Set(profile.bio.clone()),
        avatar_url: Set(profile.avatar_url.clone()),
        settings: Set(profile.settings.clone()),
        login_count: Set(profile.login_count),
        last_successful_login: Set(profile.last_successful_login),
        last_activity_at: Set(profile.last_activity_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_connection(
    txn: &DatabaseTransaction,
    connection: &OAuthConnection,
) -> Result<(), sea_orm::DbErr> {
    oauth_connections::ActiveModel {
        id: Set(connection.id),
        user_id: Set(connection.user_id),
        provider: Set(connection.provider.clone()),
        provider_user_id: Set(connection.provider_user_id.clone()),
        created_at: Set(connection.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn user_from_model(model: users::Model) -> AuthUser {
    AuthUser {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        role: model.role as u8,
        email_verified: model.email_verified,
        verification_token: model.verification_token,
        verification_token_expires_at: model.verification_token_expires_at,
        reset_token: model.reset_token,
        reset_token_expires_at: model.reset_token_expires_at,
        refresh_token: model.refresh_token,
        refresh_token_expires_at: model.refresh_token_expires_at,
        last_token_invalidation: model.last_token_invalidation,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Profile repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProfileRepository {
    pub db: DatabaseConnection,
}

impl ProfileRepository for DbProfileRepository {
    async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, AuthServiceError> {
        let model = profiles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("find profile by user")?;
        Ok(model.map(profile_from_model))
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        reset_count: bool,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        let count_expr = if reset_count {
            Expr::value(1)
        } else {
            Expr::col(profiles::Column::LoginCount).add(1)
        };
        profiles::Entity::update_many()
            .col_expr(profiles::Column::LoginCount, count_expr)
            .col_expr(profiles::Column::LastSuccessfulLogin, Expr::value(Some(at)))
            .col_expr(profiles::Column::LastActivityAt, Expr::value(Some(at)))
            .filter(profiles::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("record login")?;
        Ok(())
    }

    async fn fill_missing(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<(), AuthServiceError> {
        let Some(profile) = self.find_by_user(user_id).await? else {
            return Ok(());
        };

        let mut active = profiles::ActiveModel {
            user_id: Set(user_id),
            ..Default::default()
        };
        let mut dirty = false;
        if profile.display_name.as_deref().is_none_or(str::is_empty) {
            if let Some(name) = display_name.filter(|n| !n.is_empty()) {
                active.display_name = Set(Some(name.to_owned()));
                dirty = true;
            }
        }
        if profile.avatar_url.as_deref().is_none_or(str::is_empty) {
            if let Some(url) = avatar_url.filter(|u| !u.is_empty()) {
                active.avatar_url = Set(Some(url.to_owned()));
                dirty = true;
            }
        }
        if dirty {
            active.update(&self.db).await.context("fill missing profile fields")?;
        }
        Ok(())
    }
}

fn profile_from_model(model: profiles::Model) -> UserProfile {
    UserProfile {
        user_id: model.user_id,
        display_name: model.display_name,
        bio: model.bio,
        avatar_url: model.avatar_url,
        settings: model.settings,
        login_count: model.login_count,
        last_successful_login: model.last_successful_login,
        last_activity_at: model.last_activity_at,
    }
}

// ── Connection repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConnectionRepository {
    pub db: DatabaseConnection,
}

impl ConnectionRepository for DbConnectionRepository {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthConnection>, AuthServiceError> {
        let model = oauth_connections::Entity::find()
            .filter(oauth_connections::Column::Provider.eq(provider))
            .filter(oauth_connections::Column::ProviderUserId.eq(provider_user_id))
            .one(&self.db)
            .await
            .context("find connection by provider")?;
        Ok(model.map(connection_from_model))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OAuthConnection>, AuthServiceError> {
        let models = oauth_connections::Entity::find()
            .filter(oauth_connections::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .context("list connections by user")?;
        Ok(models.into_iter().map(connection_from_model).collect())
    }

    async fn create(&self, connection: &OAuthConnection) -> Result<(), AuthServiceError> {
        oauth_connections::ActiveModel {
            id: Set(connection.id),
            user_id: Set(connection.user_id),
            provider: Set(connection.provider.clone()),
            provider_user_id: Set(connection.provider_user_id.clone()),
            created_at: Set(connection.created_at),
        }
        .insert(&self.db)
        .await
        .context("create connection")?;
        Ok(())
    }
}

fn connection_from_model(model: oauth_connections::Model) -> OAuthConnection {
    OAuthConnection {
        id: model.id,
        user_id: model.user_id,
        provider: model.provider,
        provider_user_id: model.provider_user_id,
        created_at: model.created_at,
    }
}
