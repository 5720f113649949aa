use sea_orm::entity::prelude::*;

/// Identity record. One row per account regardless of how the account
/// was created (password registration or OAuth federation).
///
/// `password_hash` is NULL for OAuth-only accounts. `refresh_token`
/// mirrors the single live refresh JWT; rotation overwrites it, which
/// is what kills a stolen-but-unexpired predecessor. Access tokens
/// issued before `last_token_invalidation` are void regardless of
/// their own expiry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    pub role: i16,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_token_invalidation: Option<chrono::DateTime<chrono::Utc>>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profiles::Entity")]
    Profile,
    #[sea_orm(has_many = "super::oauth_connections::Entity")]
    OAuthConnections,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::oauth_connections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OAuthConnections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
