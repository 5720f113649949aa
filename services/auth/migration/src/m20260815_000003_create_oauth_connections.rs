use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OAuthConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OAuthConnections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OAuthConnections::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(OAuthConnections::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuthConnections::ProviderUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuthConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(OAuthConnections::Table, OAuthConnections::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // An external identity maps to exactly one account.
        manager
            .create_index(
                Index::create()
                    .table(OAuthConnections::Table)
                    .col(OAuthConnections::Provider)
                    .col(OAuthConnections::ProviderUserId)
                    .unique()
                    .name("uq_oauth_connections_provider_provider_user_id")
                    .to_owned(),
            )
            .await?;

        // One connection per provider per user.
        manager
            .create_index(
                Index::create()
                    .table(OAuthConnections::Table)
                    .col(OAuthConnections::UserId)
                    .col(OAuthConnections::Provider)
                    .unique()
                    .name("uq_oauth_connections_user_id_provider")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OAuthConnections::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OAuthConnections {
    Table,
    Id,
    UserId,
    Provider,
    ProviderUserId,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
