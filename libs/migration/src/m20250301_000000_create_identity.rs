use crate::pk_bigserial;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Users::Id))
                    // Stored lowercased by the application
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::FirstName, 150).default(""))
                    .col(string_len(Users::LastName, 150).default(""))
                    .col(string_len(Users::UserType, 5).default("buyer"))
                    .col(boolean(Users::IsActive).default(false))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConfirmTokens::Table)
                    .if_not_exists()
                    .col(pk_bigserial(ConfirmTokens::Id))
                    .col(big_integer(ConfirmTokens::UserId))
                    .col(
                        ColumnDef::new(ConfirmTokens::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        timestamp_with_time_zone(ConfirmTokens::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_confirm_tokens_user_id")
                            .from(ConfirmTokens::Table, ConfirmTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Contacts::Id))
                    .col(big_integer(Contacts::UserId))
                    .col(string_len(Contacts::City, 50))
                    .col(string_len(Contacts::Street, 100))
                    .col(string_len(Contacts::House, 15).default(""))
                    .col(string_len(Contacts::Structure, 15).default(""))
                    .col(string_len(Contacts::Building, 15).default(""))
                    .col(string_len(Contacts::Apartment, 15).default(""))
                    .col(string_len(Contacts::Phone, 20))
                    .col(string_len(Contacts::AdditionalDesc, 255).default(""))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_user_id")
                            .from(Contacts::Table, Contacts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contacts_user_id")
                    .table(Contacts::Table)
                    .col(Contacts::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ConfirmTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    UserType,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ConfirmTokens {
    Table,
    Id,
    UserId,
    Token,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Contacts {
    Table,
    Id,
    UserId,
    City,
    Street,
    House,
    Structure,
    Building,
    Apartment,
    Phone,
    AdditionalDesc,
}
