use crate::m20250301_000000_create_identity::Users;
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
                    .table(Shops::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Shops::Id))
                    .col(string_len(Shops::Name, 80))
                    .col(big_integer_null(Shops::UserId))
                    .col(string_len_null(Shops::Url, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shops_user_id")
                            .from(Shops::Table, Shops::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shops_name_user_id")
                    .table(Shops::Table)
                    .col(Shops::Name)
                    .col(Shops::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Categories::Id))
                    .col(big_integer(Categories::ExternalId))
                    .col(string_len(Categories::Name, 50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_categories_external_id_name")
                    .table(Categories::Table)
                    .col(Categories::ExternalId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CategoryShops::Table)
                    .if_not_exists()
                    .col(big_integer(CategoryShops::CategoryId))
                    .col(big_integer(CategoryShops::ShopId))
                    .primary_key(
                        Index::create()
                            .col(CategoryShops::CategoryId)
                            .col(CategoryShops::ShopId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_shops_category_id")
                            .from(CategoryShops::Table, CategoryShops::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_shops_shop_id")
                            .from(CategoryShops::Table, CategoryShops::ShopId)
                            .to(Shops::Table, Shops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Products::Id))
                    .col(string_len(Products::Name, 80))
                    .col(big_integer(Products::CategoryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_name_category_id")
                    .table(Products::Table)
                    .col(Products::Name)
                    .col(Products::CategoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductInfos::Table)
                    .if_not_exists()
                    .col(pk_bigserial(ProductInfos::Id))
                    .col(string_len(ProductInfos::Model, 80).default(""))
                    .col(big_integer(ProductInfos::ExternalId))
                    .col(big_integer(ProductInfos::ProductId))
                    .col(big_integer(ProductInfos::ShopId))
                    .col(big_integer(ProductInfos::Quantity))
                    .col(big_integer(ProductInfos::Price))
                    .col(big_integer(ProductInfos::PriceRrc))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_infos_product_id")
                            .from(ProductInfos::Table, ProductInfos::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_infos_shop_id")
                            .from(ProductInfos::Table, ProductInfos::ShopId)
                            .to(Shops::Table, Shops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_infos_shop_external_model")
                    .table(ProductInfos::Table)
                    .col(ProductInfos::ShopId)
                    .col(ProductInfos::ExternalId)
                    .col(ProductInfos::Model)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_infos_product_shop")
                    .table(ProductInfos::Table)
                    .col(ProductInfos::ProductId)
                    .col(ProductInfos::ShopId)
                    .to_owned(),
            )
            .await?;

        // Stock never goes negative, even under concurrent confirmations
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE product_infos
                    ADD CONSTRAINT ck_product_infos_non_negative
                    CHECK (quantity >= 0 AND price >= 0 AND price_rrc >= 0)
                "#,
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parameters::Table)
                    .if_not_exists()
                    .col(pk_bigserial(Parameters::Id))
                    .col(
                        ColumnDef::new(Parameters::Name)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductParameters::Table)
                    .if_not_exists()
                    .col(pk_bigserial(ProductParameters::Id))
                    .col(big_integer(ProductParameters::ProductInfoId))
                    .col(big_integer(ProductParameters::ParameterId))
                    .col(string_len(ProductParameters::Value, 150))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_parameters_product_info_id")
                            .from(ProductParameters::Table, ProductParameters::ProductInfoId)
                            .to(ProductInfos::Table, ProductInfos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_parameters_parameter_id")
                            .from(ProductParameters::Table, ProductParameters::ParameterId)
                            .to(Parameters::Table, Parameters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_parameters_unique")
                    .table(ProductParameters::Table)
                    .col(ProductParameters::ProductInfoId)
                    .col(ProductParameters::ParameterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            ProductParameters::Table.into_iden(),
            Parameters::Table.into_iden(),
            ProductInfos::Table.into_iden(),
            Products::Table.into_iden(),
            CategoryShops::Table.into_iden(),
            Categories::Table.into_iden(),
            Shops::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Shops {
    Table,
    Id,
    Name,
    UserId,
    Url,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    ExternalId,
    Name,
}

#[derive(DeriveIden)]
enum CategoryShops {
    Table,
    CategoryId,
    ShopId,
}

#[derive(DeriveIden)]
pub(crate) enum Products {
    Table,
    Id,
    Name,
    CategoryId,
}

#[derive(DeriveIden)]
pub(crate) enum ProductInfos {
    Table,
    Id,
    Model,
    ExternalId,
    ProductId,
    ShopId,
    Quantity,
    Price,
    PriceRrc,
}

#[derive(DeriveIden)]
enum Parameters {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ProductParameters {
    Table,
    Id,
    ProductInfoId,
    ParameterId,
    Value,
}
