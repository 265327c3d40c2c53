pub use sea_orm_migration::prelude::*;

mod m20250301_000000_create_identity;
mod m20250301_000001_create_catalog;
mod m20250301_000002_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_create_identity::Migration),
            Box::new(m20250301_000001_create_catalog::Migration),
            Box::new(m20250301_000002_create_orders::Migration),
        ]
    }
}

/// `BIGSERIAL PRIMARY KEY`
pub(crate) fn pk_bigserial<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}
