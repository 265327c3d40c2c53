use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

/// Sea-ORM entity for the `contacts` table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub city: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    pub phone: String,
    pub additional_desc: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Contact {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            city: model.city,
            street: model.street,
            house: model.house,
            structure: model.structure,
            building: model.building,
            apartment: model.apartment,
            phone: model.phone,
            additional_desc: model.additional_desc,
            user_id: model.user_id,
        }
    }
}

impl ActiveModel {
    pub fn for_insert(user_id: i64, input: crate::models::CreateContact) -> Self {
        Self {
            id: NotSet,
            user_id: Set(user_id),
            city: Set(input.city),
            street: Set(input.street),
            house: Set(input.house),
            structure: Set(input.structure),
            building: Set(input.building),
            apartment: Set(input.apartment),
            phone: Set(input.phone),
            additional_desc: Set(input.additional_desc),
        }
    }
}

impl From<crate::models::Contact> for ActiveModel {
    fn from(contact: crate::models::Contact) -> Self {
        Self {
            id: Set(contact.id),
            user_id: Set(contact.user_id),
            city: Set(contact.city),
            street: Set(contact.street),
            house: Set(contact.house),
            structure: Set(contact.structure),
            building: Set(contact.building),
            apartment: Set(contact.apartment),
            phone: Set(contact.phone),
            additional_desc: Set(contact.additional_desc),
        }
    }
}
