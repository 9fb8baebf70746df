//! A 'profile' is the user record. It is owned by the external identity
//! collaborator; this service only reads it and joins against it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "profile")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	pub name: String,
	#[sea_orm(unique)]
	pub phone: String,
	pub phone_verified: bool,
	pub city: Option<String>,
	pub state: Option<String>,
	pub created: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::listing::Entity")]
	Listing,
}

impl Related<super::listing::Entity> for Entity {
	fn to() -> RelationDef { Relation::Listing.def() }
}

impl ActiveModelBehavior for ActiveModel {}
