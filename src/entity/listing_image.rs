//! The photo bytes themselves live in blob storage; only the URL that came
//! back from it is recorded here.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "listing_image")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	pub listing_id: i64,
	pub url: String,
	pub mime_type: String,
	pub size: i64,
	pub sequence: i32,
	pub created: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::listing::Entity",
		from = "Column::ListingId",
		to = "super::listing::Column::Id"
	)]
	Listing,
}

impl Related<super::listing::Entity> for Entity {
	fn to() -> RelationDef { Relation::Listing.def() }
}

impl ActiveModelBehavior for ActiveModel {}
