use sea_orm::entity::prelude::*;

use crate::core::{ListingKind, ListingPermission};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "listing")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	pub owner_id: i64,
	pub title: String,
	pub description: String,
	pub kind: ListingKind,
	/// Monthly rent, in whole currency units.
	pub price: i64,
	pub city: String,
	/// Stored uppercase.
	pub state: String,
	pub permission: ListingPermission,
	/// Set once a share link has been generated. Survives permission changes;
	/// only cleared by an explicit revoke.
	#[sea_orm(unique)]
	pub share_token: Option<String>,
	pub is_active: bool,
	pub created: i64,
	pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::profile::Entity",
		from = "Column::OwnerId",
		to = "super::profile::Column::Id"
	)]
	Profile,
	#[sea_orm(has_many = "super::listing_image::Entity")]
	ListingImage,
}

impl Related<super::profile::Entity> for Entity {
	fn to() -> RelationDef { Relation::Profile.def() }
}

impl Related<super::listing_image::Entity> for Entity {
	fn to() -> RelationDef { Relation::ListingImage.def() }
}

impl ActiveModelBehavior for ActiveModel {}
