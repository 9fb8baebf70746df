use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "session")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	#[sea_orm(unique)]
	pub token: String,
	pub profile_id: i64,
	pub created: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::profile::Entity",
		from = "Column::ProfileId",
		to = "super::profile::Column::Id"
	)]
	Profile,
}

impl Related<super::profile::Entity> for Entity {
	fn to() -> RelationDef { Relation::Profile.def() }
}

impl ActiveModelBehavior for ActiveModel {}
