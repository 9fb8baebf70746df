//! An edge of the friend graph. The endpoints are kept in canonical order
//! (`low_id < high_id`) so that the unordered pair has exactly one row; the
//! store enforces this with a uniqueness constraint.

use sea_orm::entity::prelude::*;

use crate::core::ConnectionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "connection")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	pub low_id: i64,
	pub high_id: i64,
	pub status: ConnectionStatus,
	/// The endpoint that initiated the request. For a blocked row, the
	/// endpoint that placed the block.
	pub requested_by: i64,
	pub created: i64,
	pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
	/// The endpoint that isn't the given one.
	pub fn other_endpoint(&self, user_id: i64) -> i64 {
		if self.low_id == user_id {
			self.high_id
		} else {
			self.low_id
		}
	}

	pub fn has_endpoint(&self, user_id: i64) -> bool {
		self.low_id == user_id || self.high_id == user_id
	}
}
