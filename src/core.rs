//! Domain types shared across the listing directory, the friend graph and the
//! web layer. The status & permission fields are closed enums so that an
//! invalid state can not be stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};


/// Reachability queries are bounded to this many hops.
pub const MAX_REACHABILITY_DEGREE: u32 = 6;
/// How far the friend network extends for private listing visibility.
pub const DEFAULT_VISIBILITY_DEGREE: u32 = 3;
/// Server-side cap on the page size of directory queries.
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Uploaded listing photos may not exceed this many bytes.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] =
	&["image/jpeg", "image/png", "image/webp", "image/gif"];


#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
	#[sea_orm(string_value = "pending")]
	Pending,
	#[sea_orm(string_value = "accepted")]
	Accepted,
	#[sea_orm(string_value = "blocked")]
	Blocked,
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "kebab-case")]
pub enum ListingPermission {
	#[sea_orm(string_value = "private")]
	Private,
	#[sea_orm(string_value = "link-only")]
	LinkOnly,
	#[sea_orm(string_value = "public")]
	Public,
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
	#[sea_orm(string_value = "apartment")]
	Apartment,
	#[sea_orm(string_value = "room")]
	Room,
	#[sea_orm(string_value = "sublet")]
	Sublet,
	#[sea_orm(string_value = "house")]
	House,
}


/// Orders the two endpoints of a connection so that a pair has exactly one
/// canonical representation regardless of who initiated it.
pub fn canonical_pair(a: i64, b: i64) -> (i64, i64) {
	if a < b {
		(a, b)
	} else {
		(b, a)
	}
}
