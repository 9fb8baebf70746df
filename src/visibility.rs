//! Decides whether a viewer may see a listing. Link-only listings are never
//! granted through this check; possessing the share token is the only way in,
//! which keeps out-of-band access decoupled from the social graph.

use crate::{
	core::{ListingPermission, DEFAULT_VISIBILITY_DEGREE},
	db::PersistenceHandle,
	entity::listing,
	error::Result,
	graph::FriendGraph,
};


pub async fn can_view<P>(
	store: &P, listing: &listing::Model, viewer: Option<i64>,
) -> Result<bool>
where
	P: PersistenceHandle + Sync,
{
	// The owner always sees their own listing, active or not.
	if viewer == Some(listing.owner_id) {
		return Ok(true);
	}

	match listing.permission {
		ListingPermission::Public => Ok(true),
		ListingPermission::LinkOnly => Ok(false),
		ListingPermission::Private => match viewer {
			None => Ok(false),
			Some(viewer_id) =>
				FriendGraph::new(store)
					.are_connected_within_degree(
						listing.owner_id,
						viewer_id,
						DEFAULT_VISIBILITY_DEGREE,
					)
					.await,
		},
	}
}
