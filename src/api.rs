use std::{collections::HashMap, sync::Arc};

use log::*;
use sea_orm::{prelude::*, NotSet, Set, Unchanged};
use serde::Deserialize;

use crate::{
	common::{current_timestamp, generate_token},
	core::*,
	db::{
		Database, FriendRequestInfo, ImageInfo, ListingInfo, PersistenceHandle, ProfileInfo,
	},
	directory::{self, ListingFilter, ListingPage, PageRequest},
	entity::{connection, listing, listing_image},
	error::{Error, Result},
	graph::FriendGraph,
	media::{validate_image, BlobStore},
	visibility,
};


#[derive(Clone)]
pub struct Api {
	pub db: Database,
	pub blobs: Arc<dyn BlobStore>,
}

/// The caller-supplied fields of a listing; used for both creation and a
/// full update.
#[derive(Clone, Debug, Deserialize)]
pub struct ListingDetails {
	pub title: String,
	pub description: String,
	pub kind: ListingKind,
	pub price: i64,
	pub city: String,
	pub state: String,
	pub permission: ListingPermission,
	pub is_active: Option<bool>,
}


impl Api {
	/// Resolves a bearer credential to a profile id.
	pub async fn authenticate(&self, token: &str) -> Result<i64> {
		let session = self.db.find_session(token).await?;
		session.map(|s| s.profile_id).ok_or(Error::Unauthenticated)
	}


	pub async fn send_friend_request(
		&self, requester_id: i64, target_id: i64,
	) -> Result<FriendRequestInfo> {
		if requester_id == target_id {
			return Err(Error::Input(
				"cannot send a friend request to yourself".to_string(),
			));
		}
		let target = self
			.db
			.find_profile(target_id)
			.await?
			.ok_or(Error::NotFound("profile"))?;

		if let Some(existing) = self.db.find_connection(requester_id, target_id).await? {
			return match existing.status {
				// A block suppresses the request flow without revealing that
				// it exists.
				ConnectionStatus::Blocked => Err(Error::NotFound("profile")),
				_ => Err(Error::Conflict("a connection already exists for this pair")),
			};
		}

		let row = self
			.db
			.insert_connection(
				requester_id,
				target_id,
				requester_id,
				ConnectionStatus::Pending,
			)
			.await?;
		info!("Friend request {} -> {} created.", requester_id, target_id);
		Ok(FriendRequestInfo {
			connection_id: row.id,
			profile_id: target_id,
			name: target.name,
			incoming: false,
			created: row.created,
		})
	}

	pub async fn accept_friend_request(
		&self, user_id: i64, connection_id: i64,
	) -> Result<ProfileInfo> {
		let row = self.find_pending_request(user_id, connection_id).await?;
		if row.requested_by == user_id {
			return Err(Error::Unauthorized(
				"only the recipient may accept a friend request",
			));
		}

		self.db
			.update_connection_status(connection_id, ConnectionStatus::Accepted)
			.await?;
		let friend = self
			.db
			.find_profile(row.other_endpoint(user_id))
			.await?
			.ok_or(Error::NotFound("profile"))?;
		Ok(friend.into())
	}

	pub async fn reject_friend_request(&self, user_id: i64, connection_id: i64) -> Result<()> {
		let row = self.find_pending_request(user_id, connection_id).await?;
		if row.requested_by == user_id {
			return Err(Error::Unauthorized(
				"only the recipient may reject a friend request",
			));
		}

		self.db.delete_connection(row.id).await?;
		Ok(())
	}

	async fn find_pending_request(
		&self, user_id: i64, connection_id: i64,
	) -> Result<connection::Model> {
		let row = self
			.db
			.find_connection_by_id(connection_id)
			.await?
			.ok_or(Error::NotFound("friend request"))?;
		// A request that doesn't involve the caller doesn't exist as far as
		// they are concerned.
		if !row.has_endpoint(user_id) || row.status != ConnectionStatus::Pending {
			return Err(Error::NotFound("friend request"));
		}
		Ok(row)
	}

	pub async fn pending_requests(&self, user_id: i64) -> Result<Vec<FriendRequestInfo>> {
		let rows = self
			.db
			.connections_with_status(user_id, ConnectionStatus::Pending)
			.await?;
		let other_ids: Vec<i64> = rows.iter().map(|row| row.other_endpoint(user_id)).collect();
		let names: HashMap<i64, String> = self
			.db
			.profiles_by_ids(other_ids)
			.await?
			.into_iter()
			.map(|p| (p.id, p.name))
			.collect();

		let mut requests = Vec::with_capacity(rows.len());
		for row in rows {
			let other_id = row.other_endpoint(user_id);
			requests.push(FriendRequestInfo {
				connection_id: row.id,
				profile_id: other_id,
				name: names.get(&other_id).cloned().unwrap_or_default(),
				incoming: row.requested_by != user_id,
				created: row.created,
			});
		}
		Ok(requests)
	}

	pub async fn friends_list(&self, user_id: i64) -> Result<Vec<ProfileInfo>> {
		let friends = FriendGraph::new(&self.db).direct_friends(user_id).await?;
		Ok(friends.into_iter().map(|p| p.into()).collect())
	}

	pub async fn network(&self, user_id: i64, degree: u32) -> Result<Vec<ProfileInfo>> {
		let reachable = FriendGraph::new(&self.db)
			.reachable_within_degree(user_id, degree)
			.await?;
		let profiles = self
			.db
			.profiles_by_ids(reachable.into_iter().collect())
			.await?;
		Ok(profiles.into_iter().map(|p| p.into()).collect())
	}

	pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<()> {
		let row = self
			.db
			.find_connection(user_id, friend_id)
			.await?
			.filter(|row| row.status == ConnectionStatus::Accepted)
			.ok_or(Error::NotFound("friend"))?;
		self.db.delete_connection(row.id).await?;
		Ok(())
	}

	pub async fn block_user(&self, user_id: i64, target_id: i64) -> Result<()> {
		if user_id == target_id {
			return Err(Error::Input("cannot block yourself".to_string()));
		}
		self.db
			.find_profile(target_id)
			.await?
			.ok_or(Error::NotFound("profile"))?;

		self.db
			.upsert_blocked_connection(user_id, target_id, user_id)
			.await?;
		info!("User {} blocked user {}.", user_id, target_id);
		Ok(())
	}


	pub async fn create_listing(
		&self, owner_id: i64, details: ListingDetails,
	) -> Result<ListingInfo> {
		Self::validate_listing_details(&details)?;

		let now = current_timestamp();
		let result = listing::Entity::insert(listing::ActiveModel {
			id: NotSet,
			owner_id: Set(owner_id),
			title: Set(details.title),
			description: Set(details.description),
			kind: Set(details.kind),
			price: Set(details.price),
			city: Set(details.city),
			state: Set(details.state.to_uppercase()),
			permission: Set(details.permission),
			share_token: Set(None),
			is_active: Set(details.is_active.unwrap_or(true)),
			created: Set(now),
			updated: Set(now),
		})
		.exec(self.db.inner())
		.await?;

		let model = self
			.db
			.find_listing(result.last_insert_id)
			.await?
			.ok_or(Error::NotFound("listing"))?;
		Ok(self.db.load_listing_info(model).await?)
	}

	pub async fn get_listing(
		&self, viewer_id: Option<i64>, listing_id: i64,
	) -> Result<ListingInfo> {
		let listing = self
			.db
			.find_listing(listing_id)
			.await?
			.ok_or(Error::NotFound("listing"))?;

		// Deactivated listings only exist for their owner.
		if viewer_id != Some(listing.owner_id) && !listing.is_active {
			return Err(Error::NotFound("listing"));
		}
		if !visibility::can_view(&self.db, &listing, viewer_id).await? {
			return Err(Error::NotFound("listing"));
		}
		Ok(self.db.load_listing_info(listing).await?)
	}

	pub async fn update_listing(
		&self, owner_id: i64, listing_id: i64, details: ListingDetails,
	) -> Result<ListingInfo> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;
		Self::validate_listing_details(&details)?;

		let model = listing::ActiveModel {
			id: Unchanged(listing.id),
			title: Set(details.title),
			description: Set(details.description),
			kind: Set(details.kind),
			price: Set(details.price),
			city: Set(details.city),
			state: Set(details.state.to_uppercase()),
			permission: Set(details.permission),
			is_active: Set(details.is_active.unwrap_or(listing.is_active)),
			updated: Set(current_timestamp()),
			..Default::default()
		};
		let updated = model.update(self.db.inner()).await?;
		Ok(self.db.load_listing_info(updated).await?)
	}

	pub async fn set_listing_permission(
		&self, owner_id: i64, listing_id: i64, permission: ListingPermission,
	) -> Result<ListingInfo> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;

		// The share token, if any, stays in place across permission changes.
		let model = listing::ActiveModel {
			id: Unchanged(listing.id),
			permission: Set(permission),
			updated: Set(current_timestamp()),
			..Default::default()
		};
		let updated = model.update(self.db.inner()).await?;
		Ok(self.db.load_listing_info(updated).await?)
	}

	pub async fn delete_listing(&self, owner_id: i64, listing_id: i64) -> Result<()> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;
		let images = self.db.listing_images(listing.id).await?;

		let tx = self.db.transaction().await?;
		listing_image::Entity::delete_many()
			.filter(listing_image::Column::ListingId.eq(listing.id))
			.exec(tx.inner())
			.await?;
		listing::Entity::delete_by_id(listing.id).exec(tx.inner()).await?;
		tx.commit().await?;

		// The rows are gone; blob removal is best-effort.
		for image in images {
			if let Err(e) = self.blobs.delete(&image.url).await {
				warn!("Unable to delete blob {}: {}", image.url, e);
			}
		}
		Ok(())
	}


	pub async fn issue_share_token(&self, owner_id: i64, listing_id: i64) -> Result<String> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;

		// Idempotent: repeated calls don't rotate the token.
		if let Some(token) = listing.share_token {
			return Ok(token);
		}
		let token = generate_token();
		self.db
			.set_share_token(listing.id, Some(token.clone()))
			.await?;
		Ok(token)
	}

	pub async fn revoke_share_token(&self, owner_id: i64, listing_id: i64) -> Result<()> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;
		if listing.share_token.is_some() {
			self.db.set_share_token(listing.id, None).await?;
		}
		Ok(())
	}

	/// The share token is a bare lookup key: no identity check happens here.
	/// A revoked or never-issued token answers exactly like a listing that
	/// doesn't exist.
	pub async fn shared_listing(&self, token: &str) -> Result<ListingInfo> {
		let listing = self
			.db
			.find_listing_by_token(token)
			.await?
			.filter(|l| l.is_active)
			.ok_or(Error::NotFound("listing"))?;
		Ok(self.db.load_listing_info(listing).await?)
	}


	pub async fn visible_listings(
		&self, viewer_id: i64, filter: &ListingFilter, page: &PageRequest,
	) -> Result<ListingPage> {
		directory::visible_listings(&self.db, viewer_id, filter, page).await
	}

	pub async fn public_listings(
		&self, filter: &ListingFilter, page: &PageRequest,
	) -> Result<ListingPage> {
		directory::public_listings(&self.db, filter, page).await
	}

	pub async fn own_listings(
		&self, owner_id: i64, filter: &ListingFilter, page: &PageRequest,
	) -> Result<ListingPage> {
		directory::own_listings(&self.db, owner_id, filter, page).await
	}


	pub async fn attach_image(
		&self, owner_id: i64, listing_id: i64, mime_type: &str, data: &[u8],
	) -> Result<ImageInfo> {
		let listing = self.find_owned_listing(owner_id, listing_id).await?;
		validate_image(mime_type, data.len())?;

		let url = self
			.blobs
			.store(&format!("listing-{}", listing.id), mime_type, data)
			.await?;
		let sequence = self.db.next_image_sequence(listing.id).await?;
		let result = listing_image::Entity::insert(listing_image::ActiveModel {
			id: NotSet,
			listing_id: Set(listing.id),
			url: Set(url.clone()),
			mime_type: Set(mime_type.to_string()),
			size: Set(data.len() as i64),
			sequence: Set(sequence),
			created: Set(current_timestamp()),
		})
		.exec(self.db.inner())
		.await?;

		Ok(ImageInfo {
			id: result.last_insert_id,
			url,
			mime_type: mime_type.to_string(),
			sequence,
		})
	}

	pub async fn remove_image(
		&self, owner_id: i64, listing_id: i64, image_id: i64,
	) -> Result<()> {
		self.find_owned_listing(owner_id, listing_id).await?;
		let image = self
			.db
			.find_listing_image(image_id)
			.await?
			.filter(|i| i.listing_id == listing_id)
			.ok_or(Error::NotFound("image"))?;

		listing_image::Entity::delete_by_id(image.id)
			.exec(self.db.inner())
			.await?;
		if let Err(e) = self.blobs.delete(&image.url).await {
			warn!("Unable to delete blob {}: {}", image.url, e);
		}
		Ok(())
	}


	async fn find_owned_listing(
		&self, owner_id: i64, listing_id: i64,
	) -> Result<listing::Model> {
		let listing = self
			.db
			.find_listing(listing_id)
			.await?
			.ok_or(Error::NotFound("listing"))?;
		if listing.owner_id != owner_id {
			return Err(Error::Unauthorized("only the owner may manage a listing"));
		}
		Ok(listing)
	}

	fn validate_listing_details(details: &ListingDetails) -> Result<()> {
		if details.title.trim().is_empty() {
			return Err(Error::Input("title must not be empty".to_string()));
		}
		if details.price <= 0 {
			return Err(Error::Input("price must be positive".to_string()));
		}
		if details.city.trim().is_empty() || details.state.trim().is_empty() {
			return Err(Error::Input("city and state must not be empty".to_string()));
		}
		Ok(())
	}
}
