mod install;

use std::{fmt, path::PathBuf, time::Duration};

use ::serde::Serialize;
use async_trait::async_trait;
use log::*;
use sea_orm::{prelude::*, sea_query::*, *};
use thiserror::Error;

use crate::{
	common::{current_timestamp, generate_token},
	core::*,
	entity::{connection, listing, listing_image, profile, session},
};


#[derive(Clone)]
pub struct Database {
	orm: DatabaseConnection,
}

pub struct Transaction(pub(crate) DatabaseTransaction);

#[derive(Debug, Error)]
pub enum Error {
	OrmError(sea_orm::DbErr),
	/// A second row for the same unordered pair was about to be created. The
	/// canonical-ordering uniqueness constraint arbitrates the race; the
	/// losing writer gets this.
	DuplicateConnection(i64, i64),
}

pub type Result<T> = std::result::Result<T, Error>;


#[derive(Debug, Serialize)]
pub struct ProfileInfo {
	pub id: i64,
	pub name: String,
	pub city: Option<String>,
	pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendRequestInfo {
	pub connection_id: i64,
	/// The other endpoint of the request.
	pub profile_id: i64,
	pub name: String,
	pub incoming: bool,
	pub created: i64,
}

#[derive(Debug, Serialize)]
pub struct ImageInfo {
	pub id: i64,
	pub url: String,
	pub mime_type: String,
	pub sequence: i32,
}

#[derive(Debug, Serialize)]
pub struct ListingInfo {
	pub id: i64,
	pub owner_id: i64,
	pub owner_name: Option<String>,
	pub title: String,
	pub description: String,
	pub kind: ListingKind,
	pub price: i64,
	pub city: String,
	pub state: String,
	pub permission: ListingPermission,
	pub is_active: bool,
	pub created: i64,
	pub images: Vec<ImageInfo>,
}


#[async_trait]
pub trait PersistenceHandle {
	type Inner: ConnectionTrait;

	fn inner(&self) -> &Self::Inner;


	async fn create_profile(
		&self, name: &str, phone: &str, city: Option<&str>, state: Option<&str>,
	) -> Result<profile::Model> {
		let now = current_timestamp();
		let result = profile::Entity::insert(profile::ActiveModel {
			id: NotSet,
			name: Set(name.to_string()),
			phone: Set(phone.to_string()),
			phone_verified: Set(false),
			city: Set(city.map(|c| c.to_string())),
			state: Set(state.map(|s| s.to_uppercase())),
			created: Set(now),
		})
		.exec(self.inner())
		.await?;
		Ok(profile::Model {
			id: result.last_insert_id,
			name: name.to_string(),
			phone: phone.to_string(),
			phone_verified: false,
			city: city.map(|c| c.to_string()),
			state: state.map(|s| s.to_uppercase()),
			created: now,
		})
	}

	async fn find_profile(&self, profile_id: i64) -> Result<Option<profile::Model>> {
		Ok(profile::Entity::find_by_id(profile_id).one(self.inner()).await?)
	}

	async fn profiles_by_ids(&self, ids: Vec<i64>) -> Result<Vec<profile::Model>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}
		Ok(profile::Entity::find()
			.filter(profile::Column::Id.is_in(ids))
			.all(self.inner())
			.await?)
	}

	async fn create_session(&self, profile_id: i64) -> Result<String> {
		let token = generate_token();
		session::Entity::insert(session::ActiveModel {
			id: NotSet,
			token: Set(token.clone()),
			profile_id: Set(profile_id),
			created: Set(current_timestamp()),
		})
		.exec(self.inner())
		.await?;
		Ok(token)
	}

	async fn find_session(&self, token: &str) -> Result<Option<session::Model>> {
		Ok(session::Entity::find()
			.filter(session::Column::Token.eq(token))
			.one(self.inner())
			.await?)
	}

	async fn find_connection(
		&self, user_a: i64, user_b: i64,
	) -> Result<Option<connection::Model>> {
		let (low_id, high_id) = canonical_pair(user_a, user_b);
		Ok(connection::Entity::find()
			.filter(connection::Column::LowId.eq(low_id))
			.filter(connection::Column::HighId.eq(high_id))
			.one(self.inner())
			.await?)
	}

	async fn find_connection_by_id(
		&self, connection_id: i64,
	) -> Result<Option<connection::Model>> {
		Ok(connection::Entity::find_by_id(connection_id)
			.one(self.inner())
			.await?)
	}

	async fn insert_connection(
		&self, user_a: i64, user_b: i64, requested_by: i64, status: ConnectionStatus,
	) -> Result<connection::Model> {
		let (low_id, high_id) = canonical_pair(user_a, user_b);
		let now = current_timestamp();
		let result = connection::Entity::insert(connection::ActiveModel {
			id: NotSet,
			low_id: Set(low_id),
			high_id: Set(high_id),
			status: Set(status.clone()),
			requested_by: Set(requested_by),
			created: Set(now),
			updated: Set(now),
		})
		.exec(self.inner())
		.await;
		match result {
			Ok(r) => Ok(connection::Model {
				id: r.last_insert_id,
				low_id,
				high_id,
				status,
				requested_by,
				created: now,
				updated: now,
			}),
			Err(e) => match e.sql_err() {
				Some(SqlErr::UniqueConstraintViolation(_)) =>
					Err(Error::DuplicateConnection(low_id, high_id)),
				_ => Err(e.into()),
			},
		}
	}

	async fn update_connection_status(
		&self, connection_id: i64, status: ConnectionStatus,
	) -> Result<()> {
		let model = connection::ActiveModel {
			id: Unchanged(connection_id),
			status: Set(status),
			updated: Set(current_timestamp()),
			..Default::default()
		};
		model.update(self.inner()).await?;
		Ok(())
	}

	/// Overwrites whatever state the pair was in. The `requested_by` field is
	/// repurposed to record which endpoint placed the block.
	async fn upsert_blocked_connection(
		&self, user_a: i64, user_b: i64, blocker: i64,
	) -> Result<()> {
		match self
			.insert_connection(user_a, user_b, blocker, ConnectionStatus::Blocked)
			.await
		{
			Ok(_) => return Ok(()),
			Err(Error::DuplicateConnection(..)) => {}
			Err(e) => return Err(e),
		}

		// A row already exists for the pair, overwrite it in place.
		let (low_id, high_id) = canonical_pair(user_a, user_b);
		connection::Entity::update_many()
			.col_expr(
				connection::Column::Status,
				Expr::value(ConnectionStatus::Blocked),
			)
			.col_expr(connection::Column::RequestedBy, Expr::value(blocker))
			.col_expr(connection::Column::Updated, Expr::value(current_timestamp()))
			.filter(connection::Column::LowId.eq(low_id))
			.filter(connection::Column::HighId.eq(high_id))
			.exec(self.inner())
			.await?;
		Ok(())
	}

	async fn delete_connection(&self, connection_id: i64) -> Result<()> {
		connection::Entity::delete_by_id(connection_id)
			.exec(self.inner())
			.await?;
		Ok(())
	}

	async fn connections_with_status(
		&self, user_id: i64, status: ConnectionStatus,
	) -> Result<Vec<connection::Model>> {
		Ok(connection::Entity::find()
			.filter(connection::Column::Status.eq(status))
			.filter(
				Condition::any()
					.add(connection::Column::LowId.eq(user_id))
					.add(connection::Column::HighId.eq(user_id)),
			)
			.all(self.inner())
			.await?)
	}

	/// One adjacency fetch of the friend graph: the other endpoint of every
	/// accepted connection touching the user.
	async fn accepted_neighbor_ids(&self, user_id: i64) -> Result<Vec<i64>> {
		let rows = self
			.connections_with_status(user_id, ConnectionStatus::Accepted)
			.await?;
		Ok(rows.iter().map(|row| row.other_endpoint(user_id)).collect())
	}

	async fn blocked_peer_ids(&self, user_id: i64) -> Result<Vec<i64>> {
		let rows = self
			.connections_with_status(user_id, ConnectionStatus::Blocked)
			.await?;
		Ok(rows.iter().map(|row| row.other_endpoint(user_id)).collect())
	}

	async fn direct_friend_profiles(&self, user_id: i64) -> Result<Vec<profile::Model>> {
		let neighbors = self.accepted_neighbor_ids(user_id).await?;
		self.profiles_by_ids(neighbors).await
	}

	async fn find_listing(&self, listing_id: i64) -> Result<Option<listing::Model>> {
		Ok(listing::Entity::find_by_id(listing_id).one(self.inner()).await?)
	}

	async fn find_listing_by_token(&self, token: &str) -> Result<Option<listing::Model>> {
		Ok(listing::Entity::find()
			.filter(listing::Column::ShareToken.eq(token))
			.one(self.inner())
			.await?)
	}

	async fn set_share_token(&self, listing_id: i64, token: Option<String>) -> Result<()> {
		let model = listing::ActiveModel {
			id: Unchanged(listing_id),
			share_token: Set(token),
			updated: Set(current_timestamp()),
			..Default::default()
		};
		model.update(self.inner()).await?;
		Ok(())
	}

	async fn listing_images(&self, listing_id: i64) -> Result<Vec<listing_image::Model>> {
		Ok(listing_image::Entity::find()
			.filter(listing_image::Column::ListingId.eq(listing_id))
			.order_by_asc(listing_image::Column::Sequence)
			.all(self.inner())
			.await?)
	}

	async fn find_listing_image(
		&self, image_id: i64,
	) -> Result<Option<listing_image::Model>> {
		Ok(listing_image::Entity::find_by_id(image_id)
			.one(self.inner())
			.await?)
	}

	async fn next_image_sequence(&self, listing_id: i64) -> Result<i32> {
		let stat = listing_image::Entity::find()
			.select_only()
			.column_as(listing_image::Column::Sequence.max(), "max")
			.filter(listing_image::Column::ListingId.eq(listing_id))
			.build(DatabaseBackend::Sqlite);

		if let Some(result) = self.inner().query_one(stat).await? {
			let max: Option<i32> = result.try_get_by_index(0)?;
			Ok(max.map(|m| m + 1).unwrap_or(0))
		} else {
			Ok(0)
		}
	}

	/// Runs a directory query: the given condition, newest first, one page.
	/// Returns the page slice with the owner profile joined in, plus the
	/// total number of matching rows.
	async fn search_listings(
		&self, condition: Condition, offset: u64, limit: u64,
	) -> Result<(Vec<(listing::Model, Option<profile::Model>)>, u64)> {
		let total = listing::Entity::find()
			.filter(condition.clone())
			.count(self.inner())
			.await?;

		let results = listing::Entity::find()
			.find_also_related(profile::Entity)
			.filter(condition)
			.order_by_desc(listing::Column::Created)
			.offset(offset)
			.limit(limit)
			.all(self.inner())
			.await?;
		Ok((results, total))
	}

	async fn load_listing_info(&self, listing: listing::Model) -> Result<ListingInfo> {
		let owner_name = self.find_profile(listing.owner_id).await?.map(|p| p.name);
		let images = self.listing_images(listing.id).await?;
		Ok(ListingInfo::new(listing, owner_name, images))
	}
}


impl Database {
	pub async fn load(path: PathBuf) -> Result<Self> {
		let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
		opts.idle_timeout(Duration::from_secs(10));
		opts.acquire_timeout(Duration::from_secs(1));
		let orm = sea_orm::Database::connect(opts)
			.await
			.map_err(|e| Error::OrmError(e))?;

		// A missing version table means a fresh database file.
		let check = orm
			.query_one(Statement::from_string(
				DatabaseBackend::Sqlite,
				"SELECT major FROM version".to_owned(),
			))
			.await;
		if check.is_err() {
			info!("Installing database schema at {}...", path.display());
			orm.execute_unprepared(install::QUERY).await?;
		}

		Ok(Self { orm })
	}

	pub async fn transaction(&self) -> Result<Transaction> {
		let tx = self.orm.begin().await?;
		Ok(Transaction(tx))
	}
}

impl Transaction {
	pub async fn commit(self) -> Result<()> {
		self.0.commit().await?;
		Ok(())
	}
}

impl PersistenceHandle for Database {
	type Inner = DatabaseConnection;

	fn inner(&self) -> &DatabaseConnection { &self.orm }
}

impl PersistenceHandle for Transaction {
	type Inner = DatabaseTransaction;

	fn inner(&self) -> &DatabaseTransaction { &self.0 }
}


impl ListingInfo {
	pub fn new(
		listing: listing::Model, owner_name: Option<String>, images: Vec<listing_image::Model>,
	) -> Self {
		Self {
			id: listing.id,
			owner_id: listing.owner_id,
			owner_name,
			title: listing.title,
			description: listing.description,
			kind: listing.kind,
			price: listing.price,
			city: listing.city,
			state: listing.state,
			permission: listing.permission,
			is_active: listing.is_active,
			created: listing.created,
			images: images.into_iter().map(|i| i.into()).collect(),
		}
	}
}

impl From<listing_image::Model> for ImageInfo {
	fn from(other: listing_image::Model) -> Self {
		Self {
			id: other.id,
			url: other.url,
			mime_type: other.mime_type,
			sequence: other.sequence,
		}
	}
}

impl From<profile::Model> for ProfileInfo {
	fn from(other: profile::Model) -> Self {
		Self {
			id: other.id,
			name: other.name,
			city: other.city,
			state: other.state,
		}
	}
}

impl From<sea_orm::DbErr> for Error {
	fn from(other: sea_orm::DbErr) -> Self { Self::OrmError(other) }
}

impl From<sea_orm::TryGetError> for Error {
	fn from(other: sea_orm::TryGetError) -> Self { Self::OrmError(other.into()) }
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::OrmError(e) => write!(f, "{}", e),
			Self::DuplicateConnection(low_id, high_id) => {
				write!(f, "a connection row already exists for ({}, {})", low_id, high_id)
			}
		}
	}
}
