//! Filtered, paginated listing retrieval. Three surfaces exist: the network
//! feed for an authenticated viewer, the public directory, and the owner's
//! own listings. All of them share the same filter set and pagination.

use sea_orm::{sea_query::Condition, ColumnTrait};
use serde::Serialize;

use crate::{
	core::*,
	db::{Database, ListingInfo, PersistenceHandle},
	entity::listing,
	error::{Error, Result},
	graph::FriendGraph,
};


#[derive(Clone, Debug, Default)]
pub struct ListingFilter {
	pub kind: Option<ListingKind>,
	/// Case-insensitive substring match.
	pub city: Option<String>,
	/// Exact match, normalized to uppercase.
	pub state: Option<String>,
	pub min_price: Option<i64>,
	pub max_price: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PageRequest {
	pub page: Option<u64>,
	pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ListingPage {
	pub listings: Vec<ListingInfo>,
	pub total: u64,
	pub page: u64,
	pub page_count: u64,
}

const DEFAULT_PAGE_LIMIT: u64 = 20;


impl PageRequest {
	/// Returns `(page, limit)`. Zero is an input error; an over-large limit
	/// is clamped to the server-side cap rather than rejected.
	pub fn resolve(&self) -> Result<(u64, u64)> {
		let page = self.page.unwrap_or(1);
		let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
		if page == 0 || limit == 0 {
			return Err(Error::Input(
				"page and limit must be positive integers".to_string(),
			));
		}
		Ok((page, limit.min(MAX_PAGE_LIMIT)))
	}
}

impl ListingFilter {
	fn condition(&self) -> Condition {
		let mut condition = Condition::all();
		if let Some(kind) = &self.kind {
			condition = condition.add(listing::Column::Kind.eq(kind.clone()));
		}
		if let Some(city) = &self.city {
			condition = condition.add(listing::Column::City.contains(city));
		}
		if let Some(state) = &self.state {
			condition = condition.add(listing::Column::State.eq(state.to_uppercase()));
		}
		if let Some(min_price) = self.min_price {
			condition = condition.add(listing::Column::Price.gte(min_price));
		}
		if let Some(max_price) = self.max_price {
			condition = condition.add(listing::Column::Price.lte(max_price));
		}
		condition
	}
}


/// Everything the visibility policy lets the viewer browse: their own active
/// listings, public ones, and private ones whose owner lies within the
/// default degree of their network. Link-only listings of others never show
/// up here.
pub async fn visible_listings(
	db: &Database, viewer_id: i64, filter: &ListingFilter, page: &PageRequest,
) -> Result<ListingPage> {
	let network = FriendGraph::new(db)
		.reachable_within_degree(viewer_id, DEFAULT_VISIBILITY_DEGREE)
		.await?;

	let condition = Condition::all()
		.add(listing::Column::IsActive.eq(true))
		.add(filter.condition())
		.add(
			Condition::any()
				.add(listing::Column::OwnerId.eq(viewer_id))
				.add(listing::Column::Permission.eq(ListingPermission::Public))
				.add(
					Condition::all()
						.add(listing::Column::Permission.eq(ListingPermission::Private))
						.add(
							listing::Column::OwnerId
								.is_in(network.into_iter().collect::<Vec<i64>>()),
						),
				),
		);
	run_query(db, condition, page).await
}

/// No identity needed; only active, public listings.
pub async fn public_listings(
	db: &Database, filter: &ListingFilter, page: &PageRequest,
) -> Result<ListingPage> {
	let condition = Condition::all()
		.add(listing::Column::IsActive.eq(true))
		.add(listing::Column::Permission.eq(ListingPermission::Public))
		.add(filter.condition());
	run_query(db, condition, page).await
}

/// The owner's own listings, deactivated ones included.
pub async fn own_listings(
	db: &Database, owner_id: i64, filter: &ListingFilter, page: &PageRequest,
) -> Result<ListingPage> {
	let condition = Condition::all()
		.add(listing::Column::OwnerId.eq(owner_id))
		.add(filter.condition());
	run_query(db, condition, page).await
}

async fn run_query(
	db: &Database, condition: Condition, page: &PageRequest,
) -> Result<ListingPage> {
	let (page_number, limit) = page.resolve()?;
	let offset = (page_number - 1) * limit;

	let (rows, total) = db.search_listings(condition, offset, limit).await?;
	let mut listings = Vec::with_capacity(rows.len());
	for (listing, owner) in rows {
		let images = db.listing_images(listing.id).await?;
		listings.push(ListingInfo::new(listing, owner.map(|p| p.name), images));
	}

	Ok(ListingPage {
		listings,
		total,
		page: page_number,
		page_count: (total + limit - 1) / limit,
	})
}
