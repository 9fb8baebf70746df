use hearthd::{
	api::{Api, ListingDetails},
	core::*,
	db::PersistenceHandle,
	directory::{ListingFilter, PageRequest},
	error::Error,
	test::*,
};


#[ctor::ctor]
fn initialize() { env_logger::init(); }


fn details(permission: ListingPermission) -> ListingDetails {
	ListingDetails {
		title: "Sunny two-bedroom".to_string(),
		description: "Close to the park, heat included.".to_string(),
		kind: ListingKind::Apartment,
		price: 1450,
		city: "Portland".to_string(),
		state: "or".to_string(),
		permission,
		is_active: None,
	}
}

async fn create_listing(api: &Api, owner: i64, permission: ListingPermission) -> i64 {
	api.create_listing(owner, details(permission))
		.await
		.expect("unable to create listing")
		.id
}


#[tokio::test]
async fn test_private_listing_visibility() {
	let api = load_test_api("private_visibility").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let x = create_test_profile(&api.db, "Xavier").await;
	let y = create_test_profile(&api.db, "Yusuf").await;
	let b = create_test_profile(&api.db, "Bob").await;
	let z = create_test_profile(&api.db, "Zoe").await;
	let c = create_test_profile(&api.db, "Carol").await;

	// b sits exactly at the default degree, z one hop beyond it.
	connect_accepted(&api.db, a, x).await;
	connect_accepted(&api.db, x, y).await;
	connect_accepted(&api.db, y, b).await;
	connect_accepted(&api.db, b, z).await;

	let listing_id = create_listing(&api, a, ListingPermission::Private).await;

	api.get_listing(Some(a), listing_id).await.unwrap();
	api.get_listing(Some(b), listing_id).await.unwrap();
	assert!(matches!(
		api.get_listing(Some(z), listing_id).await,
		Err(Error::NotFound(_))
	));
	assert!(matches!(
		api.get_listing(Some(c), listing_id).await,
		Err(Error::NotFound(_))
	));
	assert!(matches!(
		api.get_listing(None, listing_id).await,
		Err(Error::NotFound(_))
	));
}

#[tokio::test]
async fn test_public_listing_is_visible_anonymously() {
	let api = load_test_api("public_visibility").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let listing_id = create_listing(&api, a, ListingPermission::Public).await;

	let info = api.get_listing(None, listing_id).await.unwrap();
	assert_eq!(info.id, listing_id);
	assert_eq!(info.state, "OR");

	let page = api
		.public_listings(&ListingFilter::default(), &PageRequest::default())
		.await
		.unwrap();
	assert_eq!(page.total, 1);
	assert_eq!(page.listings[0].id, listing_id);
}

#[tokio::test]
async fn test_share_token_flow() {
	let api = load_test_api("share_token_flow").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let b = create_test_profile(&api.db, "Bob").await;
	connect_accepted(&api.db, a, b).await;

	let listing_id = create_listing(&api, a, ListingPermission::LinkOnly).await;

	// Even a direct friend doesn't get in through the graph; the token is
	// the only path.
	assert!(matches!(
		api.get_listing(Some(b), listing_id).await,
		Err(Error::NotFound(_))
	));

	assert!(matches!(
		api.issue_share_token(b, listing_id).await,
		Err(Error::Unauthorized(_))
	));
	let token = api.issue_share_token(a, listing_id).await.unwrap();
	let token_again = api.issue_share_token(a, listing_id).await.unwrap();
	assert_eq!(token, token_again);

	let shared = api.shared_listing(&token).await.unwrap();
	assert_eq!(shared.id, listing_id);

	assert!(matches!(
		api.revoke_share_token(b, listing_id).await,
		Err(Error::Unauthorized(_))
	));
	api.revoke_share_token(a, listing_id).await.unwrap();
	assert!(matches!(
		api.shared_listing(&token).await,
		Err(Error::NotFound(_))
	));

	// After a revoke, a fresh issue mints a different token.
	let new_token = api.issue_share_token(a, listing_id).await.unwrap();
	assert_ne!(new_token, token);
	assert_eq!(api.shared_listing(&new_token).await.unwrap().id, listing_id);
}

#[tokio::test]
async fn test_share_token_survives_permission_changes() {
	let api = load_test_api("share_token_survival").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let listing_id = create_listing(&api, a, ListingPermission::LinkOnly).await;

	let token = api.issue_share_token(a, listing_id).await.unwrap();
	api.set_listing_permission(a, listing_id, ListingPermission::Private)
		.await
		.unwrap();

	let row = api.db.find_listing(listing_id).await.unwrap().unwrap();
	assert_eq!(row.share_token, Some(token.clone()));

	// The token is a bare lookup key, it keeps resolving...
	assert_eq!(api.shared_listing(&token).await.unwrap().id, listing_id);
	// ...and switching back doesn't rotate it.
	api.set_listing_permission(a, listing_id, ListingPermission::LinkOnly)
		.await
		.unwrap();
	assert_eq!(api.issue_share_token(a, listing_id).await.unwrap(), token);
}

#[tokio::test]
async fn test_friend_request_unlocks_listing() {
	let api = load_test_api("request_unlocks_listing").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let b = create_test_profile(&api.db, "Bob").await;

	let listing_id = create_listing(&api, a, ListingPermission::Private).await;
	assert!(matches!(
		api.get_listing(Some(b), listing_id).await,
		Err(Error::NotFound(_))
	));

	let request = api.send_friend_request(a, b).await.unwrap();
	api.accept_friend_request(b, request.connection_id)
		.await
		.unwrap();

	let info = api.get_listing(Some(b), listing_id).await.unwrap();
	assert_eq!(info.id, listing_id);
}

#[tokio::test]
async fn test_network_feed_gating() {
	let api = load_test_api("network_feed").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let b = create_test_profile(&api.db, "Bob").await;
	let c = create_test_profile(&api.db, "Carol").await;
	connect_accepted(&api.db, a, b).await;

	let private_id = create_listing(&api, b, ListingPermission::Private).await;
	let link_only_id = create_listing(&api, b, ListingPermission::LinkOnly).await;
	let public_id = create_listing(&api, c, ListingPermission::Public).await;

	let alices_feed = api
		.visible_listings(a, &ListingFilter::default(), &PageRequest::default())
		.await
		.unwrap();
	let ids: Vec<i64> = alices_feed.listings.iter().map(|l| l.id).collect();
	assert!(ids.contains(&private_id));
	assert!(ids.contains(&public_id));
	// Link-only listings of others never show up in a directory.
	assert!(!ids.contains(&link_only_id));

	let carols_feed = api
		.visible_listings(c, &ListingFilter::default(), &PageRequest::default())
		.await
		.unwrap();
	let ids: Vec<i64> = carols_feed.listings.iter().map(|l| l.id).collect();
	assert!(!ids.contains(&private_id));
	assert!(ids.contains(&public_id));
}

#[tokio::test]
async fn test_directory_filters() {
	let api = load_test_api("directory_filters").await;
	let a = create_test_profile(&api.db, "Alice").await;

	api.create_listing(a, ListingDetails {
		title: "Sunny two-bedroom".to_string(),
		description: "".to_string(),
		kind: ListingKind::Apartment,
		price: 1450,
		city: "Portland".to_string(),
		state: "or".to_string(),
		permission: ListingPermission::Public,
		is_active: None,
	})
	.await
	.unwrap();
	api.create_listing(a, ListingDetails {
		title: "Room near the ferry".to_string(),
		description: "".to_string(),
		kind: ListingKind::Room,
		price: 700,
		city: "Port Townsend".to_string(),
		state: "wa".to_string(),
		permission: ListingPermission::Public,
		is_active: None,
	})
	.await
	.unwrap();
	api.create_listing(a, ListingDetails {
		title: "Whole house with yard".to_string(),
		description: "".to_string(),
		kind: ListingKind::House,
		price: 2200,
		city: "Eugene".to_string(),
		state: "OR".to_string(),
		permission: ListingPermission::Public,
		is_active: None,
	})
	.await
	.unwrap();

	let page = PageRequest::default();

	// City matches are case-insensitive substrings.
	let by_city = api
		.public_listings(
			&ListingFilter {
				city: Some("port".to_string()),
				..Default::default()
			},
			&page,
		)
		.await
		.unwrap();
	assert_eq!(by_city.total, 2);

	// State matches are exact after case normalization.
	let by_state = api
		.public_listings(
			&ListingFilter {
				state: Some("or".to_string()),
				..Default::default()
			},
			&page,
		)
		.await
		.unwrap();
	assert_eq!(by_state.total, 2);

	let by_kind = api
		.public_listings(
			&ListingFilter {
				kind: Some(ListingKind::Room),
				..Default::default()
			},
			&page,
		)
		.await
		.unwrap();
	assert_eq!(by_kind.total, 1);
	assert_eq!(by_kind.listings[0].price, 700);

	// Filters are conjunctive; price bounds are inclusive.
	let combined = api
		.public_listings(
			&ListingFilter {
				state: Some("OR".to_string()),
				min_price: Some(1450),
				max_price: Some(2200),
				..Default::default()
			},
			&page,
		)
		.await
		.unwrap();
	assert_eq!(combined.total, 2);
	let narrow = api
		.public_listings(
			&ListingFilter {
				state: Some("OR".to_string()),
				max_price: Some(1449),
				..Default::default()
			},
			&page,
		)
		.await
		.unwrap();
	assert_eq!(narrow.total, 0);
}

#[tokio::test]
async fn test_directory_pagination() {
	let api = load_test_api("directory_pagination").await;
	let a = create_test_profile(&api.db, "Alice").await;
	for _ in 0..3 {
		create_listing(&api, a, ListingPermission::Public).await;
	}

	let filter = ListingFilter::default();
	let first = api
		.public_listings(&filter, &PageRequest {
			page: Some(1),
			limit: Some(2),
		})
		.await
		.unwrap();
	assert_eq!(first.total, 3);
	assert_eq!(first.page_count, 2);
	assert_eq!(first.listings.len(), 2);

	let second = api
		.public_listings(&filter, &PageRequest {
			page: Some(2),
			limit: Some(2),
		})
		.await
		.unwrap();
	assert_eq!(second.listings.len(), 1);

	// Zero is an input error; an oversized limit is clamped, not rejected.
	assert!(matches!(
		api.public_listings(&filter, &PageRequest {
			page: Some(0),
			limit: None,
		})
		.await,
		Err(Error::Input(_))
	));
	assert!(matches!(
		api.public_listings(&filter, &PageRequest {
			page: None,
			limit: Some(0),
		})
		.await,
		Err(Error::Input(_))
	));
	let clamped = api
		.public_listings(&filter, &PageRequest {
			page: Some(1),
			limit: Some(100000),
		})
		.await
		.unwrap();
	assert_eq!(clamped.page_count, 1);
}

#[tokio::test]
async fn test_deactivated_listing_only_exists_for_its_owner() {
	let api = load_test_api("deactivation").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let listing_id = create_listing(&api, a, ListingPermission::Public).await;

	let mut update = details(ListingPermission::Public);
	update.is_active = Some(false);
	api.update_listing(a, listing_id, update).await.unwrap();

	assert!(matches!(
		api.get_listing(None, listing_id).await,
		Err(Error::NotFound(_))
	));
	let info = api.get_listing(Some(a), listing_id).await.unwrap();
	assert!(!info.is_active);

	let public = api
		.public_listings(&ListingFilter::default(), &PageRequest::default())
		.await
		.unwrap();
	assert_eq!(public.total, 0);
	let mine = api
		.own_listings(a, &ListingFilter::default(), &PageRequest::default())
		.await
		.unwrap();
	assert_eq!(mine.total, 1);

	// A share token doesn't resurrect a deactivated listing either.
	let token = api.issue_share_token(a, listing_id).await.unwrap();
	assert!(matches!(
		api.shared_listing(&token).await,
		Err(Error::NotFound(_))
	));
}

#[tokio::test]
async fn test_only_the_owner_may_modify() {
	let api = load_test_api("owner_only").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let b = create_test_profile(&api.db, "Bob").await;
	let listing_id = create_listing(&api, a, ListingPermission::Public).await;

	assert!(matches!(
		api.update_listing(b, listing_id, details(ListingPermission::Public))
			.await,
		Err(Error::Unauthorized(_))
	));
	assert!(matches!(
		api.delete_listing(b, listing_id).await,
		Err(Error::Unauthorized(_))
	));
	assert!(matches!(
		api.set_listing_permission(b, listing_id, ListingPermission::Private)
			.await,
		Err(Error::Unauthorized(_))
	));

	// Malformed fields are rejected before anything is written.
	let mut bad = details(ListingPermission::Public);
	bad.price = 0;
	assert!(matches!(
		api.update_listing(a, listing_id, bad).await,
		Err(Error::Input(_))
	));
	let mut bad = details(ListingPermission::Public);
	bad.title = "  ".to_string();
	assert!(matches!(api.create_listing(a, bad).await, Err(Error::Input(_))));
}

#[tokio::test]
async fn test_listing_images() {
	let api = load_test_api("listing_images").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let b = create_test_profile(&api.db, "Bob").await;
	let listing_id = create_listing(&api, a, ListingPermission::Public).await;

	assert!(matches!(
		api.attach_image(b, listing_id, "image/png", &[0u8; 64]).await,
		Err(Error::Unauthorized(_))
	));
	assert!(matches!(
		api.attach_image(a, listing_id, "text/html", &[0u8; 64]).await,
		Err(Error::Input(_))
	));
	let oversized = vec![0u8; MAX_IMAGE_SIZE + 1];
	assert!(matches!(
		api.attach_image(a, listing_id, "image/jpeg", &oversized).await,
		Err(Error::Input(_))
	));

	let image = api
		.attach_image(a, listing_id, "image/png", &[0u8; 128])
		.await
		.unwrap();
	assert!(image.url.starts_with("/media/"));
	assert_eq!(image.sequence, 0);
	let second = api
		.attach_image(a, listing_id, "image/jpeg", &[0u8; 128])
		.await
		.unwrap();
	assert_eq!(second.sequence, 1);

	let info = api.get_listing(Some(a), listing_id).await.unwrap();
	assert_eq!(info.images.len(), 2);
	assert_eq!(info.images[0].id, image.id);

	api.remove_image(a, listing_id, image.id).await.unwrap();
	let info = api.get_listing(Some(a), listing_id).await.unwrap();
	assert_eq!(info.images.len(), 1);
	assert!(matches!(
		api.remove_image(a, listing_id, image.id).await,
		Err(Error::NotFound(_))
	));
}

#[tokio::test]
async fn test_deleting_a_listing_removes_it_everywhere() {
	let api = load_test_api("listing_deletion").await;
	let a = create_test_profile(&api.db, "Alice").await;
	let listing_id = create_listing(&api, a, ListingPermission::LinkOnly).await;
	let token = api.issue_share_token(a, listing_id).await.unwrap();
	api.attach_image(a, listing_id, "image/png", &[0u8; 64])
		.await
		.unwrap();

	api.delete_listing(a, listing_id).await.unwrap();

	assert!(matches!(
		api.get_listing(Some(a), listing_id).await,
		Err(Error::NotFound(_))
	));
	// The token leads nowhere, and doesn't reveal that anything ever existed.
	assert!(matches!(
		api.shared_listing(&token).await,
		Err(Error::NotFound(_))
	));
	assert!(api.db.listing_images(listing_id).await.unwrap().is_empty());
}
