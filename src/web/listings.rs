use std::sync::Arc;

use axum::{
	extract::{Extension, Multipart, Path, Query, State},
	http::HeaderMap,
	middleware::from_fn_with_state,
	response::Response,
	routing::{delete, get, patch, post, put},
	Json, Router,
};
use log::*;
use serde::Deserialize;

use super::{
	common::*,
	session::{bearer_profile, require_session, SessionUser},
	Global,
};
use crate::{
	api::ListingDetails,
	core::{ListingKind, ListingPermission},
	directory::{ListingFilter, PageRequest},
};


pub fn router(g: Arc<Global>) -> Router<Arc<Global>> {
	let authenticated = Router::new()
		.route("/", get(index).post(create))
		.route("/mine", get(mine))
		.route("/:id", put(update))
		.route("/:id", delete(remove))
		.route("/:id/permission", patch(change_permission))
		.route("/:id/share", post(issue_share))
		.route("/:id/share", delete(revoke_share))
		.route("/:id/images", post(upload_image))
		.route("/:id/images/:image_id", delete(remove_image))
		.route_layer(from_fn_with_state(g, require_session));

	// These are reachable without a session; a present credential is still
	// resolved, an invalid one still rejected.
	Router::new()
		.route("/public", get(public_index))
		.route("/shared/:token", get(shared))
		.route("/:id", get(show))
		.merge(authenticated)
}


#[derive(Deserialize)]
struct ListingQuery {
	kind: Option<ListingKind>,
	city: Option<String>,
	state: Option<String>,
	min_price: Option<i64>,
	max_price: Option<i64>,
	page: Option<u64>,
	limit: Option<u64>,
}

impl ListingQuery {
	fn split(self) -> (ListingFilter, PageRequest) {
		(
			ListingFilter {
				kind: self.kind,
				city: self.city,
				state: self.state,
				min_price: self.min_price,
				max_price: self.max_price,
			},
			PageRequest {
				page: self.page,
				limit: self.limit,
			},
		)
	}
}


async fn index(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Query(query): Query<ListingQuery>,
) -> Response {
	let (filter, page) = query.split();
	match g.api.visible_listings(user, &filter, &page).await {
		Ok(listings) => json_response(&listings),
		Err(e) => api_error_response(e),
	}
}

async fn public_index(State(g): State<Arc<Global>>, Query(query): Query<ListingQuery>) -> Response {
	let (filter, page) = query.split();
	match g.api.public_listings(&filter, &page).await {
		Ok(listings) => json_response(&listings),
		Err(e) => api_error_response(e),
	}
}

async fn mine(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Query(query): Query<ListingQuery>,
) -> Response {
	let (filter, page) = query.split();
	match g.api.own_listings(user, &filter, &page).await {
		Ok(listings) => json_response(&listings),
		Err(e) => api_error_response(e),
	}
}

async fn create(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Json(details): Json<ListingDetails>,
) -> Response {
	match g.api.create_listing(user, details).await {
		Ok(listing) => json_response(&listing),
		Err(e) => api_error_response(e),
	}
}

async fn show(
	State(g): State<Arc<Global>>, Path(listing_id): Path<i64>, headers: HeaderMap,
) -> Response {
	let viewer = match bearer_profile(&g, &headers).await {
		Ok(v) => v,
		Err(e) => return api_error_response(e),
	};
	match g.api.get_listing(viewer, listing_id).await {
		Ok(listing) => json_response(&listing),
		Err(e) => api_error_response(e),
	}
}

async fn shared(State(g): State<Arc<Global>>, Path(token): Path<String>) -> Response {
	match g.api.shared_listing(&token).await {
		Ok(listing) => json_response(&listing),
		Err(e) => api_error_response(e),
	}
}

async fn update(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>, Json(details): Json<ListingDetails>,
) -> Response {
	match g.api.update_listing(user, listing_id, details).await {
		Ok(listing) => json_response(&listing),
		Err(e) => api_error_response(e),
	}
}

async fn remove(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>,
) -> Response {
	match g.api.delete_listing(user, listing_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}

#[derive(Deserialize)]
struct PermissionForm {
	permission: ListingPermission,
}

async fn change_permission(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>, Json(form): Json<PermissionForm>,
) -> Response {
	match g
		.api
		.set_listing_permission(user, listing_id, form.permission)
		.await
	{
		Ok(listing) => json_response(&listing),
		Err(e) => api_error_response(e),
	}
}

async fn issue_share(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>,
) -> Response {
	match g.api.issue_share_token(user, listing_id).await {
		Ok(token) => json_response(&serde_json::json!({ "share_token": token })),
		Err(e) => api_error_response(e),
	}
}

async fn revoke_share(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>,
) -> Response {
	match g.api.revoke_share_token(user, listing_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}

async fn upload_image(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(listing_id): Path<i64>, mut form: Multipart,
) -> Response {
	let mut upload: Option<(String, Vec<u8>)> = None;

	// Collect the form fields
	loop {
		let field = match form.next_field().await {
			Ok(Some(f)) => f,
			Ok(None) => break,
			Err(e) => return error_response(400, format!("invalid multipart body: {}", e)),
		};
		let name = field.name().unwrap_or_default().to_string();
		if name != "image" {
			warn!("Unrecognized form field: {}", name);
			continue;
		}

		let mime_type = match field.content_type() {
			Some(content_type) => content_type.to_string(),
			None => return error_response(400, "image field is missing a content type"),
		};
		let data = match field.bytes().await {
			Ok(d) => d,
			Err(e) => return error_response(400, format!("unable to read image field: {}", e)),
		};
		upload = Some((mime_type, data.to_vec()));
	}

	let (mime_type, data) = match upload {
		Some(u) => u,
		None => return error_response(400, "missing image field"),
	};
	match g
		.api
		.attach_image(user, listing_id, &mime_type, &data)
		.await
	{
		Ok(image) => json_response(&image),
		Err(e) => api_error_response(e),
	}
}

async fn remove_image(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path((listing_id, image_id)): Path<(i64, i64)>,
) -> Response {
	match g.api.remove_image(user, listing_id, image_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}
