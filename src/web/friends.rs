use std::sync::Arc;

use axum::{
	extract::{Extension, Path, State},
	middleware::from_fn_with_state,
	response::Response,
	routing::{delete, get, post},
	Json, Router,
};
use serde::Deserialize;

use super::{
	common::*,
	session::{require_session, SessionUser},
	Global,
};


pub fn router(g: Arc<Global>) -> Router<Arc<Global>> {
	Router::new()
		.route("/send-request", post(send_request))
		.route("/accept-request/:id", post(accept_request))
		.route("/reject-request/:id", delete(reject_request))
		.route("/requests", get(requests))
		.route("/list", get(list))
		.route("/network/:degree", get(network))
		.route("/remove/:friend_id", delete(remove))
		.route("/block/:user_id", post(block))
		.route_layer(from_fn_with_state(g, require_session))
}


#[derive(Deserialize)]
struct SendRequestForm {
	profile_id: i64,
}

async fn send_request(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Json(form): Json<SendRequestForm>,
) -> Response {
	match g.api.send_friend_request(user, form.profile_id).await {
		Ok(request) => json_response(&request),
		Err(e) => api_error_response(e),
	}
}

async fn accept_request(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(connection_id): Path<i64>,
) -> Response {
	match g.api.accept_friend_request(user, connection_id).await {
		Ok(friend) => json_response(&friend),
		Err(e) => api_error_response(e),
	}
}

async fn reject_request(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(connection_id): Path<i64>,
) -> Response {
	match g.api.reject_friend_request(user, connection_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}

async fn requests(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
) -> Response {
	match g.api.pending_requests(user).await {
		Ok(requests) => json_response(&requests),
		Err(e) => api_error_response(e),
	}
}

async fn list(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
) -> Response {
	match g.api.friends_list(user).await {
		Ok(friends) => json_response(&friends),
		Err(e) => api_error_response(e),
	}
}

async fn network(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(degree): Path<u32>,
) -> Response {
	match g.api.network(user, degree).await {
		Ok(profiles) => json_response(&profiles),
		Err(e) => api_error_response(e),
	}
}

async fn remove(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(friend_id): Path<i64>,
) -> Response {
	match g.api.remove_friend(user, friend_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}

async fn block(
	State(g): State<Arc<Global>>, Extension(SessionUser(user)): Extension<SessionUser>,
	Path(user_id): Path<i64>,
) -> Response {
	match g.api.block_user(user, user_id).await {
		Ok(()) => ok_response(),
		Err(e) => api_error_response(e),
	}
}
