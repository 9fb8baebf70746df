use std::sync::Arc;

use axum::{
	extract::{Request, State},
	http::HeaderMap,
	middleware::Next,
	response::Response,
};

use super::{common::*, Global};
use crate::error::{Error, Result};


/// The authenticated profile, inserted into the request extensions by
/// [`require_session`].
#[derive(Clone, Copy, Debug)]
pub struct SessionUser(pub i64);


pub async fn require_session(
	State(g): State<Arc<Global>>, mut request: Request, next: Next,
) -> Response {
	match bearer_profile(&g, request.headers()).await {
		Ok(Some(profile_id)) => {
			request.extensions_mut().insert(SessionUser(profile_id));
			next.run(request).await
		}
		Ok(None) => api_error_response(Error::Unauthenticated),
		Err(e) => api_error_response(e),
	}
}

/// Resolves the Authorization header, if any. An absent header is `None`; a
/// header that doesn't resolve to a session is an error.
pub async fn bearer_profile(g: &Global, headers: &HeaderMap) -> Result<Option<i64>> {
	let header = match headers.get("Authorization") {
		None => return Ok(None),
		Some(h) => h,
	};
	let token = header
		.to_str()
		.ok()
		.and_then(|value| value.strip_prefix("Bearer "))
		.ok_or(Error::Unauthenticated)?;

	let profile_id = g.api.authenticate(token).await?;
	Ok(Some(profile_id))
}
