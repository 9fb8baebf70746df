use axum::{body::Body, response::Response};
use log::*;
use serde::Serialize;

use crate::error::Error;


pub fn json_response(json: &impl Serialize) -> Response {
	Response::builder()
		.header("Content-Type", "application/json")
		.body(Body::from(
			serde_json::to_string(json).expect("json serialization issue"),
		))
		.unwrap()
}

pub fn ok_response() -> Response {
	Response::builder().status(200).body(Body::empty()).unwrap()
}

pub fn error_response<S>(status_code: u16, message: S) -> Response
where
	S: Into<String>,
{
	let string: String = message.into();
	if status_code >= 400 {
		warn!("HTTP {} error: {}", status_code, &string);
	}
	Response::builder()
		.status(status_code)
		.header("Content-Type", "text/plain")
		.body(Body::from(string))
		.unwrap()
}

/// Maps the error taxonomy onto HTTP statuses. Store and blob failures keep
/// their detail in the server log only.
pub fn api_error_response(e: Error) -> Response {
	match &e {
		Error::Input(_) => error_response(400, e.to_string()),
		Error::Unauthenticated => error_response(401, e.to_string()),
		Error::Unauthorized(_) => error_response(403, e.to_string()),
		Error::NotFound(_) => error_response(404, e.to_string()),
		Error::Conflict(_) => error_response(409, e.to_string()),
		Error::Database(inner) => {
			error!("Database issue: {:?}", inner);
			error_response(500, "internal storage issue")
		}
		Error::Storage(inner) => {
			error!("Blob storage issue: {:?}", inner);
			error_response(500, "internal storage issue")
		}
	}
}
