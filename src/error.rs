use std::{fmt, io};

use thiserror::Error;

use crate::db;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Malformed or out-of-range parameters. Rejected before any store call.
	Input(String),
	/// Missing or invalid credential.
	Unauthenticated,
	/// Authenticated, but not permitted to perform the operation.
	Unauthorized(&'static str),
	/// The entity does not exist, or is not visible to the caller. The two
	/// cases are deliberately indistinguishable.
	NotFound(&'static str),
	/// The operation collides with existing state.
	Conflict(&'static str),
	/// The data store failed in a way the caller can not recover from.
	Database(db::Error),
	/// The blob storage collaborator failed.
	Storage(io::Error),
}


impl From<db::Error> for Error {
	fn from(other: db::Error) -> Self {
		match other {
			db::Error::DuplicateConnection(..) =>
				Self::Conflict("a connection already exists for this pair"),
			other => Self::Database(other),
		}
	}
}

impl From<sea_orm::DbErr> for Error {
	fn from(other: sea_orm::DbErr) -> Self { Self::Database(db::Error::OrmError(other)) }
}

impl From<io::Error> for Error {
	fn from(other: io::Error) -> Self { Self::Storage(other) }
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Input(message) => write!(f, "invalid input: {}", message),
			Self::Unauthenticated => write!(f, "missing or invalid credential"),
			Self::Unauthorized(message) => write!(f, "not permitted: {}", message),
			Self::NotFound(what) => write!(f, "{} not found", what),
			Self::Conflict(message) => write!(f, "{}", message),
			Self::Database(e) => write!(f, "database issue: {}", e),
			Self::Storage(e) => write!(f, "storage issue: {}", e),
		}
	}
}
