//! Listing photos pass through here on their way to blob storage. The
//! service's only involvement is validating the upload before delegating;
//! the `BlobStore` trait is the seam to the external storage collaborator.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use log::*;
use tokio::fs;

use crate::{
	common::generate_token,
	core::{ALLOWED_IMAGE_MIME_TYPES, MAX_IMAGE_SIZE},
	error::{Error, Result},
};


#[async_trait]
pub trait BlobStore: Send + Sync {
	/// Stores the blob under the given scope and returns a publicly
	/// fetchable URL for it.
	async fn store(&self, scope: &str, mime_type: &str, data: &[u8]) -> io::Result<String>;

	async fn delete(&self, url: &str) -> io::Result<()>;
}

/// Keeps blobs in a directory on disk, served back out by the web layer.
/// Stands in for a hosted blob service.
pub struct FsBlobStore {
	root: PathBuf,
	url_base: String,
}


/// Rejects anything that shouldn't reach blob storage at all. Runs before
/// any store call is made.
pub fn validate_image(mime_type: &str, size: usize) -> Result<()> {
	if !ALLOWED_IMAGE_MIME_TYPES.contains(&mime_type) {
		return Err(Error::Input(format!(
			"unsupported image type \"{}\"",
			mime_type
		)));
	}
	if size > MAX_IMAGE_SIZE {
		return Err(Error::Input(format!(
			"image exceeds the limit of {} bytes",
			MAX_IMAGE_SIZE
		)));
	}
	Ok(())
}


impl FsBlobStore {
	pub fn new(root: PathBuf, url_base: String) -> Self {
		Self {
			root,
			url_base: url_base.trim_end_matches('/').to_string(),
		}
	}

	fn extension(mime_type: &str) -> &'static str {
		match mime_type {
			"image/jpeg" => "jpg",
			"image/png" => "png",
			"image/webp" => "webp",
			"image/gif" => "gif",
			_ => "bin",
		}
	}
}

#[async_trait]
impl BlobStore for FsBlobStore {
	async fn store(&self, scope: &str, mime_type: &str, data: &[u8]) -> io::Result<String> {
		let name = format!("{}.{}", generate_token(), Self::extension(mime_type));

		let mut path = self.root.clone();
		path.push(scope);
		fs::create_dir_all(&path).await?;
		path.push(&name);
		fs::write(&path, data).await?;

		debug!("Stored blob at {}", path.display());
		Ok(format!("{}/{}/{}", self.url_base, scope, name))
	}

	async fn delete(&self, url: &str) -> io::Result<()> {
		// Map the public URL back onto the media directory. Anything that
		// doesn't point into it is not ours to touch.
		let relative = match url.strip_prefix(&self.url_base) {
			Some(r) => r.trim_start_matches('/'),
			None => {
				warn!("Refusing to delete blob outside of the media root: {}", url);
				return Ok(());
			}
		};
		if relative.contains("..") {
			warn!("Refusing to delete blob outside of the media root: {}", url);
			return Ok(());
		}

		let mut path = self.root.clone();
		path.push(relative);
		match fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e),
		}
	}
}
