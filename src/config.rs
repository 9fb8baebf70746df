use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use serde::*;


/// The file path of the configuration file
#[cfg(target_family = "unix")]
pub const CONFIG_FILE_PATH: &str = "/etc/hearth/config.toml";
#[cfg(target_family = "windows")]
pub const CONFIG_FILE_PATH: &str = "C:\\Program Files\\hearth\\config.toml";
/// A config file in the working directory takes precedence, if present.
pub const CONFIG_FILE_USER_PATH: &str = "./config.toml";

#[derive(Clone, Deserialize)]
pub struct Config {
	pub database_path: String,

	pub web_port: Option<u16>,

	/// Directory where uploaded listing photos are kept.
	pub media_path: Option<String>,
	/// URL prefix under which the media directory is served.
	pub media_url_base: Option<String>,
}


impl Default for Config {
	fn default() -> Self {
		Self {
			database_path: String::default(),
			web_port: None,
			media_path: None,
			media_url_base: None,
		}
	}
}


lazy_static! {
	pub static ref CONFIG: OnceCell<Config> = OnceCell::new();
}
