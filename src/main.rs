mod api;
mod common;
mod config;
mod core;
mod db;
mod directory;
mod entity;
mod error;
mod graph;
mod media;
mod visibility;
mod web;

use std::{
	env, fmt,
	fs::File,
	io::{self, prelude::*},
	path::{Path, PathBuf},
	str::FromStr,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
};

use api::Api;
use config::Config;
use db::Database;
use log::*;
use media::{BlobStore, FsBlobStore};
use signal_hook::flag;

use crate::config::CONFIG;


fn initialize_logging() {
	let result = env::var_os("SYSTEM_LOG_FILE").map(|os| PathBuf::from(os));

	if let Some(filename) = result {
		simple_logging::log_to_file(filename, LevelFilter::Debug)
			.expect("unable to initialize logger")
	} else {
		env_logger::init()
	}
}

fn config_path() -> PathBuf {
	let user_path = PathBuf::from_str(config::CONFIG_FILE_USER_PATH).unwrap();
	if user_path.exists() {
		return user_path;
	}
	PathBuf::from_str(config::CONFIG_FILE_PATH).unwrap()
}

fn load_config<P>(path: P) -> Option<Config>
where
	P: AsRef<Path> + fmt::Debug,
{
	let mut file = match File::open(&path) {
		Err(e) => match e.kind() {
			io::ErrorKind::NotFound => {
				error!("Config file {:?} not found!", path);
				return None;
			}
			_ => {
				error!("Unable to open config file {:?}: {}", path, e);
				return None;
			}
		},
		Ok(f) => f,
	};

	let mut content = String::new();
	match file.read_to_string(&mut content) {
		Err(e) => {
			error!("Unable to read config file {:?}: {}", path, e);
			return None;
		}
		Ok(_) => {}
	}

	match toml::from_str(&content) {
		Err(e) => {
			error!("Unable to parse config file {:?}: {}", path, e);
			None
		}
		Ok(c) => Some(c),
	}
}

async fn load_database(config: &Config) -> io::Result<Database> {
	// If the path doesn't exist yet, create it
	let db_path = PathBuf::from_str(&config.database_path)
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
	match db_path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() =>
			tokio::fs::create_dir_all(parent).await?,
		_ => {}
	}

	let db = Database::load(db_path)
		.await
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
	Ok(db)
}

#[tokio::main]
async fn main() {
	initialize_logging();

	// Load config
	let config_path = config_path();
	if let Some(config) = load_config(&config_path) {
		if let Err(_) = CONFIG.set(config.clone()) {
			panic!("Unable to set config global.")
		}

		// Catch signals
		let stop_flag = Arc::new(AtomicBool::new(false));
		flag::register(signal_hook::consts::SIGINT, stop_flag.clone()).unwrap();
		flag::register(signal_hook::consts::SIGTERM, stop_flag.clone()).unwrap();
		let stop_flag2 = stop_flag.clone();
		ctrlc::set_handler(move || {
			stop_flag2.store(true, Ordering::Relaxed);
		})
		.expect("Error setting Ctrl-C handler");

		// Load database
		let db = match load_database(&config).await {
			Ok(db) => db,
			Err(e) => {
				error!("Unable to load database: {}", e);
				return;
			}
		};

		// Blob storage for listing photos
		let media_path = PathBuf::from(config.media_path.clone().unwrap_or("media".to_string()));
		let media_url_base = config.media_url_base.clone().unwrap_or("/media".to_string());
		let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(media_path, media_url_base));

		// Run the web server until a signal arrives
		let api = Api { db, blobs };
		let port = config.web_port.unwrap_or(8080);
		web::serve(stop_flag, port, api, config).await;

		info!("Exiting hearthd...");
	}
}
