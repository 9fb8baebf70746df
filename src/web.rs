pub mod common;
mod friends;
mod listings;
mod session;

use std::{
	net::{Ipv4Addr, SocketAddr, SocketAddrV4},
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::Duration,
};

use axum::{extract::DefaultBodyLimit, Router};
use log::*;
use tokio::time::sleep;
use tower_http::services::ServeDir;

use crate::{api::Api, config::Config};


pub struct Global {
	pub api: Api,
	pub config: Config,
}


pub async fn serve(stop_flag: Arc<AtomicBool>, port: u16, api: Api, config: Config) {
	let global = Arc::new(Global { api, config });
	let media_dir = global
		.config
		.media_path
		.clone()
		.unwrap_or("media".to_string());

	let app = Router::new()
		.nest("/friends", friends::router(global.clone()))
		.nest("/listings", listings::router(global.clone()))
		.nest_service("/media", ServeDir::new(media_dir))
		.layer(DefaultBodyLimit::max(10_000_000))
		.with_state(global);

	let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
	let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
	info!("Web server listening on {}.", addr);
	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(async move {
		while !stop_flag.load(Ordering::Relaxed) {
			sleep(Duration::from_secs(1)).await;
		}
	})
	.await
	.unwrap();
}
