use std::time::{SystemTime, UNIX_EPOCH};

use base58::ToBase58;
use rand::{rngs::OsRng, RngCore};


pub fn current_timestamp() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap()
		.as_millis() as _
}

/// Generates an unguessable token: 256 bits from the OS RNG, rendered in
/// base58 so that it survives being pasted into an URL.
pub fn generate_token() -> String {
	let mut bytes = [0u8; 32];
	OsRng.fill_bytes(&mut bytes);
	bytes.to_base58()
}
