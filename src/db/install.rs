pub const QUERY: &'static str = r#"
	BEGIN;

	CREATE TABLE version (
		major INTEGER NOT NULL,
		minor INTEGER NOT NULL,
		patch INTEGER NOT NULL
	);
	INSERT INTO version VALUES (0, 1, 0);

	CREATE TABLE profile (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL,
		phone TEXT NOT NULL,
		phone_verified INTEGER NOT NULL DEFAULT FALSE,
		city TEXT,
		state TEXT,
		created INTEGER NOT NULL,
		UNIQUE(phone)
	);

	CREATE TABLE session (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		token TEXT NOT NULL,
		profile_id INTEGER NOT NULL,
		created INTEGER NOT NULL,
		UNIQUE(token),
		FOREIGN KEY(profile_id) REFERENCES profile(id) ON DELETE CASCADE
	);

	CREATE TABLE connection (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		low_id INTEGER NOT NULL,
		high_id INTEGER NOT NULL,
		status TEXT NOT NULL,
		requested_by INTEGER NOT NULL,
		created INTEGER NOT NULL,
		updated INTEGER NOT NULL,
		UNIQUE(low_id, high_id),
		CHECK(low_id < high_id),
		FOREIGN KEY(low_id) REFERENCES profile(id) ON DELETE CASCADE,
		FOREIGN KEY(high_id) REFERENCES profile(id) ON DELETE CASCADE
	);
	CREATE INDEX idx_connection_low ON connection(low_id, status);
	CREATE INDEX idx_connection_high ON connection(high_id, status);

	CREATE TABLE listing (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		owner_id INTEGER NOT NULL,
		title TEXT NOT NULL,
		description TEXT NOT NULL,
		kind TEXT NOT NULL,
		price INTEGER NOT NULL,
		city TEXT NOT NULL,
		state TEXT NOT NULL,
		permission TEXT NOT NULL,
		share_token TEXT,
		is_active INTEGER NOT NULL DEFAULT TRUE,
		created INTEGER NOT NULL,
		updated INTEGER NOT NULL,
		UNIQUE(share_token),
		FOREIGN KEY(owner_id) REFERENCES profile(id) ON DELETE CASCADE
	);
	CREATE INDEX idx_listing_owner ON listing(owner_id);
	CREATE INDEX idx_listing_visibility ON listing(permission, is_active);

	CREATE TABLE listing_image (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		listing_id INTEGER NOT NULL,
		url TEXT NOT NULL,
		mime_type TEXT NOT NULL,
		size INTEGER NOT NULL,
		sequence INTEGER NOT NULL,
		created INTEGER NOT NULL,
		FOREIGN KEY(listing_id) REFERENCES listing(id) ON DELETE CASCADE
	);
	CREATE INDEX idx_listing_image_listing ON listing_image(listing_id);

	COMMIT;
"#;
