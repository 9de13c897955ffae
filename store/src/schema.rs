//! Schema and migrations.
//!
//! Versioning is monotonic through `PRAGMA user_version`; migrations are
//! forward-only and each runs in its own transaction. A store file whose
//! version is ahead of this build is refused rather than guessed at.

use rusqlite::Connection;

use vocalia_common::errors::StoreError;

/// One entry per schema version, applied in order. Index 0 takes an empty
/// file to version 1.
const MIGRATIONS: &[&str] = &[
	// v1: the initial schema.
	"
	CREATE TABLE apps (
		package_name     TEXT PRIMARY KEY,
		app_hash         TEXT NOT NULL,
		version_code     INTEGER NOT NULL DEFAULT 0,
		version_name     TEXT NOT NULL DEFAULT '',
		scraping_mode    TEXT NOT NULL DEFAULT 'dynamic',
		is_fully_learned INTEGER NOT NULL DEFAULT 0,
		scrape_count     INTEGER NOT NULL DEFAULT 0,
		element_count    INTEGER NOT NULL DEFAULT 0,
		command_count    INTEGER NOT NULL DEFAULT 0,
		first_scraped_at INTEGER NOT NULL,
		last_scraped_at  INTEGER NOT NULL
	);

	CREATE TABLE screens (
		screen_hash    TEXT PRIMARY KEY,
		package_name   TEXT NOT NULL REFERENCES apps(package_name) ON DELETE CASCADE,
		activity_class TEXT NOT NULL,
		window_title   TEXT NOT NULL,
		visit_count    INTEGER NOT NULL DEFAULT 1,
		first_seen_at  INTEGER NOT NULL,
		last_seen_at   INTEGER NOT NULL
	);
	CREATE INDEX idx_screens_package ON screens(package_name);

	CREATE TABLE elements (
		element_hash        TEXT PRIMARY KEY,
		package_name        TEXT NOT NULL,
		screen_hash         TEXT NOT NULL REFERENCES screens(screen_hash) ON DELETE CASCADE,
		class_name          TEXT NOT NULL,
		resource_id         TEXT,
		text                TEXT,
		content_description TEXT,
		bound_left          INTEGER NOT NULL DEFAULT 0,
		bound_top           INTEGER NOT NULL DEFAULT 0,
		bound_right         INTEGER NOT NULL DEFAULT 0,
		bound_bottom        INTEGER NOT NULL DEFAULT 0,
		is_clickable        INTEGER NOT NULL DEFAULT 0,
		is_long_clickable   INTEGER NOT NULL DEFAULT 0,
		is_scrollable       INTEGER NOT NULL DEFAULT 0,
		is_focusable        INTEGER NOT NULL DEFAULT 0,
		is_enabled          INTEGER NOT NULL DEFAULT 1,
		input_type          TEXT,
		placeholder_text    TEXT,
		depth               INTEGER NOT NULL DEFAULT 0,
		child_order         INTEGER NOT NULL DEFAULT 0,
		list_index          INTEGER,
		in_scrollable       INTEGER NOT NULL DEFAULT 0,
		visual_weight       INTEGER NOT NULL DEFAULT 0,
		last_seen_at        INTEGER NOT NULL,
		form_group_id       TEXT
	);
	CREATE INDEX idx_elements_package_screen ON elements(package_name, screen_hash);

	CREATE TABLE hierarchy (
		parent_hash TEXT NOT NULL REFERENCES elements(element_hash) ON DELETE CASCADE,
		child_hash  TEXT NOT NULL REFERENCES elements(element_hash) ON DELETE CASCADE,
		child_order INTEGER NOT NULL,
		PRIMARY KEY (parent_hash, child_hash)
	);
	CREATE INDEX idx_hierarchy_parent ON hierarchy(parent_hash);
	CREATE INDEX idx_hierarchy_child ON hierarchy(child_hash);

	CREATE TABLE element_states (
		element_hash   TEXT NOT NULL REFERENCES elements(element_hash) ON DELETE CASCADE,
		state_type     TEXT NOT NULL,
		value          TEXT NOT NULL,
		changed_at     INTEGER NOT NULL,
		trigger_source TEXT NOT NULL
	);
	CREATE INDEX idx_element_states_element ON element_states(element_hash, state_type);

	CREATE TABLE element_relationships (
		source_hash       TEXT NOT NULL REFERENCES elements(element_hash) ON DELETE CASCADE,
		target_hash       TEXT NOT NULL REFERENCES elements(element_hash) ON DELETE CASCADE,
		relationship_type TEXT NOT NULL,
		relationship_data TEXT,
		updated_at        INTEGER NOT NULL,
		PRIMARY KEY (source_hash, target_hash, relationship_type)
	);

	CREATE TABLE commands (
		command_id    INTEGER PRIMARY KEY AUTOINCREMENT,
		package_name  TEXT NOT NULL,
		element_hash  TEXT REFERENCES elements(element_hash) ON DELETE CASCADE,
		phrase        TEXT NOT NULL,
		action_type   TEXT NOT NULL,
		confidence    REAL NOT NULL DEFAULT 0,
		is_persistent INTEGER NOT NULL DEFAULT 0,
		last_used_at  INTEGER,
		created_at    INTEGER NOT NULL,
		UNIQUE (package_name, phrase)
	);

	CREATE TABLE interactions (
		element_hash TEXT NOT NULL,
		action_type  TEXT NOT NULL,
		succeeded    INTEGER NOT NULL,
		latency_ms   INTEGER NOT NULL,
		timestamp    INTEGER NOT NULL
	);
	CREATE INDEX idx_interactions_element ON interactions(element_hash);
	",
];

/// The schema version this build writes.
pub const CURRENT_VERSION: i64 = MIGRATIONS.len() as i64;

fn user_version(conn: &Connection) -> Result<i64, rusqlite::Error> {
	conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Bring `conn` up to [`CURRENT_VERSION`], applying each pending migration in
/// its own transaction so a failure leaves the store at a well-defined older
/// version.
pub fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
	let found = user_version(conn)?;
	if found > CURRENT_VERSION {
		return Err(StoreError::SchemaTooNew { found, supported: CURRENT_VERSION });
	}
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	for (index, migration) in MIGRATIONS.iter().enumerate().skip(found as usize) {
		let version = index as i64 + 1;
		tracing::debug!(version, "applying store migration");
		let tx = conn.transaction()?;
		tx.execute_batch(migration)?;
		tx.pragma_update(None, "user_version", version)?;
		tx.commit()?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn migrate_is_idempotent() -> eyre::Result<()> {
		let mut conn = Connection::open_in_memory()?;
		migrate(&mut conn)?;
		migrate(&mut conn)?;
		assert_eq!(user_version(&conn)?, CURRENT_VERSION);
		Ok(())
	}

	#[test]
	fn a_newer_store_is_refused() -> eyre::Result<()> {
		let mut conn = Connection::open_in_memory()?;
		conn.pragma_update(None, "user_version", CURRENT_VERSION + 5)?;
		let err = migrate(&mut conn);
		assert!(matches!(err, Err(StoreError::SchemaTooNew { .. })));
		Ok(())
	}
}
