#![deny(
	clippy::all,
	clippy::pedantic,
	clippy::cargo,
	clippy::map_unwrap_or,
	clippy::unwrap_used,
	missing_docs,
	unsafe_code
)]

//! Vocalia's embedded store.
//!
//! A single SQLite file holds everything the engine persists: apps, screens,
//! elements, the walked hierarchy, element-state history, generated commands,
//! and the interaction log. The `Store` is the only mutator of persistent
//! state in the whole engine; every other crate borrows it read-only. All
//! multi-table writes happen inside one transaction, so a reader never sees
//! a half-committed scrape.

mod schema;
pub use schema::CURRENT_VERSION;

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use vocalia_common::errors::StoreError;
use vocalia_common::hash::{AppHash, ElementHash, ScreenHash};
use vocalia_common::model::{
	AppRecord, Bounds, CommandRecord, ElementRecord, ElementRelationship, EpochMillis,
	HierarchyEdge, InteractionRecord, ScrapingMode, ScreenRecord, StateChange, StateType,
};

/// State-history rows older than this are pruned by [`Store::run_maintenance`].
const STATE_HISTORY_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1_000;
/// Non-persistent commands for apps idle longer than this are pruned.
const IDLE_COMMAND_RETENTION_MS: i64 = 24 * 60 * 60 * 1_000;
/// TEXT_CHANGED transitions within this window qualify an element as live.
const LIVE_REGION_WINDOW_MS: i64 = 30 * 1_000;
/// Transitions required inside the window to qualify as live.
const LIVE_REGION_MIN_CHANGES: i64 = 3;

/// The embedded relational store. Construct one at engine start and pass it
/// by reference; it is internally synchronized with short critical sections
/// and never holds its lock across anything but the SQLite call itself.
pub struct Store {
	conn: Mutex<Connection>,
}

impl Store {
	/// Open (creating if needed) the store file at `path` and bring its
	/// schema up to date.
	///
	/// # Errors
	/// Fails if the file is unreadable, the schema is newer than this build,
	/// or a migration fails (in which case the store is left at the prior
	/// version).
	pub fn open(path: &Path) -> Result<Self, StoreError> {
		let conn = Connection::open(path)?;
		Self::from_connection(conn)
	}

	/// An in-memory store, used by tests and by hosts that opt out of
	/// persistence.
	///
	/// # Errors
	/// Fails only if SQLite cannot allocate the database.
	pub fn open_in_memory() -> Result<Self, StoreError> {
		Self::from_connection(Connection::open_in_memory()?)
	}

	fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
		conn.pragma_update(None, "foreign_keys", "ON")?;
		schema::migrate(&mut conn)?;
		Ok(Self { conn: Mutex::new(conn) })
	}

	/// Insert or update an app by `package_name`, returning its content hash.
	///
	/// # Errors
	/// Any SQLite failure; the row is untouched on error.
	pub fn upsert_app(&self, app: &AppRecord) -> Result<AppHash, StoreError> {
		let conn = self.conn.lock();
		conn.execute(
			"INSERT INTO apps (package_name, app_hash, version_code, version_name,
				scraping_mode, is_fully_learned, scrape_count, element_count,
				command_count, first_scraped_at, last_scraped_at)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
			 ON CONFLICT(package_name) DO UPDATE SET
				app_hash = excluded.app_hash,
				version_code = excluded.version_code,
				version_name = excluded.version_name,
				scraping_mode = excluded.scraping_mode,
				is_fully_learned = excluded.is_fully_learned,
				last_scraped_at = excluded.last_scraped_at",
			params![
				app.package_name,
				app.app_hash.as_str(),
				app.version_code,
				app.version_name,
				app.scraping_mode.to_string(),
				app.is_fully_learned,
				app.scrape_count,
				app.element_count,
				app.command_count,
				app.first_scraped_at,
				app.last_scraped_at,
			],
		)?;
		Ok(app.app_hash.clone())
	}

	/// Look up an app by package name.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn app(&self, package_name: &str) -> Result<Option<AppRecord>, StoreError> {
		let conn = self.conn.lock();
		conn.query_row(
			"SELECT package_name, app_hash, version_code, version_name, scraping_mode,
				is_fully_learned, scrape_count, element_count, command_count,
				first_scraped_at, last_scraped_at
			 FROM apps WHERE package_name = ?1",
			params![package_name],
			app_from_row,
		)
		.optional()
		.map_err(StoreError::from)
	}

	/// Change how an app is scraped.
	///
	/// # Errors
	/// [`StoreError::NoRow`] if the package has never been observed.
	pub fn set_scraping_mode(
		&self,
		package_name: &str,
		mode: ScrapingMode,
	) -> Result<(), StoreError> {
		let conn = self.conn.lock();
		let changed = conn.execute(
			"UPDATE apps SET scraping_mode = ?2 WHERE package_name = ?1",
			params![package_name, mode.to_string()],
		)?;
		if changed == 0 {
			return Err(StoreError::NoRow("apps"));
		}
		Ok(())
	}

	/// Insert a screen, or re-observe it: an existing row keeps its identity
	/// and first-seen time but gains a visit and a fresh `last_seen_at`.
	///
	/// # Errors
	/// Any SQLite failure; fails if the owning app row does not exist.
	pub fn upsert_screen(&self, screen: &ScreenRecord) -> Result<ScreenHash, StoreError> {
		let conn = self.conn.lock();
		conn.execute(
			"INSERT INTO screens (screen_hash, package_name, activity_class,
				window_title, visit_count, first_seen_at, last_seen_at)
			 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)
			 ON CONFLICT(screen_hash) DO UPDATE SET
				visit_count = visit_count + 1,
				last_seen_at = excluded.last_seen_at",
			params![
				screen.screen_hash.as_str(),
				screen.package_name,
				screen.activity_class,
				screen.window_title,
				screen.first_seen_at,
				screen.last_seen_at,
			],
		)?;
		Ok(screen.screen_hash.clone())
	}

	/// Look up a screen by hash.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn screen(&self, screen_hash: &ScreenHash) -> Result<Option<ScreenRecord>, StoreError> {
		let conn = self.conn.lock();
		conn.query_row(
			"SELECT screen_hash, package_name, activity_class, window_title,
				visit_count, first_seen_at, last_seen_at
			 FROM screens WHERE screen_hash = ?1",
			params![screen_hash.as_str()],
			screen_from_row,
		)
		.optional()
		.map_err(StoreError::from)
	}

	/// The atomic scrape commit. In one transaction: delete every hierarchy
	/// edge touching this package's elements, upsert the walked elements,
	/// insert the new edge set, and refresh the app counters. The ordering
	/// is load-bearing — edges are removed before any element changes so no
	/// moment exists where an edge references an element the scrape is about
	/// to replace.
	///
	/// # Errors
	/// Any failure rolls the entire transaction back; the prior scrape
	/// remains authoritative and no partial state is visible to readers.
	pub fn replace_scrape(
		&self,
		package_name: &str,
		screen_hash: &ScreenHash,
		elements: &[ElementRecord],
		edges: &[HierarchyEdge],
	) -> Result<(), StoreError> {
		let mut conn = self.conn.lock();
		let tx = conn.transaction()?;
		tx.execute(
			"DELETE FROM hierarchy WHERE parent_hash IN
				(SELECT element_hash FROM elements WHERE package_name = ?1)
			 OR child_hash IN
				(SELECT element_hash FROM elements WHERE package_name = ?1)",
			params![package_name],
		)?;
		{
			let mut upsert = tx.prepare(
				"INSERT INTO elements (element_hash, package_name, screen_hash,
					class_name, resource_id, text, content_description,
					bound_left, bound_top, bound_right, bound_bottom,
					is_clickable, is_long_clickable, is_scrollable,
					is_focusable, is_enabled, input_type, placeholder_text,
					depth, child_order, list_index, in_scrollable,
					visual_weight, last_seen_at, form_group_id)
				 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
					?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23,
					?24, ?25)
				 ON CONFLICT(element_hash) DO UPDATE SET
					screen_hash = excluded.screen_hash,
					bound_left = excluded.bound_left,
					bound_top = excluded.bound_top,
					bound_right = excluded.bound_right,
					bound_bottom = excluded.bound_bottom,
					is_clickable = excluded.is_clickable,
					is_long_clickable = excluded.is_long_clickable,
					is_scrollable = excluded.is_scrollable,
					is_focusable = excluded.is_focusable,
					is_enabled = excluded.is_enabled,
					input_type = excluded.input_type,
					placeholder_text = excluded.placeholder_text,
					depth = excluded.depth,
					child_order = excluded.child_order,
					list_index = excluded.list_index,
					in_scrollable = excluded.in_scrollable,
					visual_weight = excluded.visual_weight,
					last_seen_at = excluded.last_seen_at,
					form_group_id = excluded.form_group_id",
			)?;
			for element in elements {
				upsert.execute(params![
					element.element_hash.as_str(),
					element.package_name,
					element.screen_hash.as_str(),
					element.class_name,
					element.resource_id,
					element.text,
					element.content_description,
					element.bounds.left,
					element.bounds.top,
					element.bounds.right,
					element.bounds.bottom,
					element.is_clickable,
					element.is_long_clickable,
					element.is_scrollable,
					element.is_focusable,
					element.is_enabled,
					element.input_type,
					element.placeholder_text,
					element.depth,
					element.child_order,
					element.list_index,
					element.in_scrollable,
					element.visual_weight,
					element.last_seen_at,
					element.form_group_id,
				])?;
			}
			let mut insert_edge = tx.prepare(
				"INSERT OR REPLACE INTO hierarchy (parent_hash, child_hash, child_order)
				 VALUES (?1, ?2, ?3)",
			)?;
			for edge in edges {
				insert_edge.execute(params![
					edge.parent_hash.as_str(),
					edge.child_hash.as_str(),
					edge.child_order,
				])?;
			}
		}
		let now = vocalia_common::model::now_millis();
		tx.execute(
			"UPDATE apps SET
				scrape_count = scrape_count + 1,
				element_count = (SELECT COUNT(*) FROM elements WHERE package_name = ?1),
				last_scraped_at = ?2
			 WHERE package_name = ?1",
			params![package_name, now],
		)?;
		tx.commit()?;
		tracing::trace!(
			package_name,
			screen = %screen_hash,
			elements = elements.len(),
			edges = edges.len(),
			"scrape committed"
		);
		Ok(())
	}

	/// Append one element state transition. Append-only; nothing is updated.
	///
	/// # Errors
	/// Any SQLite failure; fails if the element row does not exist.
	pub fn append_state_change(&self, change: &StateChange) -> Result<(), StoreError> {
		let conn = self.conn.lock();
		conn.execute(
			"INSERT INTO element_states (element_hash, state_type, value,
				changed_at, trigger_source)
			 VALUES (?1, ?2, ?3, ?4, ?5)",
			params![
				change.element_hash.as_str(),
				change.state_type.to_string(),
				change.value,
				change.changed_at,
				change.trigger_source.to_string(),
			],
		)?;
		Ok(())
	}

	/// Upsert the derived relationships of one scrape. Existing rows for the
	/// same `(source, target, type)` are refreshed in place.
	///
	/// # Errors
	/// Any SQLite failure rolls back the whole batch.
	pub fn upsert_relationships(
		&self,
		relationships: &[ElementRelationship],
	) -> Result<(), StoreError> {
		let mut conn = self.conn.lock();
		let tx = conn.transaction()?;
		{
			let mut upsert = tx.prepare(
				"INSERT INTO element_relationships (source_hash, target_hash,
					relationship_type, relationship_data, updated_at)
				 VALUES (?1, ?2, ?3, ?4, ?5)
				 ON CONFLICT(source_hash, target_hash, relationship_type)
				 DO UPDATE SET
					relationship_data = excluded.relationship_data,
					updated_at = excluded.updated_at",
			)?;
			for rel in relationships {
				upsert.execute(params![
					rel.source_hash.as_str(),
					rel.target_hash.as_str(),
					rel.relationship_type.to_string(),
					rel.relationship_data,
					rel.updated_at,
				])?;
			}
		}
		tx.commit()?;
		Ok(())
	}

	/// Replace the non-persistent commands for a package with `commands`;
	/// persistent commands survive, and a persistent row keeps priority over
	/// an incoming phrase collision. Refreshes the app's command counter.
	///
	/// # Errors
	/// Any failure rolls the whole replacement back.
	pub fn upsert_commands(
		&self,
		package_name: &str,
		commands: &[CommandRecord],
	) -> Result<(), StoreError> {
		let mut conn = self.conn.lock();
		let tx = conn.transaction()?;
		tx.execute(
			"DELETE FROM commands WHERE package_name = ?1 AND is_persistent = 0",
			params![package_name],
		)?;
		{
			let mut insert = tx.prepare(
				"INSERT INTO commands (package_name, element_hash, phrase,
					action_type, confidence, is_persistent, last_used_at,
					created_at)
				 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
				 ON CONFLICT(package_name, phrase) DO NOTHING",
			)?;
			for command in commands {
				insert.execute(params![
					command.package_name,
					command.element_hash.as_ref().map(ElementHash::as_str),
					command.phrase,
					command.action_type.to_string(),
					command.confidence,
					command.is_persistent,
					command.last_used_at,
					command.created_at,
				])?;
			}
		}
		tx.execute(
			"UPDATE apps SET command_count =
				(SELECT COUNT(*) FROM commands WHERE package_name = ?1)
			 WHERE package_name = ?1",
			params![package_name],
		)?;
		tx.commit()?;
		Ok(())
	}

	/// Append one interaction outcome and stamp the matching command's
	/// `last_used_at` when it succeeded.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn record_interaction(&self, interaction: &InteractionRecord) -> Result<(), StoreError> {
		let conn = self.conn.lock();
		conn.execute(
			"INSERT INTO interactions (element_hash, action_type, succeeded,
				latency_ms, timestamp)
			 VALUES (?1, ?2, ?3, ?4, ?5)",
			params![
				interaction.element_hash.as_str(),
				interaction.action_type.to_string(),
				interaction.succeeded,
				interaction.latency_ms,
				interaction.timestamp,
			],
		)?;
		if interaction.succeeded {
			conn.execute(
				"UPDATE commands SET last_used_at = ?2
				 WHERE element_hash = ?1 AND action_type = ?3",
				params![
					interaction.element_hash.as_str(),
					interaction.timestamp,
					interaction.action_type.to_string(),
				],
			)?;
		}
		Ok(())
	}

	/// Every element last observed on `screen_hash`, in walk order.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn elements_for_screen(
		&self,
		screen_hash: &ScreenHash,
	) -> Result<Vec<ElementRecord>, StoreError> {
		let conn = self.conn.lock();
		let mut stmt = conn.prepare(
			"SELECT * FROM elements WHERE screen_hash = ?1 ORDER BY depth, child_order",
		)?;
		let rows = stmt.query_map(params![screen_hash.as_str()], element_from_row)?;
		rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
	}

	/// Look up one element by hash.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn element(&self, element_hash: &ElementHash) -> Result<Option<ElementRecord>, StoreError> {
		let conn = self.conn.lock();
		conn.query_row(
			"SELECT * FROM elements WHERE element_hash = ?1",
			params![element_hash.as_str()],
			element_from_row,
		)
		.optional()
		.map_err(StoreError::from)
	}

	/// The current edge set touching a package's elements; used by tests and
	/// by integrity sweeps.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn edges_for_package(&self, package_name: &str) -> Result<Vec<HierarchyEdge>, StoreError> {
		let conn = self.conn.lock();
		let mut stmt = conn.prepare(
			"SELECT h.parent_hash, h.child_hash, h.child_order FROM hierarchy h
			 JOIN elements e ON e.element_hash = h.parent_hash
			 WHERE e.package_name = ?1
			 ORDER BY h.parent_hash, h.child_order",
		)?;
		let rows = stmt.query_map(params![package_name], |row| {
			Ok(HierarchyEdge {
				parent_hash: ElementHash::from_raw(row.get::<_, String>(0)?),
				child_hash: ElementHash::from_raw(row.get::<_, String>(1)?),
				child_order: row.get(2)?,
			})
		})?;
		rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
	}

	/// Count edges whose endpoints no longer resolve to an element row.
	/// Foreign keys make a nonzero result impossible; the query exists so
	/// tests can assert the invariant directly.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn orphan_edge_count(&self) -> Result<i64, StoreError> {
		let conn = self.conn.lock();
		conn.query_row(
			"SELECT COUNT(*) FROM hierarchy h
			 WHERE NOT EXISTS
				(SELECT 1 FROM elements WHERE element_hash = h.parent_hash)
			 OR NOT EXISTS
				(SELECT 1 FROM elements WHERE element_hash = h.child_hash)",
			[],
			|row| row.get(0),
		)
		.map_err(StoreError::from)
	}

	/// The commands currently stored for a package, persistent first.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn commands_for_package(
		&self,
		package_name: &str,
	) -> Result<Vec<CommandRecord>, StoreError> {
		let conn = self.conn.lock();
		let mut stmt = conn.prepare(
			"SELECT command_id, package_name, element_hash, phrase, action_type,
				confidence, is_persistent, last_used_at, created_at
			 FROM commands WHERE package_name = ?1
			 ORDER BY is_persistent DESC, command_id",
		)?;
		let rows = stmt.query_map(params![package_name], command_from_row)?;
		rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
	}

	/// Elements whose text changed at least three times in the last thirty
	/// seconds: live regions, excluded from the next screen fingerprint
	/// because they destabilize screen identity.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn live_element_hashes(
		&self,
		now: EpochMillis,
	) -> Result<HashSet<ElementHash>, StoreError> {
		let conn = self.conn.lock();
		let mut stmt = conn.prepare(
			"SELECT element_hash FROM element_states
			 WHERE state_type = ?1 AND changed_at >= ?2
			 GROUP BY element_hash
			 HAVING COUNT(*) >= ?3",
		)?;
		let rows = stmt.query_map(
			params![
				StateType::TextChanged.to_string(),
				now - LIVE_REGION_WINDOW_MS,
				LIVE_REGION_MIN_CHANGES,
			],
			|row| Ok(ElementHash::from_raw(row.get::<_, String>(0)?)),
		)?;
		rows.collect::<Result<HashSet<_>, _>>().map_err(StoreError::from)
	}

	/// How many interactions with this element the host reported successful.
	/// Feeds the indexer's confidence boost.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn successful_interaction_count(
		&self,
		element_hash: &ElementHash,
	) -> Result<i64, StoreError> {
		let conn = self.conn.lock();
		conn.query_row(
			"SELECT COUNT(*) FROM interactions WHERE element_hash = ?1 AND succeeded = 1",
			params![element_hash.as_str()],
			|row| row.get(0),
		)
		.map_err(StoreError::from)
	}

	/// The opportunistic cleanup pass: prune state history past its
	/// retention, drop non-persistent commands for apps idle longer than a
	/// day, and let SQLite re-optimize.
	///
	/// # Errors
	/// Any failure rolls back the whole pass.
	pub fn run_maintenance(&self, now: EpochMillis) -> Result<(), StoreError> {
		let mut conn = self.conn.lock();
		let tx = conn.transaction()?;
		let pruned_states = tx.execute(
			"DELETE FROM element_states WHERE changed_at < ?1",
			params![now - STATE_HISTORY_RETENTION_MS],
		)?;
		let pruned_commands = tx.execute(
			"DELETE FROM commands WHERE is_persistent = 0 AND package_name IN
				(SELECT package_name FROM apps WHERE last_scraped_at < ?1)",
			params![now - IDLE_COMMAND_RETENTION_MS],
		)?;
		refresh_command_counts(&tx)?;
		tx.commit()?;
		tracing::debug!(pruned_states, pruned_commands, "store maintenance pass");
		conn.execute_batch("PRAGMA optimize")?;
		Ok(())
	}

	/// Row counts per table, for telemetry and tests.
	///
	/// # Errors
	/// Any SQLite failure.
	pub fn table_counts(&self) -> Result<TableCounts, StoreError> {
		let conn = self.conn.lock();
		let count = |table: &str| -> Result<i64, rusqlite::Error> {
			// Table names come from the fixed list below, never from input.
			conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
		};
		Ok(TableCounts {
			apps: count("apps")?,
			screens: count("screens")?,
			elements: count("elements")?,
			edges: count("hierarchy")?,
			state_changes: count("element_states")?,
			commands: count("commands")?,
			interactions: count("interactions")?,
		})
	}
}

/// Row counts per table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TableCounts {
	pub apps: i64,
	pub screens: i64,
	pub elements: i64,
	pub edges: i64,
	pub state_changes: i64,
	pub commands: i64,
	pub interactions: i64,
}

fn refresh_command_counts(tx: &Transaction<'_>) -> Result<(), rusqlite::Error> {
	tx.execute(
		"UPDATE apps SET command_count =
			(SELECT COUNT(*) FROM commands WHERE commands.package_name = apps.package_name)",
		[],
	)?;
	Ok(())
}

fn parse_enum<T: std::str::FromStr>(
	idx: usize,
	raw: &str,
) -> Result<T, rusqlite::Error>
where
	T::Err: std::error::Error + Send + Sync + 'static,
{
	raw.parse().map_err(|e: T::Err| {
		rusqlite::Error::FromSqlConversionFailure(
			idx,
			rusqlite::types::Type::Text,
			Box::new(e),
		)
	})
}

fn app_from_row(row: &Row<'_>) -> Result<AppRecord, rusqlite::Error> {
	let mode: String = row.get(4)?;
	Ok(AppRecord {
		package_name: row.get(0)?,
		app_hash: AppHash::from_raw(row.get::<_, String>(1)?),
		version_code: row.get(2)?,
		version_name: row.get(3)?,
		scraping_mode: parse_enum(4, &mode)?,
		is_fully_learned: row.get(5)?,
		scrape_count: row.get(6)?,
		element_count: row.get(7)?,
		command_count: row.get(8)?,
		first_scraped_at: row.get(9)?,
		last_scraped_at: row.get(10)?,
	})
}

fn screen_from_row(row: &Row<'_>) -> Result<ScreenRecord, rusqlite::Error> {
	Ok(ScreenRecord {
		screen_hash: ScreenHash::from_raw(row.get::<_, String>(0)?),
		package_name: row.get(1)?,
		activity_class: row.get(2)?,
		window_title: row.get(3)?,
		visit_count: row.get(4)?,
		first_seen_at: row.get(5)?,
		last_seen_at: row.get(6)?,
	})
}

fn command_from_row(row: &Row<'_>) -> Result<CommandRecord, rusqlite::Error> {
	let action: String = row.get(4)?;
	Ok(CommandRecord {
		command_id: row.get(0)?,
		package_name: row.get(1)?,
		element_hash: row
			.get::<_, Option<String>>(2)?
			.map(ElementHash::from_raw),
		phrase: row.get(3)?,
		action_type: parse_enum(4, &action)?,
		confidence: row.get(5)?,
		is_persistent: row.get(6)?,
		last_used_at: row.get(7)?,
		created_at: row.get(8)?,
	})
}

fn element_from_row(row: &Row<'_>) -> Result<ElementRecord, rusqlite::Error> {
	Ok(ElementRecord {
		element_hash: ElementHash::from_raw(row.get::<_, String>(0)?),
		package_name: row.get(1)?,
		screen_hash: ScreenHash::from_raw(row.get::<_, String>(2)?),
		class_name: row.get(3)?,
		resource_id: row.get(4)?,
		text: row.get(5)?,
		content_description: row.get(6)?,
		bounds: Bounds::new(row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?),
		is_clickable: row.get(11)?,
		is_long_clickable: row.get(12)?,
		is_scrollable: row.get(13)?,
		is_focusable: row.get(14)?,
		is_enabled: row.get(15)?,
		input_type: row.get(16)?,
		placeholder_text: row.get(17)?,
		depth: row.get(18)?,
		child_order: row.get(19)?,
		list_index: row.get(20)?,
		in_scrollable: row.get(21)?,
		visual_weight: row.get(22)?,
		last_seen_at: row.get(23)?,
		form_group_id: row.get(24)?,
	})
}
