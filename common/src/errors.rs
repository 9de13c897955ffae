//! # Errors
//!
//! Basic error types for all sorts of Vocalia components.

use thiserror::Error;

/// The common Vocalia error type.
/// This is specifically typed as a `#[non_exhaustive]` enum so that adding a new variant of error type does not cause an API break.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum VoxError {
	/// See: [`StoreError`].
	#[error(transparent)]
	Store(#[from] StoreError),
	/// See: [`WalkError`].
	#[error(transparent)]
	Walk(#[from] WalkError),
	/// See: [`GrammarError`].
	#[error(transparent)]
	Grammar(#[from] GrammarError),
	/// See: [`ConfigError`].
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The host refused or failed a gesture, or the action budget elapsed first.
	#[error("action execution failed: {0}")]
	Action(String),
	/// The engine received work after shutdown had begun.
	#[error("the engine is shutting down")]
	ShuttingDown,
	/// A generic error type where the error message is preserved, but it is not enumerable.
	/// These are the kind of errors that generally should have a bug filed for them.
	#[error("{0}")]
	Generic(String),
}

/// Errors raised by the embedded relational store.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
	/// An underlying SQLite error, preserved as a string so this type stays
	/// independent of the driver crate.
	#[error("sqlite: {0}")]
	Sqlite(String),
	/// A uniqueness or foreign-key constraint was violated inside a transaction.
	/// The transaction has already been rolled back when this is returned.
	#[error("constraint violation: {0}")]
	Constraint(String),
	/// The on-disk schema version is ahead of what this build understands.
	/// Migrations are forward-only, so there is no way to proceed.
	#[error("schema version {found} is newer than supported version {supported}")]
	SchemaTooNew {
		/// The `user_version` found in the store file.
		found: i64,
		/// The newest version this build can migrate to.
		supported: i64,
	},
	/// The row requested was not found.
	#[error("no such row: {0}")]
	NoRow(&'static str),
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::Error> for StoreError {
	fn from(sq_err: rusqlite::Error) -> Self {
		match &sq_err {
			rusqlite::Error::SqliteFailure(code, msg)
				if code.code == rusqlite::ErrorCode::ConstraintViolation =>
			{
				StoreError::Constraint(
					msg.clone().unwrap_or_else(|| code.to_string()),
				)
			}
			_ => StoreError::Sqlite(sq_err.to_string()),
		}
	}
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::Error> for VoxError {
	fn from(sq_err: rusqlite::Error) -> Self {
		VoxError::Store(sq_err.into())
	}
}

/// Errors raised while walking an accessibility tree.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalkError {
	/// The root handle was absent; the window was torn down mid-event.
	/// Callers treat this as an empty scrape, never as a user-visible failure.
	#[error("the root node is gone")]
	RootGone,
	/// A panic escaped a node accessor. The walk is abandoned but every
	/// handle acquired so far has been released.
	#[error("a panic occurred while walking the tree")]
	Panicked,
	/// The walk was cancelled at a suspension point.
	#[error("the walk was cancelled")]
	Cancelled,
	/// A node accessor failed in a way that invalidates the whole walk
	/// (as opposed to a single child fetch, which is skipped).
	#[error("node error: {0}")]
	Node(String),
}

/// Errors raised at the speech-engine boundary.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GrammarError {
	/// The engine rejected a grammar update. Retried with backoff by the caller.
	#[error("grammar push rejected: {0}")]
	PushRejected(String),
	/// The per-push wall-clock budget elapsed before the engine acknowledged.
	#[error("grammar push timed out")]
	PushTimeout,
	/// The speech engine is no longer reachable.
	#[error("the speech engine is closed")]
	EngineClosed,
}

/// Errors when loading or reading from settings.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A value was present but failed validation.
	#[error("invalid configuration value: {0}")]
	Invalid(String),
	/// The configuration source could not be read or parsed.
	/// The provider's message is preserved through the `String` variant data.
	#[error("{0}")]
	Provider(String),
}
