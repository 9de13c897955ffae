#![deny(
	clippy::all,
	clippy::pedantic,
	clippy::cargo,
	clippy::map_unwrap_or,
	clippy::unwrap_used,
	missing_docs,
	unsafe_code
)]

//! Common algorithms and data structures shared by the Vocalia engine crates:
//! the content-addressed identity scheme, the in-memory record types that
//! cross crate boundaries, event and throttle taxonomies, and settings.

pub mod errors;
pub mod events;
pub mod hash;
pub mod model;
pub mod queue;
pub mod settings;
pub mod throttle;

/// A result type that is generally quicker to write when using `Result<T, VoxError>`.
pub type VoxResult<T> = Result<T, errors::VoxError>;
