#![deny(
	clippy::all,
	clippy::pedantic,
	clippy::cargo,
	clippy::map_unwrap_or,
	clippy::unwrap_used,
	unsafe_code
)]

//! Accessibility-tree scraping for Vocalia.
//!
//! This crate owns the two things that historically go wrong at the host
//! boundary: walking an arbitrarily shaped tree deterministically, and
//! giving every native node handle an explicit, scoped release that runs on
//! every exit path. The host's claim that handles are auto-recycled is not
//! relied upon anywhere.

mod event;
mod host;
mod node;
mod relations;
mod walker;

pub use event::UiEvent;
pub use host::{AccessibilityHost, GlobalAction};
pub use node::{NodeAttributes, NodeGuard, UiNode};
pub use relations::infer_relationships;
pub use walker::{quick_fingerprint, TreeWalker, WalkOutput};
