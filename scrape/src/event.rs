//! The event envelope the host feeds the engine.

use vocalia_common::events::EventKind;

use crate::node::{NodeGuard, UiNode};

/// One accessibility event as delivered by the host.
///
/// The source handle, when present, is wrapped in its [`NodeGuard`] at
/// construction, so an event that is filtered, debounced, or simply dropped
/// on the floor still releases its handle.
#[derive(Debug)]
pub struct UiEvent<N: UiNode> {
	/// What happened.
	pub kind: EventKind,
	/// The package the event originated from.
	pub package: String,
	/// The node the event is about, when the host supplied one.
	pub source: Option<NodeGuard<N>>,
	/// Activity class, populated on window changes.
	pub activity_class: Option<String>,
	/// Window title, populated on window changes.
	pub window_title: Option<String>,
}

impl<N: UiNode> UiEvent<N> {
	/// Wrap an event, taking ownership of the source handle.
	pub fn new(kind: EventKind, package: impl Into<String>, source: Option<N>) -> Self {
		Self {
			kind,
			package: package.into(),
			source: source.map(NodeGuard::new),
			activity_class: None,
			window_title: None,
		}
	}

	/// Attach the window identity carried by a window-change event.
	#[must_use]
	pub fn with_window(
		mut self,
		activity_class: impl Into<String>,
		window_title: impl Into<String>,
	) -> Self {
		self.activity_class = Some(activity_class.into());
		self.window_title = Some(window_title.into());
		self
	}
}
