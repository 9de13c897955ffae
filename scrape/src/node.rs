//! The node handle contract.

use vocalia_common::errors::WalkError;
use vocalia_common::model::Bounds;

/// A snapshot of one node's attributes, extracted in a single call so the
/// walker touches the native handle exactly once per node.
#[derive(Clone, Debug, Default)]
pub struct NodeAttributes {
	/// Platform widget class.
	pub class_name: String,
	/// Developer-assigned resource identifier.
	pub resource_id: Option<String>,
	/// Visible text.
	pub text: Option<String>,
	/// Accessibility description.
	pub content_description: Option<String>,
	/// Screen bounds.
	pub bounds: Bounds,
	/// Accepts taps.
	pub is_clickable: bool,
	/// Accepts long presses.
	pub is_long_clickable: bool,
	/// Scroll container.
	pub is_scrollable: bool,
	/// Can take input focus.
	pub is_focusable: bool,
	/// Currently enabled.
	pub is_enabled: bool,
	/// Visible to the user right now.
	pub is_visible: bool,
	/// Declared input type for editable nodes.
	pub input_type: Option<String>,
	/// Hint text for editable nodes.
	pub placeholder_text: Option<String>,
	/// Index within a list container, when the host reports one.
	pub list_index: Option<u32>,
}

/// An opaque, manually-released reference to a node in the host's
/// accessibility tree.
///
/// Implementations hand out a *fresh* handle from [`UiNode::child`]; handles
/// are never shared. Every handle the engine obtains is wrapped in a
/// [`NodeGuard`] immediately, which guarantees [`UiNode::release`] is called
/// exactly once, on every exit path, panics included.
pub trait UiNode: Sized {
	/// Snapshot the node's attributes.
	fn attributes(&self) -> NodeAttributes;

	/// How many children the node currently reports.
	fn child_count(&self) -> usize;

	/// Fetch child `index`, acquiring a new handle the caller now owns.
	///
	/// `Ok(None)` means the child vanished between the count and the fetch;
	/// the walker skips it and keeps going. `Err(_)` is a transient host
	/// failure with the same skip-the-child treatment.
	///
	/// # Errors
	/// Transient host failures (stale handle, IPC hiccup).
	fn child(&self, index: usize) -> Result<Option<Self>, WalkError>;

	/// Return the native handle to the host. Called exactly once per handle,
	/// by [`NodeGuard`]; never call it directly.
	fn release(&mut self);
}

/// Scoped ownership of one node handle. Dropping the guard — normally, by
/// early return, or during unwinding — releases the handle.
#[derive(Debug)]
pub struct NodeGuard<N: UiNode> {
	node: Option<N>,
}

impl<N: UiNode> NodeGuard<N> {
	/// Take ownership of a freshly acquired handle.
	pub fn new(node: N) -> Self {
		Self { node: Some(node) }
	}

	/// Borrow the guarded node.
	///
	/// The `Option` is only `None` after `Drop` has begun, which safe code
	/// cannot observe, so this accessor panics rather than propagating an
	/// impossible state.
	pub fn node(&self) -> &N {
		#[allow(clippy::expect_used)]
		self.node.as_ref().expect("NodeGuard accessed after drop")
	}
}

impl<N: UiNode> std::ops::Deref for NodeGuard<N> {
	type Target = N;

	fn deref(&self) -> &Self::Target {
		self.node()
	}
}

impl<N: UiNode> Drop for NodeGuard<N> {
	fn drop(&mut self) {
		if let Some(mut node) = self.node.take() {
			node.release();
		}
	}
}
