//! The consumed contract of the platform accessibility API.

use strum::Display;

use vocalia_common::model::ActionType;

use crate::node::UiNode;

/// A host-global navigation action, independent of any element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GlobalAction {
	/// Navigate back.
	Back,
	/// Go to the home screen.
	Home,
	/// Open the recent-apps switcher.
	Recents,
	/// Open the notification shade.
	Notifications,
}

/// Everything the engine consumes from the platform accessibility API.
///
/// Implementations must be callable from more than one thread: the work
/// context walks trees while the speech-result context resolves and performs
/// gestures. Individual node handles are still confined to the task that
/// acquired them.
pub trait AccessibilityHost: Send + Sync + 'static {
	/// The host's node handle type.
	type Node: UiNode + Send;

	/// A fresh handle to the root of the foreground window's tree, or `None`
	/// when the window is being torn down.
	fn root_node(&self) -> Option<Self::Node>;

	/// Perform a gesture on a node. `true` means the host accepted it.
	fn perform(&self, action: ActionType, node: &Self::Node) -> bool;

	/// Perform a global navigation action.
	fn perform_global(&self, action: GlobalAction) -> bool;

	/// Whether `package` is the host's own system UI, which is never scraped.
	fn is_system_package(&self, package: &str) -> bool;
}
