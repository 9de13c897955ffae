//! The depth-bounded tree walk.
//!
//! An explicit work stack instead of recursion: the tree's shape is host
//! data, so its depth must not translate into call-stack depth, and release
//! on pop gives every handle one well-defined place to die.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio_util::sync::CancellationToken;

use vocalia_common::errors::WalkError;
use vocalia_common::hash::ElementHash;
use vocalia_common::model::{ElementRecord, HierarchyEdge};

use crate::node::{NodeGuard, UiNode};

/// Nodes visited between cooperative cancellation checks.
const CANCEL_CHECK_STRIDE: usize = 64;
/// Absolute bound on visited nodes, independent of the depth cap. Subtrees
/// past the bound are dropped, not an error.
const MAX_NODES: usize = 10_000;

/// The handle-free product of one walk: elements in canonical depth-first
/// child-order sequence, plus the edge set that mirrors the traversal.
#[derive(Debug, Default)]
pub struct WalkOutput {
	/// Every element visited, in emission order.
	pub elements: Vec<ElementRecord>,
	/// One edge per parent→child link actually walked.
	pub edges: Vec<HierarchyEdge>,
}

/// Walks one accessibility tree into a [`WalkOutput`].
#[derive(Clone, Copy, Debug)]
pub struct TreeWalker {
	max_depth: u32,
}

struct Frame<N: UiNode> {
	guard: NodeGuard<N>,
	depth: u32,
	child_order: u32,
	parent_hash: Option<ElementHash>,
	class_chain: String,
	index_chain: String,
	in_scrollable: bool,
}

impl TreeWalker {
	/// A walker bounded at `max_depth`. Callers pass the already-clamped
	/// effective depth from settings.
	#[must_use]
	pub fn new(max_depth: u32) -> Self {
		Self { max_depth }
	}

	/// Walk the tree under `root`.
	///
	/// An absent root is an empty scrape, not an error: the window was torn
	/// down between the event and the walk. A panic escaping a node accessor
	/// is contained here and reported as [`WalkError::Panicked`]; in every
	/// outcome, each handle acquired by the walk has been released by the
	/// time this returns.
	///
	/// # Errors
	/// [`WalkError::Cancelled`] at a cancellation check, or
	/// [`WalkError::Panicked`] when a node accessor panicked.
	pub fn walk<N: UiNode>(
		&self,
		package: &str,
		root: Option<N>,
		cancel: &CancellationToken,
	) -> Result<WalkOutput, WalkError> {
		let Some(root) = root else {
			return Ok(WalkOutput::default());
		};
		let root_guard = NodeGuard::new(root);
		catch_unwind(AssertUnwindSafe(|| self.walk_inner(package, root_guard, cancel)))
			.unwrap_or(Err(WalkError::Panicked))
	}

	fn walk_inner<N: UiNode>(
		&self,
		package: &str,
		root: NodeGuard<N>,
		cancel: &CancellationToken,
	) -> Result<WalkOutput, WalkError> {
		let mut elements = Vec::new();
		let mut edges = Vec::new();
		let mut visited = 0_usize;
		let mut stack = vec![Frame {
			guard: root,
			depth: 0,
			child_order: 0,
			parent_hash: None,
			class_chain: String::new(),
			index_chain: "0".to_owned(),
			in_scrollable: false,
		}];

		while let Some(frame) = stack.pop() {
			visited += 1;
			if visited % CANCEL_CHECK_STRIDE == 0 && cancel.is_cancelled() {
				// Dropping the stack releases every handle still queued.
				return Err(WalkError::Cancelled);
			}
			if frame.depth > self.max_depth || visited > MAX_NODES {
				continue;
			}

			let attrs = frame.guard.attributes();
			let structural_path =
				format!("{}:{}", frame.class_chain, frame.index_chain);
			let mut record = ElementRecord::for_walk(
				package,
				&attrs.class_name,
				attrs.resource_id.clone(),
				attrs.text.clone(),
				attrs.content_description.clone(),
				attrs.bounds,
				frame.depth,
				frame.child_order,
				&structural_path,
			);
			record.is_clickable = attrs.is_clickable;
			record.is_long_clickable = attrs.is_long_clickable;
			record.is_scrollable = attrs.is_scrollable;
			record.is_focusable = attrs.is_focusable;
			record.is_enabled = attrs.is_enabled;
			record.input_type = attrs.input_type.clone();
			record.placeholder_text = attrs.placeholder_text.clone();
			record.list_index = attrs.list_index;
			record.in_scrollable = frame.in_scrollable;

			let self_hash = record.element_hash.clone();
			if let Some(parent_hash) = &frame.parent_hash {
				edges.push(HierarchyEdge {
					parent_hash: parent_hash.clone(),
					child_hash: self_hash.clone(),
					child_order: frame.child_order,
				});
			}
			elements.push(record);

			let child_class_chain = if frame.class_chain.is_empty() {
				attrs.class_name.clone()
			} else {
				format!("{}/{}", frame.class_chain, attrs.class_name)
			};
			let child_in_scrollable = frame.in_scrollable || attrs.is_scrollable;

			let count = frame.guard.child_count();
			let mut children = Vec::with_capacity(count);
			for index in 0..count {
				match frame.guard.child(index) {
					Ok(Some(child)) => {
						children.push((index, NodeGuard::new(child)));
					}
					Ok(None) => {}
					Err(err) => {
						tracing::trace!(index, %err, "skipping unreachable child");
					}
				}
			}
			// Reverse push so the stack pops children in child order.
			for (index, guard) in children.into_iter().rev() {
				#[allow(clippy::cast_possible_truncation)]
				stack.push(Frame {
					guard,
					depth: frame.depth + 1,
					child_order: index as u32,
					parent_hash: Some(self_hash.clone()),
					class_chain: child_class_chain.clone(),
					index_chain: format!(
						"{}/{}",
						frame.index_chain, index
					),
					in_scrollable: child_in_scrollable,
				});
			}
			// The frame's guard drops here: the node's handle is released
			// once its subtree is fully scheduled.
		}
		Ok(WalkOutput { elements, edges })
	}
}

impl TreeWalker {
	/// Walk until the node whose element fingerprint equals `target` is
	/// found, returning its still-live guard so the caller can perform a
	/// gesture on it. Every other handle visited is released on the way;
	/// `None` means the element is no longer in the tree.
	///
	/// The structural-path computation here is the same as [`Self::walk`]'s,
	/// so an element found by a scrape resolves to the same node afterwards
	/// as long as the tree has not changed shape around it.
	pub fn find_element<N: UiNode>(
		&self,
		package: &str,
		root: Option<N>,
		target: &ElementHash,
	) -> Option<NodeGuard<N>> {
		self.find_inner(root, |attrs, class_chain, index_chain| {
			let structural_path = format!("{class_chain}:{index_chain}");
			let hash = vocalia_common::hash::hash_element(
				package,
				&attrs.class_name,
				attrs.resource_id.as_deref(),
				attrs.text.as_deref(),
				attrs.content_description.as_deref(),
				&structural_path,
			);
			hash == *target
		})
	}

	/// Walk until a node whose attributes satisfy `pred` is found. Used to
	/// resolve targets that are positional rather than identity-based, like
	/// the first scrollable container for a system scroll command.
	pub fn find_where<N: UiNode>(
		&self,
		root: Option<N>,
		pred: impl Fn(&crate::node::NodeAttributes) -> bool,
	) -> Option<NodeGuard<N>> {
		self.find_inner(root, |attrs, _, _| pred(attrs))
	}

	fn find_inner<N: UiNode>(
		&self,
		root: Option<N>,
		matches: impl Fn(&crate::node::NodeAttributes, &str, &str) -> bool,
	) -> Option<NodeGuard<N>> {
		struct FindFrame<N: UiNode> {
			guard: NodeGuard<N>,
			depth: u32,
			class_chain: String,
			index_chain: String,
		}
		let root = root?;
		let mut visited = 0_usize;
		let mut stack = vec![FindFrame {
			guard: NodeGuard::new(root),
			depth: 0,
			class_chain: String::new(),
			index_chain: "0".to_owned(),
		}];
		while let Some(frame) = stack.pop() {
			visited += 1;
			if frame.depth > self.max_depth || visited > MAX_NODES {
				continue;
			}
			let attrs = frame.guard.attributes();
			if matches(&attrs, &frame.class_chain, &frame.index_chain) {
				// The rest of the stack drops here, releasing its handles;
				// only the match stays alive.
				return Some(frame.guard);
			}
			let child_class_chain = if frame.class_chain.is_empty() {
				attrs.class_name.clone()
			} else {
				format!("{}/{}", frame.class_chain, attrs.class_name)
			};
			let count = frame.guard.child_count();
			let mut children = Vec::with_capacity(count);
			for index in 0..count {
				if let Ok(Some(child)) = frame.guard.child(index) {
					children.push((index, NodeGuard::new(child)));
				}
			}
			for (index, guard) in children.into_iter().rev() {
				stack.push(FindFrame {
					guard,
					depth: frame.depth + 1,
					class_chain: child_class_chain.clone(),
					index_chain: format!("{}/{}", frame.index_chain, index),
				});
			}
		}
		None
	}
}

/// A shallow fingerprint of one node: enough signal to recognize a
/// CONTENT_CHANGE that changed nothing the engine cares about, cheap enough
/// to run before the debounce gate.
pub fn quick_fingerprint<N: UiNode>(node: &N) -> u64 {
	let attrs = node.attributes();
	let mut hasher = blake3::Hasher::new();
	for field in [
		Some(attrs.class_name.as_str()),
		attrs.text.as_deref(),
		attrs.content_description.as_deref(),
	] {
		hasher.update(&[0x1f]);
		hasher.update(field.unwrap_or("\u{1}").as_bytes());
	}
	hasher.update(&node.child_count().to_le_bytes());
	hasher.update(&attrs.bounds.area().to_le_bytes());
	let digest = hasher.finalize();
	let mut first = [0_u8; 8];
	first.copy_from_slice(&digest.as_bytes()[..8]);
	u64::from_le_bytes(first)
}
