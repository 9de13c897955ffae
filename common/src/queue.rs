//! A fixed-capacity drop-oldest buffer.
//!
//! This replaces an unbounded event bus at the speech-result boundary: when
//! the recognizer outruns the dispatcher the oldest buffered result is the
//! least likely to still match the screen, so it is the one discarded, and
//! every discard is counted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

struct Inner<T> {
	items: VecDeque<T>,
	closed: bool,
}

/// A bounded FIFO that drops its oldest entry on overflow instead of
/// blocking or growing. Single consumer, any number of producers.
pub struct DropOldest<T> {
	inner: Mutex<Inner<T>>,
	notify: Notify,
	capacity: usize,
	dropped: AtomicU64,
}

impl<T> DropOldest<T> {
	/// A new buffer holding at most `capacity` items. A zero capacity is
	/// treated as one.
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			inner: Mutex::new(Inner {
				items: VecDeque::with_capacity(capacity),
				closed: false,
			}),
			notify: Notify::new(),
			capacity,
			dropped: AtomicU64::new(0),
		}
	}

	/// Enqueue an item, evicting the oldest one when full. Returns `false`
	/// when the buffer has been closed and the item was discarded.
	pub fn push(&self, item: T) -> bool {
		{
			let mut inner = self.inner.lock();
			if inner.closed {
				return false;
			}
			if inner.items.len() == self.capacity {
				inner.items.pop_front();
				self.dropped.fetch_add(1, Ordering::Relaxed);
			}
			inner.items.push_back(item);
		}
		self.notify.notify_one();
		true
	}

	/// Receive the next item in FIFO order, waiting if the buffer is empty.
	/// Returns `None` once the buffer is closed and drained.
	pub async fn recv(&self) -> Option<T> {
		loop {
			{
				let mut inner = self.inner.lock();
				if let Some(item) = inner.items.pop_front() {
					return Some(item);
				}
				if inner.closed {
					return None;
				}
			}
			self.notify.notified().await;
		}
	}

	/// Close the buffer: producers are refused from now on and the consumer
	/// sees `None` after draining what is already buffered. Idempotent.
	pub fn close(&self) {
		self.inner.lock().closed = true;
		self.notify.notify_waiters();
		// A consumer parked between the drain check and the await still
		// holds a stored permit from notify_one, so no wakeup is lost.
		self.notify.notify_one();
	}

	/// Discard everything currently buffered, returning what was dropped.
	pub fn drain(&self) -> Vec<T> {
		self.inner.lock().items.drain(..).collect()
	}

	/// Items evicted by overflow since creation.
	#[must_use]
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	/// Current number of buffered items.
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.lock().items.len()
	}

	/// Whether nothing is currently buffered.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
