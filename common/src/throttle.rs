//! Adaptive debouncing.
//!
//! Each throttled operation has a minimum inter-fire interval selected by
//! the device speed class. Memory pressure halves the rate of every
//! skippable operation until it clears. Time is measured with
//! [`tokio::time::Instant`] so the engine's debounce behavior is testable
//! under paused time.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

use crate::events::{DeviceSpeedClass, Operation};

/// The minimum interval between fires of `op` on a device of class `class`.
#[must_use]
pub fn debounce_interval(
	op: Operation,
	class: DeviceSpeedClass,
	high_throttle: bool,
) -> Duration {
	use DeviceSpeedClass::{Fast, Medium, Slow};
	use Operation::{ContentChange, GrammarPush, Scroll, WindowChange};
	let millis = match (op, class) {
		(ContentChange, Slow) => 800,
		(ContentChange, Medium) => 500,
		(ContentChange, Fast) => 250,
		(Scroll, Slow) => 500,
		(Scroll, Medium) => 300,
		(Scroll, Fast) => 150,
		(GrammarPush, Slow) => 2_000,
		(GrammarPush, Medium) => 1_000,
		(GrammarPush, Fast) => 500,
		(WindowChange, _) => 0,
	};
	let base = Duration::from_millis(millis);
	if high_throttle && op.is_skippable() {
		base * 2
	} else {
		base
	}
}

/// Per-operation last-fire bookkeeping plus the memory-pressure flag.
#[derive(Debug)]
pub struct Debouncer {
	class: DeviceSpeedClass,
	high_throttle: AtomicBool,
	last_fire: Mutex<[Option<Instant>; Operation::ALL.len()]>,
}

impl Debouncer {
	/// A fresh debouncer for the configured speed class; every operation is
	/// immediately eligible to fire.
	#[must_use]
	pub fn new(class: DeviceSpeedClass) -> Self {
		Self {
			class,
			high_throttle: AtomicBool::new(false),
			last_fire: Mutex::new([None; Operation::ALL.len()]),
		}
	}

	/// Enter or leave the high-throttle mode.
	pub fn set_high_throttle(&self, on: bool) {
		self.high_throttle.store(on, Ordering::Relaxed);
	}

	/// Whether the high-throttle mode is active.
	#[must_use]
	pub fn is_high_throttle(&self) -> bool {
		self.high_throttle.load(Ordering::Relaxed)
	}

	/// The interval currently in force for `op`.
	#[must_use]
	pub fn interval(&self, op: Operation) -> Duration {
		debounce_interval(op, self.class, self.is_high_throttle())
	}

	/// The wall-clock budget for a unit of work triggered by `op`: twice the
	/// debounce window, floored so the non-debounced window change still
	/// gets a usable budget.
	#[must_use]
	pub fn work_budget(&self, op: Operation) -> Duration {
		(self.interval(op) * 2).max(Duration::from_secs(2))
	}

	/// Whether `op` may fire at `now`, and if so, record the fire.
	/// The check and the record are one critical section so two callers can
	/// never both win the same window.
	#[must_use]
	pub fn try_fire(&self, op: Operation, now: Instant) -> bool {
		let interval = self.interval(op);
		let mut last = self.last_fire.lock();
		let slot = &mut last[op as usize];
		let ready = match *slot {
			None => true,
			Some(prev) => now.saturating_duration_since(prev) >= interval,
		};
		if ready {
			*slot = Some(now);
		}
		ready
	}

	/// Time remaining until `op` is next eligible, zero when eligible now.
	#[must_use]
	pub fn remaining(&self, op: Operation, now: Instant) -> Duration {
		let interval = self.interval(op);
		let last = self.last_fire.lock();
		match last[op as usize] {
			None => Duration::ZERO,
			Some(prev) => interval.saturating_sub(now.saturating_duration_since(prev)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::{DeviceSpeedClass, Operation};

	#[tokio::test(start_paused = true)]
	async fn second_fire_inside_window_is_rejected() {
		let debouncer = Debouncer::new(DeviceSpeedClass::Medium);
		let now = Instant::now();
		assert!(debouncer.try_fire(Operation::ContentChange, now));
		assert!(!debouncer.try_fire(Operation::ContentChange, now));
		tokio::time::advance(Duration::from_millis(499)).await;
		assert!(!debouncer.try_fire(Operation::ContentChange, Instant::now()));
		tokio::time::advance(Duration::from_millis(1)).await;
		assert!(debouncer.try_fire(Operation::ContentChange, Instant::now()));
	}

	#[tokio::test(start_paused = true)]
	async fn window_change_is_never_debounced() {
		let debouncer = Debouncer::new(DeviceSpeedClass::Slow);
		let now = Instant::now();
		assert!(debouncer.try_fire(Operation::WindowChange, now));
		assert!(debouncer.try_fire(Operation::WindowChange, now));
	}

	#[tokio::test(start_paused = true)]
	async fn high_throttle_doubles_skippable_windows() {
		let debouncer = Debouncer::new(DeviceSpeedClass::Medium);
		debouncer.set_high_throttle(true);
		assert_eq!(
			debouncer.interval(Operation::ContentChange),
			Duration::from_millis(1_000)
		);
		assert_eq!(debouncer.interval(Operation::WindowChange), Duration::ZERO);
		let now = Instant::now();
		assert!(debouncer.try_fire(Operation::Scroll, now));
		tokio::time::advance(Duration::from_millis(400)).await;
		// inside the doubled 600ms window
		assert!(!debouncer.try_fire(Operation::Scroll, Instant::now()));
	}

	#[test]
	fn operations_index_their_slots() {
		// try_fire indexes the array by discriminant; make sure the
		// enum and the table stay the same length.
		assert_eq!(Operation::ALL.len(), 4);
		for (i, op) in Operation::ALL.iter().enumerate() {
			assert_eq!(*op as usize, i);
		}
	}
}
