//! Shared engine state: the status machine, single-owner guards, counters,
//! and the acknowledged grammar window. Everything here is either atomic or
//! behind a short critical section; no lock is ever held across I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;

use vocalia_common::events::EventKind;
use vocalia_common::hash::ElementHash;
use vocalia_common::settings::EngineSettings;
use vocalia_common::throttle::Debouncer;
use vocalia_grammar::ActiveGrammar;

/// The coordinator's lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineStatus {
	/// Constructed, tasks not yet running.
	Init = 0,
	/// Waiting for events.
	Ready = 1,
	/// A scrape cycle is in flight.
	Processing = 2,
	/// Shutdown has begun; in-flight work is being cancelled.
	ShuttingDown = 3,
	/// All tasks have stopped. Terminal.
	Terminated = 4,
}

impl EngineStatus {
	fn from_u8(raw: u8) -> Self {
		match raw {
			1 => Self::Ready,
			2 => Self::Processing,
			3 => Self::ShuttingDown,
			4 => Self::Terminated,
			_ => Self::Init,
		}
	}
}

/// Observable engine counters. All monotonic.
#[derive(Debug, Default)]
pub struct EngineCounters {
	/// Events the host handed us.
	pub events_received: AtomicU64,
	/// Events dropped by filters, guards, debounce, or channel overflow.
	pub events_dropped: AtomicU64,
	/// Scrapes committed to the store.
	pub scrapes_committed: AtomicU64,
	/// Scrapes that failed after the retry.
	pub scrapes_failed: AtomicU64,
	/// Grammar deltas the speech engine acknowledged.
	pub grammar_pushes: AtomicU64,
	/// Grammar deltas dropped after backoff was exhausted.
	pub grammar_pushes_dropped: AtomicU64,
	/// Voice commands executed (successfully or not).
	pub commands_dispatched: AtomicU64,
}

impl EngineCounters {
	pub fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub fn get(counter: &AtomicU64) -> u64 {
		counter.load(Ordering::Relaxed)
	}
}

/// The foreground window as last reported by a window-change event.
#[derive(Clone, Debug, Default)]
pub struct Foreground {
	pub package: String,
	pub activity_class: String,
	pub window_title: String,
}

/// Sentinel for "no kind is being processed".
const NO_KIND: u8 = u8::MAX;

/// What the last walk saw at one stable tree position. Text participates in
/// the element hash, so a churning label forks its identity on every tick;
/// the anchor is the hash the position had when first seen, and text-change
/// history accumulates against it.
#[derive(Clone, Debug)]
pub struct PositionEntry {
	pub anchor: ElementHash,
	pub text: Option<String>,
}

/// State shared by the intake loop, the work loop, the speech-result
/// context, and the embedding host's handle.
pub struct EngineShared {
	pub settings: EngineSettings,
	pub counters: EngineCounters,
	pub debouncer: Debouncer,
	/// The engine-acknowledged grammar window plus dispatch bindings.
	pub grammar: Mutex<ActiveGrammar>,
	pub foreground: Mutex<Foreground>,
	/// Position-stable view of the previous walk, for text-churn detection.
	pub positions: Mutex<HashMap<String, PositionEntry>>,
	status: AtomicU8,
	/// Set while the work loop is inside a scrape cycle; the intake loop
	/// drops skippable same-kind events while it is up.
	processing_kind: AtomicU8,
	pub is_grammar_pushing: AtomicBool,
	/// Quick fingerprint of the last processed content-change source;
	/// zero means unset.
	pub last_quick_hash: AtomicU64,
	pub memory_pressure: AtomicBool,
	pub events_since_maintenance: AtomicU64,
}

impl EngineShared {
	pub fn new(settings: EngineSettings) -> Self {
		let debouncer = Debouncer::new(settings.throttle.device_speed_class);
		Self {
			settings,
			counters: EngineCounters::default(),
			debouncer,
			grammar: Mutex::new(ActiveGrammar::new()),
			foreground: Mutex::new(Foreground::default()),
			positions: Mutex::new(HashMap::new()),
			status: AtomicU8::new(EngineStatus::Init as u8),
			processing_kind: AtomicU8::new(NO_KIND),
			is_grammar_pushing: AtomicBool::new(false),
			last_quick_hash: AtomicU64::new(0),
			memory_pressure: AtomicBool::new(false),
			events_since_maintenance: AtomicU64::new(0),
		}
	}

	pub fn status(&self) -> EngineStatus {
		EngineStatus::from_u8(self.status.load(Ordering::Acquire))
	}

	pub fn set_status(&self, status: EngineStatus) {
		self.status.store(status as u8, Ordering::Release);
	}

	/// Move `Ready` → `Processing` and claim the kind. Shutdown states are
	/// left untouched.
	pub fn begin_processing(&self, kind: EventKind) {
		self.processing_kind.store(kind as u8, Ordering::Release);
		let _ = self.status.compare_exchange(
			EngineStatus::Ready as u8,
			EngineStatus::Processing as u8,
			Ordering::AcqRel,
			Ordering::Relaxed,
		);
	}

	/// Move `Processing` → `Ready`; a concurrent shutdown wins.
	pub fn end_processing(&self) {
		self.processing_kind.store(NO_KIND, Ordering::Release);
		let _ = self.status.compare_exchange(
			EngineStatus::Processing as u8,
			EngineStatus::Ready as u8,
			Ordering::AcqRel,
			Ordering::Relaxed,
		);
	}

	/// Whether a scrape of the same kind is in flight right now.
	pub fn is_processing_kind(&self, kind: EventKind) -> bool {
		self.processing_kind.load(Ordering::Acquire) == kind as u8
	}

	/// Enter or leave memory-pressure throttling: skippable debounce rates
	/// halve and the numeric overlay is suspended until pressure clears.
	pub fn set_memory_pressure(&self, on: bool) {
		self.memory_pressure.store(on, Ordering::Release);
		self.debouncer.set_high_throttle(on);
	}

	pub fn under_memory_pressure(&self) -> bool {
		self.memory_pressure.load(Ordering::Acquire)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn processing_transitions_do_not_clobber_shutdown() {
		let shared = EngineShared::new(EngineSettings::default());
		shared.set_status(EngineStatus::Ready);
		shared.begin_processing(EventKind::ContentChange);
		assert_eq!(shared.status(), EngineStatus::Processing);
		shared.set_status(EngineStatus::ShuttingDown);
		shared.end_processing();
		assert_eq!(shared.status(), EngineStatus::ShuttingDown);
	}

	#[test]
	fn processing_kind_is_tracked_while_in_flight() {
		let shared = EngineShared::new(EngineSettings::default());
		shared.set_status(EngineStatus::Ready);
		assert!(!shared.is_processing_kind(EventKind::ContentChange));
		shared.begin_processing(EventKind::ContentChange);
		assert!(shared.is_processing_kind(EventKind::ContentChange));
		assert!(!shared.is_processing_kind(EventKind::Scroll));
		shared.end_processing();
		assert!(!shared.is_processing_kind(EventKind::ContentChange));
	}
}
