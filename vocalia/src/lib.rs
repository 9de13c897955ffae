#![deny(
	clippy::all,
	clippy::pedantic,
	clippy::cargo,
	clippy::map_unwrap_or,
	clippy::unwrap_used,
	unsafe_code
)]
#![allow(clippy::multiple_crate_versions)]

//! The Vocalia engine: an embeddable voice-command core for accessibility
//! hosts.
//!
//! The host feeds accessibility events and speech results into an
//! [`EngineHandle`]; the engine walks the UI tree, persists a
//! content-addressed picture of it, keeps the speech recognizer's grammar in
//! sync with what is on screen, and executes spoken commands as gestures.
//!
//! Two execution contexts back the handle: a work context (intake + scrape
//! loops on the caller's tokio runtime) and a dedicated speech-result thread
//! that stays responsive no matter how busy scraping gets. [`Engine::spawn`]
//! must therefore be called from within a tokio runtime.

pub mod config;
pub mod logging;

mod intake;
mod speech;
mod state;
mod work;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use vocalia_common::queue::DropOldest;

pub use state::EngineStatus;
pub use vocalia_common::errors::VoxError;
pub use vocalia_common::events::{DeviceSpeedClass, EventKind};
pub use vocalia_common::settings::EngineSettings;
pub use vocalia_common::VoxResult;
pub use vocalia_grammar::{Feedback, NullFeedback, SpeechEngine, SpeechResult};
pub use vocalia_scrape::{
	AccessibilityHost, GlobalAction, NodeAttributes, NodeGuard, UiEvent, UiNode,
};
pub use vocalia_store::Store;

use state::{EngineCounters, EngineShared};

/// Capacity of the host-event and work channels. Overflow drops the event
/// (with a counter) rather than blocking the host's event thread.
const EVENT_CHANNEL_CAPACITY: usize = 128;
/// Budget for the shutdown-time grammar flush.
const SHUTDOWN_FLUSH_BUDGET: Duration = Duration::from_secs(4);

/// Constructor for a running engine.
pub struct Engine;

impl Engine {
	/// Open the store at the configured path and start the engine.
	///
	/// # Errors
	/// Fails when the store cannot be opened or migrated.
	///
	/// # Panics
	/// Panics when called outside a tokio runtime.
	pub fn spawn<H, S, F>(
		settings: EngineSettings,
		host: Arc<H>,
		speech: Arc<S>,
		feedback: Arc<F>,
	) -> VoxResult<EngineHandle<H>>
	where
		H: AccessibilityHost,
		H::Node: Sync,
		S: SpeechEngine,
		F: Feedback,
	{
		let store = Arc::new(Store::open(&settings.store.path)?);
		Ok(Self::spawn_with_store(settings, host, speech, feedback, store))
	}

	/// Start the engine against an already-open store (an in-memory one, in
	/// tests and persistence-free hosts).
	///
	/// # Panics
	/// Panics when called outside a tokio runtime.
	pub fn spawn_with_store<H, S, F>(
		settings: EngineSettings,
		host: Arc<H>,
		speech: Arc<S>,
		feedback: Arc<F>,
		store: Arc<Store>,
	) -> EngineHandle<H>
	where
		H: AccessibilityHost,
		H::Node: Sync,
		S: SpeechEngine,
		F: Feedback,
	{
		let results = Arc::new(DropOldest::new(settings.grammar.speech_result_buffer));
		let shared = Arc::new(EngineShared::new(settings));
		let token = CancellationToken::new();
		let tracker = TaskTracker::new();

		let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
		let (work_tx, work_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

		tracker.spawn(intake::receive(
			Arc::clone(&shared),
			Arc::clone(&host),
			Arc::clone(&store),
			event_rx,
			work_tx,
			token.clone(),
		));
		tracker.spawn(work::process(
			Arc::clone(&shared),
			Arc::clone(&host),
			Arc::clone(&store),
			Arc::clone(&speech),
			work_rx,
			token.clone(),
		));
		tracker.close();

		let speech_thread = speech::spawn(
			Arc::clone(&shared),
			host,
			Arc::clone(&store),
			feedback,
			Arc::clone(&results),
			token.clone(),
		);

		shared.set_status(EngineStatus::Ready);
		EngineHandle {
			shared,
			store,
			speech,
			event_tx,
			results,
			token,
			tracker,
			speech_thread: Mutex::new(speech_thread),
			shutting_down: AtomicBool::new(false),
		}
	}
}

/// Observable counters, snapshotted from the running engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CountersSnapshot {
	pub events_received: u64,
	pub events_dropped: u64,
	pub scrapes_committed: u64,
	pub scrapes_failed: u64,
	pub grammar_pushes: u64,
	pub grammar_pushes_dropped: u64,
	pub commands_dispatched: u64,
	pub speech_results_dropped: u64,
}

/// The embedding host's handle to a running engine.
pub struct EngineHandle<H: AccessibilityHost> {
	shared: Arc<EngineShared>,
	store: Arc<Store>,
	speech: Arc<dyn SpeechEngine>,
	event_tx: mpsc::Sender<UiEvent<H::Node>>,
	results: Arc<DropOldest<SpeechResult>>,
	token: CancellationToken,
	tracker: TaskTracker,
	speech_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
	shutting_down: AtomicBool,
}

impl<H: AccessibilityHost> EngineHandle<H> {
	/// Hand one accessibility event to the engine. Never blocks: when the
	/// intake channel is full the event is dropped, counted, and its source
	/// handle released. Returns whether the event was accepted.
	pub fn submit_event(&self, event: UiEvent<H::Node>) -> bool {
		match self.event_tx.try_send(event) {
			Ok(()) => true,
			Err(mpsc::error::TrySendError::Full(event)) => {
				EngineCounters::bump(&self.shared.counters.events_dropped);
				drop(event);
				false
			}
			Err(mpsc::error::TrySendError::Closed(event)) => {
				drop(event);
				false
			}
		}
	}

	/// Hand one recognition result to the engine. When the buffer is full
	/// the oldest result is evicted and counted.
	pub fn submit_speech_result(&self, text: impl Into<String>, confidence: f64) -> bool {
		self.results.push(SpeechResult { text: text.into(), confidence })
	}

	/// The coordinator's current lifecycle state.
	#[must_use]
	pub fn status(&self) -> EngineStatus {
		self.shared.status()
	}

	/// Enter or leave the high-throttle mode driven by the host's memory
	/// pressure signal.
	pub fn set_memory_pressure(&self, on: bool) {
		self.shared.set_memory_pressure(on);
	}

	/// Read access to the underlying store.
	#[must_use]
	pub fn store(&self) -> &Store {
		&self.store
	}

	/// Snapshot the engine's counters.
	#[must_use]
	pub fn counters(&self) -> CountersSnapshot {
		let counters = &self.shared.counters;
		CountersSnapshot {
			events_received: EngineCounters::get(&counters.events_received),
			events_dropped: EngineCounters::get(&counters.events_dropped),
			scrapes_committed: EngineCounters::get(&counters.scrapes_committed),
			scrapes_failed: EngineCounters::get(&counters.scrapes_failed),
			grammar_pushes: EngineCounters::get(&counters.grammar_pushes),
			grammar_pushes_dropped: EngineCounters::get(
				&counters.grammar_pushes_dropped,
			),
			commands_dispatched: EngineCounters::get(&counters.commands_dispatched),
			speech_results_dropped: self.results.dropped(),
		}
	}

	/// Stop the engine: cancel in-flight work at its next suspension point,
	/// flush a grammar removal so the recognizer does not keep phrases for a
	/// dead target, drain and close the speech-result channel, and wait for
	/// every task. Idempotent; a second call returns immediately.
	pub async fn shutdown(&self) {
		if self.shutting_down.swap(true, Ordering::AcqRel) {
			return;
		}
		self.shared.set_status(EngineStatus::ShuttingDown);
		self.token.cancel();

		let flush = self.shared.grammar.lock().flush_all();
		if !flush.removed.is_empty() {
			match timeout(
				SHUTDOWN_FLUSH_BUDGET,
				self.speech.set_active_phrases(&[], &flush.removed),
			)
			.await
			{
				Ok(Ok(())) => {
					self.shared.grammar.lock().commit(&[]);
				}
				Ok(Err(err)) => {
					tracing::warn!(%err, "shutdown grammar flush failed");
				}
				Err(_elapsed) => {
					tracing::warn!("shutdown grammar flush timed out");
				}
			}
		}

		self.results.close();
		let _ = self.results.drain();
		self.tracker.wait().await;

		let thread = self.speech_thread.lock().take();
		if let Some(handle) = thread {
			let _ = tokio::task::spawn_blocking(move || handle.join()).await;
		}
		self.shared.set_status(EngineStatus::Terminated);
	}
}
