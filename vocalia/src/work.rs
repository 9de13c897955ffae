//! The work loop: debounce, scrape, persist, index, push.
//!
//! One event is processed at a time, end to end. Suspension points sit
//! between the walk and the commit and between the commit and the grammar
//! push, so cancellation and the per-scrape budget both take effect at
//! stage boundaries rather than mid-transaction.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tokio::time::{sleep, timeout, Duration, Instant};
use tokio_util::sync::CancellationToken;

use vocalia_common::errors::WalkError;
use vocalia_common::events::{EventKind, Operation};
use vocalia_common::hash::{content_fingerprint, hash_screen, ElementHash};
use vocalia_common::model::{
	now_millis, AppRecord, ElementRecord, ScreenRecord, StateChange, StateType,
	TriggerSource,
};
use vocalia_common::VoxResult;
use vocalia_grammar::{generate_commands, GenerationContext, SpeechEngine};
use vocalia_scrape::{infer_relationships, AccessibilityHost, TreeWalker, UiEvent, UiNode};
use vocalia_store::Store;

use crate::state::{EngineCounters, EngineShared, PositionEntry};

/// The position identity used for text-churn tracking: stable across text
/// changes, distinct across siblings.
fn position_key(element: &ElementRecord) -> String {
	format!(
		"{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
		element.package_name,
		element.class_name,
		element.resource_id.as_deref().unwrap_or("-"),
		element.depth,
		element.child_order
	)
}

/// Delay before the single scrape-commit retry.
const SCRAPE_RETRY_DELAY: Duration = Duration::from_millis(500);
/// Grammar push backoff start, cap, and attempt limit.
const PUSH_BACKOFF_START: Duration = Duration::from_millis(250);
const PUSH_BACKOFF_CAP: Duration = Duration::from_secs(4);
const PUSH_ATTEMPTS: u32 = 3;
/// Wall-clock budget for one grammar push attempt.
const PUSH_BUDGET: Duration = Duration::from_secs(4);

#[tracing::instrument(level = "debug", skip_all)]
pub async fn process<H, S>(
	shared: Arc<EngineShared>,
	host: Arc<H>,
	store: Arc<Store>,
	speech: Arc<S>,
	mut work_rx: Receiver<UiEvent<H::Node>>,
	shutdown: CancellationToken,
) where
	H: AccessibilityHost,
	S: SpeechEngine,
{
	loop {
		tokio::select! {
			maybe_event = work_rx.recv() => {
				let Some(event) = maybe_event else {
					tracing::debug!("work channel closed");
					break;
				};
				handle_event(&shared, &host, &store, &speech, event, &shutdown)
					.await;
			}
			() = shutdown.cancelled() => {
				tracing::debug!("work loop cancelled");
				break;
			}
		}
	}
}

async fn handle_event<H, S>(
	shared: &Arc<EngineShared>,
	host: &Arc<H>,
	store: &Arc<Store>,
	speech: &Arc<S>,
	event: UiEvent<H::Node>,
	shutdown: &CancellationToken,
) where
	H: AccessibilityHost,
	S: SpeechEngine,
{
	let op = event.kind.operation();
	if event.kind.is_skippable() && !shared.debouncer.try_fire(op, Instant::now()) {
		EngineCounters::bump(&shared.counters.events_dropped);
		return;
	}
	if op == Operation::WindowChange {
		// Window changes are never debounced, but their fire time still
		// feeds the per-operation budget bookkeeping.
		let _ = shared.debouncer.try_fire(op, Instant::now());
	}

	shared.begin_processing(event.kind);
	let budget = shared.debouncer.work_budget(op);
	let outcome = timeout(
		budget,
		scrape_cycle(shared, host, store, speech, &event, shutdown),
	)
	.await;
	shared.end_processing();
	// The event's source guard drops here, releasing its handle.
	drop(event);

	match outcome {
		Ok(Ok(())) => {}
		Ok(Err(err)) => {
			EngineCounters::bump(&shared.counters.scrapes_failed);
			tracing::error!(%err, "scrape cycle failed; prior scrape remains authoritative");
		}
		Err(_elapsed) => {
			EngineCounters::bump(&shared.counters.scrapes_failed);
			tracing::warn!(?budget, "scrape cycle exceeded its budget");
		}
	}

	let processed =
		shared.events_since_maintenance.fetch_add(1, Ordering::Relaxed) + 1;
	let threshold = shared.settings.scrape.retry_cleanup_threshold.max(1);
	if processed % threshold == 0 {
		if let Err(err) = store.run_maintenance(now_millis()) {
			tracing::warn!(%err, "store maintenance pass failed");
		}
	}
}

/// One end-to-end scrape: walk → identity → commit (with one retry) →
/// index → push. Transient host trouble is not an error; a failed commit
/// after the retry is.
async fn scrape_cycle<H, S>(
	shared: &Arc<EngineShared>,
	host: &Arc<H>,
	store: &Arc<Store>,
	speech: &Arc<S>,
	event: &UiEvent<H::Node>,
	shutdown: &CancellationToken,
) -> VoxResult<()>
where
	H: AccessibilityHost,
	S: SpeechEngine,
{
	let package = event.package.clone();
	let walker = TreeWalker::new(shared.settings.scrape.effective_max_depth());
	let output = match walker.walk(&package, host.root_node(), shutdown) {
		Ok(output) => output,
		Err(WalkError::Cancelled) => return Ok(()),
		Err(err) => {
			// Transient host failure: no persistence side effect, no
			// user-visible error.
			tracing::debug!(%err, "walk abandoned");
			return Ok(());
		}
	};
	if output.elements.is_empty() {
		return Ok(());
	}

	// Suspension point before touching the store.
	tokio::task::yield_now().await;
	if shutdown.is_cancelled() {
		return Ok(());
	}

	let (activity_class, window_title) = {
		let foreground = shared.foreground.lock();
		if foreground.package == package {
			(foreground.activity_class.clone(), foreground.window_title.clone())
		} else {
			(String::new(), String::new())
		}
	};

	// Live regions churn on their own and would fork screen identity on
	// every tick. Text participates in the element hash, so churn is
	// tracked per stable tree position: the anchor hash a position had when
	// first seen accumulates its TEXT_CHANGED history, and positions whose
	// anchor is currently live are excluded from the fingerprint.
	let live = store.live_element_hashes(now_millis())?;
	let mut text_changes: Vec<StateChange> = Vec::new();
	let excluded: HashSet<ElementHash> = {
		let mut positions = shared.positions.lock();
		let mut excluded = HashSet::new();
		let mut next = HashMap::with_capacity(output.elements.len());
		for element in &output.elements {
			let key = position_key(element);
			let (anchor, prior_text) = match positions.get(&key) {
				Some(entry) => {
					(entry.anchor.clone(), Some(entry.text.clone()))
				}
				None => (element.element_hash.clone(), None),
			};
			if live.contains(&anchor) {
				excluded.insert(element.element_hash.clone());
			}
			if let Some(prior) = prior_text {
				if prior != element.text {
					text_changes.push(StateChange {
						element_hash: anchor.clone(),
						state_type: StateType::TextChanged,
						value: element
							.text
							.clone()
							.unwrap_or_default(),
						changed_at: now_millis(),
						trigger_source: TriggerSource::Scrape,
					});
				}
			}
			next.insert(
				key,
				PositionEntry { anchor, text: element.text.clone() },
			);
		}
		*positions = next;
		excluded
	};
	let significant: Vec<_> = output
		.elements
		.iter()
		.filter(|e| !excluded.contains(&e.element_hash))
		.collect();
	let fingerprint = content_fingerprint(
		&significant,
		shared.settings.scrape.screen_fingerprint_top_n,
	);
	let screen_hash = hash_screen(&package, &activity_class, &window_title, &fingerprint);

	let mut elements = output.elements;
	for element in &mut elements {
		element.screen_hash = screen_hash.clone();
	}
	let edges = output.edges;
	let relationships = infer_relationships(&mut elements, &edges);

	if store.app(&package)?.is_none() {
		store.upsert_app(&AppRecord::first_observation(&package, 0, "", ""))?;
	}
	let now = now_millis();
	store.upsert_screen(&ScreenRecord {
		screen_hash: screen_hash.clone(),
		package_name: package.clone(),
		activity_class,
		window_title,
		visit_count: 1,
		first_seen_at: now,
		last_seen_at: now,
	})?;

	if let Err(first) = store.replace_scrape(&package, &screen_hash, &elements, &edges) {
		tracing::warn!(%first, "scrape commit failed; retrying once");
		tokio::select! {
			() = sleep(SCRAPE_RETRY_DELAY) => {}
			() = shutdown.cancelled() => return Ok(()),
		}
		store.replace_scrape(&package, &screen_hash, &elements, &edges)?;
	}
	EngineCounters::bump(&shared.counters.scrapes_committed);

	if let Err(err) = store.upsert_relationships(&relationships) {
		tracing::warn!(%err, "relationship upsert failed");
	}

	// State history appends after the commit so every anchor row exists.
	for change in &text_changes {
		if let Err(err) = store.append_state_change(change) {
			tracing::trace!(%err, "state change append skipped");
		}
	}
	if event.kind == EventKind::Focus {
		if let Some(source) = &event.source {
			let attrs = source.attributes();
			let target = elements.iter().find(|e| {
				e.class_name == attrs.class_name
					&& e.text == attrs.text
					&& e.resource_id == attrs.resource_id
			});
			if let Some(target) = target {
				let change = StateChange {
					element_hash: target.element_hash.clone(),
					state_type: StateType::Focused,
					value: "true".to_owned(),
					changed_at: now_millis(),
					trigger_source: TriggerSource::HostEvent,
				};
				if let Err(err) = store.append_state_change(&change) {
					tracing::trace!(%err, "focus append skipped");
				}
			}
		}
	}

	// A window change that arrived while we walked makes this element set
	// stale: the commit stands, but the grammar must not follow it.
	if shared.foreground.lock().package != package {
		tracing::debug!("foreground changed mid-scrape; discarding index result");
		return Ok(());
	}

	// Suspension point between persistence and indexing.
	tokio::task::yield_now().await;
	if shutdown.is_cancelled() {
		return Ok(());
	}

	let mut interaction_counts: HashMap<ElementHash, i64> = HashMap::new();
	for element in elements.iter().filter(|e| e.is_actionable()) {
		let count = store.successful_interaction_count(&element.element_hash)?;
		if count > 0 {
			interaction_counts.insert(element.element_hash.clone(), count);
		}
	}
	let context = GenerationContext {
		package: &package,
		settings: &shared.settings.grammar,
		suspend_numeric_overlay: shared.under_memory_pressure(),
		interaction_counts: &interaction_counts,
	};
	let commands = generate_commands(&elements, &context);
	store.upsert_commands(&package, &commands)?;

	push_grammar(shared, speech, &commands, shutdown).await;
	Ok(())
}

/// Push the delta between the acknowledged grammar and `commands`.
///
/// Exceeding the push rate coalesces: the delta is simply not sent, and the
/// next commit diffs against the same acknowledged window, so nothing is
/// lost. Failures retry with exponential backoff; exhaustion drops the delta
/// and leaves `active_phrases` at the last acknowledged set.
async fn push_grammar<S: SpeechEngine>(
	shared: &Arc<EngineShared>,
	speech: &Arc<S>,
	commands: &[vocalia_common::model::CommandRecord],
	shutdown: &CancellationToken,
) {
	if !shared.debouncer.try_fire(Operation::GrammarPush, Instant::now()) {
		tracing::trace!("grammar push coalesced");
		return;
	}
	if shared.is_grammar_pushing.swap(true, Ordering::AcqRel) {
		// Never reentrant.
		return;
	}

	let delta = shared.grammar.lock().diff(commands);
	if delta.is_empty() {
		shared.grammar.lock().commit(commands);
		shared.is_grammar_pushing.store(false, Ordering::Release);
		return;
	}

	let mut backoff = PUSH_BACKOFF_START;
	for attempt in 1..=PUSH_ATTEMPTS {
		let push = speech.set_active_phrases(&delta.added, &delta.removed);
		match timeout(PUSH_BUDGET, push).await {
			Ok(Ok(())) => {
				// The engine acknowledged; only now does the window move.
				shared.grammar.lock().commit(commands);
				EngineCounters::bump(&shared.counters.grammar_pushes);
				break;
			}
			Ok(Err(err)) if attempt == PUSH_ATTEMPTS => {
				EngineCounters::bump(&shared.counters.grammar_pushes_dropped);
				tracing::warn!(%err, "grammar delta dropped after {PUSH_ATTEMPTS} attempts");
			}
			Err(_elapsed) if attempt == PUSH_ATTEMPTS => {
				EngineCounters::bump(&shared.counters.grammar_pushes_dropped);
				tracing::warn!("grammar delta dropped: push budget exhausted");
			}
			Ok(Err(err)) => {
				tracing::debug!(%err, attempt, "grammar push failed; backing off");
				tokio::select! {
					() = sleep(backoff) => {}
					() = shutdown.cancelled() => break,
				}
				backoff = (backoff * 2).min(PUSH_BACKOFF_CAP);
			}
			Err(_elapsed) => {
				tracing::debug!(attempt, "grammar push timed out; backing off");
				tokio::select! {
					() = sleep(backoff) => {}
					() = shutdown.cancelled() => break,
				}
				backoff = (backoff * 2).min(PUSH_BACKOFF_CAP);
			}
		}
	}
	shared.is_grammar_pushing.store(false, Ordering::Release);
}
