//! The speech-result context.
//!
//! Speech results are consumed on a dedicated thread driving its own
//! single-threaded runtime. If dispatch shared an executor with the work
//! loop, a stream of content-change events could starve the user's spoken
//! commands; keeping the contexts on separate OS resources is what makes
//! the isolation guarantee hold rather than merely usually-true.

use std::sync::Arc;

use tokio::time::{timeout, Duration, Instant};
use tokio_util::sync::CancellationToken;

use vocalia_common::model::{now_millis, ActionType, InteractionRecord};
use vocalia_common::queue::DropOldest;
use vocalia_grammar::{match_result, CommandBinding, Dispatch, Feedback, SpeechResult};
use vocalia_scrape::{AccessibilityHost, GlobalAction, TreeWalker};
use vocalia_store::Store;

use crate::state::{EngineCounters, EngineShared, EngineStatus};

/// Wall-clock budget for executing one spoken command.
const ACTION_BUDGET: Duration = Duration::from_millis(1_500);

/// Owned copy of a dispatch decision, so no grammar lock is held while the
/// gesture executes.
enum Decision {
	Execute(CommandBinding),
	Confirm(CommandBinding),
	Suggest(Vec<String>),
}

/// Start the speech-result context. Returns `None` when the OS refuses a
/// thread, which is fatal for dispatch but not for scraping; the caller
/// logs and carries on degraded.
pub fn spawn<H, F>(
	shared: Arc<EngineShared>,
	host: Arc<H>,
	store: Arc<Store>,
	feedback: Arc<F>,
	results: Arc<DropOldest<SpeechResult>>,
	shutdown: CancellationToken,
) -> Option<std::thread::JoinHandle<()>>
where
	H: AccessibilityHost,
	F: Feedback,
{
	let spawned = std::thread::Builder::new()
		.name("vocalia-speech".to_owned())
		.spawn(move || {
			let runtime = match tokio::runtime::Builder::new_current_thread()
				.enable_time()
				.build()
			{
				Ok(runtime) => runtime,
				Err(err) => {
					tracing::error!(%err, "speech context runtime failed to build");
					return;
				}
			};
			runtime.block_on(dispatch_loop(
				shared, host, store, feedback, results, shutdown,
			));
		});
	match spawned {
		Ok(handle) => Some(handle),
		Err(err) => {
			tracing::error!(%err, "speech context thread failed to spawn");
			None
		}
	}
}

#[tracing::instrument(level = "debug", skip_all)]
async fn dispatch_loop<H, F>(
	shared: Arc<EngineShared>,
	host: Arc<H>,
	store: Arc<Store>,
	feedback: Arc<F>,
	results: Arc<DropOldest<SpeechResult>>,
	shutdown: CancellationToken,
) where
	H: AccessibilityHost,
	F: Feedback,
{
	loop {
		tokio::select! {
			maybe_result = results.recv() => {
				let Some(result) = maybe_result else {
					tracing::debug!("speech result buffer closed");
					break;
				};
				if matches!(
					shared.status(),
					EngineStatus::ShuttingDown | EngineStatus::Terminated
				) {
					// Results that race shutdown are dropped, never
					// executed against a dying host.
					continue;
				}
				dispatch_one(&shared, &host, &store, feedback.as_ref(), result)
					.await;
			}
			() = shutdown.cancelled() => {
				tracing::debug!("speech context cancelled");
				break;
			}
		}
	}
}

async fn dispatch_one<H: AccessibilityHost>(
	shared: &Arc<EngineShared>,
	host: &Arc<H>,
	store: &Arc<Store>,
	feedback: &dyn Feedback,
	result: SpeechResult,
) {
	let started = Instant::now();
	let decision = {
		let grammar = shared.grammar.lock();
		match match_result(
			&grammar,
			&result.text,
			result.confidence,
			&shared.settings.grammar,
		) {
			Dispatch::Execute(binding) => Decision::Execute(binding.clone()),
			Dispatch::Confirm(binding) => Decision::Confirm(binding.clone()),
			Dispatch::Suggest(candidates) => Decision::Suggest(candidates),
		}
	};

	match decision {
		Decision::Execute(binding) => {
			EngineCounters::bump(&shared.counters.commands_dispatched);
			let succeeded = execute(shared, host, binding.clone()).await;
			if let Some(element_hash) = binding.element_hash {
				let latency_ms = i64::try_from(started.elapsed().as_millis())
					.unwrap_or(i64::MAX);
				let record = InteractionRecord {
					element_hash,
					action_type: binding.action_type,
					succeeded,
					latency_ms,
					timestamp: now_millis(),
				};
				if let Err(err) = store.record_interaction(&record) {
					tracing::warn!(%err, "failed to record interaction");
				}
			}
			if !succeeded {
				tracing::debug!(
					phrase = %binding.phrase,
					"gesture failed or target vanished"
				);
			}
		}
		Decision::Confirm(binding) => {
			feedback.request_confirmation(&binding.phrase, result.confidence);
		}
		Decision::Suggest(candidates) => {
			feedback.suggest(&result.text, &candidates);
		}
	}
}

/// Resolve the binding to a live node and perform its gesture, bounded by
/// the action budget. The blocking resolution cannot be interrupted once
/// started; on budget exhaustion its eventual result is discarded.
async fn execute<H: AccessibilityHost>(
	shared: &Arc<EngineShared>,
	host: &Arc<H>,
	binding: CommandBinding,
) -> bool {
	let max_depth = shared.settings.scrape.effective_max_depth();
	let host = Arc::clone(host);
	let task = tokio::task::spawn_blocking(move || {
		perform_binding(host.as_ref(), max_depth, &binding)
	});
	match timeout(ACTION_BUDGET, task).await {
		Ok(Ok(succeeded)) => succeeded,
		Ok(Err(join_err)) => {
			tracing::warn!(%join_err, "gesture task failed");
			false
		}
		Err(_elapsed) => {
			tracing::warn!("action execution exceeded its budget");
			false
		}
	}
}

fn perform_binding<H: AccessibilityHost>(
	host: &H,
	max_depth: u32,
	binding: &CommandBinding,
) -> bool {
	let walker = TreeWalker::new(max_depth);
	match (&binding.element_hash, binding.action_type) {
		(None, ActionType::System) => {
			let action = match binding.phrase.as_str() {
				"go back" => GlobalAction::Back,
				"go home" => GlobalAction::Home,
				"recent apps" => GlobalAction::Recents,
				_ => return false,
			};
			host.perform_global(action)
		}
		(None, ActionType::ScrollUp | ActionType::ScrollDown) => {
			// System scroll targets the first scrollable container on
			// screen; the guard releases the handle after the gesture.
			match walker.find_where(host.root_node(), |attrs| attrs.is_scrollable) {
				Some(guard) => host.perform(binding.action_type, guard.node()),
				None => false,
			}
		}
		(Some(element_hash), action) => {
			match walker.find_element(&binding.package, host.root_node(), element_hash)
			{
				Some(guard) => host.perform(action, guard.node()),
				None => false,
			}
		}
		(None, _) => false,
	}
}
