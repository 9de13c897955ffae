//! The intake loop: cheap, always-responsive filtering between the host's
//! event channel and the work queue.
//!
//! Everything here must stay fast — this loop is what keeps foreground
//! tracking current while a scrape is in flight, which is what makes the
//! window-change invalidation in the work loop meaningful.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

use vocalia_common::events::EventKind;
use vocalia_common::model::ScrapingMode;
use vocalia_scrape::{quick_fingerprint, AccessibilityHost, UiEvent, UiNode};
use vocalia_store::Store;

use crate::state::{EngineCounters, EngineShared};

#[tracing::instrument(level = "debug", skip_all)]
pub async fn receive<H: AccessibilityHost>(
	shared: Arc<EngineShared>,
	host: Arc<H>,
	store: Arc<Store>,
	mut events: Receiver<UiEvent<H::Node>>,
	work_tx: Sender<UiEvent<H::Node>>,
	shutdown: CancellationToken,
) {
	loop {
		tokio::select! {
			maybe_event = events.recv() => {
				let Some(event) = maybe_event else {
					tracing::debug!("event channel closed");
					break;
				};
				EngineCounters::bump(&shared.counters.events_received);
				match admit(&shared, host.as_ref(), store.as_ref(), event) {
					Some(event) => {
						if work_tx.send(event).await.is_err() {
							tracing::debug!("work channel closed");
							break;
						}
					}
					None => {
						EngineCounters::bump(&shared.counters.events_dropped);
					}
				}
			}
			() = shutdown.cancelled() => {
				tracing::debug!("intake loop cancelled");
				break;
			}
		}
	}
}

/// Decide whether an event reaches the work queue. Returning `None` drops
/// it; the source guard inside releases its handle either way.
fn admit<H: AccessibilityHost>(
	shared: &EngineShared,
	host: &H,
	store: &Store,
	event: UiEvent<H::Node>,
) -> Option<UiEvent<H::Node>> {
	if host.is_system_package(&event.package) {
		return None;
	}
	if let Some(source) = &event.source {
		if !source.attributes().is_visible {
			return None;
		}
	}

	if event.kind == EventKind::WindowChange {
		// Foreground tracking stays current even for apps that are never
		// scraped; the window-change invalidation depends on it.
		let mut foreground = shared.foreground.lock();
		foreground.package.clone_from(&event.package);
		foreground.activity_class =
			event.activity_class.clone().unwrap_or_default();
		foreground.window_title = event.window_title.clone().unwrap_or_default();
		drop(foreground);
		// A new window invalidates the content fast path.
		shared.last_quick_hash.store(0, Ordering::Release);
	}

	// Frozen apps are never scraped.
	match store.app(&event.package) {
		Ok(Some(app)) if app.scraping_mode == ScrapingMode::Frozen => return None,
		Ok(_) => {}
		Err(err) => {
			tracing::warn!(%err, "app lookup failed during intake; admitting event");
		}
	}

	if event.kind == EventKind::WindowChange {
		return Some(event);
	}

	// Same-kind events are dropped, not queued, while one is in flight.
	if event.kind.is_skippable() && shared.is_processing_kind(event.kind) {
		return None;
	}

	// Fast path: a content change whose source subtree fingerprint matches
	// the last processed one is a no-op.
	if event.kind == EventKind::ContentChange {
		if let Some(source) = &event.source {
			let fingerprint = quick_fingerprint(source.node());
			let previous =
				shared.last_quick_hash.swap(fingerprint, Ordering::AcqRel);
			if previous == fingerprint {
				return None;
			}
		}
	}

	Some(event)
}
