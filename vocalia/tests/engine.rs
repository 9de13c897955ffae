//! End-to-end engine tests against a scripted host and a recording speech
//! engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use vocalia::{
	AccessibilityHost, DeviceSpeedClass, Engine, EngineHandle, EngineStatus, EventKind,
	Feedback, GlobalAction, NodeAttributes, SpeechEngine, Store, UiEvent, UiNode,
};
use vocalia_common::errors::{GrammarError, WalkError};
use vocalia_common::model::{ActionType, AppRecord, Bounds, ScrapingMode};
use vocalia_common::settings::EngineSettings;

#[derive(Debug, Default)]
struct HandleStats {
	acquired: AtomicUsize,
	released: AtomicUsize,
}

impl HandleStats {
	fn balanced(&self) -> bool {
		self.acquired.load(Ordering::SeqCst) == self.released.load(Ordering::SeqCst)
	}
}

struct SpecNode {
	class: &'static str,
	text: Option<&'static str>,
	clickable: bool,
	scrollable: bool,
	list_index: Option<u32>,
	children: Vec<Arc<SpecNode>>,
}

fn button(text: &'static str) -> Arc<SpecNode> {
	Arc::new(SpecNode {
		class: "android.widget.Button",
		text: Some(text),
		clickable: true,
		scrollable: false,
		list_index: None,
		children: vec![],
	})
}

fn plain(class: &'static str, text: Option<&'static str>) -> Arc<SpecNode> {
	Arc::new(SpecNode {
		class,
		text,
		clickable: false,
		scrollable: false,
		list_index: None,
		children: vec![],
	})
}

fn row(index: u32) -> Arc<SpecNode> {
	Arc::new(SpecNode {
		class: "android.view.View",
		text: None,
		clickable: true,
		scrollable: false,
		list_index: Some(index),
		children: vec![],
	})
}

fn list(children: Vec<Arc<SpecNode>>) -> Arc<SpecNode> {
	Arc::new(SpecNode {
		class: "androidx.recyclerview.widget.RecyclerView",
		text: None,
		clickable: false,
		scrollable: true,
		list_index: None,
		children,
	})
}

fn screen(children: Vec<Arc<SpecNode>>) -> Arc<SpecNode> {
	Arc::new(SpecNode {
		class: "android.widget.FrameLayout",
		text: None,
		clickable: false,
		scrollable: false,
		list_index: None,
		children,
	})
}

struct MockNode {
	spec: Arc<SpecNode>,
	stats: Arc<HandleStats>,
}

impl MockNode {
	fn acquire(spec: Arc<SpecNode>, stats: Arc<HandleStats>) -> Self {
		stats.acquired.fetch_add(1, Ordering::SeqCst);
		Self { spec, stats }
	}
}

impl UiNode for MockNode {
	fn attributes(&self) -> NodeAttributes {
		NodeAttributes {
			class_name: self.spec.class.to_owned(),
			text: self.spec.text.map(str::to_owned),
			bounds: Bounds::new(0, 0, 200, 64),
			is_clickable: self.spec.clickable,
			is_scrollable: self.spec.scrollable,
			is_enabled: true,
			is_visible: true,
			list_index: self.spec.list_index,
			..NodeAttributes::default()
		}
	}

	fn child_count(&self) -> usize {
		self.spec.children.len()
	}

	fn child(&self, index: usize) -> Result<Option<Self>, WalkError> {
		Ok(self
			.spec
			.children
			.get(index)
			.map(|c| MockNode::acquire(Arc::clone(c), Arc::clone(&self.stats))))
	}

	fn release(&mut self) {
		self.stats.released.fetch_add(1, Ordering::SeqCst);
	}
}

struct MockHost {
	tree: RwLock<Arc<SpecNode>>,
	stats: Arc<HandleStats>,
	gestures: Mutex<Vec<(ActionType, String)>>,
	globals: Mutex<Vec<GlobalAction>>,
}

impl MockHost {
	fn new(tree: Arc<SpecNode>) -> Self {
		Self {
			tree: RwLock::new(tree),
			stats: Arc::new(HandleStats::default()),
			gestures: Mutex::new(Vec::new()),
			globals: Mutex::new(Vec::new()),
		}
	}

	fn set_tree(&self, tree: Arc<SpecNode>) {
		*self.tree.write() = tree;
	}

	fn root(&self) -> MockNode {
		MockNode::acquire(Arc::clone(&self.tree.read()), Arc::clone(&self.stats))
	}
}

impl AccessibilityHost for MockHost {
	type Node = MockNode;

	fn root_node(&self) -> Option<Self::Node> {
		Some(self.root())
	}

	fn perform(&self, action: ActionType, node: &Self::Node) -> bool {
		self.gestures
			.lock()
			.push((action, node.spec.text.unwrap_or(node.spec.class).to_owned()));
		true
	}

	fn perform_global(&self, action: GlobalAction) -> bool {
		self.globals.lock().push(action);
		true
	}

	fn is_system_package(&self, package: &str) -> bool {
		package == "com.android.systemui"
	}
}

#[derive(Default)]
struct MockSpeech {
	pushes: Mutex<Vec<(Vec<String>, Vec<String>)>>,
	failures_remaining: AtomicUsize,
}

#[async_trait]
impl SpeechEngine for MockSpeech {
	async fn set_active_phrases(
		&self,
		added: &[String],
		removed: &[String],
	) -> Result<(), GrammarError> {
		if self.failures_remaining.load(Ordering::SeqCst) > 0 {
			self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
			return Err(GrammarError::PushRejected("engine busy".to_owned()));
		}
		self.pushes.lock().push((added.to_vec(), removed.to_vec()));
		Ok(())
	}
}

#[derive(Default)]
struct MockFeedback {
	confirmations: Mutex<Vec<(String, f64)>>,
	suggestions: Mutex<Vec<(String, Vec<String>)>>,
}

impl Feedback for MockFeedback {
	fn request_confirmation(&self, phrase: &str, confidence: f64) {
		self.confirmations.lock().push((phrase.to_owned(), confidence));
	}

	fn suggest(&self, heard: &str, candidates: &[String]) {
		self.suggestions.lock().push((heard.to_owned(), candidates.to_vec()));
	}
}

struct Fixture {
	handle: EngineHandle<MockHost>,
	host: Arc<MockHost>,
	speech: Arc<MockSpeech>,
	feedback: Arc<MockFeedback>,
}

fn fixture(tree: Arc<SpecNode>, class: DeviceSpeedClass) -> eyre::Result<Fixture> {
	let settings = EngineSettings {
		throttle: vocalia_common::settings::ThrottleSettings { device_speed_class: class },
		..EngineSettings::default()
	};
	let host = Arc::new(MockHost::new(tree));
	let speech = Arc::new(MockSpeech::default());
	let feedback = Arc::new(MockFeedback::default());
	let store = Arc::new(Store::open_in_memory()?);
	let handle = Engine::spawn_with_store(
		settings,
		Arc::clone(&host),
		Arc::clone(&speech),
		Arc::clone(&feedback),
		store,
	);
	Ok(Fixture { handle, host, speech, feedback })
}

fn window_change(package: &str) -> UiEvent<MockNode> {
	UiEvent::new(EventKind::WindowChange, package, None).with_window("MainActivity", "")
}

fn content_change(package: &str) -> UiEvent<MockNode> {
	UiEvent::new(EventKind::ContentChange, package, None)
}

async fn settle() {
	tokio::time::sleep(Duration::from_millis(700)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn four_distinct_screens_make_four_screen_rows() -> eyre::Result<()> {
	let welcome = screen(vec![button("Start")]);
	let loading = screen(vec![plain("android.widget.ProgressBar", None)]);
	let form = screen(vec![
		plain("android.widget.EditText", Some("Email")),
		plain("android.widget.EditText", Some("Password")),
		button("Submit"),
	]);
	let results = screen(vec![
		plain("android.widget.ListView", None),
		button("Back"),
	]);

	let f = fixture(Arc::clone(&welcome), DeviceSpeedClass::Fast)?;
	assert!(f.handle.submit_event(window_change("com.ex")));
	settle().await;
	for tree in [loading, form, results] {
		f.host.set_tree(tree);
		assert!(f.handle.submit_event(content_change("com.ex")));
		settle().await;
	}

	assert_eq!(f.handle.store().table_counts()?.screens, 4);
	f.handle.shutdown().await;
	assert!(f.host.stats.balanced(), "all walked handles must be released");
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rescraping_a_screen_keeps_edges_on_current_elements() -> eyre::Result<()> {
	let first = screen(vec![button("Alpha"), button("Beta"), button("Gamma")]);
	let second = screen(vec![button("Delta"), button("Epsilon"), button("Zeta")]);

	let f = fixture(Arc::clone(&first), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	f.host.set_tree(second);
	f.handle.submit_event(content_change("com.ex"));
	settle().await;

	let store = f.handle.store();
	assert_eq!(store.orphan_edge_count()?, 0);
	let edges = store.edges_for_package("com.ex")?;
	assert!(!edges.is_empty());
	for edge in &edges {
		let child = store.element(&edge.child_hash)?.expect("edge child resolves");
		assert!(["Delta", "Epsilon", "Zeta"]
			.iter()
			.any(|t| child.text.as_deref() == Some(t) || child.text.is_none()));
	}
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn an_event_burst_commits_at_most_one_scrape() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Medium)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;

	let before = f.handle.counters();
	for _ in 0..100 {
		f.handle.submit_event(content_change("com.ex"));
	}
	tokio::time::sleep(Duration::from_millis(1_200)).await;
	let after = f.handle.counters();

	assert!(
		after.scrapes_committed - before.scrapes_committed <= 1,
		"burst must debounce to at most one commit"
	);
	assert!(after.grammar_pushes - before.grammar_pushes <= 1);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn speech_dispatch_survives_a_saturated_work_context() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;

	for _ in 0..10 {
		for _ in 0..20 {
			f.handle.submit_event(content_change("com.ex"));
		}
		f.handle.submit_speech_result("go back", 0.95);
		tokio::time::sleep(Duration::from_millis(100)).await;
	}
	tokio::time::sleep(Duration::from_millis(500)).await;

	assert_eq!(f.host.globals.lock().len(), 10, "every spoken command must dispatch");
	assert_eq!(f.handle.counters().speech_results_dropped, 0);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn grammar_deltas_carry_exactly_the_changed_phrases() -> eyre::Result<()> {
	let first = screen(vec![list(vec![row(0), row(1)]), button("Settings")]);
	let second = screen(vec![list(vec![row(0)]), button("Settings"), button("Help")]);

	let f = fixture(Arc::clone(&first), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	f.host.set_tree(second);
	f.handle.submit_event(content_change("com.ex"));
	settle().await;

	let pushes = f.speech.pushes.lock().clone();
	assert!(pushes.len() >= 2, "expected an initial push and one delta");
	let (added, removed) = pushes.last().expect("at least one push").clone();
	assert_eq!(added, vec!["help".to_owned()]);
	assert_eq!(removed, vec!["second".to_owned()]);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn replaying_an_event_leaves_the_same_store_state() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start"), button("Stop")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	let first = f.handle.store().table_counts()?;

	f.handle.submit_event(content_change("com.ex"));
	settle().await;
	let second = f.handle.store().table_counts()?;

	assert_eq!(first.elements, second.elements);
	assert_eq!(first.edges, second.edges);
	assert_eq!(first.commands, second.commands);
	assert_eq!(f.handle.store().orphan_edge_count()?, 0);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn spoken_labels_execute_gestures_on_their_elements() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Compose"), button("Archive")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;

	f.handle.submit_speech_result("compose", 0.95);
	tokio::time::sleep(Duration::from_millis(400)).await;

	let gestures = f.host.gestures.lock().clone();
	assert_eq!(gestures, vec![(ActionType::Click, "Compose".to_owned())]);
	assert_eq!(f.handle.store().table_counts()?.interactions, 1);
	f.handle.shutdown().await;
	assert!(f.host.stats.balanced());
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn medium_confidence_asks_and_low_confidence_suggests() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Compose")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;

	f.handle.submit_speech_result("compose", 0.70);
	f.handle.submit_speech_result("compost", 0.95);
	tokio::time::sleep(Duration::from_millis(400)).await;

	let confirmations = f.feedback.confirmations.lock().clone();
	assert_eq!(confirmations.len(), 1);
	assert_eq!(confirmations[0].0, "compose");
	let suggestions = f.feedback.suggestions.lock().clone();
	assert_eq!(suggestions.len(), 1);
	assert!(suggestions[0].1.contains(&"compose".to_owned()));
	assert!(f.host.gestures.lock().is_empty());
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_grammar_pushes_keep_the_acknowledged_window() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	// Every attempt for the first delta fails; the backoff gives up.
	f.speech.failures_remaining.store(3, Ordering::SeqCst);
	f.handle.submit_event(window_change("com.ex"));
	tokio::time::sleep(Duration::from_millis(2_000)).await;

	assert!(f.speech.pushes.lock().is_empty());
	assert_eq!(f.handle.counters().grammar_pushes, 0);
	assert_eq!(f.handle.counters().grammar_pushes_dropped, 1);
	// The phrase was never acknowledged, so speaking it only suggests.
	f.handle.submit_speech_result("start", 0.95);
	tokio::time::sleep(Duration::from_millis(300)).await;
	assert!(f.host.gestures.lock().is_empty());
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn memory_pressure_suspends_numeric_badges() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start"), button("Stop")]), DeviceSpeedClass::Fast)?;
	f.handle.set_memory_pressure(true);
	f.handle.submit_event(window_change("com.ex"));
	settle().await;

	let commands = f.handle.store().commands_for_package("com.ex")?;
	assert!(commands
		.iter()
		.all(|c| !c.phrase.chars().all(|ch| ch.is_ascii_digit())));
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_is_idempotent_and_flushes_the_grammar() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	let pushes_before = f.speech.pushes.lock().len();
	assert!(pushes_before >= 1);

	f.handle.shutdown().await;
	f.handle.shutdown().await;
	assert_eq!(f.handle.status(), EngineStatus::Terminated);

	let pushes = f.speech.pushes.lock().clone();
	let (added, removed) = pushes.last().expect("flush push").clone();
	assert!(added.is_empty());
	assert!(removed.contains(&"start".to_owned()));
	assert!(removed.contains(&"go back".to_owned()));

	// Results arriving after shutdown are dropped, not executed.
	assert!(!f.handle.submit_speech_result("go back", 0.99));
	tokio::time::sleep(Duration::from_millis(200)).await;
	assert!(f.host.globals.lock().is_empty());
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn system_ui_events_are_filtered_out() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.android.systemui"));
	settle().await;

	assert_eq!(f.handle.counters().scrapes_committed, 0);
	assert_eq!(f.handle.counters().events_dropped, 1);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn text_churn_at_a_stable_position_flags_a_live_region() -> eyre::Result<()> {
	let tick = |label: &'static str| {
		screen(vec![button("Start"), plain("android.widget.TextView", Some(label))])
	};
	let f = fixture(tick("tick 1"), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	for label in ["tick 2", "tick 3", "tick 4"] {
		f.host.set_tree(tick(label));
		f.handle.submit_event(content_change("com.ex"));
		settle().await;
	}

	let store = f.handle.store();
	assert_eq!(store.table_counts()?.state_changes, 3);
	let live = store.live_element_hashes(vocalia_common::model::now_millis())?;
	assert_eq!(live.len(), 1, "the churning label must be flagged live");
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn frozen_apps_update_the_foreground_but_are_never_scraped() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	f.handle
		.store()
		.upsert_app(&AppRecord::first_observation("com.ex", 1, "1.0", "sig"))?;
	f.handle.store().set_scraping_mode("com.ex", ScrapingMode::Frozen)?;

	f.handle.submit_event(window_change("com.ex"));
	f.handle.submit_event(content_change("com.ex"));
	settle().await;

	assert_eq!(f.handle.counters().scrapes_committed, 0);
	assert_eq!(f.handle.counters().events_dropped, 2);
	f.handle.shutdown().await;
	Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn an_unchanged_subtree_fingerprint_skips_the_scrape() -> eyre::Result<()> {
	let f = fixture(screen(vec![button("Start")]), DeviceSpeedClass::Fast)?;
	f.handle.submit_event(window_change("com.ex"));
	settle().await;
	let before = f.handle.counters().scrapes_committed;

	// Two content changes carrying the same source subtree: the second is
	// recognized as a no-op before it ever reaches the debouncer.
	let with_source = |f: &Fixture| {
		UiEvent::new(EventKind::ContentChange, "com.ex", Some(f.host.root()))
	};
	f.handle.submit_event(with_source(&f));
	settle().await;
	f.handle.submit_event(with_source(&f));
	settle().await;

	let after = f.handle.counters().scrapes_committed;
	assert_eq!(after - before, 1, "the identical follow-up must be dropped");
	f.handle.shutdown().await;
	assert!(f.host.stats.balanced());
	Ok(())
}
