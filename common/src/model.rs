//! The single in-memory record type per persisted entity.
//!
//! These are the shapes that cross crate boundaries: the walker emits
//! [`ElementRecord`]s and [`HierarchyEdge`]s, the store persists them, the
//! indexer reads them back. The store keeps its own row shape internally;
//! conversions happen in exactly one place (the store crate).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::hash::{self, AppHash, ElementHash, ScreenHash};

/// Milliseconds since the Unix epoch, the timestamp unit of every persisted
/// time field.
pub type EpochMillis = i64;

/// The current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> EpochMillis {
	Utc::now().timestamp_millis()
}

/// How an app is currently being scraped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScrapingMode {
	/// Scrape on every qualifying accessibility event.
	#[default]
	Dynamic,
	/// The app is being explored by a learn-mode walker. Accepted and
	/// persisted, but dynamic scraping treats it the same as [`Self::Dynamic`].
	Learn,
	/// Scraping is suppressed for this app entirely.
	Frozen,
}

/// The coarse role of an element, classified once from its class name and
/// actionability flags. The indexer disambiguates on this tag instead of a
/// class hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
	/// Clickable, non-editable.
	Button,
	/// Editable text entry.
	TextField,
	/// An item inside a scrollable container.
	ListItem,
	/// A toggle (checkbox, switch, radio).
	Checkbox,
	/// A pure layout node.
	Container,
	/// Anything else.
	Other,
}

/// A kind of element state transition, recorded append-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StateType {
	/// Visibility toggled.
	Visible,
	/// Enabled/disabled toggled.
	Enabled,
	/// Input focus moved onto or off the element.
	Focused,
	/// Selection state changed.
	Selected,
	/// The element's text content changed.
	TextChanged,
}

/// What caused a state change to be recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	/// Observed during a tree walk.
	Scrape,
	/// Reported directly by a host event.
	HostEvent,
	/// Side effect of executing a voice command.
	VoiceAction,
}

/// A typed link between two elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
	/// Both elements belong to the same inferred form group.
	FormGroup,
	/// The source element labels the target.
	LabelFor,
	/// The source element describes the target.
	DescribedBy,
}

/// The action a generated command performs when spoken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
	/// Single tap.
	Click,
	/// Long press.
	LongClick,
	/// Scroll the target's container up.
	ScrollUp,
	/// Scroll the target's container down.
	ScrollDown,
	/// Move input focus to the target.
	Focus,
	/// A persistent system navigation command with no target element.
	System,
}

/// Screen-coordinate bounds of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
	/// Left edge, pixels.
	pub left: i32,
	/// Top edge, pixels.
	pub top: i32,
	/// Right edge, pixels.
	pub right: i32,
	/// Bottom edge, pixels.
	pub bottom: i32,
}

impl Bounds {
	/// Construct from edges.
	#[must_use]
	pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
		Self { left, top, right, bottom }
	}

	/// Width in pixels; zero when degenerate.
	#[must_use]
	pub fn width(&self) -> i64 {
		i64::from(self.right - self.left).max(0)
	}

	/// Height in pixels; zero when degenerate.
	#[must_use]
	pub fn height(&self) -> i64 {
		i64::from(self.bottom - self.top).max(0)
	}

	/// On-screen area in square pixels, the input to visual weight.
	#[must_use]
	pub fn area(&self) -> i64 {
		self.width() * self.height()
	}
}

/// One observed application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
	/// Primary key.
	pub package_name: String,
	/// Content fingerprint of declared version plus signing identity.
	pub app_hash: AppHash,
	/// Declared numeric version.
	pub version_code: i64,
	/// Declared display version.
	pub version_name: String,
	/// How this app is scraped.
	pub scraping_mode: ScrapingMode,
	/// Whether a learn-mode walker has fully explored this app.
	pub is_fully_learned: bool,
	/// Number of committed scrapes.
	pub scrape_count: i64,
	/// Current element row count for this app.
	pub element_count: i64,
	/// Current command row count for this app.
	pub command_count: i64,
	/// First scrape commit time.
	pub first_scraped_at: EpochMillis,
	/// Most recent scrape commit time.
	pub last_scraped_at: EpochMillis,
}

impl AppRecord {
	/// A fresh record for a package observed for the first time.
	#[must_use]
	pub fn first_observation(
		package_name: &str,
		version_code: i64,
		version_name: &str,
		signing_identity: &str,
	) -> Self {
		let now = now_millis();
		Self {
			package_name: package_name.to_owned(),
			app_hash: hash::hash_app(
				package_name,
				version_code,
				version_name,
				signing_identity,
			),
			version_code,
			version_name: version_name.to_owned(),
			scraping_mode: ScrapingMode::Dynamic,
			is_fully_learned: false,
			scrape_count: 0,
			element_count: 0,
			command_count: 0,
			first_scraped_at: now,
			last_scraped_at: now,
		}
	}
}

/// One logical screen, identified by its content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRecord {
	/// Primary key; see [`crate::hash::hash_screen`].
	pub screen_hash: ScreenHash,
	/// Owning package.
	pub package_name: String,
	/// Activity class the screen was observed in.
	pub activity_class: String,
	/// Window title at observation time.
	pub window_title: String,
	/// Number of times this exact screen has been observed.
	pub visit_count: i64,
	/// First observation time.
	pub first_seen_at: EpochMillis,
	/// Most recent observation time.
	pub last_seen_at: EpochMillis,
}

/// One UI element as observed by a tree walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
	/// Primary key; see [`crate::hash::hash_element`].
	pub element_hash: ElementHash,
	/// Owning package.
	pub package_name: String,
	/// Screen the element was last observed on.
	pub screen_hash: ScreenHash,
	/// Platform widget class.
	pub class_name: String,
	/// Developer-assigned resource identifier, when present.
	pub resource_id: Option<String>,
	/// Visible text, when present.
	pub text: Option<String>,
	/// Accessibility description, when present.
	pub content_description: Option<String>,
	/// Screen bounds.
	pub bounds: Bounds,
	/// Accepts taps.
	pub is_clickable: bool,
	/// Accepts long presses.
	pub is_long_clickable: bool,
	/// Scroll container.
	pub is_scrollable: bool,
	/// Can take input focus.
	pub is_focusable: bool,
	/// Currently enabled.
	pub is_enabled: bool,
	/// Declared input type for editable elements.
	pub input_type: Option<String>,
	/// Hint text for editable elements.
	pub placeholder_text: Option<String>,
	/// Depth in the walked tree, root = 0.
	pub depth: u32,
	/// Index among the parent's children.
	pub child_order: u32,
	/// Index within a list container, when the host reports one.
	pub list_index: Option<u32>,
	/// Whether any ancestor is scrollable.
	pub in_scrollable: bool,
	/// On-screen prominence used for disambiguation; larger wins.
	pub visual_weight: i64,
	/// Most recent observation time.
	pub last_seen_at: EpochMillis,
	/// Inferred form group, when the element belongs to one.
	pub form_group_id: Option<String>,
}

impl ElementRecord {
	/// Construct a record mid-walk. The screen hash is assigned after the
	/// walk completes (the content fingerprint needs the full element set),
	/// and actionability flags are filled in by the walker from the node
	/// snapshot.
	#[must_use]
	#[allow(clippy::too_many_arguments)]
	pub fn for_walk(
		package_name: &str,
		class_name: &str,
		resource_id: Option<String>,
		text: Option<String>,
		content_description: Option<String>,
		bounds: Bounds,
		depth: u32,
		child_order: u32,
		structural_path: &str,
	) -> Self {
		let element_hash = hash::hash_element(
			package_name,
			class_name,
			resource_id.as_deref(),
			text.as_deref(),
			content_description.as_deref(),
			structural_path,
		);
		Self {
			element_hash,
			package_name: package_name.to_owned(),
			screen_hash: ScreenHash::from_raw(""),
			class_name: class_name.to_owned(),
			resource_id,
			text,
			content_description,
			bounds,
			is_clickable: false,
			is_long_clickable: false,
			is_scrollable: false,
			is_focusable: false,
			is_enabled: true,
			input_type: None,
			placeholder_text: None,
			depth,
			child_order,
			list_index: None,
			in_scrollable: false,
			visual_weight: bounds.area(),
			last_seen_at: now_millis(),
			form_group_id: None,
		}
	}

	/// Whether the user can act on this element by voice.
	#[must_use]
	pub fn is_actionable(&self) -> bool {
		self.is_clickable || self.is_long_clickable
	}

	/// Classify the tagged role from class name and flags.
	#[must_use]
	pub fn role(&self) -> ElementRole {
		let class = self.class_name.as_str();
		if class.contains("CheckBox") || class.contains("Switch") || class.contains("RadioButton")
		{
			ElementRole::Checkbox
		} else if class.contains("EditText") || self.input_type.is_some() {
			ElementRole::TextField
		} else if self.in_scrollable && self.list_index.is_some() {
			ElementRole::ListItem
		} else if crate::hash::is_container_class(class) {
			ElementRole::Container
		} else if self.is_clickable || class.contains("Button") {
			ElementRole::Button
		} else {
			ElementRole::Other
		}
	}
}

/// One parent→child edge in the walked hierarchy. Edges for a scrape scope
/// are regenerated atomically on every commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEdge {
	/// The parent element.
	pub parent_hash: ElementHash,
	/// The child element.
	pub child_hash: ElementHash,
	/// The child's index among the parent's children.
	pub child_order: u32,
}

/// One append-only element state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
	/// The element whose state changed.
	pub element_hash: ElementHash,
	/// Which state changed.
	pub state_type: StateType,
	/// The new value, stringly typed by state kind.
	pub value: String,
	/// When the change was observed.
	pub changed_at: EpochMillis,
	/// What caused the observation.
	pub trigger_source: TriggerSource,
}

/// A typed relationship between two elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRelationship {
	/// Relationship source.
	pub source_hash: ElementHash,
	/// Relationship target.
	pub target_hash: ElementHash,
	/// The kind of link.
	pub relationship_type: RelationshipType,
	/// Optional JSON payload with kind-specific data.
	pub relationship_data: Option<String>,
	/// Last time the relationship was re-derived.
	pub updated_at: EpochMillis,
}

/// One generated voice command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
	/// Monotonic store-assigned id; `None` until persisted.
	pub command_id: Option<i64>,
	/// Owning package.
	pub package_name: String,
	/// Target element; `None` for system commands.
	pub element_hash: Option<ElementHash>,
	/// The normalized phrase the recognizer listens for.
	pub phrase: String,
	/// What speaking the phrase does.
	pub action_type: ActionType,
	/// Generation confidence in `[0, 1]`.
	pub confidence: f64,
	/// Whether the command survives scrape commits.
	pub is_persistent: bool,
	/// Last successful dispatch time.
	pub last_used_at: Option<EpochMillis>,
	/// Generation time.
	pub created_at: EpochMillis,
}

/// One executed (or attempted) user interaction, append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
	/// The element acted on.
	pub element_hash: ElementHash,
	/// The gesture attempted.
	pub action_type: ActionType,
	/// Whether the host reported success.
	pub succeeded: bool,
	/// End-to-end latency from speech result to gesture completion.
	pub latency_ms: i64,
	/// When the attempt finished.
	pub timestamp: EpochMillis,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roles_classify_from_class_and_flags() {
		let mut e = ElementRecord::for_walk(
			"com.ex",
			"android.widget.EditText",
			None,
			None,
			None,
			Bounds::new(0, 0, 10, 10),
			1,
			0,
			"root:0",
		);
		assert_eq!(e.role(), ElementRole::TextField);
		e.class_name = "android.widget.CheckBox".into();
		assert_eq!(e.role(), ElementRole::Checkbox);
		e.class_name = "android.widget.LinearLayout".into();
		assert_eq!(e.role(), ElementRole::Container);
		e.class_name = "android.widget.TextView".into();
		e.in_scrollable = true;
		e.list_index = Some(3);
		assert_eq!(e.role(), ElementRole::ListItem);
	}

	#[test]
	fn scraping_mode_round_trips_as_string() {
		assert_eq!(ScrapingMode::Frozen.to_string(), "frozen");
		assert_eq!("dynamic".parse::<ScrapingMode>().ok(), Some(ScrapingMode::Dynamic));
	}

	#[test]
	fn visual_weight_defaults_to_area() {
		let e = ElementRecord::for_walk(
			"com.ex",
			"Button",
			None,
			None,
			None,
			Bounds::new(0, 0, 100, 50),
			1,
			0,
			"root:0",
		);
		assert_eq!(e.visual_weight, 5_000);
	}
}
