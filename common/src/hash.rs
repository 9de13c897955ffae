//! Content-addressed identity.
//!
//! Everything Vocalia persists is keyed by a deterministic fingerprint of the
//! thing itself, so the same element or screen observed across runs, devices,
//! or DOM reshuffles resolves to the same row. Digests are blake3 truncated
//! to 128 bits; device-local collision resistance is all that is required.
//!
//! Canonicalization is load-bearing: strings are trimmed and interior
//! whitespace is collapsed, and an *absent* field is encoded as a
//! distinguished marker rather than coerced to `""` — the empty string is a
//! distinct, valid UI value.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ElementRecord;

/// Field separator inside a digest preimage. Unit separator never appears in
/// canonicalized UI strings (it is collapsed as whitespace is not; it is a
/// control character the canonicalizer strips via trim only at the ends), so
/// framing stays unambiguous together with the absent marker below.
const FIELD_SEP: u8 = 0x1f;

/// The distinguished encoding of an absent field. Contains a control
/// character so no canonicalized UI string can collide with it.
const ABSENT: &str = "\u{1}<absent>";

macro_rules! content_hash {
	($(#[$outer:meta])* $name:ident) => {
		$(#[$outer])*
		#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Wrap a digest read back from the store. No validation is
			/// performed; only store rows and [`crate::hash`] functions
			/// should ever construct these.
			#[must_use]
			pub fn from_raw(raw: impl Into<String>) -> Self {
				Self(raw.into())
			}

			/// The hex digest.
			#[must_use]
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
	};
}

content_hash!(
	/// The content-addressed identifier of a persisted element.
	ElementHash
);
content_hash!(
	/// The content-addressed identifier of a logical screen.
	ScreenHash
);
content_hash!(
	/// The content fingerprint of an app's declared version and signing identity.
	AppHash
);

/// Trim and collapse interior whitespace runs to a single space.
/// `None` becomes the distinguished absent marker.
#[must_use]
pub fn canonical(field: Option<&str>) -> Cow<'_, str> {
	let Some(s) = field else {
		return Cow::Borrowed(ABSENT);
	};
	let trimmed = s.trim();
	if !trimmed.contains(|c: char| c.is_whitespace()) {
		return Cow::Borrowed(trimmed);
	}
	let mut out = String::with_capacity(trimmed.len());
	let mut in_gap = false;
	for c in trimmed.chars() {
		if c.is_whitespace() {
			in_gap = true;
		} else {
			if in_gap {
				out.push(' ');
				in_gap = false;
			}
			out.push(c);
		}
	}
	Cow::Owned(out)
}

fn digest(tag: &str, fields: &[Option<&str>]) -> String {
	let mut hasher = blake3::Hasher::new();
	hasher.update(tag.as_bytes());
	for field in fields {
		hasher.update(&[FIELD_SEP]);
		hasher.update(canonical(*field).as_bytes());
	}
	let full = hasher.finalize();
	// 128 bits is plenty for device-local identity.
	hex(&full.as_bytes()[..16])
}

fn hex(bytes: &[u8]) -> String {
	use std::fmt::Write;
	let mut out = String::with_capacity(bytes.len() * 2);
	for b in bytes {
		// Writing to a String cannot fail.
		let _ = write!(out, "{b:02x}");
	}
	out
}

/// Fingerprint of a single element: identity survives text-free DOM
/// reshuffles because the structural path pins the element to its
/// parent-class chain and child-index chain rather than to runtime IDs.
#[must_use]
pub fn hash_element(
	package_name: &str,
	class_name: &str,
	resource_id: Option<&str>,
	text: Option<&str>,
	content_description: Option<&str>,
	structural_path: &str,
) -> ElementHash {
	ElementHash(digest(
		"element",
		&[
			Some(package_name),
			Some(class_name),
			resource_id,
			text,
			content_description,
			Some(structural_path),
		],
	))
}

/// Fingerprint of a logical screen. The content fingerprint disambiguates
/// screens that share a package, activity, and window title.
#[must_use]
pub fn hash_screen(
	package_name: &str,
	activity_class: &str,
	window_title: &str,
	content_fingerprint: &str,
) -> ScreenHash {
	ScreenHash(digest(
		"screen",
		&[
			Some(package_name),
			Some(activity_class),
			Some(window_title),
			Some(content_fingerprint),
		],
	))
}

/// Fingerprint of an app's declared version plus signing identity.
#[must_use]
pub fn hash_app(
	package_name: &str,
	version_code: i64,
	version_name: &str,
	signing_identity: &str,
) -> AppHash {
	let code = version_code.to_string();
	AppHash(digest(
		"app",
		&[Some(package_name), Some(&code), Some(version_name), Some(signing_identity)],
	))
}

/// Whether a class is a pure container and therefore carries no signal for
/// the screen content fingerprint.
#[must_use]
pub fn is_container_class(class_name: &str) -> bool {
	class_name.contains("DecorView") || class_name.ends_with("Layout")
}

/// Render the canonical content fingerprint for a screen: the ordered top-N
/// significant element descriptors, `class:text:contentDescription:isClickable`
/// each, joined with `|`.
///
/// Callers pass the element set of one walk in emission order; the selection
/// here re-sorts stably by `(depth, child_order)` so the result is
/// independent of any caller-side reordering.
#[must_use]
pub fn content_fingerprint(elements: &[&ElementRecord], top_n: usize) -> String {
	let mut significant: Vec<&&ElementRecord> = elements
		.iter()
		.filter(|e| !is_container_class(&e.class_name))
		.collect();
	significant.sort_by_key(|e| (e.depth, e.child_order));
	significant
		.iter()
		.take(top_n)
		.map(|e| {
			format!(
				"{}:{}:{}:{}",
				canonical(Some(&e.class_name)),
				canonical(e.text.as_deref()),
				canonical(e.content_description.as_deref()),
				e.is_clickable
			)
		})
		.collect::<Vec<_>>()
		.join("|")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Bounds, ElementRecord};

	fn element(class: &str, text: Option<&str>, depth: u32, child_order: u32) -> ElementRecord {
		ElementRecord::for_walk(
			"com.ex",
			class,
			None,
			text.map(String::from),
			None,
			Bounds::new(0, 0, 100, 50),
			depth,
			child_order,
			"root:0",
		)
	}

	#[test]
	fn identical_inputs_hash_identically() {
		let a = hash_element("com.ex", "Button", Some("btn_ok"), Some("OK"), None, "A/B:0/1");
		let b = hash_element("com.ex", "Button", Some("btn_ok"), Some("OK"), None, "A/B:0/1");
		assert_eq!(a, b);
	}

	#[test]
	fn absent_and_empty_are_distinct() {
		let absent = hash_element("com.ex", "Button", None, None, None, "A:0");
		let empty = hash_element("com.ex", "Button", Some(""), None, None, "A:0");
		assert_ne!(absent, empty);
	}

	#[test]
	fn whitespace_is_canonicalized() {
		let a = hash_element("com.ex", "Button", None, Some("  Sign\t\tin "), None, "A:0");
		let b = hash_element("com.ex", "Button", None, Some("Sign in"), None, "A:0");
		assert_eq!(a, b);
	}

	#[test]
	fn structural_path_participates_in_identity() {
		let a = hash_element("com.ex", "Button", None, Some("OK"), None, "A/B:0/1");
		let b = hash_element("com.ex", "Button", None, Some("OK"), None, "A/B:0/2");
		assert_ne!(a, b);
	}

	#[test]
	fn containers_are_filtered_from_fingerprints() {
		let btn = element("Button", Some("Start"), 2, 0);
		let layout = element("LinearLayout", None, 1, 0);
		let decor = element("DecorView", None, 0, 0);
		let fp = content_fingerprint(&[&decor, &layout, &btn], 10);
		assert!(fp.contains("Button"));
		assert!(!fp.contains("Layout"));
		assert!(!fp.contains("DecorView"));
	}

	#[test]
	fn fingerprint_orders_by_depth_then_child_order() {
		let deep = element("Button", Some("Deep"), 3, 0);
		let shallow = element("Button", Some("Shallow"), 1, 2);
		let fp = content_fingerprint(&[&deep, &shallow], 10);
		let shallow_at = fp.find("Shallow").expect("descriptor present");
		let deep_at = fp.find("Deep").expect("descriptor present");
		assert!(shallow_at < deep_at);
	}

	#[test]
	fn different_descriptors_give_different_screen_hashes() {
		let welcome = content_fingerprint(&[&element("Button", Some("Start"), 1, 0)], 10);
		let loading = content_fingerprint(&[&element("ProgressBar", None, 1, 0)], 10);
		let a = hash_screen("com.ex", "MainActivity", "", &welcome);
		let b = hash_screen("com.ex", "MainActivity", "", &loading);
		assert_ne!(a, b);
	}
}
