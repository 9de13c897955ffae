//! Phrase derivation and normalization.

use vocalia_common::model::ElementRecord;

/// Phrases shorter than this many characters carry too little signal for a
/// recognizer and are dropped.
const MIN_PHRASE_CHARS: usize = 2;

/// Ordinal words for the first list positions; later positions fall back to
/// the `item N` form.
const ORDINALS: [&str; 10] = [
	"first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
	"tenth",
];

/// Normalize a phrase the way the recognizer expects it: lowercased,
/// punctuation stripped, whitespace collapsed.
#[must_use]
pub fn normalize(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut in_gap = true;
	for c in raw.chars() {
		if c.is_alphanumeric() {
			out.extend(c.to_lowercase());
			in_gap = false;
		} else if !in_gap {
			out.push(' ');
			in_gap = true;
		}
	}
	while out.ends_with(' ') {
		out.pop();
	}
	out
}

/// Whether a normalized phrase is speakable as a label: long enough, and not
/// digits-only (bare numbers belong to the numeric overlay).
#[must_use]
pub fn is_speakable_label(phrase: &str) -> bool {
	phrase.chars().count() >= MIN_PHRASE_CHARS
		&& !phrase.chars().all(|c| c.is_ascii_digit() || c == ' ')
}

/// The last segment of a resource id (`com.ex:id/submit_button` →
/// `submit button` after normalization).
fn resource_tail(resource_id: &str) -> Option<&str> {
	let tail = resource_id.rsplit('/').next()?;
	let tail = tail.rsplit(':').next()?;
	(!tail.is_empty()).then_some(tail)
}

/// Derive the label phrase for an element: the first non-empty of content
/// description, text, resource-id tail, and placeholder, normalized. Returns
/// the phrase and a confidence reflecting how authoritative the source is.
#[must_use]
pub fn label_for(element: &ElementRecord) -> Option<(String, f64)> {
	let candidates: [(Option<&str>, f64); 4] = [
		(element.content_description.as_deref(), 0.9),
		(element.text.as_deref(), 0.9),
		(element.resource_id.as_deref().and_then(resource_tail), 0.7),
		(element.placeholder_text.as_deref(), 0.7),
	];
	for (candidate, confidence) in candidates {
		let Some(raw) = candidate else { continue };
		let phrase = normalize(&raw.replace('_', " "));
		if is_speakable_label(&phrase) {
			return Some((phrase, confidence));
		}
	}
	None
}

/// The spoken phrase for one-based list position `n`, up to `cap`.
#[must_use]
pub fn index_phrase(n: u32, cap: u32) -> Option<String> {
	if n == 0 || n > cap {
		return None;
	}
	match usize::try_from(n) {
		Ok(i) if i <= ORDINALS.len() => Some(ORDINALS[i - 1].to_owned()),
		_ => Some(format!("item {n}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vocalia_common::model::Bounds;

	fn element(
		text: Option<&str>,
		content_description: Option<&str>,
		resource_id: Option<&str>,
	) -> ElementRecord {
		let mut e = ElementRecord::for_walk(
			"com.ex",
			"android.widget.Button",
			resource_id.map(str::to_owned),
			text.map(str::to_owned),
			content_description.map(str::to_owned),
			Bounds::new(0, 0, 10, 10),
			1,
			0,
			"root:0",
		);
		e.is_clickable = true;
		e
	}

	#[test]
	fn normalization_strips_punctuation_and_case() {
		assert_eq!(normalize("  Sign-In!  "), "sign in");
		assert_eq!(normalize("Save & Exit"), "save exit");
		assert_eq!(normalize("OK"), "ok");
	}

	#[test]
	fn label_priority_is_description_text_resource_placeholder() {
		let both = element(Some("Submit"), Some("Send the form"), None);
		assert_eq!(label_for(&both).map(|(p, _)| p), Some("send the form".to_owned()));

		let text_only = element(Some("Submit"), None, None);
		assert_eq!(label_for(&text_only).map(|(p, _)| p), Some("submit".to_owned()));

		let resource_only = element(None, None, Some("com.ex:id/submit_button"));
		let (phrase, confidence) =
			label_for(&resource_only).expect("resource tail is usable");
		assert_eq!(phrase, "submit button");
		assert!(confidence < 0.9);
	}

	#[test]
	fn short_and_numeric_labels_are_rejected() {
		let short = element(Some("x"), None, None);
		assert_eq!(label_for(&short), None);
		let numeric = element(Some("42"), None, None);
		assert_eq!(label_for(&numeric), None);
	}

	#[test]
	fn index_phrases_use_ordinals_then_item_n() {
		assert_eq!(index_phrase(1, 20).as_deref(), Some("first"));
		assert_eq!(index_phrase(10, 20).as_deref(), Some("tenth"));
		assert_eq!(index_phrase(11, 20).as_deref(), Some("item 11"));
		assert_eq!(index_phrase(21, 20), None);
		assert_eq!(index_phrase(0, 20), None);
	}
}
