//! Relationship inference over one walk's output.
//!
//! Two cheap structural inferences run after every walk: input fields that
//! share an immediate parent form a form group, and a non-actionable text
//! element immediately preceding an input labels it.

use std::collections::HashMap;

use vocalia_common::hash::ElementHash;
use vocalia_common::model::{
	now_millis, ElementRecord, ElementRelationship, ElementRole, HierarchyEdge,
	RelationshipType,
};

/// Derive form-group and label-for relationships, stamping `form_group_id`
/// on the member elements in place.
pub fn infer_relationships(
	elements: &mut [ElementRecord],
	edges: &[HierarchyEdge],
) -> Vec<ElementRelationship> {
	let parent_of: HashMap<&ElementHash, &ElementHash> =
		edges.iter().map(|e| (&e.child_hash, &e.parent_hash)).collect();

	// Input fields grouped by their immediate parent.
	let mut groups: HashMap<ElementHash, Vec<usize>> = HashMap::new();
	for (index, element) in elements.iter().enumerate() {
		if element.role() == ElementRole::TextField {
			if let Some(parent) = parent_of.get(&element.element_hash) {
				groups.entry((*parent).clone()).or_default().push(index);
			}
		}
	}

	let now = now_millis();
	let mut relationships = Vec::new();

	for (parent, members) in &groups {
		if members.len() < 2 {
			continue;
		}
		let group_id = format!("fg-{}", &parent.as_str()[..parent.as_str().len().min(12)]);
		let anchor = elements[members[0]].element_hash.clone();
		for &member in members {
			elements[member].form_group_id = Some(group_id.clone());
			if elements[member].element_hash == anchor {
				continue;
			}
			relationships.push(ElementRelationship {
				source_hash: elements[member].element_hash.clone(),
				target_hash: anchor.clone(),
				relationship_type: RelationshipType::FormGroup,
				relationship_data: Some(
					serde_json::json!({
						"group": group_id,
						"size": members.len(),
					})
					.to_string(),
				),
				updated_at: now,
			});
		}
	}

	// A text element directly before an input, under the same parent,
	// labels it.
	let by_position: HashMap<(&ElementHash, u32), usize> = elements
		.iter()
		.enumerate()
		.filter_map(|(index, e)| {
			parent_of.get(&e.element_hash).map(|p| ((*p, e.child_order), index))
		})
		.collect();
	for element in elements.iter() {
		if element.role() != ElementRole::TextField || element.child_order == 0 {
			continue;
		}
		let Some(parent) = parent_of.get(&element.element_hash) else {
			continue;
		};
		let Some(&label_index) = by_position.get(&(*parent, element.child_order - 1))
		else {
			continue;
		};
		let label = &elements[label_index];
		if label.text.is_some() && !label.is_actionable() {
			relationships.push(ElementRelationship {
				source_hash: label.element_hash.clone(),
				target_hash: element.element_hash.clone(),
				relationship_type: RelationshipType::LabelFor,
				relationship_data: None,
				updated_at: now,
			});
		}
	}

	relationships
}

#[cfg(test)]
mod tests {
	use super::*;
	use vocalia_common::model::Bounds;

	fn field(package: &str, label: &str, order: u32) -> ElementRecord {
		let mut e = ElementRecord::for_walk(
			package,
			"android.widget.EditText",
			None,
			None,
			Some(label.to_owned()),
			Bounds::new(0, 0, 100, 40),
			2,
			order,
			&format!("Frame/Form:{order}"),
		);
		e.input_type = Some("text".to_owned());
		e
	}

	fn text(package: &str, value: &str, order: u32) -> ElementRecord {
		ElementRecord::for_walk(
			package,
			"android.widget.TextView",
			None,
			Some(value.to_owned()),
			None,
			Bounds::new(0, 0, 100, 20),
			2,
			order,
			&format!("Frame/Form:{order}"),
		)
	}

	fn edge(parent: &ElementRecord, child: &ElementRecord) -> HierarchyEdge {
		HierarchyEdge {
			parent_hash: parent.element_hash.clone(),
			child_hash: child.element_hash.clone(),
			child_order: child.child_order,
		}
	}

	#[test]
	fn sibling_inputs_share_a_form_group() {
		let parent = text("com.ex", "form", 0);
		let email = field("com.ex", "Email", 1);
		let password = field("com.ex", "Password", 2);
		let edges =
			vec![edge(&parent, &email), edge(&parent, &password)];
		let mut elements = vec![parent, email, password];
		let rels = infer_relationships(&mut elements, &edges);
		assert!(rels
			.iter()
			.any(|r| r.relationship_type == RelationshipType::FormGroup));
		assert_eq!(elements[1].form_group_id, elements[2].form_group_id);
		assert!(elements[1].form_group_id.is_some());
	}

	#[test]
	fn a_preceding_text_sibling_labels_an_input() {
		let parent = text("com.ex", "form", 0);
		let label = text("com.ex", "Email address", 0);
		let input = field("com.ex", "Email", 1);
		let edges = vec![edge(&parent, &label), edge(&parent, &input)];
		let mut elements = vec![parent, label, input];
		let rels = infer_relationships(&mut elements, &edges);
		let label_rel = rels
			.iter()
			.find(|r| r.relationship_type == RelationshipType::LabelFor)
			.expect("label relationship inferred");
		assert_eq!(label_rel.source_hash, elements[1].element_hash);
		assert_eq!(label_rel.target_hash, elements[2].element_hash);
	}

	#[test]
	fn a_lone_input_gets_no_group() {
		let parent = text("com.ex", "form", 0);
		let input = field("com.ex", "Search", 1);
		let edges = vec![edge(&parent, &input)];
		let mut elements = vec![parent, input];
		let rels = infer_relationships(&mut elements, &edges);
		assert!(rels
			.iter()
			.all(|r| r.relationship_type != RelationshipType::FormGroup));
		assert!(elements[1].form_group_id.is_none());
	}
}
