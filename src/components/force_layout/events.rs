//! Typed output events emitted to the host.
//!
//! The interaction layer produces a [`GraphEvent`] only when the hovered or
//! selected node actually changes, so hosts can treat every delivery as a
//! state transition.

use serde::Serialize;

use super::graph::Node;

/// A stable reference to a node, detached from layout state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeRef {
	pub id: String,
	/// The node's `type` payload field, when present.
	#[serde(rename = "type")]
	pub kind: Option<String>,
}

impl NodeRef {
	pub fn of(node: &Node) -> Self {
		Self {
			id: node.id.clone(),
			kind: node.kind().map(str::to_string),
		}
	}
}

/// Snapshot of the interaction state at the moment it changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphEvent {
	pub hovered: Option<NodeRef>,
	pub selected: Option<NodeRef>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_layout::graph::Graph;

	#[test]
	fn node_ref_carries_id_and_kind() {
		let g = Graph::parse(
			r#"{"nodes": [{"id": "a", "type": "person"}, {"id": "b"}], "links": []}"#,
		)
		.unwrap();
		let a = NodeRef::of(&g.nodes[g.index_of("a").unwrap()]);
		assert_eq!(a.id, "a");
		assert_eq!(a.kind.as_deref(), Some("person"));
		let b = NodeRef::of(&g.nodes[g.index_of("b").unwrap()]);
		assert_eq!(b.kind, None);
	}

	#[test]
	fn event_serializes_with_type_key() {
		let event = GraphEvent {
			hovered: Some(NodeRef {
				id: "a".into(),
				kind: Some("person".into()),
			}),
			selected: None,
		};
		let json = serde_json::to_string(&event).unwrap();
		assert_eq!(
			json,
			r#"{"hovered":{"id":"a","type":"person"},"selected":null}"#
		);
	}
}
