//! Graph payload records for input to the force layout component.
//!
//! Payloads are JSON with `{ nodes: [...], links: [...] }`. The accepted
//! shape is deliberately loose: `edges` is an alias for `links`, links may
//! be records or positional arrays, node ids may be strings or numbers,
//! and the node list may be omitted entirely (derived from link endpoints).
//! Normalization into a validated graph happens in [`super::graph`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A node in the payload.
///
/// Only `id` is structural. Every other field is captured as-is and made
/// available to the style resolver by name (size, color and label fields
/// are picked out of this map at resolve time).
#[derive(Clone, Debug, Deserialize)]
pub struct GraphNode {
	/// Unique identifier for this node. Numbers are coerced to strings.
	#[serde(deserialize_with = "string_or_number")]
	pub id: String,
	/// All remaining record fields, in stable key order.
	#[serde(flatten)]
	pub fields: BTreeMap<String, Value>,
}

/// A link endpoint: a node id, or a positional index into `nodes`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LinkEnd {
	/// Endpoint given by node id.
	Id(String),
	/// Endpoint given numerically. Resolved as an id first (numeric ids
	/// are coerced to strings), then as an index into the node list.
	Num(i64),
}

impl LinkEnd {
	/// The endpoint as an id string, for node derivation and error messages.
	pub fn as_id(&self) -> String {
		match self {
			LinkEnd::Id(s) => s.clone(),
			LinkEnd::Num(n) => n.to_string(),
		}
	}
}

/// An edge between two nodes, in record or positional array form.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum GraphLink {
	/// `{ "source": .., "target": .., "weight": .. }`
	Record {
		source: LinkEnd,
		target: LinkEnd,
		#[serde(default)]
		weight: Option<f64>,
	},
	/// `[source, target, weight]`
	Triple(LinkEnd, LinkEnd, f64),
	/// `[source, target]`
	Pair(LinkEnd, LinkEnd),
}

impl GraphLink {
	pub fn source(&self) -> &LinkEnd {
		match self {
			GraphLink::Record { source, .. } => source,
			GraphLink::Triple(source, _, _) => source,
			GraphLink::Pair(source, _) => source,
		}
	}

	pub fn target(&self) -> &LinkEnd {
		match self {
			GraphLink::Record { target, .. } => target,
			GraphLink::Triple(_, target, _) => target,
			GraphLink::Pair(_, target) => target,
		}
	}

	/// Link weight, defaulting to 1.0. Non-finite and non-positive weights
	/// also fall back to 1.0 so downstream force math never divides by zero.
	pub fn weight(&self) -> f64 {
		let w = match self {
			GraphLink::Record { weight, .. } => weight.unwrap_or(1.0),
			GraphLink::Triple(_, _, weight) => *weight,
			GraphLink::Pair(_, _) => 1.0,
		};
		if w.is_finite() && w > 0.0 { w } else { 1.0 }
	}
}

/// Complete graph payload: nodes and links.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default, alias = "edges")]
	pub links: Vec<GraphLink>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Int(i64),
		Float(f64),
	}

	Ok(match Raw::deserialize(deserializer)? {
		Raw::Text(s) => s,
		Raw::Int(n) => n.to_string(),
		Raw::Float(f) => f.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_record_links_with_extra_node_fields() {
		let data: GraphData = serde_json::from_str(
			r#"{
				"nodes": [{"id": "a", "kind": "service", "load": 3.5}, {"id": 7}],
				"links": [{"source": "a", "target": 7, "weight": 2}]
			}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].id, "a");
		assert_eq!(data.nodes[0].fields["kind"], Value::from("service"));
		assert_eq!(data.nodes[1].id, "7");
		assert_eq!(data.links[0].weight(), 2.0);
	}

	#[test]
	fn parses_array_links_and_edges_alias() {
		let data: GraphData =
			serde_json::from_str(r#"{"edges": [["a", "b"], ["b", "c", 0.5]]}"#).unwrap();
		assert!(data.nodes.is_empty());
		assert_eq!(data.links.len(), 2);
		assert_eq!(data.links[0].weight(), 1.0);
		assert_eq!(data.links[1].weight(), 0.5);
		assert_eq!(data.links[1].source().as_id(), "b");
	}

	#[test]
	fn bad_weights_default_to_one() {
		let data: GraphData = serde_json::from_str(
			r#"{"links": [{"source": "a", "target": "b", "weight": -3}]}"#,
		)
		.unwrap();
		assert_eq!(data.links[0].weight(), 1.0);
	}
}
