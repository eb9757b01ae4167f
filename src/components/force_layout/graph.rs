//! Validated graph model: parsed nodes and links with seeded positions.
//!
//! `Graph::parse` normalizes the loose payload shapes from [`super::types`]
//! into an indexable structure the simulation can tick: nodes carry position,
//! velocity and a pinned flag; links carry resolved endpoint indices and a
//! weight. Validation is all-or-nothing, a payload with a duplicate id or a
//! dangling link endpoint is rejected whole rather than silently repaired.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::f64::consts::PI;

use serde_json::Value;

use super::error::GraphError;
use super::types::{GraphData, GraphLink, GraphNode, LinkEnd};

/// Spiral constants for deterministic initial placement.
const INITIAL_RADIUS: f64 = 10.0;
const INITIAL_ANGLE: f64 = PI * (3.0 - 2.236_067_977_499_79);

/// A node with layout state.
#[derive(Clone, Debug)]
pub struct Node {
	/// Unique identity from the payload.
	pub id: String,
	/// All non-structural payload fields, including the computed `degree`.
	pub fields: BTreeMap<String, Value>,
	/// Sum of incident link weights.
	pub degree: f64,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned nodes keep their position; set while dragging.
	pub fixed: bool,
}

impl Node {
	fn new(id: String, fields: BTreeMap<String, Value>) -> Self {
		Self {
			id,
			fields,
			degree: 0.0,
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			fixed: false,
		}
	}

	/// Numeric view of a payload field. Numeric strings count, matching how
	/// CSV-sourced payloads carry their numbers.
	pub fn numeric_field(&self, name: &str) -> Option<f64> {
		match self.fields.get(name)? {
			Value::Number(n) => n.as_f64(),
			Value::String(s) => s.trim().parse::<f64>().ok(),
			Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
			_ => None,
		}
	}

	/// String view of a payload field, for categorical scales and labels.
	pub fn display_field(&self, name: &str) -> Option<String> {
		match self.fields.get(name)? {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			Value::Bool(b) => Some(b.to_string()),
			_ => None,
		}
	}

	/// The node's `type` field, carried on output events.
	pub fn kind(&self) -> Option<&str> {
		self.fields.get("type").and_then(Value::as_str)
	}
}

/// A link with endpoints resolved to node indices.
#[derive(Clone, Copy, Debug)]
pub struct Link {
	pub source: usize,
	pub target: usize,
	pub weight: f64,
}

/// A validated graph. The identity set is immutable once parsed; positions
/// and velocities mutate per simulation tick.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	index: HashMap<String, usize>,
}

impl Graph {
	/// Parse and validate a JSON payload.
	pub fn parse(raw: &str) -> Result<Self, GraphError> {
		let data: GraphData = serde_json::from_str(raw)?;
		Self::from_data(data)
	}

	/// Build a graph from an already-deserialized payload.
	pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
		let mut nodes = if data.nodes.is_empty() && !data.links.is_empty() {
			derive_nodes(&data.links)
		} else {
			data.nodes
				.into_iter()
				.map(|GraphNode { id, fields }| Node::new(id, fields))
				.collect::<Vec<_>>()
		};

		let mut index = HashMap::with_capacity(nodes.len());
		for (i, node) in nodes.iter().enumerate() {
			if index.insert(node.id.clone(), i).is_some() {
				return Err(GraphError::DuplicateIdentity(node.id.clone()));
			}
		}

		// Resolve endpoints and accumulate weighted degree before any
		// reordering.
		let mut resolved = Vec::with_capacity(data.links.len());
		for link in &data.links {
			let si = resolve_endpoint(&nodes, &index, link.source())?;
			let ti = resolve_endpoint(&nodes, &index, link.target())?;
			let weight = link.weight();
			nodes[si].degree += weight;
			nodes[ti].degree += weight;
			resolved.push((nodes[si].id.clone(), nodes[ti].id.clone(), weight));
		}

		// Low-degree nodes first so hubs render on top and win hit-tests.
		nodes.sort_by(|a, b| a.degree.total_cmp(&b.degree));
		let index: HashMap<String, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let links = resolved
			.into_iter()
			.map(|(source, target, weight)| Link {
				source: index[&source],
				target: index[&target],
				weight,
			})
			.collect();

		for (i, node) in nodes.iter_mut().enumerate() {
			let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
			let angle = i as f64 * INITIAL_ANGLE;
			node.x = radius * angle.cos();
			node.y = radius * angle.sin();
			let degree = serde_json::Number::from_f64(node.degree)
				.map(Value::Number)
				.unwrap_or(Value::Null);
			node.fields.insert("degree".to_string(), degree);
		}

		Ok(Self {
			nodes,
			links,
			index,
		})
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Resolve a link endpoint to a node index. Ids win, numeric ids included;
/// a number matching no id falls back to a position in the node list.
fn resolve_endpoint(
	nodes: &[Node],
	index: &HashMap<String, usize>,
	end: &LinkEnd,
) -> Result<usize, GraphError> {
	let id = end.as_id();
	if let Some(&i) = index.get(&id) {
		return Ok(i);
	}
	if let LinkEnd::Num(n) = end
		&& let Ok(i) = usize::try_from(*n)
		&& i < nodes.len()
	{
		return Ok(i);
	}
	Err(GraphError::DanglingLink(id))
}

/// Derive the node set from link endpoints, first appearance first.
fn derive_nodes(links: &[GraphLink]) -> Vec<Node> {
	let mut seen = HashMap::new();
	let mut nodes: Vec<Node> = Vec::new();
	for link in links {
		for end in [link.source(), link.target()] {
			let id = end.as_id();
			if !seen.contains_key(&id) {
				seen.insert(id.clone(), nodes.len());
				nodes.push(Node::new(id, BTreeMap::new()));
			}
		}
	}
	nodes
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(raw: &str) -> Graph {
		Graph::parse(raw).unwrap()
	}

	#[test]
	fn resolves_links_and_computes_weighted_degree() {
		let g = parse(
			r#"{
				"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
				"links": [
					{"source": "a", "target": "b", "weight": 2},
					["b", "c"]
				]
			}"#,
		);
		assert_eq!(g.len(), 3);
		let b = g.index_of("b").unwrap();
		assert_eq!(g.nodes[b].degree, 3.0);
		assert_eq!(g.nodes[b].numeric_field("degree"), Some(3.0));
		let a = g.index_of("a").unwrap();
		assert_eq!(g.nodes[a].degree, 2.0);
	}

	#[test]
	fn duplicate_id_rejects_payload() {
		let err = Graph::parse(r#"{"nodes": [{"id": "a"}, {"id": "a"}], "links": []}"#)
			.unwrap_err();
		assert!(matches!(err, GraphError::DuplicateIdentity(id) if id == "a"));
	}

	#[test]
	fn dangling_link_rejects_payload() {
		let err = Graph::parse(
			r#"{"nodes": [{"id": "a"}], "links": [{"source": "a", "target": "ghost"}]}"#,
		)
		.unwrap_err();
		assert!(matches!(err, GraphError::DanglingLink(id) if id == "ghost"));
	}

	#[test]
	fn malformed_payload_is_a_parse_error() {
		assert!(matches!(
			Graph::parse("{nodes").unwrap_err(),
			GraphError::Parse(_)
		));
	}

	#[test]
	fn nodes_derive_from_links_when_missing() {
		let g = parse(r#"{"edges": [["x", "y"], ["y", "z", 2]]}"#);
		assert_eq!(g.len(), 3);
		assert!(g.index_of("x").is_some());
		let z = g.index_of("z").unwrap();
		assert_eq!(g.nodes[z].degree, 2.0);
	}

	#[test]
	fn numeric_ids_coerce_to_strings() {
		let g = parse(r#"{"nodes": [{"id": 1}, {"id": 2}], "links": [[1, 2]]}"#);
		assert!(g.index_of("1").is_some());
		assert_eq!(g.links.len(), 1);
	}

	#[test]
	fn positional_endpoints_fall_back_to_node_order() {
		let g = parse(r#"{"nodes": [{"id": "a"}, {"id": "b"}], "links": [[0, 1]]}"#);
		assert_eq!(g.links.len(), 1);
		assert_eq!(g.nodes[g.index_of("a").unwrap()].degree, 1.0);
		assert_eq!(g.nodes[g.index_of("b").unwrap()].degree, 1.0);
	}

	#[test]
	fn nodes_order_by_ascending_degree() {
		let g = parse(
			r#"{
				"nodes": [{"id": "hub"}, {"id": "leaf"}, {"id": "mid"}],
				"links": [
					["hub", "leaf"], ["hub", "mid"], ["hub", "mid"]
				]
			}"#,
		);
		let degrees: Vec<f64> = g.nodes.iter().map(|n| n.degree).collect();
		assert_eq!(degrees, vec![1.0, 3.0, 4.0]);
		assert_eq!(g.nodes.last().unwrap().id, "hub");
	}

	#[test]
	fn initial_positions_are_deterministic_and_distinct() {
		let raw = r#"{"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}], "links": []}"#;
		let g1 = parse(raw);
		let g2 = parse(raw);
		for (n1, n2) in g1.nodes.iter().zip(&g2.nodes) {
			assert_eq!((n1.x, n1.y), (n2.x, n2.y));
		}
		assert_ne!((g1.nodes[0].x, g1.nodes[0].y), (g1.nodes[1].x, g1.nodes[1].y));
	}

	#[test]
	fn empty_payload_parses_to_empty_graph() {
		let g = parse("{}");
		assert!(g.is_empty());
		assert!(g.links.is_empty());
	}

	#[test]
	fn self_links_and_duplicate_links_are_allowed() {
		let g = parse(
			r#"{"nodes": [{"id": "a"}, {"id": "b"}],
			    "links": [["a", "a"], ["a", "b"], ["a", "b"]]}"#,
		);
		assert_eq!(g.links.len(), 3);
		let a = g.index_of("a").unwrap();
		assert_eq!(g.nodes[a].degree, 4.0);
	}
}
