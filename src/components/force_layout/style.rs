//! Style resolver: turns config, theme and payload fields into concrete
//! per-node and per-link visuals.
//!
//! Resolution is total: invalid field values fall back to documented
//! defaults with a `warn!` and never abort a frame. The resolved radii
//! double as the collision radii fed to the simulation.

use std::collections::HashMap;

use log::warn;
use serde_json::Value;

use super::config::{ColorMode, StyleConfig};
use super::error::StyleError;
use super::graph::Graph;
use super::theme::{Color, Theme};

/// Area range for field-driven sizing; radii run 10 to 500 at size 1.
const AREA_MIN: f64 = 100.0;
const AREA_MAX: f64 = 250_000.0;

/// Area for nodes whose size field is not numeric.
const AREA_INVALID: f64 = 2.0;

/// Radius when no size field is configured.
const RADIUS_UNIFORM: f64 = 250.0;

/// Offset into the sequential ramp; keeps the smallest values visible
/// against a light background.
const RAMP_FLOOR: f64 = 0.2;

/// A label assignment: which node, and what to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
	pub node: usize,
	pub text: String,
}

/// Everything the renderer and simulation need, resolved per graph.
#[derive(Clone, Debug, Default)]
pub struct ResolvedStyle {
	/// Per-node radius in layout units; also the collision radius.
	pub radii: Vec<f64>,
	/// Per-node base fill, opacity applied.
	pub fills: Vec<Color>,
	/// Label subset, ascending node index.
	pub labels: Vec<Label>,
	pub node_stroke_width: f64,
	pub node_stroke_opacity: f64,
	pub label_font_size: f64,
	pub link_width: f64,
	pub link_opacity: f64,
}

/// Resolve visuals for every node and link of `graph`.
pub fn resolve(graph: &Graph, config: &StyleConfig, theme: &Theme) -> ResolvedStyle {
	let radii = resolve_radii(graph, config);
	let fills = resolve_fills(graph, config, theme);
	let labels = resolve_labels(graph, config, &radii);
	ResolvedStyle {
		radii,
		fills,
		labels,
		node_stroke_width: config.node_stroke_width,
		node_stroke_opacity: config.node_stroke_opacity,
		label_font_size: config.node_label_font_size,
		link_width: config.link_width,
		link_opacity: config.link_opacity,
	}
}

/// Field-driven area scale: min-max normalize into `[AREA_MIN, AREA_MAX]`
/// and take the square root, so the field maps linearly to circle area.
fn resolve_radii(graph: &Graph, config: &StyleConfig) -> Vec<f64> {
	let Some(field) = &config.node_size_field else {
		return vec![RADIUS_UNIFORM * config.node_size; graph.len()];
	};

	let mut extent: Option<(f64, f64)> = None;
	for node in &graph.nodes {
		if let Some(v) = node.numeric_field(field).filter(|v| v.is_finite()) {
			extent = Some(match extent {
				None => (v, v),
				Some((lo, hi)) => (lo.min(v), hi.max(v)),
			});
		}
	}

	graph
		.nodes
		.iter()
		.map(|node| {
			let area = match (node.numeric_field(field).filter(|v| v.is_finite()), extent) {
				(Some(v), Some((lo, hi))) => {
					// A degenerate extent pins every value to mid-range.
					let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
					AREA_MIN + (AREA_MAX - AREA_MIN) * t
				}
				_ => AREA_INVALID,
			};
			area.sqrt() * config.node_size
		})
		.collect()
}

fn resolve_fills(graph: &Graph, config: &StyleConfig, theme: &Theme) -> Vec<Color> {
	let Some(field) = &config.node_color_field else {
		return vec![theme.node_fill.with_alpha(config.node_opacity); graph.len()];
	};
	match config.node_color_mode {
		ColorMode::Identity => identity_fills(graph, field, config.node_opacity, theme),
		ColorMode::Auto => {
			// The first node's value type decides between the categorical
			// palette and the numeric ramp.
			let first_is_string = graph
				.nodes
				.first()
				.is_some_and(|node| matches!(node.fields.get(field), Some(Value::String(_))));
			if first_is_string {
				categorical_fills(graph, field, config.node_opacity, theme)
			} else {
				ramp_fills(graph, field, config.node_opacity, theme)
			}
		}
	}
}

fn identity_fills(graph: &Graph, field: &str, opacity: f64, theme: &Theme) -> Vec<Color> {
	graph
		.nodes
		.iter()
		.map(|node| {
			let base = match node.display_field(field) {
				None => theme.node_fill,
				Some(value) => Color::parse(&value).unwrap_or_else(|| {
					let err = StyleError::InvalidColorValue(value);
					warn!("style: {err}, using theme default");
					theme.node_fill
				}),
			};
			base.with_alpha(base.a * opacity)
		})
		.collect()
}

/// Palette slots are handed out in first-seen order, so equal values share
/// a color for the whole resolve. Nodes missing the field share one slot.
fn categorical_fills(graph: &Graph, field: &str, opacity: f64, theme: &Theme) -> Vec<Color> {
	let mut slots: HashMap<Option<String>, usize> = HashMap::new();
	graph
		.nodes
		.iter()
		.map(|node| {
			let next = slots.len();
			let slot = *slots.entry(node.display_field(field)).or_insert(next);
			theme.categorical(slot).with_alpha(opacity)
		})
		.collect()
}

/// Sequential blues scaled to the field maximum; missing values read as 0.
fn ramp_fills(graph: &Graph, field: &str, opacity: f64, theme: &Theme) -> Vec<Color> {
	let maximum = graph
		.nodes
		.iter()
		.filter_map(|node| node.numeric_field(field))
		.filter(|v| v.is_finite())
		.fold(f64::NEG_INFINITY, f64::max);
	graph
		.nodes
		.iter()
		.map(|node| {
			let value = node.numeric_field(field).unwrap_or(0.0);
			let t = RAMP_FLOOR + (1.0 - RAMP_FLOOR) * (value / maximum);
			theme.sequential(t).with_alpha(opacity)
		})
		.collect()
}

/// The largest nodes get labels, at most `node_label_max_count` of them;
/// equal radii break ties by node order.
fn resolve_labels(graph: &Graph, config: &StyleConfig, radii: &[f64]) -> Vec<Label> {
	let Some(field) = &config.node_label_field else {
		return Vec::new();
	};
	if config.node_label_max_count == 0 {
		return Vec::new();
	}
	let mut order: Vec<usize> = (0..graph.len())
		.filter(|&i| graph.nodes[i].display_field(field).is_some())
		.collect();
	order.sort_by(|&a, &b| radii[b].total_cmp(&radii[a]));
	order.truncate(config.node_label_max_count);
	order.sort_unstable();
	order
		.into_iter()
		.map(|i| Label {
			node: i,
			text: graph.nodes[i].display_field(field).unwrap_or_default(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph(raw: &str) -> Graph {
		Graph::parse(raw).unwrap()
	}

	fn config() -> StyleConfig {
		StyleConfig::standard()
	}

	#[test]
	fn uniform_radius_without_a_size_field() {
		let g = graph(r#"{"nodes": [{"id": "a"}, {"id": "b"}], "links": []}"#);
		let style = resolve(&g, &StyleConfig { node_size: 2.0, ..config() }, &Theme::light());
		assert_eq!(style.radii, vec![500.0, 500.0]);
	}

	#[test]
	fn size_field_maps_the_extent_to_the_area_range() {
		let g = graph(
			r#"{"nodes": [
				{"id": "lo", "load": 0},
				{"id": "hi", "load": 10},
				{"id": "bad", "load": "n/a"}
			], "links": []}"#,
		);
		let style = resolve(
			&g,
			&StyleConfig {
				node_size_field: Some("load".into()),
				..config()
			},
			&Theme::light(),
		);
		let lo = g.index_of("lo").unwrap();
		let hi = g.index_of("hi").unwrap();
		let bad = g.index_of("bad").unwrap();
		assert!((style.radii[lo] - 10.0).abs() < 1e-9);
		assert!((style.radii[hi] - 500.0).abs() < 1e-9);
		assert!((style.radii[bad] - 2.0_f64.sqrt()).abs() < 1e-9);
	}

	#[test]
	fn degenerate_extent_sizes_to_mid_range() {
		let g = graph(
			r#"{"nodes": [{"id": "a", "v": 7}, {"id": "b", "v": 7}], "links": []}"#,
		);
		let style = resolve(
			&g,
			&StyleConfig {
				node_size_field: Some("v".into()),
				..config()
			},
			&Theme::light(),
		);
		let expected = (0.5 * (AREA_MIN + AREA_MAX)).sqrt();
		assert!((style.radii[0] - expected).abs() < 1e-9);
	}

	#[test]
	fn auto_categorical_assignment_is_stable_within_a_resolve() {
		let g = graph(
			r#"{"nodes": [
				{"id": "a", "kind": "db"},
				{"id": "b", "kind": "web"},
				{"id": "c", "kind": "db"},
				{"id": "d"}
			], "links": []}"#,
		);
		let theme = Theme::light();
		let style = resolve(
			&g,
			&StyleConfig {
				node_color_field: Some("kind".into()),
				..config()
			},
			&theme,
		);
		let at = |id: &str| style.fills[g.index_of(id).unwrap()];
		assert_eq!(at("a"), at("c"));
		assert_ne!(at("a"), at("b"));
		assert_eq!(at("a"), theme.categorical(0).with_alpha(1.0));
		assert_ne!(at("d"), at("a"));
	}

	#[test]
	fn auto_numeric_values_ride_the_blue_ramp() {
		let g = graph(
			r#"{"nodes": [{"id": "zero", "v": 0}, {"id": "max", "v": 4}], "links": []}"#,
		);
		let theme = Theme::light();
		let style = resolve(
			&g,
			&StyleConfig {
				node_color_field: Some("v".into()),
				..config()
			},
			&theme,
		);
		let zero = g.index_of("zero").unwrap();
		let max = g.index_of("max").unwrap();
		assert_eq!(style.fills[zero], theme.sequential(0.2).with_alpha(1.0));
		assert_eq!(style.fills[max], theme.sequential(1.0).with_alpha(1.0));
	}

	#[test]
	fn identity_mode_parses_css_and_falls_back() {
		let g = graph(
			r##"{"nodes": [
				{"id": "red", "paint": "#ff0000"},
				{"id": "oops", "paint": "not-a-color"}
			], "links": []}"##,
		);
		let theme = Theme::light();
		let style = resolve(
			&g,
			&StyleConfig {
				node_color_field: Some("paint".into()),
				node_color_mode: ColorMode::Identity,
				..config()
			},
			&theme,
		);
		let red = g.index_of("red").unwrap();
		let oops = g.index_of("oops").unwrap();
		assert_eq!(style.fills[red], Color::rgb(255, 0, 0).with_alpha(1.0));
		assert_eq!(style.fills[oops], theme.node_fill.with_alpha(1.0));
	}

	#[test]
	fn node_opacity_lands_in_the_fill_alpha() {
		let g = graph(r#"{"nodes": [{"id": "a"}], "links": []}"#);
		let style = resolve(
			&g,
			&StyleConfig { node_opacity: 0.25, ..config() },
			&Theme::light(),
		);
		assert_eq!(style.fills[0].a, 0.25);
	}

	#[test]
	fn labels_prefer_the_largest_nodes_and_respect_the_cap() {
		let g = graph(
			r#"{"nodes": [
				{"id": "s", "v": 1, "name": "small"},
				{"id": "m", "v": 5, "name": "mid"},
				{"id": "l", "v": 9, "name": "large"}
			], "links": []}"#,
		);
		let style = resolve(
			&g,
			&StyleConfig {
				node_size_field: Some("v".into()),
				node_label_field: Some("name".into()),
				node_label_max_count: 2,
				..config()
			},
			&Theme::light(),
		);
		let texts: Vec<&str> = style.labels.iter().map(|l| l.text.as_str()).collect();
		assert_eq!(texts, vec!["mid", "large"]);
	}

	#[test]
	fn zero_label_cap_means_no_labels() {
		let g = graph(r#"{"nodes": [{"id": "a", "name": "x"}], "links": []}"#);
		let style = resolve(
			&g,
			&StyleConfig {
				node_label_field: Some("name".into()),
				node_label_max_count: 0,
				..config()
			},
			&Theme::light(),
		);
		assert!(style.labels.is_empty());
	}

	#[test]
	fn empty_graph_resolves_to_empty_style() {
		let g = graph("{}");
		let style = resolve(&g, &config(), &Theme::light());
		assert!(style.radii.is_empty());
		assert!(style.fills.is_empty());
		assert!(style.labels.is_empty());
	}
}
