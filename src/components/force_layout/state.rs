//! Component state: graph, simulation, resolved style and interaction.
//!
//! `LayoutState` is created once when the component mounts and mutated every
//! frame by the animation loop. Pointer handling lives here as pure math on
//! screen coordinates so the whole interaction layer is natively testable;
//! the component only forwards DOM events.

use super::config::{LayoutConfig, StyleConfig};
use super::events::{GraphEvent, NodeRef};
use super::graph::Graph;
use super::quadtree::{Point, QuadTree};
use super::simulation::{Phase, Simulation};
use super::style::{self, ResolvedStyle};
use super::theme::Theme;

/// Minimum pick radius in screen pixels, so tiny nodes stay clickable.
const PICK_SLOP: f64 = 6.0;

/// Zoom factor bounds.
const ZOOM_MIN: f64 = 0.05;
const ZOOM_MAX: f64 = 10.0;

/// Margin kept around the graph when fitting the view.
const FIT_MARGIN: f64 = 0.9;

/// Pan and zoom transform from world to screen coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// Hovered and selected node indices. Cleared whenever a new payload
/// replaces the identity set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
	pub hovered: Option<usize>,
	pub selected: Option<usize>,
}

/// An in-progress node drag. The grab offset keeps the node from snapping
/// its center to the cursor.
#[derive(Clone, Copy, Debug, Default)]
struct DragState {
	active: bool,
	node: Option<usize>,
	offset_x: f64,
	offset_y: f64,
}

/// An in-progress background pan.
#[derive(Clone, Copy, Debug, Default)]
struct PanState {
	active: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Everything the animation loop touches each frame.
pub struct LayoutState {
	pub graph: Graph,
	pub simulation: Simulation,
	pub style: ResolvedStyle,
	pub theme: Theme,
	pub selection: SelectionState,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	drag: DragState,
	pan: PanState,
	style_config: StyleConfig,
	pick_tree: QuadTree,
	max_radius: f64,
	/// The view follows the layout until the first manual pan/zoom/drag.
	auto_fit: bool,
}

impl LayoutState {
	pub fn new(
		graph: Graph,
		layout: LayoutConfig,
		style_config: StyleConfig,
		theme: Theme,
		width: f64,
		height: f64,
	) -> Self {
		let style = style::resolve(&graph, &style_config, &theme);
		let mut simulation = Simulation::new(layout);
		simulation.bind(&graph);
		let mut state = Self {
			graph,
			simulation,
			style,
			theme,
			selection: SelectionState::default(),
			transform: ViewTransform::default(),
			width,
			height,
			drag: DragState::default(),
			pan: PanState::default(),
			style_config,
			pick_tree: QuadTree::default(),
			max_radius: 0.0,
			auto_fit: true,
		};
		state.rebuild_pick_tree();
		state.fit_view();
		state
	}

	/// Replace the graph payload. Selection does not survive an identity
	/// change; the returned event reports the reset when there was one.
	pub fn load(&mut self, graph: Graph) -> Option<GraphEvent> {
		let had_selection = self.selection != SelectionState::default();
		self.graph = graph;
		self.selection = SelectionState::default();
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.style = style::resolve(&self.graph, &self.style_config, &self.theme);
		self.simulation.bind(&self.graph);
		self.auto_fit = true;
		self.rebuild_pick_tree();
		self.fit_view();
		had_selection.then(GraphEvent::default)
	}

	/// Stage new simulation knobs for the next tick boundary.
	pub fn reconfigure(&mut self, layout: LayoutConfig) {
		self.simulation.reconfigure(layout);
	}

	/// Re-resolve visuals. The new radii feed both rendering and collision.
	pub fn restyle(&mut self, style_config: StyleConfig) {
		self.style_config = style_config;
		self.style = style::resolve(&self.graph, &self.style_config, &self.theme);
		self.rebuild_pick_tree();
		if self.auto_fit {
			self.fit_view();
		}
	}

	/// Advance one animation frame. Returns whether positions changed and a
	/// redraw is needed beyond the usual invalidations.
	pub fn tick(&mut self) -> bool {
		let moved = self.simulation.step(&mut self.graph, &self.style.radii);
		if moved {
			self.rebuild_pick_tree();
			if self.auto_fit {
				self.fit_view();
			}
		}
		moved
	}

	pub fn phase(&self) -> Phase {
		self.simulation.phase()
	}

	/// Press at screen coordinates. A hit starts a node drag and pins the
	/// node; a miss starts a background pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let (wx, wy) = self.transform.screen_to_world(sx, sy);
		if let Some(i) = self.hit_test(wx, wy) {
			self.drag = DragState {
				active: true,
				node: Some(i),
				offset_x: self.graph.nodes[i].x - wx,
				offset_y: self.graph.nodes[i].y - wy,
			};
			self.graph.nodes[i].fixed = true;
			self.auto_fit = false;
			if self.simulation.phase() == Phase::Settled {
				self.simulation.reheat();
			}
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
			self.auto_fit = false;
		}
	}

	/// Move at screen coordinates. Drives whichever gesture is active, or
	/// updates hover when none is; an event comes back only when the hovered
	/// node actually changed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> Option<GraphEvent> {
		if self.drag.active {
			if let Some(i) = self.drag.node {
				let (wx, wy) = self.transform.screen_to_world(sx, sy);
				let node = &mut self.graph.nodes[i];
				node.x = wx + self.drag.offset_x;
				node.y = wy + self.drag.offset_y;
				node.vx = 0.0;
				node.vy = 0.0;
			}
			return None;
		}
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			return None;
		}
		let (wx, wy) = self.transform.screen_to_world(sx, sy);
		let hovered = self.hit_test(wx, wy);
		if hovered == self.selection.hovered {
			return None;
		}
		self.selection.hovered = hovered;
		Some(self.event())
	}

	/// Click at screen coordinates. Only a hit changes the selection; a
	/// background click leaves it in place.
	pub fn pointer_click(&mut self, sx: f64, sy: f64) -> Option<GraphEvent> {
		let (wx, wy) = self.transform.screen_to_world(sx, sy);
		let hit = self.hit_test(wx, wy)?;
		if Some(hit) == self.selection.selected {
			return None;
		}
		self.selection.selected = Some(hit);
		Some(self.event())
	}

	/// Release ends the active gesture. A dragged node stays pinned where it
	/// was dropped.
	pub fn pointer_up(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
	}

	/// The pointer left the canvas: end gestures and clear hover.
	pub fn pointer_leave(&mut self) -> Option<GraphEvent> {
		self.pointer_up();
		if self.selection.hovered.is_none() {
			return None;
		}
		self.selection.hovered = None;
		Some(self.event())
	}

	/// Zoom about the cursor. Positive `delta_y` zooms out.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(ZOOM_MIN, ZOOM_MAX);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.auto_fit = false;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		if self.auto_fit {
			self.fit_view();
		}
	}

	/// The current interaction snapshot as an output event.
	pub fn event(&self) -> GraphEvent {
		let node_ref = |i: Option<usize>| i.map(|i| NodeRef::of(&self.graph.nodes[i]));
		GraphEvent {
			hovered: node_ref(self.selection.hovered),
			selected: node_ref(self.selection.selected),
		}
	}

	/// Indices adjacent to `node`, for the hover tint.
	pub fn neighbors(&self, node: usize) -> Vec<usize> {
		let mut out: Vec<usize> = self
			.graph
			.links
			.iter()
			.filter_map(|l| {
				if l.source == node {
					Some(l.target)
				} else if l.target == node {
					Some(l.source)
				} else {
					None
				}
			})
			.collect();
		out.sort_unstable();
		out.dedup();
		out
	}

	/// Topmost node whose hit radius covers the world point. Nodes render in
	/// index order, so the highest index wins overlaps.
	fn hit_test(&self, wx: f64, wy: f64) -> Option<usize> {
		let slop = PICK_SLOP / self.transform.k;
		let reach = self.max_radius.max(slop);
		self.pick_tree
			.neighbors_within(wx, wy, reach)
			.into_iter()
			.filter(|&i| {
				let node = &self.graph.nodes[i];
				let r = self.style.radii[i].max(slop);
				let (dx, dy) = (node.x - wx, node.y - wy);
				dx * dx + dy * dy <= r * r
			})
			.max()
	}

	fn rebuild_pick_tree(&mut self) {
		let points: Vec<Point> = self
			.graph
			.nodes
			.iter()
			.map(|n| Point {
				x: n.x,
				y: n.y,
				value: 1.0,
			})
			.collect();
		self.pick_tree = QuadTree::build(&points);
		self.max_radius = self.style.radii.iter().copied().fold(0.0, f64::max);
	}

	/// Center and scale the view so every node circle fits the canvas.
	fn fit_view(&mut self) {
		if self.graph.is_empty() || self.width <= 0.0 || self.height <= 0.0 {
			self.transform = ViewTransform {
				x: self.width / 2.0,
				y: self.height / 2.0,
				k: 1.0,
			};
			return;
		}
		let mut lo = (f64::INFINITY, f64::INFINITY);
		let mut hi = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for (node, &r) in self.graph.nodes.iter().zip(&self.style.radii) {
			lo.0 = lo.0.min(node.x - r);
			lo.1 = lo.1.min(node.y - r);
			hi.0 = hi.0.max(node.x + r);
			hi.1 = hi.1.max(node.y + r);
		}
		let (bw, bh) = ((hi.0 - lo.0).max(1.0), (hi.1 - lo.1).max(1.0));
		let k = ((self.width / bw).min(self.height / bh) * FIT_MARGIN)
			.clamp(ZOOM_MIN, ZOOM_MAX);
		let (cx, cy) = ((lo.0 + hi.0) / 2.0, (lo.1 + hi.1) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const PAIR: &str = r#"{
		"nodes": [{"id": "a", "type": "person"}, {"id": "b"}],
		"links": [["a", "b"]]
	}"#;

	fn state(raw: &str) -> LayoutState {
		LayoutState::new(
			Graph::parse(raw).unwrap(),
			LayoutConfig::default(),
			StyleConfig::standard(),
			Theme::light(),
			800.0,
			600.0,
		)
	}

	fn screen_of(state: &LayoutState, node: usize) -> (f64, f64) {
		let t = &state.transform;
		let n = &state.graph.nodes[node];
		(n.x * t.k + t.x, n.y * t.k + t.y)
	}

	#[test]
	fn fit_view_keeps_every_node_on_canvas() {
		let s = state(PAIR);
		for i in 0..s.graph.len() {
			let (sx, sy) = screen_of(&s, i);
			assert!((0.0..=800.0).contains(&sx), "x = {sx}");
			assert!((0.0..=600.0).contains(&sy), "y = {sy}");
		}
	}

	#[test]
	fn hover_event_fires_once_per_change() {
		let mut s = state(PAIR);
		let (sx, sy) = screen_of(&s, 0);
		let event = s.pointer_move(sx, sy).unwrap();
		assert!(event.hovered.is_some());
		assert!(s.pointer_move(sx, sy).is_none());
		assert!(s.pointer_move(sx + 1.0, sy).is_none());
		let off = s.pointer_move(-10_000.0, -10_000.0).unwrap();
		assert_eq!(off.hovered, None);
	}

	#[test]
	fn click_selects_only_on_a_hit() {
		let mut s = state(PAIR);
		let (sx, sy) = screen_of(&s, 1);
		let event = s.pointer_click(sx, sy).unwrap();
		assert_eq!(event.selected.as_ref().unwrap().id, s.graph.nodes[1].id);
		assert!(s.pointer_click(sx, sy).is_none(), "reselect is not a change");
		assert!(s.pointer_click(-10_000.0, -10_000.0).is_none());
		assert_eq!(s.selection.selected, Some(1));
	}

	#[test]
	fn overlapping_nodes_resolve_to_the_topmost() {
		let mut s = state(PAIR);
		let (x, y) = (s.graph.nodes[1].x, s.graph.nodes[1].y);
		s.graph.nodes[0].x = x;
		s.graph.nodes[0].y = y;
		s.rebuild_pick_tree();
		let t = &s.transform;
		let event = s.pointer_move(x * t.k + t.x, y * t.k + t.y).unwrap();
		assert_eq!(event.hovered.unwrap().id, s.graph.nodes[1].id);
	}

	#[test]
	fn drag_pins_the_node_and_stops_auto_fit() {
		let mut s = state(PAIR);
		let (sx, sy) = screen_of(&s, 1);
		s.pointer_down(sx, sy);
		assert!(s.pointer_move(sx + 40.0, sy).is_none());
		s.pointer_up();
		assert!(s.graph.nodes[1].fixed);
		let moved = s.graph.nodes[1].x;
		let before = s.transform.k;
		for _ in 0..5 {
			s.tick();
		}
		assert_eq!(s.graph.nodes[1].x, moved);
		assert_eq!(s.transform.k, before);
	}

	#[test]
	fn background_drag_pans_the_view() {
		let mut s = state(PAIR);
		let (tx, ty) = (s.transform.x, s.transform.y);
		s.pointer_down(-10_000.0, -10_000.0);
		s.pointer_move(-9_950.0, -9_970.0);
		s.pointer_up();
		assert_eq!(s.transform.x, tx + 50.0);
		assert_eq!(s.transform.y, ty + 30.0);
	}

	#[test]
	fn zoom_is_clamped_and_anchored_at_the_cursor() {
		let mut s = state(PAIR);
		let (wx, wy) = s.transform.screen_to_world(400.0, 300.0);
		s.zoom(400.0, 300.0, -1.0);
		let (wx2, wy2) = s.transform.screen_to_world(400.0, 300.0);
		assert!((wx - wx2).abs() < 1e-9 && (wy - wy2).abs() < 1e-9);
		for _ in 0..200 {
			s.zoom(400.0, 300.0, 1.0);
		}
		assert_eq!(s.transform.k, ZOOM_MIN);
	}

	#[test]
	fn new_payload_clears_the_selection() {
		let mut s = state(PAIR);
		let (sx, sy) = screen_of(&s, 0);
		s.pointer_click(sx, sy).unwrap();
		let event = s
			.load(Graph::parse(r#"{"nodes": [{"id": "z"}], "links": []}"#).unwrap())
			.unwrap();
		assert_eq!(event, GraphEvent::default());
		assert_eq!(s.selection, SelectionState::default());
		assert!(s.load(Graph::default()).is_none(), "no change, no event");
	}

	#[test]
	fn leave_clears_hover_and_gestures() {
		let mut s = state(PAIR);
		let (sx, sy) = screen_of(&s, 0);
		s.pointer_move(sx, sy).unwrap();
		s.pointer_down(sx, sy);
		let event = s.pointer_leave().unwrap();
		assert_eq!(event.hovered, None);
		assert!(s.pointer_leave().is_none());
		assert!(s.pointer_move(sx + 1.0, sy + 1.0).is_some(), "drag ended");
	}

	#[test]
	fn neighbors_come_from_incident_links() {
		let s = state(
			r#"{"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
			    "links": [["a", "b"], ["a", "c"], ["a", "c"]]}"#,
		);
		let a = s.graph.index_of("a").unwrap();
		let mut expected = vec![
			s.graph.index_of("b").unwrap(),
			s.graph.index_of("c").unwrap(),
		];
		expected.sort_unstable();
		assert_eq!(s.neighbors(a), expected);
		assert!(s.neighbors(s.graph.index_of("b").unwrap()).contains(&a));
	}
}
