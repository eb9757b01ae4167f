//! Canvas rendering for the layout.
//!
//! A frame is a pure function of positions, resolved style, selection and the
//! view transform, drawn in fixed passes for correct z-ordering: background,
//! then links, then nodes, then labels. Nodes render in index order, so the
//! best-connected nodes land on top.

use std::collections::HashSet;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::LayoutState;
use super::theme::{Color, Theme};

/// Stroke darkening applied to each node's own fill.
const STROKE_DARKEN: f64 = 0.3;

/// Renders one complete frame.
pub fn render(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&state.theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	if state.graph.is_empty() {
		return;
	}

	ctx.save();
	let t = state.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);

	ctx.restore();
}

fn draw_links(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	let style = &state.style;
	if style.link_width <= 0.0 || style.link_opacity <= 0.0 {
		return;
	}
	let stroke = state.theme.link.with_alpha(style.link_opacity);
	ctx.set_stroke_style_str(&stroke.to_css());
	// Link width is specified in pixels; undo the zoom scale.
	ctx.set_line_width(style.link_width / state.transform.k);

	ctx.begin_path();
	for link in &state.graph.links {
		let s = &state.graph.nodes[link.source];
		let t = &state.graph.nodes[link.target];
		if (s.x - t.x).abs() < 1e-9 && (s.y - t.y).abs() < 1e-9 {
			continue;
		}
		ctx.move_to(s.x, s.y);
		ctx.line_to(t.x, t.y);
	}
	ctx.stroke();
}

fn draw_nodes(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	let style = &state.style;
	let highlighted: HashSet<usize> = match state.selection.hovered {
		Some(h) => {
			let mut set: HashSet<usize> = state.neighbors(h).into_iter().collect();
			set.insert(h);
			set
		}
		None => HashSet::new(),
	};
	let stroke_width = style.node_stroke_width / state.transform.k;

	for (i, node) in state.graph.nodes.iter().enumerate() {
		let radius = style.radii[i];
		if radius <= 0.0 {
			continue;
		}
		let fill = node_fill(
			style.fills[i],
			&state.theme,
			state.selection.selected == Some(i),
			highlighted.contains(&i),
		);

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&fill.to_css());
		ctx.fill();

		if style.node_stroke_width > 0.0 && style.node_stroke_opacity > 0.0 {
			let stroke = fill
				.darken(STROKE_DARKEN)
				.with_alpha(style.node_stroke_opacity);
			ctx.set_stroke_style_str(&stroke.to_css());
			ctx.set_line_width(stroke_width);
			ctx.stroke();
		}
	}
}

fn draw_labels(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	let style = &state.style;
	if style.labels.is_empty() {
		return;
	}
	// Labels keep their pixel size under zoom.
	let size = style.label_font_size / state.transform.k;
	ctx.set_font(&format!("{size:.2}px sans-serif"));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&state.theme.label.to_css());
	for label in &style.labels {
		let node = &state.graph.nodes[label.node];
		let _ = ctx.fill_text(&label.text, node.x, node.y);
	}
}

/// Base fill with the interaction tints layered on: selection first, hover on
/// top, each keeping the base alpha.
fn node_fill(base: Color, theme: &Theme, selected: bool, highlighted: bool) -> Color {
	let mut fill = base;
	if selected {
		fill = theme.selection.with_alpha(base.a);
	}
	if highlighted {
		fill = theme.hover.with_alpha(base.a);
	}
	fill
}
