//! Leptos component wrapping the force layout canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel
//! event handlers for hover, selection, node dragging, panning, and zooming.
//! An animation loop runs via `requestAnimationFrame`, advancing the
//! simulation one tick and redrawing each frame. Graph payloads and both
//! config snapshots are reactive; changes are staged into the running state
//! at the next frame boundary.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::{LayoutConfig, StyleConfig};
use super::events::GraphEvent;
use super::graph::Graph;
use super::render;
use super::state::LayoutState;
use super::theme::Theme;

/// Parse a payload, falling back to the empty graph so the canvas always
/// renders something.
fn parse_graph(raw: &str) -> Graph {
	match Graph::parse(raw) {
		Ok(graph) => {
			info!(
				"force-layout: loaded {} nodes, {} links",
				graph.len(),
				graph.links.len()
			);
			graph
		}
		Err(e) => {
			warn!("force-layout: rejecting payload: {e}");
			Graph::default()
		}
	}
}

/// Renders an interactive force-directed graph on a canvas element.
///
/// `data` is the serialized JSON payload; `layout` and `style` are config
/// snapshots applied at the next tick boundary when they change. Hover and
/// selection changes are reported through `on_event`. The component sizes
/// itself to its parent container by default; set `fullscreen = true` to
/// fill the viewport and resize automatically with the window.
#[component]
pub fn ForceLayoutCanvas(
	#[prop(into)] data: Signal<String>,
	#[prop(into)] layout: Signal<LayoutConfig>,
	#[prop(into)] style: Signal<StyleConfig>,
	#[prop(optional, into)] on_event: Option<Callback<GraphEvent>>,
	#[prop(default = Theme::default())] theme: Theme,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<LayoutState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	// A press that turned into a drag or pan must not count as a click.
	let gesture_moved = Rc::new(Cell::new(false));

	let emit = move |event: Option<GraphEvent>| {
		if let (Some(callback), Some(event)) = (on_event, event) {
			callback.run(event);
		}
	};

	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let graph = parse_graph(&data.get());

		if let Some(ref mut state) = *context_init.borrow_mut() {
			emit(state.load(graph));
			return;
		}

		let window: Window = web_sys::window().unwrap();
		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		*context_init.borrow_mut() = Some(LayoutState::new(
			graph,
			layout.get_untracked().sanitize(),
			style.get_untracked().sanitize(),
			theme.clone(),
			w,
			h,
		));

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut state) = *context_resize.borrow_mut() {
					state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut state) = *context_anim.borrow_mut() {
				state.tick();
				render::render(state, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_layout = context.clone();
	Effect::new(move |_| {
		let config = layout.get().sanitize();
		if let Some(ref mut state) = *context_layout.borrow_mut() {
			state.reconfigure(config);
		}
	});

	let context_style = context.clone();
	Effect::new(move |_| {
		let config = style.get().sanitize();
		if let Some(ref mut state) = *context_style.borrow_mut() {
			state.restyle(config);
		}
	});

	let pointer_position = move |ev: &MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		)
	};

	let (context_md, moved_md) = (context.clone(), gesture_moved.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = pointer_position(&ev);
		moved_md.set(false);
		if let Some(ref mut state) = *context_md.borrow_mut() {
			state.pointer_down(x, y);
		}
	};

	let (context_mm, moved_mm) = (context.clone(), gesture_moved.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = pointer_position(&ev);
		if ev.buttons() != 0 {
			moved_mm.set(true);
		}
		if let Some(ref mut state) = *context_mm.borrow_mut() {
			emit(state.pointer_move(x, y));
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut state) = *context_mu.borrow_mut() {
			state.pointer_up();
		}
	};

	let (context_cl, moved_cl) = (context.clone(), gesture_moved.clone());
	let on_click = move |ev: MouseEvent| {
		if moved_cl.get() {
			return;
		}
		let (x, y) = pointer_position(&ev);
		if let Some(ref mut state) = *context_cl.borrow_mut() {
			emit(state.pointer_click(x, y));
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut state) = *context_ml.borrow_mut() {
			emit(state.pointer_leave());
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = pointer_position(&ev);
		if let Some(ref mut state) = *context_wh.borrow_mut() {
			state.zoom(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-layout-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:click=on_click
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
