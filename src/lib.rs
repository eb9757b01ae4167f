//! force-layout-canvas: interactive force-directed graph layout and
//! rendering.
//!
//! This crate provides a WASM-based canvas component that lays out graph
//! payloads with a force simulation, styles nodes from their payload fields,
//! and reports hover/selection back to the host as typed events.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::force_layout::{
	ColorMode, ForceLayoutCanvas, Graph, GraphError, GraphEvent, LayoutConfig, NodeRef,
	StyleConfig, Theme,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("force-layout: logging initialized");
}

/// Load the serialized graph payload from a script element with
/// id="graph-data". Validation happens inside the component, which falls
/// back to an empty canvas on a rejected payload.
fn load_graph_data() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Main application component.
/// Loads a graph payload from the DOM and renders the layout canvas with
/// the layout running and standard styling.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let payload = load_graph_data().unwrap_or_else(|| "{}".to_string());
	let data = Signal::derive(move || payload.clone());
	let layout = Signal::derive(|| LayoutConfig {
		run_layout: true,
		..LayoutConfig::default()
	});
	let style = Signal::derive(StyleConfig::standard);
	let on_event = Callback::new(|event: GraphEvent| {
		info!(
			"force-layout: {}",
			serde_json::to_string(&event).unwrap_or_default()
		);
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Force Layout" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceLayoutCanvas
				data=data
				layout=layout
				style=style
				on_event=on_event
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Force Layout"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
			</div>
		</div>
	}
}
