//! Force-directed graph layout and rendering component.
//!
//! Renders an interactive graph on an HTML canvas:
//! - Physics-based positioning: weighted link springs, Barnes-Hut charge
//!   repulsion, collision resolution, radial gravity and centering, with an
//!   alpha cooling schedule
//! - Data-driven styling: field-based sizing, categorical and sequential
//!   color scales, capped labels
//! - Hover and click selection reported to the host as typed events
//! - Pan, zoom, and node dragging
//!
//! The simulation, style resolution and interaction layers are plain Rust
//! with no DOM dependency; only `component.rs` and `render.rs` touch the
//! browser.
//!
//! # Example
//!
//! ```ignore
//! use force_layout_canvas::{ForceLayoutCanvas, LayoutConfig, StyleConfig};
//!
//! let data = r#"{"nodes": [{"id": "a"}, {"id": "b"}], "links": [["a", "b"]]}"#;
//! let layout = LayoutConfig { run_layout: true, ..LayoutConfig::default() };
//!
//! view! {
//!     <ForceLayoutCanvas
//!         data=data.to_string()
//!         layout=layout
//!         style=StyleConfig::standard()
//!         fullscreen=true
//!     />
//! }
//! ```

mod component;
pub mod config;
mod error;
pub mod events;
mod graph;
mod quadtree;
mod render;
mod simulation;
mod state;
mod style;
pub mod theme;
mod types;

pub use component::ForceLayoutCanvas;
pub use config::{ColorMode, LayoutConfig, StyleConfig};
pub use error::{GraphError, StyleError};
pub use events::{GraphEvent, NodeRef};
pub use graph::Graph;
pub use theme::Theme;
