//! Host-facing configuration snapshots.
//!
//! Both structs are immutable snapshots: the host constructs a fresh value
//! per reconfiguration and the component stages it for the next tick
//! boundary. Out-of-range values are clamped to their documented bounds
//! with a warning rather than rejected, since every knob is slider-bounded
//! on the host side.

use log::warn;

/// How node colors are derived from `node_color_field`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
	/// Categorical palette for string values, sequential blue ramp for
	/// numeric values.
	#[default]
	Auto,
	/// The field value itself is a CSS color specification.
	Identity,
}

/// Force simulation knobs. All strengths are multipliers in `[0, 1]`;
/// `charge_approximation` is the Barnes-Hut theta in `[0, 2]`.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Whether the simulation ticks at all.
	pub run_layout: bool,
	/// Starting alpha for a (re)started run. Zero freezes the layout.
	pub energy: f64,
	pub collide_strength: f64,
	pub charge_strength: f64,
	/// Barnes-Hut accuracy/speed trade-off; higher is coarser.
	pub charge_approximation: f64,
	pub link_strength: f64,
	pub gravity_strength: f64,
	pub center_strength: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			run_layout: false,
			energy: 1.0,
			collide_strength: 1.0,
			charge_strength: 1.0,
			charge_approximation: 1.0,
			link_strength: 1.0,
			gravity_strength: 0.0,
			center_strength: 1.0,
		}
	}
}

impl LayoutConfig {
	/// Clamp every knob to its documented range, warning on adjustments.
	pub fn sanitize(mut self) -> Self {
		self.energy = clamp(self.energy, 0.0, 1.0, "energy");
		self.collide_strength = clamp(self.collide_strength, 0.0, 1.0, "collide_strength");
		self.charge_strength = clamp(self.charge_strength, 0.0, 1.0, "charge_strength");
		self.charge_approximation =
			clamp(self.charge_approximation, 0.0, 2.0, "charge_approximation");
		self.link_strength = clamp(self.link_strength, 0.0, 1.0, "link_strength");
		self.gravity_strength = clamp(self.gravity_strength, 0.0, 1.0, "gravity_strength");
		self.center_strength = clamp(self.center_strength, 0.0, 1.0, "center_strength");
		self
	}
}

/// Style resolver knobs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleConfig {
	/// Global size multiplier.
	pub node_size: f64,
	/// Numeric field driving per-node radius; `None` means uniform size.
	pub node_size_field: Option<String>,
	/// Field driving per-node color; `None` means the theme default fill.
	pub node_color_field: Option<String>,
	pub node_color_mode: ColorMode,
	pub node_opacity: f64,
	pub node_stroke_width: f64,
	pub node_stroke_opacity: f64,
	/// Field whose value is drawn as the node label; `None` disables labels.
	pub node_label_field: Option<String>,
	/// Label font size in pixels.
	pub node_label_font_size: f64,
	/// At most this many nodes get labels, largest first.
	pub node_label_max_count: usize,
	pub link_width: f64,
	pub link_opacity: f64,
}

impl StyleConfig {
	/// Host-side slider defaults.
	pub fn standard() -> Self {
		Self {
			node_size: 1.0,
			node_size_field: None,
			node_color_field: None,
			node_color_mode: ColorMode::Auto,
			node_opacity: 1.0,
			node_stroke_width: 1.0,
			node_stroke_opacity: 1.0,
			node_label_field: None,
			node_label_font_size: 12.0,
			node_label_max_count: 100,
			link_width: 1.0,
			link_opacity: 1.0,
		}
	}

	/// Clamp every knob to its documented range, warning on adjustments.
	pub fn sanitize(mut self) -> Self {
		self.node_size = clamp(self.node_size, 0.0, f64::INFINITY, "node_size");
		self.node_opacity = clamp(self.node_opacity, 0.0, 1.0, "node_opacity");
		self.node_stroke_width =
			clamp(self.node_stroke_width, 0.0, f64::INFINITY, "node_stroke_width");
		self.node_stroke_opacity =
			clamp(self.node_stroke_opacity, 0.0, 1.0, "node_stroke_opacity");
		self.node_label_font_size =
			clamp(self.node_label_font_size, 1.0, f64::INFINITY, "node_label_font_size");
		self.link_width = clamp(self.link_width, 0.0, f64::INFINITY, "link_width");
		self.link_opacity = clamp(self.link_opacity, 0.0, 1.0, "link_opacity");
		self
	}
}

fn clamp(value: f64, min: f64, max: f64, name: &str) -> f64 {
	if value.is_nan() {
		warn!("config: {name} is NaN, using {min}");
		return min;
	}
	let clamped = value.clamp(min, max);
	if clamped != value {
		warn!("config: {name} = {value} out of range, clamped to {clamped}");
	}
	clamped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_host_parameter_surface() {
		let layout = LayoutConfig::default();
		assert!(!layout.run_layout);
		assert_eq!(layout.energy, 1.0);
		assert_eq!(layout.gravity_strength, 0.0);
		assert_eq!(layout.charge_approximation, 1.0);

		let style = StyleConfig::standard();
		assert_eq!(style.node_size, 1.0);
		assert_eq!(style.node_label_font_size, 12.0);
		assert_eq!(style.node_label_max_count, 100);
		assert_eq!(style.node_color_mode, ColorMode::Auto);
	}

	#[test]
	fn out_of_range_values_clamp() {
		let layout = LayoutConfig {
			energy: 2.5,
			charge_strength: -1.0,
			charge_approximation: 9.0,
			..LayoutConfig::default()
		}
		.sanitize();
		assert_eq!(layout.energy, 1.0);
		assert_eq!(layout.charge_strength, 0.0);
		assert_eq!(layout.charge_approximation, 2.0);
	}

	#[test]
	fn nan_values_clamp_to_minimum() {
		let style = StyleConfig {
			node_opacity: f64::NAN,
			..StyleConfig::standard()
		}
		.sanitize();
		assert_eq!(style.node_opacity, 0.0);
	}
}
