//! Controller configuration: layout geometry, timings and force parameters.
//!
//! Every section deserializes with defaults, so a page can override a single
//! value through the `graph-config` JSON script element.

use log::warn;
use serde::Deserialize;

use super::simulation::ForceParameters;
use super::theme::Theme;

/// Geometry of the initial layout and of child fans.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Radius of the center node.
	pub center_radius: f64,
	/// Radius of topic nodes.
	pub topic_radius: f64,
	/// Radius of achievement nodes.
	pub child_radius: f64,
	/// Distance of topic nodes from the center at startup.
	pub orbit_radius: f64,
	/// Downward shift of the center so the header does not overlap the graph.
	pub header_offset: f64,
	/// Angle between neighbouring children of one topic (radians).
	pub fan_step: f64,
	/// Upper bound for the whole fan (radians).
	pub fan_max_spread: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			center_radius: 60.0,
			topic_radius: 50.0,
			child_radius: 30.0,
			orbit_radius: 200.0,
			header_offset: 40.0,
			fan_step: 0.55,
			fan_max_spread: std::f64::consts::PI * 0.9,
		}
	}
}

/// Timers (seconds) and energy levels used by the controller.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
	/// How long a tooltip stays up without interaction.
	pub tooltip_secs: f64,
	/// Delay between spawning children at the parent and bursting them outward.
	pub settle_delay_secs: f64,
	/// Simulation energy at startup.
	pub initial_alpha: f64,
	/// Reheat after children are added.
	pub expand_alpha: f64,
	/// Reheat after children are removed.
	pub collapse_alpha: f64,
	/// Reheat after the canvas is resized.
	pub resize_alpha: f64,
	/// Reheat when children burst outward.
	pub burst_alpha: f64,
	/// Energy floor held while a node is dragged.
	pub drag_alpha_target: f64,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			tooltip_secs: 3.0,
			settle_delay_secs: 0.35,
			initial_alpha: 1.0,
			expand_alpha: 0.5,
			collapse_alpha: 0.3,
			resize_alpha: 0.3,
			burst_alpha: 0.3,
			drag_alpha_target: 0.3,
		}
	}
}

/// Complete controller configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
	/// Force simulation parameters.
	pub forces: ForceParameters,
	/// Layout geometry.
	pub layout: LayoutConfig,
	/// Timers and reheat levels.
	pub timing: TimingConfig,
}

/// Everything the `graph-config` element may set: the controller sections
/// at the top level plus an optional theme preset name.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
	/// Controller configuration.
	#[serde(flatten)]
	pub controller: ControllerConfig,
	/// Theme preset, `"dusk"` or `"paper"`.
	pub theme: Option<String>,
}

impl GraphSettings {
	/// The configured theme. Unknown names fall back to the default theme.
	pub fn resolve_theme(&self) -> Theme {
		let Some(name) = self.theme.as_deref() else {
			return Theme::default();
		};
		Theme::by_name(name).unwrap_or_else(|| {
			warn!("hobby-graph: unknown theme {name:?}, using the default");
			Theme::default()
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_remaining_defaults() {
		let config: ControllerConfig =
			serde_json::from_str(r#"{ "timing": { "tooltip_secs": 5.0 }, "forces": { "child_charge": -100 } }"#)
				.unwrap();
		assert_eq!(config.timing.tooltip_secs, 5.0);
		assert_eq!(config.timing.settle_delay_secs, TimingConfig::default().settle_delay_secs);
		assert_eq!(config.forces.child_charge, -100.0);
		assert_eq!(config.forces.topic_link_distance, 200.0);
		assert_eq!(config.layout, LayoutConfig::default());
	}

	#[test]
	fn settings_select_a_theme_next_to_controller_sections() {
		let settings: GraphSettings =
			serde_json::from_str(r#"{ "theme": "paper", "timing": { "tooltip_secs": 5.0 } }"#).unwrap();
		assert_eq!(settings.resolve_theme().name, "paper");
		assert_eq!(settings.controller.timing.tooltip_secs, 5.0);
		assert_eq!(settings.controller.layout, LayoutConfig::default());

		let unknown: GraphSettings = serde_json::from_str(r#"{ "theme": "neon" }"#).unwrap();
		assert_eq!(unknown.resolve_theme().name, "dusk");
		assert_eq!(GraphSettings::default().resolve_theme().name, "dusk");
	}

	#[test]
	fn child_forces_are_weaker_than_topic_forces() {
		let forces = ForceParameters::default();
		assert!(forces.child_link_distance < forces.topic_link_distance);
		assert!(forces.child_charge.abs() < forces.topic_charge.abs());
		assert!(forces.velocity_decay > 0.4);
		assert!(forces.alpha_decay > 0.0228);
	}
}
