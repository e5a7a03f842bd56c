//! Hover highlighting with smooth per-element intensity transitions.
//!
//! Hovering a node highlights the node itself, its direct neighbours and every
//! link touching it. Each highlighted element has an intensity in `0.0..=1.0`
//! that eases toward its target with exponential smoothing, and a short hold
//! time prevents flashing when the pointer grazes a node's hit area.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::types::{GraphLink, LinkKey};

/// Minimum time (seconds) a highlight must be held before it can fade out.
const MIN_HOLD_TIME: f64 = 0.12;
/// ~150ms to 95%.
const FADE_IN_SPEED: f64 = 6.0;
/// ~250ms to 95%.
const FADE_OUT_SPEED: f64 = 4.0;
const VISIBLE_EPSILON: f64 = 0.005;

/// Intensities for one family of keys (nodes or links).
#[derive(Clone, Debug)]
struct Intensities<K> {
	targets: HashSet<K>,
	values: HashMap<K, f64>,
	hold: HashMap<K, f64>,
}

impl<K> Default for Intensities<K> {
	fn default() -> Self {
		Self {
			targets: HashSet::new(),
			values: HashMap::new(),
			hold: HashMap::new(),
		}
	}
}

impl<K: Clone + Eq + Hash> Intensities<K> {
	fn retarget(&mut self, targets: HashSet<K>) {
		for key in &targets {
			self.hold.insert(key.clone(), MIN_HOLD_TIME);
		}
		self.targets = targets;
	}

	/// Animates intensities and returns the largest one.
	fn tick(&mut self, dt: f64) -> f64 {
		let fade_in = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let fade_out = (-FADE_OUT_SPEED * dt).exp();

		for key in &self.targets {
			let value = self.values.entry(key.clone()).or_insert(0.0);
			*value += (1.0 - *value) * fade_in;
		}

		self.hold.retain(|key, timer| {
			if self.targets.contains(key) {
				true
			} else {
				*timer -= dt;
				*timer > 0.0
			}
		});

		let mut max: f64 = 0.0;
		self.values.retain(|key, value| {
			if !self.targets.contains(key) && self.hold.get(key).copied().unwrap_or(0.0) <= 0.0 {
				*value *= fade_out;
			}
			max = max.max(*value);
			self.targets.contains(key) || *value > VISIBLE_EPSILON
		});
		max
	}

	fn get(&self, key: &K) -> f64 {
		self.values.get(key).copied().unwrap_or(0.0)
	}

	fn is_target(&self, key: &K) -> bool {
		self.targets.contains(key)
	}
}

/// Hover state for the whole graph.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	hovered: Option<String>,
	nodes: Intensities<String>,
	links: Intensities<LinkKey>,
	cached_max: f64,
}

impl HighlightState {
	/// Node under the pointer.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Change the hovered node and recompute the highlighted sets.
	pub fn set_hover(&mut self, node: Option<&str>, links: &[GraphLink]) {
		if self.hovered.as_deref() == node {
			return;
		}
		self.hovered = node.map(str::to_string);
		self.refresh(links);
	}

	/// Recompute targets against the current link set, e.g. after a collapse
	/// removed links touching the hovered node.
	pub fn refresh(&mut self, links: &[GraphLink]) {
		let mut node_targets = HashSet::new();
		let mut link_targets = HashSet::new();
		if let Some(id) = &self.hovered {
			node_targets.insert(id.clone());
			for link in links.iter().filter(|l| l.touches(id)) {
				node_targets.insert(link.source.clone());
				node_targets.insert(link.target.clone());
				link_targets.insert(link.key());
			}
		}
		self.nodes.retarget(node_targets);
		self.links.retarget(link_targets);
	}

	/// Eases intensities toward their targets.
	pub fn tick(&mut self, dt: f64) {
		self.cached_max = self.nodes.tick(dt);
		self.links.tick(dt);
	}

	/// Whether a link currently touches the hovered node.
	pub fn is_link_highlighted(&self, link: &GraphLink) -> bool {
		self.links.is_target(&link.key())
	}

	/// Highlight level of a node in `0.0..=1.0`.
	pub fn node_intensity(&self, id: &str) -> f64 {
		self.nodes.get(&id.to_string())
	}

	/// Highlight level of a link in `0.0..=1.0`.
	pub fn link_intensity(&self, source: &str, target: &str) -> f64 {
		self.links.get(&(source.to_string(), target.to_string()))
	}

	/// Intensity of the hover ring, only non-zero for the hovered node.
	pub fn hover_ring_intensity(&self, id: &str) -> f64 {
		if self.hovered.as_deref() == Some(id) {
			self.node_intensity(id)
		} else {
			0.0
		}
	}

	/// Largest node intensity, used to dim everything else.
	pub fn max_intensity(&self) -> f64 {
		self.cached_max
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			is_child_link: false,
		}
	}

	fn links() -> Vec<GraphLink> {
		vec![link("center", "video"), link("center", "hosting"), link("video", "video-child-0")]
	}

	#[test]
	fn hovering_marks_touching_links_only() {
		let links = links();
		let mut state = HighlightState::default();
		state.set_hover(Some("video"), &links);
		assert!(state.is_link_highlighted(&links[0]));
		assert!(!state.is_link_highlighted(&links[1]));
		assert!(state.is_link_highlighted(&links[2]));
	}

	#[test]
	fn intensity_fades_in_then_out_after_hold() {
		let links = links();
		let mut state = HighlightState::default();
		state.set_hover(Some("video"), &links);
		for _ in 0..60 {
			state.tick(0.016);
		}
		assert!(state.node_intensity("video") > 0.95);
		assert!(state.node_intensity("center") > 0.95);
		assert_eq!(state.node_intensity("hosting"), 0.0);
		assert!(state.link_intensity("center", "video") > 0.95);
		assert!(state.hover_ring_intensity("video") > 0.95);
		assert_eq!(state.hover_ring_intensity("center"), 0.0);

		state.set_hover(None, &links);
		state.tick(0.05);
		let held = state.node_intensity("video");
		assert!(held > 0.95, "held at {held}");
		for _ in 0..200 {
			state.tick(0.016);
		}
		assert_eq!(state.node_intensity("video"), 0.0);
		assert_eq!(state.max_intensity(), 0.0);
	}

	#[test]
	fn refresh_drops_removed_links() {
		let mut links = links();
		let mut state = HighlightState::default();
		state.set_hover(Some("video"), &links);
		let removed = links.pop().unwrap();
		state.refresh(&links);
		assert!(!state.is_link_highlighted(&removed));
		assert!(state.is_link_highlighted(&links[0]));
	}
}
