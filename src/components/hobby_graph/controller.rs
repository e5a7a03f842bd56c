//! Expandable graph controller.
//!
//! Owns the node/link model and the set of expanded topics, drives a
//! [`LayoutEngine`], and implements the expand/collapse state machine:
//!
//! ```text
//! collapsed --activate--> pending --content--> expanded
//!     ^                      |                    |
//!     +-------collapse-------+------collapse------+
//! ```
//!
//! Fetching content is the host's job. [`GraphController::handle_node_activate`]
//! hands back a [`ContentRequest`]; the host resolves it asynchronously and
//! passes the result to [`GraphController::complete_expand`]. Collapsing a
//! topic invalidates its request, so late responses are discarded.

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;

use log::{debug, info, warn};

use super::config::ControllerConfig;
use super::data::HobbyData;
use super::highlight::HighlightState;
use super::simulation::{BodySpec, LayoutEngine, LinkSpec};
use super::types::{Achievement, GraphLink, GraphNode, NodeKind, TopicContent};

/// An outstanding content fetch for one topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRequest {
	/// Topic whose document should be loaded.
	pub topic_id: String,
	ticket: u64,
}

/// Achievement details shown when a child node is activated.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	/// Child node the tooltip belongs to.
	pub node_id: String,
	/// Achievement title.
	pub title: String,
	/// Icon inherited from the parent topic.
	pub icon: String,
	/// Achievement description.
	pub description: String,
	/// Image path relative to the content root.
	pub image: Option<String>,
	/// Achievement tag, empty when absent.
	pub tag: String,
	/// CSS gradient of the parent topic, if configured.
	pub gradient: Option<String>,
	/// Seconds until auto-dismiss.
	pub remaining: f64,
}

/// Children waiting for the outward burst after the settle delay.
#[derive(Clone, Debug)]
struct Burst {
	parent_id: String,
	/// `(child id, offset from parent)`.
	offsets: Vec<(String, (f64, f64))>,
	remaining: f64,
}

/// Node/link model plus the expand/collapse state machine over a layout engine.
pub struct GraphController<E: LayoutEngine> {
	config: ControllerConfig,
	data: HobbyData,
	engine: E,
	nodes: Vec<GraphNode>,
	links: Vec<GraphLink>,
	expanded: BTreeSet<String>,
	pending: HashMap<String, u64>,
	next_ticket: u64,
	bursts: Vec<Burst>,
	tooltip: Option<Tooltip>,
	highlight: HighlightState,
	center: (f64, f64),
	initialized: bool,
	revision: u64,
}

impl<E: LayoutEngine> GraphController<E> {
	/// Creates an empty controller. Nothing exists until [`Self::initialize`].
	pub fn new(config: ControllerConfig, data: HobbyData, engine: E) -> Self {
		Self {
			config,
			data,
			engine,
			nodes: Vec::new(),
			links: Vec::new(),
			expanded: BTreeSet::new(),
			pending: HashMap::new(),
			next_ticket: 0,
			bursts: Vec::new(),
			tooltip: None,
			highlight: HighlightState::default(),
			center: (0.0, 0.0),
			initialized: false,
			revision: 0,
		}
	}

	/// Builds the center and topic nodes and starts the simulation.
	pub fn initialize(&mut self, width: f64, height: f64) {
		if self.initialized {
			warn!("hobby-graph: controller already initialized, ignoring");
			return;
		}
		self.initialized = true;
		self.center = self.center_for(width, height);

		let layout = &self.config.layout;
		let (cx, cy) = self.center;
		let center = &self.data.center;
		self.nodes.push(GraphNode {
			id: center.id.clone(),
			kind: NodeKind::Center,
			x: cx,
			y: cy,
			radius: layout.center_radius,
			color: center.color.clone(),
			label: center.name.clone(),
			icon: center.icon.clone(),
			description: center.description.clone(),
			tag: String::new(),
			image: None,
		});

		let count = self.data.hobbies.len().max(1) as f64;
		for (i, hobby) in self.data.hobbies.iter().enumerate() {
			let angle = -PI / 2.0 + (i as f64) * 2.0 * PI / count;
			self.nodes.push(GraphNode {
				id: hobby.id.clone(),
				kind: NodeKind::Topic,
				x: cx + layout.orbit_radius * angle.cos(),
				y: cy + layout.orbit_radius * angle.sin(),
				radius: layout.topic_radius,
				color: hobby.color.clone(),
				label: hobby.name.clone(),
				icon: hobby.icon.clone(),
				description: hobby.description.clone(),
				tag: String::new(),
				image: None,
			});
			self.links.push(GraphLink {
				source: center.id.clone(),
				target: hobby.id.clone(),
				is_child_link: false,
			});
		}

		self.engine.set_force_parameters(self.config.forces.clone());
		self.sync_engine();
		self.engine.pin(&self.data.center.id, cx, cy);
		self.engine.reheat(self.config.timing.initial_alpha);
		self.revision += 1;
		info!(
			"hobby-graph: initialized {} topics in {width}x{height}",
			self.data.hobbies.len()
		);
	}

	fn center_for(&self, width: f64, height: f64) -> (f64, f64) {
		(width / 2.0, height / 2.0 + self.config.layout.header_offset)
	}

	/// Re-injects the full node and link set into the engine.
	fn sync_engine(&mut self) {
		let forces = &self.config.forces;
		let bodies: Vec<BodySpec> = self
			.nodes
			.iter()
			.map(|n| BodySpec {
				id: n.id.clone(),
				x: n.x,
				y: n.y,
				collision_radius: n.radius + forces.collision_margin,
				charge: if n.is_child() {
					forces.child_charge
				} else {
					forces.topic_charge
				},
			})
			.collect();
		let links: Vec<LinkSpec> = self
			.links
			.iter()
			.map(|l| LinkSpec {
				source: l.source.clone(),
				target: l.target.clone(),
				distance: if l.is_child_link {
					forces.child_link_distance
				} else {
					forces.topic_link_distance
				},
			})
			.collect();
		self.engine.set_nodes(&bodies);
		self.engine.set_links(&links);
	}

	/// Marks a structural change: re-inject, reheat, refresh hover targets.
	fn restructured(&mut self, alpha: f64) {
		self.sync_engine();
		self.engine.reheat(alpha);
		self.highlight.refresh(&self.links);
		self.revision += 1;
	}

	/// Dispatches a click/tap on a node by its kind. Returns a content request
	/// when a topic starts expanding.
	pub fn handle_node_activate(&mut self, node_id: &str) -> Option<ContentRequest> {
		self.tooltip = None;
		let Some(node) = self.node(node_id) else {
			debug!("hobby-graph: activation of unknown node {node_id}");
			return None;
		};

		match node.kind.clone() {
			NodeKind::Topic => {
				if self.is_expanded(node_id) || self.is_pending(node_id) {
					self.collapse(node_id);
					None
				} else {
					self.expand(node_id)
				}
			}
			NodeKind::Center => {
				self.collapse_all();
				None
			}
			NodeKind::Child { parent_id } => {
				self.show_tooltip(node_id, &parent_id);
				None
			}
		}
	}

	/// Click on empty canvas.
	pub fn handle_background_activate(&mut self) {
		self.collapse_all();
	}

	/// Re-centers the pinned center node and re-injects the model.
	pub fn handle_resize(&mut self, width: f64, height: f64) {
		if !self.initialized {
			return;
		}
		self.center = self.center_for(width, height);
		let (cx, cy) = self.center;
		let center_id = self.data.center.id.clone();
		if let Some(center) = self.nodes.iter_mut().find(|n| n.id == center_id) {
			center.x = cx;
			center.y = cy;
		}
		self.sync_engine();
		self.engine.pin(&center_id, cx, cy);
		self.engine.reheat(self.config.timing.resize_alpha);
	}

	/// Pointer entered or left a node.
	pub fn handle_hover(&mut self, node_id: &str, is_entering: bool) {
		if is_entering {
			self.highlight.set_hover(Some(node_id), &self.links);
		} else if self.highlight.hovered() == Some(node_id) {
			self.highlight.set_hover(None, &self.links);
		}
	}

	/// Starts expanding a topic. Returns `None` for non-topics and when a
	/// request for the topic is already in flight.
	pub fn expand(&mut self, topic_id: &str) -> Option<ContentRequest> {
		if !self.node(topic_id).is_some_and(GraphNode::is_topic) {
			return None;
		}
		if self.pending.contains_key(topic_id) {
			return None;
		}
		self.next_ticket += 1;
		self.pending.insert(topic_id.to_string(), self.next_ticket);
		debug!("hobby-graph: requesting content for {topic_id}");
		Some(ContentRequest {
			topic_id: topic_id.to_string(),
			ticket: self.next_ticket,
		})
	}

	/// Finishes an expansion with the loaded content.
	pub fn complete_expand(&mut self, request: ContentRequest, content: TopicContent) {
		let topic_id = request.topic_id.as_str();
		if self.pending.get(topic_id) != Some(&request.ticket) {
			debug!("hobby-graph: dropping stale content for {topic_id}");
			return;
		}
		self.pending.remove(topic_id);

		let achievements = if content.achievements.is_empty() {
			self.data.achievements_for(topic_id).to_vec()
		} else {
			content.achievements
		};
		if achievements.is_empty() {
			info!("hobby-graph: no achievements for {topic_id}, nothing to expand");
			return;
		}

		let Some(parent) = self.node(topic_id).cloned() else {
			return;
		};
		let offsets = self.fan_offsets(&parent, achievements.len());
		let mut burst = Vec::new();
		for (index, (achievement, offset)) in achievements.iter().zip(offsets).enumerate() {
			let id = format!("{topic_id}-child-{index}");
			if self.node(&id).is_some() {
				continue;
			}
			let child = self.child_node(&id, &parent, achievement);
			self.nodes.push(child);
			self.links.push(GraphLink {
				source: topic_id.to_string(),
				target: id.clone(),
				is_child_link: true,
			});
			burst.push((id, offset));
		}

		if self.nodes.iter().any(|n| n.parent_id() == Some(topic_id)) {
			self.expanded.insert(topic_id.to_string());
		}
		if burst.is_empty() {
			return;
		}

		debug!("hobby-graph: expanded {topic_id} with {} children", burst.len());
		self.bursts.push(Burst {
			parent_id: topic_id.to_string(),
			offsets: burst,
			remaining: self.config.timing.settle_delay_secs,
		});
		self.restructured(self.config.timing.expand_alpha);
	}

	fn child_node(&self, id: &str, parent: &GraphNode, achievement: &Achievement) -> GraphNode {
		GraphNode {
			id: id.to_string(),
			kind: NodeKind::Child {
				parent_id: parent.id.clone(),
			},
			x: parent.x,
			y: parent.y,
			radius: self.config.layout.child_radius,
			color: parent.color.clone(),
			label: achievement.title.clone(),
			icon: parent.icon.clone(),
			description: achievement.description.clone(),
			tag: achievement.tag.clone(),
			image: achievement.image.clone(),
		}
	}

	/// Offsets from the parent for `count` children, fanned symmetrically
	/// around the direction from the map center through the parent.
	fn fan_offsets(&self, parent: &GraphNode, count: usize) -> Vec<(f64, f64)> {
		let layout = &self.config.layout;
		let distance = self.config.forces.child_link_distance;
		let (dx, dy) = (parent.x - self.center.0, parent.y - self.center.1);
		let base = if dx == 0.0 && dy == 0.0 {
			-PI / 2.0
		} else {
			dy.atan2(dx)
		};
		let step = if count > 1 {
			layout.fan_step.min(layout.fan_max_spread / (count - 1) as f64)
		} else {
			0.0
		};
		let middle = (count as f64 - 1.0) / 2.0;
		(0..count)
			.map(|i| {
				let angle = base + (i as f64 - middle) * step;
				(distance * angle.cos(), distance * angle.sin())
			})
			.collect()
	}

	/// Removes a topic's children and their links. No-op when nothing is open.
	pub fn collapse(&mut self, topic_id: &str) {
		let was_pending = self.pending.remove(topic_id).is_some();
		self.expanded.remove(topic_id);

		let removed: BTreeSet<String> = self
			.nodes
			.iter()
			.filter(|n| n.parent_id() == Some(topic_id))
			.map(|n| n.id.clone())
			.collect();
		if removed.is_empty() {
			if was_pending {
				debug!("hobby-graph: cancelled pending expand of {topic_id}");
			}
			return;
		}

		self.nodes.retain(|n| !removed.contains(&n.id));
		self.links
			.retain(|l| !removed.contains(&l.source) && !removed.contains(&l.target));
		self.bursts.retain(|b| b.parent_id != topic_id);
		if self
			.tooltip
			.as_ref()
			.is_some_and(|t| removed.contains(&t.node_id))
		{
			self.tooltip = None;
		}
		debug!("hobby-graph: collapsed {topic_id} ({} children)", removed.len());
		self.restructured(self.config.timing.collapse_alpha);
	}

	/// Collapses every topic in one pass and dismisses the tooltip.
	pub fn collapse_all(&mut self) {
		self.tooltip = None;
		self.pending.clear();
		self.expanded.clear();
		self.bursts.clear();

		let before = self.nodes.len();
		self.nodes.retain(|n| !n.is_child());
		if self.nodes.len() == before {
			return;
		}
		self.links.retain(|l| !l.is_child_link);
		debug!("hobby-graph: collapsed all ({} children)", before - self.nodes.len());
		self.restructured(self.config.timing.collapse_alpha);
	}

	fn show_tooltip(&mut self, node_id: &str, parent_id: &str) {
		let Some(node) = self.node(node_id) else {
			return;
		};
		self.tooltip = Some(Tooltip {
			node_id: node.id.clone(),
			title: node.label.clone(),
			icon: node.icon.clone(),
			description: node.description.clone(),
			image: node.image.clone(),
			tag: node.tag.clone(),
			gradient: self.data.gradient_of(parent_id).map(str::to_string),
			remaining: self.config.timing.tooltip_secs,
		});
	}

	/// Hides the tooltip immediately.
	pub fn dismiss_tooltip(&mut self) {
		self.tooltip = None;
	}

	/// Pins a node under the pointer for the duration of a drag.
	pub fn begin_drag(&mut self, node_id: &str) -> bool {
		let Some(node) = self.node(node_id).filter(|n| !n.is_center()) else {
			return false;
		};
		let (x, y) = (node.x, node.y);
		self.engine.pin(node_id, x, y);
		self.engine
			.set_alpha_target(self.config.timing.drag_alpha_target);
		self.engine.reheat(self.config.timing.drag_alpha_target);
		true
	}

	/// Moves a dragged node and keeps it pinned there.
	pub fn drag_to(&mut self, node_id: &str, x: f64, y: f64) {
		let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
			return;
		};
		if node.is_center() {
			return;
		}
		node.x = x;
		node.y = y;
		self.engine.pin(node_id, x, y);
	}

	/// Releases a dragged node back to the simulation.
	pub fn end_drag(&mut self, node_id: &str) {
		if self.node(node_id).is_some_and(|n| !n.is_center()) {
			self.engine.unpin(node_id);
		}
		self.engine.set_alpha_target(0.0);
	}

	/// Advances one animation frame.
	pub fn tick(&mut self, dt: f64) {
		if self.engine.is_active() {
			self.engine.step();
			for node in &mut self.nodes {
				if let Some((x, y)) = self.engine.position(&node.id) {
					node.x = x;
					node.y = y;
				}
			}
		}

		let mut ready = Vec::new();
		self.bursts.retain_mut(|burst| {
			burst.remaining -= dt;
			if burst.remaining <= 0.0 {
				ready.push(burst.clone());
				false
			} else {
				true
			}
		});
		for burst in ready {
			self.run_burst(&burst);
		}

		if let Some(tooltip) = self.tooltip.as_mut() {
			tooltip.remaining -= dt;
			if tooltip.remaining <= 0.0 {
				self.tooltip = None;
			}
		}

		self.highlight.tick(dt);
	}

	/// Moves a burst's surviving children to their target offsets.
	fn run_burst(&mut self, burst: &Burst) {
		let Some((px, py)) = self.node(&burst.parent_id).map(|p| (p.x, p.y)) else {
			return;
		};
		for (id, (ox, oy)) in &burst.offsets {
			let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) else {
				continue;
			};
			node.x = px + ox;
			node.y = py + oy;
			self.engine.place(id, node.x, node.y);
		}
		self.engine.reheat(self.config.timing.burst_alpha);
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// All nodes in insertion order: center, topics, then children.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// All links.
	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	/// Whether the topic currently shows children.
	pub fn is_expanded(&self, topic_id: &str) -> bool {
		self.expanded.contains(topic_id)
	}

	/// Whether a content request for the topic is outstanding.
	pub fn is_pending(&self, topic_id: &str) -> bool {
		self.pending.contains_key(topic_id)
	}

	/// Expanded topic ids in sorted order.
	pub fn expanded_topics(&self) -> impl Iterator<Item = &str> {
		self.expanded.iter().map(String::as_str)
	}

	/// Tooltip currently shown, if any.
	pub fn tooltip(&self) -> Option<&Tooltip> {
		self.tooltip.as_ref()
	}

	/// Hover highlight state.
	pub fn highlight(&self) -> &HighlightState {
		&self.highlight
	}

	/// Bumped on every structural change.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Pinned position of the center node.
	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	/// The layout engine driving node positions.
	pub fn engine(&self) -> &E {
		&self.engine
	}
}
