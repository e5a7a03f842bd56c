//! Keyed reconciliation of the graph model into animated presences.
//!
//! Nodes are keyed by id and links by `(source, target)`. New elements grow
//! from scale 0, removed ones shrink and drift toward their parent before
//! being dropped. An element that comes back while still exiting grows again
//! from whatever scale it had reached.

use std::collections::{HashMap, HashSet};

use super::types::{GraphLink, GraphNode, LinkKey};

const ENTER_SECS: f64 = 0.3;
const EXIT_SECS: f64 = 0.25;

/// Where an element is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Growing in.
	Entering,
	/// Fully visible.
	Present,
	/// Removed from the model, shrinking out.
	Exiting,
}

/// A model element plus its animation state.
#[derive(Clone, Debug)]
pub struct Presence<T> {
	/// Last known model state.
	pub item: T,
	/// Lifecycle phase.
	pub phase: Phase,
	/// 0.0 when invisible, 1.0 when fully present.
	pub scale: f64,
}

impl<T> Presence<T> {
	fn entering(item: T) -> Self {
		Self {
			item,
			phase: Phase::Entering,
			scale: 0.0,
		}
	}

	fn revive(&mut self, item: T) {
		self.item = item;
		if self.phase == Phase::Exiting {
			self.phase = Phase::Entering;
		}
	}

	fn advance(&mut self, dt: f64, enter_secs: f64, exit_secs: f64) {
		match self.phase {
			Phase::Entering => {
				self.scale = (self.scale + dt / enter_secs).min(1.0);
				if self.scale >= 1.0 {
					self.phase = Phase::Present;
				}
			}
			Phase::Exiting => self.scale = (self.scale - dt / exit_secs).max(0.0),
			Phase::Present => {}
		}
	}

	fn is_gone(&self) -> bool {
		self.phase == Phase::Exiting && self.scale <= 0.0
	}
}

/// A link with resolved endpoint positions.
#[derive(Clone, Debug)]
pub struct LinkSegment {
	/// The model link.
	pub link: GraphLink,
	/// Source position.
	pub from: (f64, f64),
	/// Target position.
	pub to: (f64, f64),
}

/// Animated node.
pub type NodePresence = Presence<GraphNode>;
/// Animated link.
pub type LinkPresence = Presence<LinkSegment>;

/// Enter/exit state for every node and link, including ones on their way out.
#[derive(Clone, Debug)]
pub struct Transitions {
	enter_secs: f64,
	exit_secs: f64,
	nodes: Vec<NodePresence>,
	links: Vec<LinkPresence>,
}

impl Default for Transitions {
	fn default() -> Self {
		Self::new(ENTER_SECS, EXIT_SECS)
	}
}

impl Transitions {
	/// Transitions with the given grow and shrink durations.
	pub fn new(enter_secs: f64, exit_secs: f64) -> Self {
		Self {
			enter_secs,
			exit_secs,
			nodes: Vec::new(),
			links: Vec::new(),
		}
	}

	/// Reconciles against the current model and advances animations by `dt`.
	pub fn sync(&mut self, nodes: &[GraphNode], links: &[GraphLink], dt: f64) {
		self.sync_nodes(nodes, dt);
		self.sync_links(links, dt);
	}

	fn sync_nodes(&mut self, nodes: &[GraphNode], dt: f64) {
		let live: HashMap<&str, &GraphNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
		let known: HashSet<String> = self.nodes.iter().map(|p| p.item.id.clone()).collect();

		for presence in &mut self.nodes {
			if let Some(node) = live.get(presence.item.id.as_str()) {
				presence.revive((*node).clone());
				continue;
			}

			presence.phase = Phase::Exiting;
			let parent = presence.item.parent_id().and_then(|id| live.get(id));
			if let Some(parent) = parent {
				// Arrive at the parent exactly when the scale reaches zero.
				let remaining = presence.scale * self.exit_secs;
				let t = if remaining > 0.0 {
					(dt / remaining).min(1.0)
				} else {
					1.0
				};
				presence.item.x += (parent.x - presence.item.x) * t;
				presence.item.y += (parent.y - presence.item.y) * t;
			}
		}

		for node in nodes.iter().filter(|n| !known.contains(&n.id)) {
			self.nodes.push(Presence::entering(node.clone()));
		}

		for presence in &mut self.nodes {
			presence.advance(dt, self.enter_secs, self.exit_secs);
		}
		self.nodes.retain(|p| !p.is_gone());
	}

	fn sync_links(&mut self, links: &[GraphLink], dt: f64) {
		let positions: HashMap<&str, (f64, f64)> = self
			.nodes
			.iter()
			.map(|p| (p.item.id.as_str(), (p.item.x, p.item.y)))
			.collect();
		let live: HashMap<LinkKey, &GraphLink> = links.iter().map(|l| (l.key(), l)).collect();
		let known: HashSet<LinkKey> = self.links.iter().map(|p| p.item.link.key()).collect();

		for presence in &mut self.links {
			let segment = &mut presence.item;
			if let Some(&from) = positions.get(segment.link.source.as_str()) {
				segment.from = from;
			}
			if let Some(&to) = positions.get(segment.link.target.as_str()) {
				segment.to = to;
			}
			match live.get(&segment.link.key()) {
				Some(link) => {
					let revived = LinkSegment {
						link: (*link).clone(),
						from: segment.from,
						to: segment.to,
					};
					presence.revive(revived);
				}
				None => presence.phase = Phase::Exiting,
			}
		}

		for link in links.iter().filter(|l| !known.contains(&l.key())) {
			let from = positions.get(link.source.as_str()).copied().unwrap_or_default();
			let to = positions.get(link.target.as_str()).copied().unwrap_or(from);
			self.links.push(Presence::entering(LinkSegment {
				link: link.clone(),
				from,
				to,
			}));
		}

		for presence in &mut self.links {
			presence.advance(dt, self.enter_secs, self.exit_secs);
		}
		self.links.retain(|p| !p.is_gone());
	}

	/// Nodes in draw order.
	pub fn nodes(&self) -> &[NodePresence] {
		&self.nodes
	}

	/// Links in draw order.
	pub fn links(&self) -> &[LinkPresence] {
		&self.links
	}

	/// Presence of one node.
	pub fn node(&self, id: &str) -> Option<&NodePresence> {
		self.nodes.iter().find(|p| p.item.id == id)
	}

	/// Whether any element is still entering or exiting.
	pub fn is_animating(&self) -> bool {
		self.nodes
			.iter()
			.map(|p| p.phase)
			.chain(self.links.iter().map(|p| p.phase))
			.any(|phase| phase != Phase::Present)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::hobby_graph::types::NodeKind;

	fn node(id: &str, kind: NodeKind, x: f64, y: f64) -> GraphNode {
		GraphNode {
			id: id.into(),
			kind,
			x,
			y,
			radius: 30.0,
			color: "#FF6B6B".into(),
			label: id.into(),
			icon: String::new(),
			description: String::new(),
			tag: String::new(),
			image: None,
		}
	}

	fn child(id: &str, parent: &str, x: f64, y: f64) -> GraphNode {
		node(
			id,
			NodeKind::Child {
				parent_id: parent.into(),
			},
			x,
			y,
		)
	}

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			is_child_link: true,
		}
	}

	#[test]
	fn new_nodes_grow_from_zero_then_settle() {
		let mut transitions = Transitions::new(0.25, 0.25);
		let nodes = vec![node("video", NodeKind::Topic, 10.0, 20.0)];
		transitions.sync(&nodes, &[], 0.0);
		let presence = transitions.node("video").unwrap();
		assert_eq!(presence.phase, Phase::Entering);
		assert_eq!(presence.scale, 0.0);
		assert_eq!((presence.item.x, presence.item.y), (10.0, 20.0));

		transitions.sync(&nodes, &[], 0.125);
		assert_eq!(transitions.node("video").unwrap().scale, 0.5);
		transitions.sync(&nodes, &[], 0.125);
		assert_eq!(transitions.node("video").unwrap().phase, Phase::Present);
		assert!(!transitions.is_animating());
	}

	#[test]
	fn removed_child_shrinks_toward_parent_then_disappears() {
		let mut transitions = Transitions::new(0.25, 0.25);
		let parent = node("video", NodeKind::Topic, 100.0, 0.0);
		let kid = child("video-child-0", "video", 0.0, 0.0);
		transitions.sync(&[parent.clone(), kid], &[link("video", "video-child-0")], 1.0);

		transitions.sync(std::slice::from_ref(&parent), &[], 0.125);
		let exiting = transitions.node("video-child-0").unwrap();
		assert_eq!(exiting.phase, Phase::Exiting);
		assert_eq!(exiting.scale, 0.5);
		assert_eq!(exiting.item.x, 50.0);
		assert_eq!(transitions.links()[0].phase, Phase::Exiting);
		assert!(transitions.is_animating());

		transitions.sync(std::slice::from_ref(&parent), &[], 0.125);
		assert!(transitions.node("video-child-0").is_none());
		assert!(transitions.links().is_empty());
		assert_eq!(transitions.nodes().len(), 1);
	}

	#[test]
	fn removed_node_without_parent_stays_in_place() {
		let mut transitions = Transitions::new(0.25, 0.25);
		transitions.sync(&[child("orphan", "gone", 5.0, 6.0)], &[], 1.0);
		transitions.sync(&[], &[], 0.125);
		let exiting = transitions.node("orphan").unwrap();
		assert_eq!((exiting.item.x, exiting.item.y), (5.0, 6.0));
	}

	#[test]
	fn readded_node_reenters_from_current_scale() {
		let mut transitions = Transitions::new(0.25, 0.25);
		let parent = node("video", NodeKind::Topic, 100.0, 0.0);
		let kid = child("video-child-0", "video", 0.0, 0.0);
		let both = vec![parent.clone(), kid];
		transitions.sync(&both, &[], 1.0);
		transitions.sync(std::slice::from_ref(&parent), &[], 0.125);

		transitions.sync(&both, &[], 0.0);
		let presence = transitions.node("video-child-0").unwrap();
		assert_eq!(presence.phase, Phase::Entering);
		assert_eq!(presence.scale, 0.5);
		assert_eq!(presence.item.x, 0.0, "takes the model position again");
		assert_eq!(transitions.nodes().len(), 2);
	}

	#[test]
	fn links_follow_node_positions() {
		let mut transitions = Transitions::default();
		let mut nodes = vec![node("center", NodeKind::Center, 0.0, 0.0), node("video", NodeKind::Topic, 3.0, 4.0)];
		let links = vec![link("center", "video")];
		transitions.sync(&nodes, &links, 0.0);
		assert_eq!(transitions.links()[0].item.to, (3.0, 4.0));

		nodes[1].x = 30.0;
		transitions.sync(&nodes, &links, 0.016);
		let segment = &transitions.links()[0].item;
		assert_eq!(segment.from, (0.0, 0.0));
		assert_eq!(segment.to, (30.0, 4.0));
	}
}
