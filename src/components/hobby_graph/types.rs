//! Graph data structures shared by the controller, transitions and renderer.

use std::collections::HashMap;

use serde::Deserialize;

/// Category of a node. Child nodes carry the id of the topic that spawned them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
	/// The fixed hub of the map.
	Center,
	/// A hobby, created at startup and never destroyed.
	Topic,
	/// An achievement under a topic, created on expand and removed on collapse.
	Child {
		/// Topic that spawned this node.
		parent_id: String,
	},
}

/// A node in the active graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique identifier within the active node set.
	pub id: String,
	/// Center, topic or child.
	pub kind: NodeKind,
	/// Current position, copied back from the layout simulation every step.
	pub x: f64,
	/// See `x`.
	pub y: f64,
	/// Visual radius in graph units.
	pub radius: f64,
	/// CSS color (e.g., "#FF6B6B").
	pub color: String,
	/// Text drawn under the icon.
	pub label: String,
	/// Emoji drawn on the node.
	pub icon: String,
	/// Longer text for the hover card or tooltip.
	pub description: String,
	/// Achievement tag, empty for center and topics.
	pub tag: String,
	/// Optional image path, relative to the content root.
	pub image: Option<String>,
}

impl GraphNode {
	/// Id of the spawning topic, present only for child nodes.
	pub fn parent_id(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Child { parent_id } => Some(parent_id),
			_ => None,
		}
	}

	/// The hub node.
	pub fn is_center(&self) -> bool {
		self.kind == NodeKind::Center
	}

	/// A hobby node.
	pub fn is_topic(&self) -> bool {
		self.kind == NodeKind::Topic
	}

	/// An achievement node.
	pub fn is_child(&self) -> bool {
		matches!(self.kind, NodeKind::Child { .. })
	}
}

/// An undirected edge between two node ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLink {
	/// Center for topic links, the topic for child links.
	pub source: String,
	/// Topic or child node id.
	pub target: String,
	/// True for topic → child links.
	pub is_child_link: bool,
}

impl GraphLink {
	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}

	/// Stable key used for reconciliation and highlight tracking.
	pub fn key(&self) -> LinkKey {
		(self.source.clone(), self.target.clone())
	}
}

/// `(source, target)` pair identifying a link.
pub type LinkKey = (String, String);

/// One achievement entry under a topic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Achievement {
	/// Heading of the achievement block.
	pub title: String,
	/// Body text.
	#[serde(default)]
	pub description: String,
	/// Short category shown as a badge.
	#[serde(default)]
	pub tag: String,
	/// Image path relative to the content root.
	#[serde(default)]
	pub image: Option<String>,
}

/// Parsed content of one topic document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicContent {
	/// Front matter key/value pairs.
	pub metadata: HashMap<String, String>,
	/// Achievement blocks in document order.
	pub achievements: Vec<Achievement>,
}
