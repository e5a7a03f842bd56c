//! View state and pointer interaction tracking.
//!
//! Wraps the [`GraphController`] with a pan/zoom transform, the transition
//! layer, and the press/drag/pan gesture state. Pointer coordinates are in
//! canvas pixels; the controller works in graph coordinates.

use super::controller::{ContentRequest, GraphController};
use super::simulation::LayoutEngine;
use super::transition::Transitions;

/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 2.0;
/// A press that moves less than this many pixels is a click.
const CLICK_SLOP: f64 = 4.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in pixels.
	pub x: f64,
	/// Vertical translation in pixels.
	pub y: f64,
	/// Zoom factor, clamped to `MIN_ZOOM..=MAX_ZOOM`.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	/// Canvas pixels to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Graph coordinates to canvas pixels.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Zooms by `factor` keeping the graph point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = k;
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Node being dragged.
	pub node_id: Option<String>,
	/// Graph x of the node when the drag started.
	pub node_start_x: f64,
	/// Graph y of the node when the drag started.
	pub node_start_y: f64,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// A background drag is panning the view.
	pub active: bool,
	/// Transform x when the pan started.
	pub transform_start_x: f64,
	/// Transform y when the pan started.
	pub transform_start_y: f64,
}

/// Pointer press that may still turn out to be a click.
#[derive(Clone, Debug)]
struct Press {
	start_x: f64,
	start_y: f64,
	/// Node under the pointer at press time.
	target: Option<String>,
	moved: bool,
}

/// Summary card for a hovered center or topic node.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverCard {
	/// Node label.
	pub label: String,
	/// Node icon.
	pub icon: String,
	/// Node description.
	pub description: String,
	/// Screen x of the node center.
	pub x: f64,
	/// Screen y just below the node.
	pub y: f64,
}

/// Everything the canvas needs between frames.
pub struct HobbyGraphState<E: LayoutEngine> {
	/// Graph model and expand/collapse logic.
	pub controller: GraphController<E>,
	/// Enter/exit animation state.
	pub transitions: Transitions,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Node drag in progress.
	pub drag: DragState,
	/// Background pan in progress.
	pub pan: PanState,
	press: Option<Press>,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
}

impl<E: LayoutEngine> HobbyGraphState<E> {
	/// Initializes the controller for the given canvas size.
	pub fn new(mut controller: GraphController<E>, width: f64, height: f64) -> Self {
		controller.initialize(width, height);
		let mut transitions = Transitions::default();
		transitions.sync(controller.nodes(), controller.links(), 0.0);
		Self {
			controller,
			transitions,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			press: None,
			width,
			height,
		}
	}

	/// Canvas pixels to graph coordinates under the current transform.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.screen_to_graph(sx, sy)
	}

	/// Topmost node under a screen position. Children are drawn last, so they
	/// win over the topic they spawned from.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.controller
			.nodes()
			.iter()
			.rev()
			.find(|n| {
				let (dx, dy) = (n.x - gx, n.y - gy);
				dx * dx + dy * dy <= n.radius * n.radius
			})
			.map(|n| n.id.clone())
	}

	/// Starts a press on a node or on the background.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let target = self.node_at_position(sx, sy);
		if target.is_none() {
			self.pan = PanState {
				active: true,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
		self.press = Some(Press {
			start_x: sx,
			start_y: sy,
			target,
			moved: false,
		});
	}

	/// Drags, pans, or updates hover depending on the current press.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		let Some(press) = self.press.as_mut() else {
			self.update_hover(sx, sy);
			return;
		};

		let (dx, dy) = (sx - press.start_x, sy - press.start_y);
		if !press.moved && dx * dx + dy * dy < CLICK_SLOP * CLICK_SLOP {
			return;
		}
		press.moved = true;

		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
			return;
		}

		let Some(target) = press.target.clone() else {
			return;
		};
		if self.drag.node_id.is_none() {
			let Some(node) = self.controller.node(&target) else {
				return;
			};
			let (x, y) = (node.x, node.y);
			if !self.controller.begin_drag(&target) {
				return;
			}
			self.drag = DragState {
				node_id: Some(target.clone()),
				node_start_x: x,
				node_start_y: y,
			};
		}
		let (nx, ny) = (
			self.drag.node_start_x + dx / self.transform.k,
			self.drag.node_start_y + dy / self.transform.k,
		);
		self.controller.drag_to(&target, nx, ny);
	}

	/// Ends the gesture. A press that stayed within the click slop activates
	/// whatever it started on.
	pub fn pointer_up(&mut self) -> Option<ContentRequest> {
		let press = self.press.take()?;
		self.end_gesture();
		if press.moved {
			return None;
		}
		match press.target {
			Some(id) => self.controller.handle_node_activate(&id),
			None => {
				self.controller.handle_background_activate();
				None
			}
		}
	}

	/// Pointer left the canvas: cancels the gesture and clears hover.
	pub fn pointer_leave(&mut self) {
		self.press = None;
		self.end_gesture();
		if let Some(id) = self.controller.highlight().hovered().map(str::to_string) {
			self.controller.handle_hover(&id, false);
		}
	}

	fn end_gesture(&mut self) {
		if let Some(id) = self.drag.node_id.take() {
			self.controller.end_drag(&id);
		}
		self.pan.active = false;
	}

	fn update_hover(&mut self, sx: f64, sy: f64) {
		let hit = self.node_at_position(sx, sy);
		let current = self.controller.highlight().hovered().map(str::to_string);
		if hit == current {
			return;
		}
		if let Some(id) = current {
			self.controller.handle_hover(&id, false);
		}
		if let Some(id) = hit {
			self.controller.handle_hover(&id, true);
		}
	}

	/// Wheel zoom around the cursor.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.transform.zoom_at(sx, sy, factor);
	}

	/// Canvas was resized.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.controller.handle_resize(width, height);
	}

	/// Advances the controller and the transitions by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		self.controller.tick(dt);
		self.transitions
			.sync(self.controller.nodes(), self.controller.links(), dt);
	}

	/// Screen position just above the node the tooltip belongs to.
	pub fn tooltip_anchor(&self) -> Option<(f64, f64)> {
		let tooltip = self.controller.tooltip()?;
		let node = self.controller.node(&tooltip.node_id)?;
		let (sx, sy) = self.transform.graph_to_screen(node.x, node.y);
		Some((sx, sy - node.radius * self.transform.k))
	}

	/// Click on the tooltip overlay.
	pub fn dismiss_tooltip(&mut self) {
		self.controller.dismiss_tooltip();
	}

	/// Card for the hovered center or topic, when it has a description.
	/// Children already show their details in the tooltip.
	pub fn hover_card(&self) -> Option<HoverCard> {
		let id = self.controller.highlight().hovered()?;
		let node = self
			.controller
			.node(id)
			.filter(|n| !n.is_child() && !n.description.is_empty())?;
		let (sx, sy) = self.transform.graph_to_screen(node.x, node.y);
		Some(HoverCard {
			label: node.label.clone(),
			icon: node.icon.clone(),
			description: node.description.clone(),
			x: sx,
			y: sy + node.radius * self.transform.k,
		})
	}

	/// CSS cursor for the current gesture.
	pub fn cursor(&self) -> &'static str {
		if self.drag.node_id.is_some() || self.pan.active {
			"grabbing"
		} else if self.controller.highlight().hovered().is_some() {
			"pointer"
		} else {
			"grab"
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::hobby_graph::config::ControllerConfig;
	use crate::components::hobby_graph::data::HobbyData;
	use crate::components::hobby_graph::simulation::{ForceParameters, ForceSimulation};
	use crate::components::hobby_graph::types::{Achievement, TopicContent};

	fn state() -> HobbyGraphState<ForceSimulation> {
		let controller = GraphController::new(
			ControllerConfig::default(),
			HobbyData::default(),
			ForceSimulation::new(ForceParameters::default()),
		);
		HobbyGraphState::new(controller, 800.0, 600.0)
	}

	fn screen_pos(state: &HobbyGraphState<ForceSimulation>, id: &str) -> (f64, f64) {
		let node = state.controller.node(id).unwrap();
		state.transform.graph_to_screen(node.x, node.y)
	}

	fn click(state: &mut HobbyGraphState<ForceSimulation>, (x, y): (f64, f64)) -> Option<ContentRequest> {
		state.pointer_down(x, y);
		state.pointer_move(x + 1.0, y + 1.0);
		state.pointer_up()
	}

	#[test]
	fn zoom_is_clamped_and_keeps_cursor_point_fixed() {
		let mut transform = ViewTransform::default();
		let before = transform.screen_to_graph(200.0, 100.0);
		transform.zoom_at(200.0, 100.0, 1.5);
		let after = transform.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

		for _ in 0..20 {
			transform.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(transform.k, MAX_ZOOM);
		for _ in 0..40 {
			transform.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(transform.k, MIN_ZOOM);
	}

	#[test]
	fn click_on_topic_requests_content_and_background_collapses() {
		let mut state = state();
		let pos = screen_pos(&state, "video");
		let request = click(&mut state, pos).unwrap();
		assert_eq!(request.topic_id, "video");
		state.controller.complete_expand(
			request,
			TopicContent {
				metadata: Default::default(),
				achievements: vec![Achievement {
					title: "Edit".into(),
					..Achievement::default()
				}],
			},
		);
		assert_eq!(state.controller.nodes().len(), 5);

		assert!(click(&mut state, (5.0, 5.0)).is_none());
		assert_eq!(state.controller.nodes().len(), 4);
	}

	#[test]
	fn children_are_hit_before_their_parent() {
		let mut state = state();
		let pos = screen_pos(&state, "hosting");
		let request = click(&mut state, pos).unwrap();
		state.controller.complete_expand(
			request,
			TopicContent {
				metadata: Default::default(),
				achievements: vec![Achievement {
					title: "Gala".into(),
					..Achievement::default()
				}],
			},
		);
		assert_eq!(state.node_at_position(pos.0, pos.1).as_deref(), Some("hosting-child-0"));
		assert!(click(&mut state, pos).is_none());
		assert!(state.controller.tooltip().is_some());
		let anchor = state.tooltip_anchor().unwrap();
		assert_eq!(anchor, (pos.0, pos.1 - 30.0));
	}

	#[test]
	fn moving_past_slop_drags_instead_of_clicking() {
		let mut state = state();
		let (x, y) = screen_pos(&state, "fitness");
		state.pointer_down(x, y);
		state.pointer_move(x + 30.0, y + 40.0);
		assert_eq!(state.cursor(), "grabbing");
		let node = state.controller.node("fitness").unwrap();
		assert_eq!((node.x, node.y), (x + 30.0, y + 40.0));
		assert!(state.pointer_up().is_none());
		assert!(!state.controller.is_pending("fitness"));
		assert!(state.drag.node_id.is_none());
	}

	#[test]
	fn center_cannot_be_dragged() {
		let mut state = state();
		let (x, y) = screen_pos(&state, "center");
		state.pointer_down(x, y);
		state.pointer_move(x + 50.0, y);
		state.pointer_up();
		assert_eq!(
			state.controller.node("center").map(|n| (n.x, n.y)),
			Some(state.controller.center())
		);
	}

	#[test]
	fn background_drag_pans() {
		let mut state = state();
		state.pointer_down(5.0, 5.0);
		state.pointer_move(25.0, 15.0);
		assert_eq!((state.transform.x, state.transform.y), (20.0, 10.0));
		state.pointer_up();
		assert!(!state.pan.active);

		let (x, y) = screen_pos(&state, "video");
		assert_eq!(state.node_at_position(x, y).as_deref(), Some("video"));
	}

	#[test]
	fn hover_follows_pointer_and_clears_on_leave() {
		let mut state = state();
		let (x, y) = screen_pos(&state, "video");
		state.pointer_move(x, y);
		assert_eq!(state.controller.highlight().hovered(), Some("video"));
		assert_eq!(state.cursor(), "pointer");
		state.pointer_move(5.0, 5.0);
		assert_eq!(state.controller.highlight().hovered(), None);
		state.pointer_move(x, y);
		state.pointer_leave();
		assert_eq!(state.controller.highlight().hovered(), None);
	}

	#[test]
	fn clicking_the_tooltip_dismisses_it() {
		let mut state = state();
		let pos = screen_pos(&state, "video");
		let request = click(&mut state, pos).unwrap();
		state.controller.complete_expand(
			request,
			TopicContent {
				metadata: Default::default(),
				achievements: vec![Achievement {
					title: "Edit".into(),
					..Achievement::default()
				}],
			},
		);
		let child = screen_pos(&state, "video-child-0");
		click(&mut state, child);
		assert!(state.tooltip_anchor().is_some());

		state.dismiss_tooltip();
		assert!(state.controller.tooltip().is_none());
		assert!(state.tooltip_anchor().is_none());
		assert!(state.controller.is_expanded("video"));
	}

	#[test]
	fn hovering_a_topic_shows_its_description() {
		let mut state = state();
		let (x, y) = screen_pos(&state, "video");
		state.pointer_move(x, y);
		let card = state.hover_card().unwrap();
		assert_eq!(card.label, "视频制作");
		assert_eq!(card.icon, "🎬");
		assert_eq!(card.description, HobbyData::default().hobbies[0].description);
		assert_eq!((card.x, card.y), (x, y + 50.0));

		state.pointer_move(5.0, 5.0);
		assert!(state.hover_card().is_none());
	}

	#[test]
	fn hover_card_skips_children_and_blank_descriptions() {
		let mut data = HobbyData::default();
		data.center.description.clear();
		let controller = GraphController::new(
			ControllerConfig::default(),
			data,
			ForceSimulation::new(ForceParameters::default()),
		);
		let mut state = HobbyGraphState::new(controller, 800.0, 600.0);
		let (x, y) = screen_pos(&state, "center");
		state.pointer_move(x, y);
		assert_eq!(state.controller.highlight().hovered(), Some("center"));
		assert!(state.hover_card().is_none());

		let pos = screen_pos(&state, "fitness");
		state.pointer_move(5.0, 5.0);
		let request = click(&mut state, pos).unwrap();
		state.controller.complete_expand(request, TopicContent::default());
		let child = screen_pos(&state, "fitness-child-0");
		state.pointer_move(child.0, child.1);
		let hovered = state.controller.highlight().hovered().unwrap();
		assert!(hovered.starts_with("fitness-child-"), "hovering {hovered}");
		assert!(state.hover_card().is_none());
	}

	#[test]
	fn tick_feeds_transitions() {
		let mut state = state();
		assert_eq!(state.transitions.nodes().len(), 4);
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert!(!state.transitions.is_animating());
	}
}
