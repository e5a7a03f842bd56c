//! Force-directed layout simulation.
//!
//! The controller drives layout through the [`LayoutEngine`] trait so the
//! physics can be swapped for a deterministic double in tests.
//! [`ForceSimulation`] is the production engine and follows d3-force
//! semantics: an `alpha` energy level that decays toward `alpha_target`, forces
//! that write into velocities scaled by alpha, then velocity decay and
//! integration. Graphs here are a few dozen nodes, so charge and collision are
//! plain pairwise loops.

use std::collections::HashMap;

use serde::Deserialize;

/// Tunable force configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceParameters {
	/// Target separation for center ↔ topic links.
	pub topic_link_distance: f64,
	/// Target separation for topic ↔ child links.
	pub child_link_distance: f64,
	/// Many-body strength of center and topic nodes (negative repels).
	pub topic_charge: f64,
	/// Many-body strength of child nodes.
	pub child_charge: f64,
	/// Added to a node's visual radius to get its collision radius.
	pub collision_margin: f64,
	/// How much of an overlap is resolved per step (0..=1).
	pub collision_strength: f64,
	/// Fraction of velocity removed per step (d3 default 0.4).
	pub velocity_decay: f64,
	/// Per-step approach rate of alpha to its target (d3 default ~0.0228).
	pub alpha_decay: f64,
	/// Below this energy the simulation stops moving nodes.
	pub alpha_min: f64,
}

impl Default for ForceParameters {
	fn default() -> Self {
		Self {
			topic_link_distance: 200.0,
			child_link_distance: 100.0,
			topic_charge: -800.0,
			child_charge: -300.0,
			collision_margin: 20.0,
			collision_strength: 1.0,
			velocity_decay: 0.6,
			alpha_decay: 0.05,
			alpha_min: 0.001,
		}
	}
}

/// A node as handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
	/// Node id.
	pub id: String,
	/// Spawn position, only used for bodies the engine has not seen before.
	pub x: f64,
	/// Spawn y, see `x`.
	pub y: f64,
	/// Radius used by the collision force.
	pub collision_radius: f64,
	/// Many-body strength (negative repels).
	pub charge: f64,
}

/// A link as handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Rest length.
	pub distance: f64,
}

/// Capability the controller needs from a layout engine.
pub trait LayoutEngine {
	/// Replace the force configuration.
	fn set_force_parameters(&mut self, params: ForceParameters);
	/// Replace the body set. Bodies whose id is already known keep their
	/// position and velocity; new ids spawn at the given coordinates.
	fn set_nodes(&mut self, nodes: &[BodySpec]);
	/// Replace the link set. Links with unknown endpoints are ignored.
	fn set_links(&mut self, links: &[LinkSpec]);
	/// Advance one simulation step.
	fn step(&mut self);
	/// Fix a body at a position until unpinned.
	fn pin(&mut self, id: &str, x: f64, y: f64);
	/// Release a pinned body.
	fn unpin(&mut self, id: &str);
	/// Raise the energy level to at least `alpha`.
	fn reheat(&mut self, alpha: f64);
	/// Energy level alpha decays toward; non-zero keeps the layout moving.
	fn set_alpha_target(&mut self, target: f64);
	/// Current position of a body.
	fn position(&self, id: &str) -> Option<(f64, f64)>;
	/// Move a free body without touching its velocity.
	fn place(&mut self, id: &str, x: f64, y: f64);
	/// Whether stepping would still move anything.
	fn is_active(&self) -> bool;
}

#[derive(Clone, Debug)]
struct Body {
	id: String,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	fixed: Option<(f64, f64)>,
	collision_radius: f64,
	charge: f64,
}

#[derive(Clone, Copy, Debug)]
struct ResolvedLink {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

/// d3-style force simulation keyed by node id.
#[derive(Clone, Debug, Default)]
pub struct ForceSimulation {
	params: ForceParameters,
	bodies: Vec<Body>,
	index: HashMap<String, usize>,
	link_specs: Vec<LinkSpec>,
	links: Vec<ResolvedLink>,
	alpha: f64,
	alpha_target: f64,
}

/// Tiny deterministic offset used to separate coincident points.
fn jiggle(i: usize, j: usize) -> f64 {
	let t = ((i as f64) * 0.618_034 + (j as f64) * 0.414_214).fract();
	(t - 0.5) * 1e-6
}

impl ForceSimulation {
	/// Empty simulation at full energy.
	pub fn new(params: ForceParameters) -> Self {
		Self {
			params,
			alpha: 1.0,
			..Self::default()
		}
	}

	fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
		let i = *self.index.get(id)?;
		self.bodies.get_mut(i)
	}

	fn resolve_links(&mut self) {
		let mut degree = vec![0usize; self.bodies.len()];
		let mut pairs = Vec::with_capacity(self.link_specs.len());
		for spec in &self.link_specs {
			if let (Some(&s), Some(&t)) = (self.index.get(&spec.source), self.index.get(&spec.target)) {
				if s == t {
					continue;
				}
				degree[s] += 1;
				degree[t] += 1;
				pairs.push((s, t, spec.distance));
			}
		}

		self.links = pairs
			.into_iter()
			.map(|(source, target, distance)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				ResolvedLink {
					source,
					target,
					distance,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();
	}

	fn apply_links(&mut self, alpha: f64) {
		for (n, link) in self.links.iter().enumerate() {
			let (s, t) = (&self.bodies[link.source], &self.bodies[link.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 {
				dx = jiggle(n, link.source);
			}
			if dy == 0.0 {
				dy = jiggle(n, link.target);
			}
			let l = (dx * dx + dy * dy).sqrt();
			let f = (l - link.distance) / l * alpha * link.strength;
			let (fx, fy) = (dx * f, dy * f);

			let target = &mut self.bodies[link.target];
			target.vx -= fx * link.bias;
			target.vy -= fy * link.bias;
			let source = &mut self.bodies[link.source];
			source.vx += fx * (1.0 - link.bias);
			source.vy += fy * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let n = self.bodies.len();
		let mut deltas = vec![(0.0, 0.0); n];
		for i in 0..n {
			for j in 0..n {
				if i == j {
					continue;
				}
				let (a, b) = (&self.bodies[i], &self.bodies[j]);
				let mut dx = b.x - a.x;
				let mut dy = b.y - a.y;
				if dx == 0.0 {
					dx = jiggle(i, j);
				}
				if dy == 0.0 {
					dy = jiggle(j, i);
				}
				let mut l2 = dx * dx + dy * dy;
				if l2 < 1.0 {
					l2 = l2.sqrt();
				}
				let w = b.charge * alpha / l2;
				deltas[i].0 += dx * w;
				deltas[i].1 += dy * w;
			}
		}
		for (body, (dvx, dvy)) in self.bodies.iter_mut().zip(deltas) {
			body.vx += dvx;
			body.vy += dvy;
		}
	}

	fn apply_collision(&mut self) {
		let strength = self.params.collision_strength;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (&self.bodies[i], &self.bodies[j]);
				let r = a.collision_radius + b.collision_radius;
				let mut dx = a.x + a.vx - b.x - b.vx;
				let mut dy = a.y + a.vy - b.y - b.vy;
				let mut l2 = dx * dx + dy * dy;
				if l2 >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = jiggle(i, j);
					l2 += dx * dx;
				}
				if dy == 0.0 {
					dy = jiggle(j, i);
					l2 += dy * dy;
				}
				let l = l2.sqrt();
				let push = (r - l) / l * strength;
				let (px, py) = (dx * push, dy * push);
				let (ra2, rb2) = (a.collision_radius.powi(2), b.collision_radius.powi(2));
				let share = rb2 / (ra2 + rb2);

				let a = &mut self.bodies[i];
				a.vx += px * share;
				a.vy += py * share;
				let b = &mut self.bodies[j];
				b.vx -= px * (1.0 - share);
				b.vy -= py * (1.0 - share);
			}
		}
	}
}

impl LayoutEngine for ForceSimulation {
	fn set_force_parameters(&mut self, params: ForceParameters) {
		self.params = params;
	}

	fn set_nodes(&mut self, nodes: &[BodySpec]) {
		let mut previous: HashMap<String, Body> = std::mem::take(&mut self.bodies)
			.into_iter()
			.map(|b| (b.id.clone(), b))
			.collect();

		self.bodies = nodes
			.iter()
			.map(|spec| match previous.remove(&spec.id) {
				Some(mut body) => {
					body.collision_radius = spec.collision_radius;
					body.charge = spec.charge;
					body
				}
				None => Body {
					id: spec.id.clone(),
					x: spec.x,
					y: spec.y,
					vx: 0.0,
					vy: 0.0,
					fixed: None,
					collision_radius: spec.collision_radius,
					charge: spec.charge,
				},
			})
			.collect();

		self.index = self
			.bodies
			.iter()
			.enumerate()
			.map(|(i, b)| (b.id.clone(), i))
			.collect();
		self.resolve_links();
	}

	fn set_links(&mut self, links: &[LinkSpec]) {
		self.link_specs = links.to_vec();
		self.resolve_links();
	}

	fn step(&mut self) {
		if !self.is_active() {
			return;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_collision();

		let keep = 1.0 - self.params.velocity_decay;
		for body in &mut self.bodies {
			match body.fixed {
				Some((fx, fy)) => {
					body.x = fx;
					body.y = fy;
					body.vx = 0.0;
					body.vy = 0.0;
				}
				None => {
					body.vx *= keep;
					body.vy *= keep;
					body.x += body.vx;
					body.y += body.vy;
				}
			}
		}
	}

	fn pin(&mut self, id: &str, x: f64, y: f64) {
		if let Some(body) = self.body_mut(id) {
			body.fixed = Some((x, y));
			body.x = x;
			body.y = y;
		}
	}

	fn unpin(&mut self, id: &str) {
		if let Some(body) = self.body_mut(id) {
			body.fixed = None;
		}
	}

	fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.index.get(id).map(|&i| (self.bodies[i].x, self.bodies[i].y))
	}

	fn place(&mut self, id: &str, x: f64, y: f64) {
		if let Some(body) = self.body_mut(id) {
			if body.fixed.is_none() {
				body.x = x;
				body.y = y;
			}
		}
	}

	fn is_active(&self) -> bool {
		self.alpha >= self.params.alpha_min || self.alpha_target >= self.params.alpha_min
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn body(id: &str, x: f64, y: f64) -> BodySpec {
		BodySpec {
			id: id.into(),
			x,
			y,
			collision_radius: 10.0,
			charge: 0.0,
		}
	}

	fn velocity(sim: &ForceSimulation, id: &str) -> Option<(f64, f64)> {
		sim.index.get(id).map(|&i| (sim.bodies[i].vx, sim.bodies[i].vy))
	}

	fn distance(sim: &ForceSimulation, a: &str, b: &str) -> f64 {
		let (ax, ay) = sim.position(a).unwrap();
		let (bx, by) = sim.position(b).unwrap();
		((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
	}

	#[test]
	fn pinned_body_does_not_move() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0), body("b", 5.0, 0.0)]);
		sim.pin("a", 0.0, 0.0);
		for _ in 0..50 {
			sim.step();
		}
		assert_eq!(sim.position("a"), Some((0.0, 0.0)));
		assert!(distance(&sim, "a", "b") > 5.0);
	}

	#[test]
	fn link_relaxes_toward_target_distance() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0), body("b", 400.0, 0.0)]);
		sim.set_links(&[LinkSpec {
			source: "a".into(),
			target: "b".into(),
			distance: 100.0,
		}]);
		sim.pin("a", 0.0, 0.0);
		for _ in 0..300 {
			sim.step();
		}
		let d = distance(&sim, "a", "b");
		assert!((d - 100.0).abs() < 10.0, "settled at {d}");
	}

	#[test]
	fn collision_separates_overlapping_bodies() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0), body("b", 2.0, 0.0)]);
		for _ in 0..100 {
			sim.step();
		}
		assert!(distance(&sim, "a", "b") >= 19.0);
	}

	#[test]
	fn coincident_bodies_are_separated_deterministically() {
		let run = || {
			let mut sim = ForceSimulation::new(ForceParameters::default());
			sim.set_nodes(&[body("a", 10.0, 10.0), body("b", 10.0, 10.0)]);
			for _ in 0..20 {
				sim.step();
			}
			(sim.position("a").unwrap(), sim.position("b").unwrap())
		};
		let (first, second) = (run(), run());
		assert_eq!(first, second);
		assert_ne!(first.0, first.1);
	}

	#[test]
	fn energy_decays_until_inactive_and_reheat_restarts() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0)]);
		for _ in 0..500 {
			sim.step();
		}
		assert!(!sim.is_active());
		sim.reheat(0.3);
		assert!(sim.is_active());
		assert_eq!(sim.alpha, 0.3);
		sim.reheat(0.1);
		assert_eq!(sim.alpha, 0.3);
	}

	#[test]
	fn alpha_target_keeps_simulation_warm() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0)]);
		sim.set_alpha_target(0.3);
		for _ in 0..500 {
			sim.step();
		}
		assert!((sim.alpha - 0.3).abs() < 0.01);
		assert!(sim.is_active());
	}

	#[test]
	fn set_nodes_preserves_existing_state_and_drops_missing() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0), body("b", 50.0, 0.0)]);
		sim.set_links(&[LinkSpec {
			source: "a".into(),
			target: "b".into(),
			distance: 100.0,
		}]);
		sim.step();
		let moved = sim.position("b").unwrap();
		let before = velocity(&sim, "b").unwrap();

		sim.set_nodes(&[body("b", 999.0, 999.0), body("c", 1.0, 2.0)]);
		assert_eq!(sim.position("b"), Some(moved));
		assert_eq!(velocity(&sim, "b"), Some(before));
		assert_eq!(sim.position("c"), Some((1.0, 2.0)));
		assert_eq!(sim.position("a"), None);
		assert_eq!(sim.bodies.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
	}

	#[test]
	fn place_moves_free_bodies_only() {
		let mut sim = ForceSimulation::new(ForceParameters::default());
		sim.set_nodes(&[body("a", 0.0, 0.0), body("b", 0.0, 0.0)]);
		sim.pin("a", 1.0, 1.0);
		sim.place("a", 50.0, 50.0);
		sim.place("b", 50.0, 50.0);
		assert_eq!(sim.position("a"), Some((1.0, 1.0)));
		assert_eq!(sim.position("b"), Some((50.0, 50.0)));
		sim.unpin("a");
		sim.place("a", 7.0, 7.0);
		assert_eq!(sim.position("a"), Some((7.0, 7.0)));
	}
}
