//! Force simulation engine driving node positions.
//!
//! One `step()` per animation frame while the phase is `Running`. Each tick
//! applies, in fixed order: link springs, charge repulsion through the
//! Barnes-Hut tree, collision resolution against resolved radii, radial
//! gravity toward the origin, and centroid centering, then integrates
//! velocities with damping. Alpha cools on the standard d3 schedule and the
//! phase flips to `Settled` once it falls below [`ALPHA_MIN`].
//!
//! Reconfiguration is staged: a new [`LayoutConfig`] swaps in at the top of
//! the next `step()`, never mid-tick, and resets alpha to the configured
//! energy.

use super::config::LayoutConfig;
use super::graph::Graph;
use super::quadtree::{Point, QuadTree};

/// Alpha threshold below which the layout counts as settled.
const ALPHA_MIN: f64 = 0.001;

/// Velocity multiplier applied during integration.
const VELOCITY_DECAY: f64 = 0.6;

/// Offset substituted for an exactly-zero coordinate in the gravity pull.
const MIN_OFFSET: f64 = 1e-6;

/// Per-tick alpha decay rate, tuned so cooling from 1 crosses
/// [`ALPHA_MIN`] after roughly 300 ticks.
fn alpha_decay() -> f64 {
	1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// Where the simulation is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Layout disabled; positions are static.
	Idle,
	/// Ticking and cooling.
	Running,
	/// Alpha fell below the minimum; positions are final until reheated.
	Settled,
}

/// d3's linear congruential generator. Reseeded per graph so repeated runs
/// of the same payload produce identical layouts.
#[derive(Clone, Debug)]
struct Lcg {
	state: u32,
}

impl Lcg {
	fn new() -> Self {
		Self { state: 1 }
	}

	fn next(&mut self) -> f64 {
		self.state = self
			.state
			.wrapping_mul(1_664_525)
			.wrapping_add(1_013_904_223);
		f64::from(self.state) / 4_294_967_296.0
	}

	/// Tiny deterministic offset for breaking exact coincidence.
	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

/// Precomputed per-link spring parameters.
#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	/// `weight / min(degree)`, scaled by the configured link strength at
	/// tick time so reconfiguration needs no rebuild.
	strength: f64,
	/// Rest length `(sqrt(deg_s) + sqrt(deg_t)) / weight`.
	distance: f64,
	/// Share of each correction absorbed by the target endpoint; the
	/// better-connected end moves less.
	bias: f64,
}

/// The simulation: config, cooling state and per-link spring table.
///
/// Owns no node data. `step()` mutates positions and velocities on the
/// [`Graph`] it is handed, which stays with the component.
#[derive(Clone, Debug)]
pub struct Simulation {
	config: LayoutConfig,
	pending: Option<LayoutConfig>,
	alpha: f64,
	phase: Phase,
	rng: Lcg,
	springs: Vec<Spring>,
}

impl Simulation {
	pub fn new(config: LayoutConfig) -> Self {
		let mut sim = Self {
			config: LayoutConfig::default(),
			pending: None,
			alpha: 0.0,
			phase: Phase::Idle,
			rng: Lcg::new(),
			springs: Vec::new(),
		};
		sim.apply(config);
		sim
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Stage a config snapshot; it takes effect at the next `step()`.
	pub fn reconfigure(&mut self, config: LayoutConfig) {
		self.pending = Some(config);
	}

	/// Restart the cooling schedule from the configured energy. Used when a
	/// drag disturbs a settled layout.
	pub fn reheat(&mut self) {
		let config = self.config.clone();
		self.apply(config);
	}

	/// Rebuild the spring table for a freshly parsed graph and restart the
	/// run from the configured energy.
	pub fn bind(&mut self, graph: &Graph) {
		let mut counts = vec![0.0_f64; graph.len()];
		for link in &graph.links {
			counts[link.source] += 1.0;
			counts[link.target] += 1.0;
		}
		self.springs = graph
			.links
			.iter()
			.map(|link| {
				let ds = graph.nodes[link.source].degree;
				let dt = graph.nodes[link.target].degree;
				Spring {
					source: link.source,
					target: link.target,
					strength: link.weight / ds.min(dt),
					distance: (ds.sqrt() + dt.sqrt()) / link.weight,
					bias: counts[link.source]
						/ (counts[link.source] + counts[link.target]),
				}
			})
			.collect();
		self.rng = Lcg::new();
		let config = self.config.clone();
		self.apply(config);
	}

	fn apply(&mut self, config: LayoutConfig) {
		self.alpha = config.energy;
		self.phase = if !config.run_layout {
			Phase::Idle
		} else if self.alpha < ALPHA_MIN {
			Phase::Settled
		} else {
			Phase::Running
		};
		self.config = config;
	}

	/// Advance one tick. `radii` are the resolved per-node radii feeding
	/// collision; a zero-strength knob disables its force entirely. Returns
	/// whether positions may have changed.
	pub fn step(&mut self, graph: &mut Graph, radii: &[f64]) -> bool {
		if let Some(next) = self.pending.take() {
			self.apply(next);
		}
		if self.phase != Phase::Running {
			return false;
		}
		if graph.len() <= 1 {
			self.phase = Phase::Settled;
			return false;
		}

		self.alpha -= self.alpha * alpha_decay();
		let alpha = self.alpha;
		let cfg = self.config.clone();
		let mut jiggle = {
			let rng = &mut self.rng;
			move || rng.jiggle()
		};

		if cfg.link_strength > 0.0 {
			for spring in &self.springs {
				let (s, t) = (spring.source, spring.target);
				let mut dx = graph.nodes[t].x + graph.nodes[t].vx
					- graph.nodes[s].x - graph.nodes[s].vx;
				let mut dy = graph.nodes[t].y + graph.nodes[t].vy
					- graph.nodes[s].y - graph.nodes[s].vy;
				if dx == 0.0 {
					dx = jiggle();
				}
				if dy == 0.0 {
					dy = jiggle();
				}
				let len = (dx * dx + dy * dy).sqrt();
				let k = (len - spring.distance) / len
					* alpha * cfg.link_strength
					* spring.strength;
				dx *= k;
				dy *= k;
				graph.nodes[t].vx -= dx * spring.bias;
				graph.nodes[t].vy -= dy * spring.bias;
				graph.nodes[s].vx += dx * (1.0 - spring.bias);
				graph.nodes[s].vy += dy * (1.0 - spring.bias);
			}
		}

		if cfg.charge_strength > 0.0 {
			let points: Vec<Point> = graph
				.nodes
				.iter()
				.map(|n| Point {
					x: n.x,
					y: n.y,
					value: -cfg.charge_strength,
				})
				.collect();
			let tree = QuadTree::build(&points);
			for (i, node) in graph.nodes.iter_mut().enumerate() {
				let (fx, fy) = tree.accumulate_force(
					i,
					node.x,
					node.y,
					cfg.charge_approximation,
					&mut jiggle,
				);
				node.vx += fx * alpha;
				node.vy += fy * alpha;
			}
		}

		if cfg.collide_strength > 0.0 && radii.len() == graph.len() {
			// Overlap is tested at the position each node is about to
			// occupy, so one pass resolves most of the frame's contacts.
			let predicted: Vec<Point> = graph
				.nodes
				.iter()
				.map(|n| Point {
					x: n.x + n.vx,
					y: n.y + n.vy,
					value: 1.0,
				})
				.collect();
			let tree = QuadTree::build(&predicted);
			let max_radius = radii.iter().copied().fold(0.0_f64, f64::max);
			for i in 0..graph.len() {
				let pi = predicted[i];
				let ri = radii[i];
				for j in tree.neighbors_within(pi.x, pi.y, ri + max_radius) {
					// Each pair resolves once, from its lower index.
					if j <= i {
						continue;
					}
					let pj = predicted[j];
					let rj = radii[j];
					let sum = ri + rj;
					let mut dx = pi.x - pj.x;
					let mut dy = pi.y - pj.y;
					let mut l = dx * dx + dy * dy;
					if l >= sum * sum {
						continue;
					}
					if dx == 0.0 {
						dx = jiggle();
						l += dx * dx;
					}
					if dy == 0.0 {
						dy = jiggle();
						l += dy * dy;
					}
					l = l.sqrt();
					let push = (sum - l) / l * cfg.collide_strength;
					dx *= push;
					dy *= push;
					let rj2 = rj * rj;
					let share = rj2 / (ri * ri + rj2);
					graph.nodes[i].vx += dx * share;
					graph.nodes[i].vy += dy * share;
					graph.nodes[j].vx -= dx * (1.0 - share);
					graph.nodes[j].vy -= dy * (1.0 - share);
				}
			}
		}

		if cfg.gravity_strength > 0.0 {
			for node in &mut graph.nodes {
				let dx = if node.x == 0.0 { MIN_OFFSET } else { node.x };
				let dy = if node.y == 0.0 { MIN_OFFSET } else { node.y };
				node.vx -= dx * cfg.gravity_strength * alpha;
				node.vy -= dy * cfg.gravity_strength * alpha;
			}
		}

		if cfg.center_strength > 0.0 {
			let n = graph.len() as f64;
			let (sx, sy) = graph
				.nodes
				.iter()
				.fold((0.0, 0.0), |(x, y), node| (x + node.x, y + node.y));
			let (cx, cy) = (
				sx / n * cfg.center_strength,
				sy / n * cfg.center_strength,
			);
			// Translates positions directly; pinned nodes hold still.
			for node in graph.nodes.iter_mut().filter(|n| !n.fixed) {
				node.x -= cx;
				node.y -= cy;
			}
		}

		for node in &mut graph.nodes {
			if node.fixed {
				node.vx = 0.0;
				node.vy = 0.0;
				continue;
			}
			node.vx *= VELOCITY_DECAY;
			node.vy *= VELOCITY_DECAY;
			node.x += node.vx;
			node.y += node.vy;
		}

		if self.alpha < ALPHA_MIN {
			self.phase = Phase::Settled;
		}
		true
	}
}
