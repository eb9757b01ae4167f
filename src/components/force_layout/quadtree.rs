//! Barnes-Hut quadtree over node positions.
//!
//! Rebuilt from scratch each tick. Cells aggregate a signed value total and
//! a magnitude-weighted centroid so distant regions can act on a node as a
//! single supernode when they pass the theta criterion (cell width over
//! distance below theta). The same structure answers radius queries for
//! collision candidates and pointer hit-testing.

/// Splitting stops here; coincident points share a leaf.
const MAX_DEPTH: usize = 24;

/// Squared minimum interaction distance. Closer pairs are softened by the
/// geometric mean of the floor and the true distance, which bounds the
/// force without introducing a discontinuity.
const DISTANCE_MIN2: f64 = 1.0;

/// One indexed point with the signed value it contributes to force queries.
#[derive(Clone, Copy, Debug)]
pub struct Point {
	pub x: f64,
	pub y: f64,
	pub value: f64,
}

#[derive(Clone, Debug)]
enum Children {
	Internal([Option<usize>; 4]),
	Leaf(Vec<usize>),
}

#[derive(Clone, Debug)]
struct Cell {
	cx: f64,
	cy: f64,
	half: f64,
	children: Children,
	/// Signed sum of point values in this subtree.
	value: f64,
	/// Sum of absolute point values, the centroid weighting.
	weight: f64,
	x: f64,
	y: f64,
}

impl Cell {
	fn leaf(cx: f64, cy: f64, half: f64) -> Self {
		Self {
			cx,
			cy,
			half,
			children: Children::Leaf(Vec::new()),
			value: 0.0,
			weight: 0.0,
			x: 0.0,
			y: 0.0,
		}
	}
}

/// A quadtree snapshot of point positions. Index `i` in the input slice is
/// index `i` in every query result.
#[derive(Clone, Debug, Default)]
pub struct QuadTree {
	cells: Vec<Cell>,
	points: Vec<Point>,
}

impl QuadTree {
	/// Build the tree and aggregate cell values bottom-up.
	pub fn build(points: &[Point]) -> Self {
		if points.is_empty() {
			return Self::default();
		}

		let mut min_x = f64::INFINITY;
		let mut max_x = f64::NEG_INFINITY;
		let mut min_y = f64::INFINITY;
		let mut max_y = f64::NEG_INFINITY;
		for p in points {
			min_x = min_x.min(p.x);
			max_x = max_x.max(p.x);
			min_y = min_y.min(p.y);
			max_y = max_y.max(p.y);
		}
		let cx = (min_x + max_x) / 2.0;
		let cy = (min_y + max_y) / 2.0;
		let half = ((max_x - min_x).max(max_y - min_y) / 2.0).max(0.5);

		let mut tree = Self {
			cells: vec![Cell::leaf(cx, cy, half)],
			points: points.to_vec(),
		};
		for i in 0..points.len() {
			tree.insert(0, i, 0);
		}
		tree.aggregate(0);
		tree
	}

	fn insert(&mut self, cell: usize, point: usize, depth: usize) {
		match &mut self.cells[cell].children {
			Children::Leaf(items) => {
				items.push(point);
				if items.len() < 2 || depth >= MAX_DEPTH {
					return;
				}
				let items = std::mem::take(items);
				let first = self.points[items[0]];
				if items
					.iter()
					.all(|&i| self.points[i].x == first.x && self.points[i].y == first.y)
				{
					self.cells[cell].children = Children::Leaf(items);
					return;
				}
				self.cells[cell].children = Children::Internal([None; 4]);
				for item in items {
					self.insert_child(cell, item, depth);
				}
			}
			Children::Internal(_) => self.insert_child(cell, point, depth),
		}
	}

	fn insert_child(&mut self, cell: usize, point: usize, depth: usize) {
		let p = self.points[point];
		let (cx, cy, half) = {
			let c = &self.cells[cell];
			(c.cx, c.cy, c.half)
		};
		let right = p.x >= cx;
		let below = p.y >= cy;
		let quadrant = (below as usize) << 1 | right as usize;

		let child = {
			let Children::Internal(kids) = &self.cells[cell].children else {
				unreachable!("insert_child on a leaf");
			};
			kids[quadrant]
		};
		let child = match child {
			Some(i) => i,
			None => {
				let q = half / 2.0;
				let ccx = if right { cx + q } else { cx - q };
				let ccy = if below { cy + q } else { cy - q };
				let i = self.cells.len();
				self.cells.push(Cell::leaf(ccx, ccy, q));
				let Children::Internal(kids) = &mut self.cells[cell].children else {
					unreachable!("insert_child on a leaf");
				};
				kids[quadrant] = Some(i);
				i
			}
		};
		self.insert(child, point, depth + 1);
	}

	fn aggregate(&mut self, cell: usize) {
		match self.cells[cell].children.clone() {
			Children::Leaf(items) => {
				let mut value = 0.0;
				for &i in &items {
					value += self.points[i].value;
				}
				let c = &mut self.cells[cell];
				c.value = value;
				c.weight = value.abs().max(if items.is_empty() { 0.0 } else { f64::MIN_POSITIVE });
				if let Some(&first) = items.first() {
					c.x = self.points[first].x;
					c.y = self.points[first].y;
				}
			}
			Children::Internal(kids) => {
				let mut value = 0.0;
				let mut weight = 0.0;
				let mut x = 0.0;
				let mut y = 0.0;
				for child in kids.into_iter().flatten() {
					self.aggregate(child);
					let c = &self.cells[child];
					let w = c.weight;
					if w > 0.0 {
						value += c.value;
						weight += w;
						x += w * c.x;
						y += w * c.y;
					}
				}
				let c = &mut self.cells[cell];
				c.value = value;
				c.weight = weight;
				if weight > 0.0 {
					c.x = x / weight;
					c.y = y / weight;
				}
			}
		}
	}

	/// Accumulated force on the point at `(x, y)`, skipping index `skip`.
	///
	/// Contribution per point (or per supernode, when the cell passes the
	/// theta test) is `d * value / |d|^2`, so magnitude falls off as `1/r`.
	/// Coincident pairs are nudged apart with `jiggle` before dividing.
	pub fn accumulate_force(
		&self,
		skip: usize,
		x: f64,
		y: f64,
		theta: f64,
		jiggle: &mut impl FnMut() -> f64,
	) -> (f64, f64) {
		let theta2 = theta * theta;
		let mut fx = 0.0;
		let mut fy = 0.0;
		let mut stack = if self.cells.is_empty() { vec![] } else { vec![0] };

		while let Some(ci) = stack.pop() {
			let cell = &self.cells[ci];
			if cell.weight == 0.0 {
				continue;
			}
			let mut dx = cell.x - x;
			let mut dy = cell.y - y;
			let mut l = dx * dx + dy * dy;
			let width = cell.half * 2.0;

			if width * width < theta2 * l {
				if dx == 0.0 {
					dx = jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = jiggle();
					l += dy * dy;
				}
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				fx += dx * cell.value / l;
				fy += dy * cell.value / l;
				continue;
			}

			match &cell.children {
				Children::Internal(kids) => {
					stack.extend(kids.iter().flatten().copied());
				}
				Children::Leaf(items) => {
					for &pi in items {
						if pi == skip {
							continue;
						}
						let p = self.points[pi];
						let mut dx = p.x - x;
						let mut dy = p.y - y;
						let mut l = dx * dx + dy * dy;
						if dx == 0.0 {
							dx = jiggle();
							l += dx * dx;
						}
						if dy == 0.0 {
							dy = jiggle();
							l += dy * dy;
						}
						if l < DISTANCE_MIN2 {
							l = (DISTANCE_MIN2 * l).sqrt();
						}
						fx += dx * p.value / l;
						fy += dy * p.value / l;
					}
				}
			}
		}
		(fx, fy)
	}

	/// Indices of all points within `radius` of `(x, y)`, pruning whole
	/// cells whose square cannot intersect the query circle.
	pub fn neighbors_within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
		let mut found = Vec::new();
		if self.cells.is_empty() || radius < 0.0 {
			return found;
		}
		let r2 = radius * radius;
		let mut stack = vec![0];
		while let Some(ci) = stack.pop() {
			let cell = &self.cells[ci];
			if (x - cell.cx).abs() > cell.half + radius
				|| (y - cell.cy).abs() > cell.half + radius
			{
				continue;
			}
			match &cell.children {
				Children::Internal(kids) => stack.extend(kids.iter().flatten().copied()),
				Children::Leaf(items) => {
					for &pi in items {
						let p = self.points[pi];
						let (dx, dy) = (p.x - x, p.y - y);
						if dx * dx + dy * dy <= r2 {
							found.push(pi);
						}
					}
				}
			}
		}
		found
	}
}
