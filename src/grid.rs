//! Discretized navigation grid shared by every agent.
//!
//! The continuous town map is overlaid with a uniform lattice of square
//! cells. Buildings make cells unwalkable, water raises their traversal
//! cost, and a pair of arterial roads through the map center (plus the
//! plaza) lower it so paths prefer roads over open ground.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    walkable: bool,
    cost: f64,
}

const WATER_COST: f64 = 5.0;
const ROAD_COST: f64 = 0.5;
const PLAZA_COST: f64 = 0.3;
/// Waypoints closer to collinear than this cosine are dropped when smoothing.
const SMOOTH_COS_THRESHOLD: f64 = 0.9;
const NEARBY_SAMPLE_ATTEMPTS: u32 = 20;

struct SearchNode {
    x: usize,
    y: usize,
    g: f64,
    f: f64,
    parent: Option<usize>,
}

/// Walkability/cost grid with weighted A* path queries.
///
/// Obstacles are applied wholesale via [`NavGrid::update_obstacles`]; path
/// queries only read the grid, so one instance can serve every agent in a
/// tick.
pub struct NavGrid {
    width: usize,
    height: usize,
    cell_size: f64,
    world_width: f64,
    world_height: f64,
    cells: Vec<Cell>,
}

impl NavGrid {
    /// Builds a fully walkable grid of `floor(w / cell) x floor(h / cell)`
    /// cells, cost 1 everywhere.
    pub fn new(world_width: f64, world_height: f64, cell_size: f64) -> Self {
        let width = (world_width / cell_size).floor() as usize;
        let height = (world_height / cell_size).floor() as usize;
        Self {
            width,
            height,
            cell_size,
            world_width,
            world_height,
            cells: vec![
                Cell {
                    walkable: true,
                    cost: 1.0,
                };
                width * height
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Replaces all obstacle state. Buildings become unwalkable, water
    /// cells cost [`WATER_COST`], then the road/plaza discounts apply.
    pub fn update_obstacles(&mut self, buildings: &[Rect], water: &[Rect]) {
        for cell in &mut self.cells {
            cell.walkable = true;
            cell.cost = 1.0;
        }

        for rect in buildings {
            self.for_each_covered(rect, |cell| cell.walkable = false);
        }

        for rect in water {
            self.for_each_covered(rect, |cell| {
                if cell.walkable {
                    cell.cost = WATER_COST;
                }
            });
        }

        self.mark_preferred_routes();
    }

    /// Two arterial roads crossing at the map center, and the plaza around
    /// it, get discounted costs so agents keep to them.
    fn mark_preferred_routes(&mut self) {
        let road_row = ((self.world_height / 2.0) / self.cell_size).floor() as usize;
        if road_row < self.height {
            for x in 0..self.width {
                let cell = &mut self.cells[road_row * self.width + x];
                if cell.walkable {
                    cell.cost = ROAD_COST;
                }
            }
        }

        let road_col = ((self.world_width / 2.0) / self.cell_size).floor() as usize;
        if road_col < self.width {
            for y in 0..self.height {
                let cell = &mut self.cells[y * self.width + road_col];
                if cell.walkable {
                    cell.cost = ROAD_COST;
                }
            }
        }

        let plaza = Rect::new(
            self.world_width / 2.0 - 80.0,
            self.world_height / 2.0 - 60.0,
            160.0,
            120.0,
        );
        self.for_each_covered(&plaza, |cell| {
            if cell.walkable {
                cell.cost = PLAZA_COST;
            }
        });
    }

    fn for_each_covered(&mut self, rect: &Rect, mut apply: impl FnMut(&mut Cell)) {
        let start_x = (rect.x / self.cell_size).floor().max(0.0) as usize;
        let start_y = (rect.y / self.cell_size).floor().max(0.0) as usize;
        let end_x = (((rect.x + rect.width) / self.cell_size).floor() as usize)
            .min(self.width.saturating_sub(1));
        let end_y = (((rect.y + rect.height) / self.cell_size).floor() as usize)
            .min(self.height.saturating_sub(1));
        for y in start_y..=end_y {
            for x in start_x..=end_x {
                apply(&mut self.cells[y * self.width + x]);
            }
        }
    }

    fn world_to_cell(&self, p: Point) -> Option<(usize, usize)> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let x = (p.x / self.cell_size).floor() as usize;
        let y = (p.y / self.cell_size).floor() as usize;
        if x < self.width && y < self.height {
            Some((x, y))
        } else {
            None
        }
    }

    fn cell_center(&self, x: usize, y: usize) -> Point {
        Point::new(
            x as f64 * self.cell_size + self.cell_size / 2.0,
            y as f64 * self.cell_size + self.cell_size / 2.0,
        )
    }

    fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[y * self.width + x]
    }

    pub fn is_walkable(&self, p: Point) -> bool {
        self.world_to_cell(p)
            .map(|(x, y)| self.cell(x, y).walkable)
            .unwrap_or(false)
    }

    /// Weighted A* between two world points. Fails closed: an endpoint off
    /// the grid or on an unwalkable cell yields an empty path, as does an
    /// exhausted search.
    ///
    /// The heuristic is grid Manhattan distance. Road cells cost less than
    /// one step, so the heuristic is not strictly admissible there; paths
    /// may be slightly suboptimal along discounts. Kept on purpose: the
    /// grids are small and the bias toward roads is the desired behavior.
    pub fn find_path(&self, start: Point, goal: Point) -> Vec<Point> {
        let (start_x, start_y) = match self.world_to_cell(start) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let (goal_x, goal_y) = match self.world_to_cell(goal) {
            Some(c) => c,
            None => return Vec::new(),
        };
        if !self.cell(start_x, start_y).walkable || !self.cell(goal_x, goal_y).walkable {
            return Vec::new();
        }

        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut closed = vec![false; self.width * self.height];

        let h0 = manhattan(start_x, start_y, goal_x, goal_y);
        nodes.push(SearchNode {
            x: start_x,
            y: start_y,
            g: 0.0,
            f: h0,
            parent: None,
        });
        open.push(0);

        while !open.is_empty() {
            // Stable sort keeps insertion order on equal f, so ties break
            // toward the earliest-discovered node.
            open.sort_by(|&a, &b| {
                nodes[a]
                    .f
                    .partial_cmp(&nodes[b].f)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let current = open.remove(0);
            let (cx, cy) = (nodes[current].x, nodes[current].y);

            if closed[cy * self.width + cx] {
                continue;
            }
            closed[cy * self.width + cx] = true;

            if cx == goal_x && cy == goal_y {
                return self.reconstruct(&nodes, current);
            }

            for (nx, ny) in self.neighbors(cx, cy) {
                if closed[ny * self.width + nx] {
                    continue;
                }
                // Diagonal steps cost the same as cardinal ones; the cost
                // model is purely cell-based.
                let tentative_g = nodes[current].g + self.cell(nx, ny).cost;

                let existing = open
                    .iter()
                    .copied()
                    .find(|&i| nodes[i].x == nx && nodes[i].y == ny);
                if let Some(i) = existing {
                    if tentative_g >= nodes[i].g {
                        continue;
                    }
                    nodes[i].g = tentative_g;
                    nodes[i].f = tentative_g + manhattan(nx, ny, goal_x, goal_y);
                    nodes[i].parent = Some(current);
                } else {
                    nodes.push(SearchNode {
                        x: nx,
                        y: ny,
                        g: tentative_g,
                        f: tentative_g + manhattan(nx, ny, goal_x, goal_y),
                        parent: Some(current),
                    });
                    open.push(nodes.len() - 1);
                }
            }
        }

        Vec::new()
    }

    fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        const DIRS: [(i64, i64); 8] = [
            (0, -1),
            (1, 0),
            (0, 1),
            (-1, 0),
            (1, -1),
            (1, 1),
            (-1, 1),
            (-1, -1),
        ];
        let mut out = Vec::with_capacity(8);
        for (dx, dy) in DIRS {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if self.cell(nx, ny).walkable {
                out.push((nx, ny));
            }
        }
        out
    }

    fn reconstruct(&self, nodes: &[SearchNode], mut current: usize) -> Vec<Point> {
        let mut path = Vec::new();
        loop {
            let node = &nodes[current];
            path.push(self.cell_center(node.x, node.y));
            match node.parent {
                Some(p) => current = p,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Drops essentially-collinear interior waypoints so movement along the
    /// path looks natural. Paths of length <= 2 come back unchanged.
    pub fn smooth_path(&self, path: Vec<Point>) -> Vec<Point> {
        if path.len() <= 2 {
            return path;
        }
        let mut smoothed = vec![path[0]];
        for i in 1..path.len() - 1 {
            let prev = path[i - 1];
            let here = path[i];
            let next = path[i + 1];
            let d1 = (here.x - prev.x, here.y - prev.y);
            let d2 = (next.x - here.x, next.y - here.y);
            let mag1 = (d1.0 * d1.0 + d1.1 * d1.1).sqrt();
            let mag2 = (d2.0 * d2.0 + d2.1 * d2.1).sqrt();
            if mag1 > 0.0 && mag2 > 0.0 {
                let cos = (d1.0 * d2.0 + d1.1 * d2.1) / (mag1 * mag2);
                if cos < SMOOTH_COS_THRESHOLD {
                    smoothed.push(here);
                }
            }
        }
        smoothed.push(path[path.len() - 1]);
        smoothed
    }

    /// Uniformly samples up to 20 points within `radius` of `target` and
    /// returns the first one on a walkable cell.
    pub fn random_nearby(&self, rng: &mut impl Rng, target: Point, radius: f64) -> Option<Point> {
        for _ in 0..NEARBY_SAMPLE_ATTEMPTS {
            let angle = rng.gen::<f64>() * std::f64::consts::TAU;
            let distance = rng.gen::<f64>() * radius;
            let candidate = Point::new(
                target.x + angle.cos() * distance,
                target.y + angle.sin() * distance,
            );
            if self.is_walkable(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

fn manhattan(x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
    (x1.abs_diff(x2) + y1.abs_diff(y2)) as f64
}
