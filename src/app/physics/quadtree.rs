use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
struct Square {
    min: Vec2,
    side: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let side = (max.x - min.x).max(max.y - min.y).max(1.0) + 1.0;
        Some(Self {
            min: min - vec2(0.5, 0.5),
            side,
        })
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let offset = vec2(
            if quadrant & 1 == 1 { half } else { 0.0 },
            if quadrant & 2 == 2 { half } else { 0.0 },
        );
        Self {
            min: self.min + offset,
            side: half,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        let half = self.side * 0.5;
        let right = usize::from(point.x >= self.min.x + half);
        let lower = usize::from(point.y >= self.min.y + half);
        right | (lower << 1)
    }

    fn contains(self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.x <= self.min.x + self.side
            && point.y <= self.min.y + self.side
    }

    fn distance_sq_to(self, point: Vec2) -> f32 {
        let max = self.min + vec2(self.side, self.side);
        let dx = (self.min.x - point.x).max(point.x - max.x).max(0.0);
        let dy = (self.min.y - point.y).max(point.y - max.y).max(0.0);
        dx * dx + dy * dy
    }
}

struct Cell {
    square: Square,
    centroid: Vec2,
    count: usize,
    points: Vec<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Arena-backed Barnes-Hut quadtree over a snapshot of body positions.
pub(super) struct Quadtree {
    cells: Vec<Cell>,
}

impl Quadtree {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(points)?;
        let mut tree = Self {
            cells: Vec::with_capacity(points.len() / LEAF_CAPACITY * 2 + 1),
        };
        tree.insert_cell(square, (0..points.len()).collect(), points, 0);
        Some(tree)
    }

    fn insert_cell(
        &mut self,
        square: Square,
        points: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> usize {
        let count = points.len();
        let centroid = if count == 0 {
            Vec2::ZERO
        } else {
            points
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / count as f32
        };

        let cell_index = self.cells.len();
        self.cells.push(Cell {
            square,
            centroid,
            count,
            points: Vec::new(),
            children: [None; 4],
        });

        if count <= LEAF_CAPACITY || depth >= MAX_DEPTH {
            self.cells[cell_index].points = points;
            return cell_index;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for index in points {
            buckets[square.quadrant_of(positions[index])].push(index);
        }

        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            self.cells[cell_index].points = buckets.into_iter().flatten().collect();
            return cell_index;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child = self.insert_cell(square.quadrant(quadrant), bucket, positions, depth + 1);
            self.cells[cell_index].children[quadrant] = Some(child);
        }
        cell_index
    }

    /// Many-body velocity contribution on `index`; far cells are approximated by their centroid.
    pub(super) fn charge_on(
        &self,
        index: usize,
        positions: &[Vec2],
        strength: f32,
        theta_sq: f32,
    ) -> Vec2 {
        let point = positions[index];
        let mut total = Vec2::ZERO;
        let mut stack = vec![0usize];

        while let Some(cell_index) = stack.pop() {
            let cell = &self.cells[cell_index];
            if cell.count == 0 {
                continue;
            }

            if cell.is_leaf() {
                for &other in &cell.points {
                    if other == index {
                        continue;
                    }
                    total += pairwise_charge(positions[other] - point, strength, index, other);
                }
                continue;
            }

            let delta = cell.centroid - point;
            let distance_sq = delta.length_sq();
            let far_enough = (cell.square.side * cell.square.side) / theta_sq < distance_sq;
            if far_enough && !cell.square.contains(point) {
                total += pairwise_charge(delta, strength * cell.count as f32, index, cell_index);
                continue;
            }

            stack.extend(cell.children.iter().flatten().copied());
        }

        total
    }

    /// Pushes every body index whose position may lie within `radius` of `point`.
    pub(super) fn candidates_within(&self, point: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        let radius_sq = radius * radius;
        let mut stack = vec![0usize];

        while let Some(cell_index) = stack.pop() {
            let cell = &self.cells[cell_index];
            if cell.count == 0 || cell.square.distance_sq_to(point) > radius_sq {
                continue;
            }
            out.extend_from_slice(&cell.points);
            stack.extend(cell.children.iter().flatten().copied());
        }
    }
}

fn pairwise_charge(delta: Vec2, strength: f32, salt_a: usize, salt_b: usize) -> Vec2 {
    let delta = if delta.length_sq() > 1e-12 {
        delta
    } else {
        jiggle(salt_a, salt_b)
    };
    // Clamp the softening distance so coincident bodies do not explode apart.
    let distance_sq = delta.length_sq().max(1.0);
    delta * (strength / distance_sq)
}

/// Tiny deterministic offset for coincident bodies.
pub(super) fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}
