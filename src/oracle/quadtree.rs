use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 14;

#[derive(Clone, Copy)]
struct QuadBounds {
    center: Vec2,
    half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span_x.max(span_y) * 0.5) + 1.0,
        })
    }

    fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }
}

/// Barnes-Hut quadtree over a point set; each cell keeps its centre of mass.
pub(super) struct QuadNode {
    bounds: QuadBounds,
    center_of_mass: Vec2,
    mass: f32,
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mut center_of_mass = Vec2::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }

        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(positions[index])].push(index);
        }

        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Accumulates `strength * mass / distance` repulsion on `index`,
    /// approximating far cells by their centre of mass.
    pub(super) fn accumulate_repulsion(
        &self,
        index: usize,
        positions: &[Vec2],
        strength: f32,
        theta: f32,
        force: &mut Vec2,
    ) {
        if self.mass <= 0.0 {
            return;
        }

        let point = positions[index];

        if self.is_leaf() {
            for &other in &self.indices {
                if other != index {
                    *force += repulsion(point, positions[other], strength, 1.0, index, other);
                }
            }
            return;
        }

        let delta = point - self.center_of_mass;
        let distance = delta.length().max(0.01);
        let can_approximate = !self.bounds.contains(point)
            && (self.bounds.half_extent * 2.0 / distance) < theta
            && self.mass > 1.0;

        if can_approximate {
            *force += delta / distance * (strength * self.mass / distance);
            return;
        }

        for child in self.children.iter().flatten() {
            child.accumulate_repulsion(index, positions, strength, theta, force);
        }
    }
}

fn repulsion(point: Vec2, other: Vec2, strength: f32, mass: f32, a: usize, b: usize) -> Vec2 {
    let delta = point - other;
    let distance = delta.length();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    };
    direction * (strength * mass / distance.max(0.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximation_matches_direct_sum_for_far_cluster() {
        let mut positions = vec![vec2(0.0, 0.0)];
        for i in 0..40 {
            positions.push(vec2(1000.0 + (i % 7) as f32, 1000.0 + (i / 7) as f32));
        }

        let tree = QuadNode::build(&positions).unwrap();
        let mut approx = Vec2::ZERO;
        tree.accumulate_repulsion(0, &positions, 100.0, 0.9, &mut approx);

        let mut direct = Vec2::ZERO;
        for other in 1..positions.len() {
            direct += repulsion(positions[0], positions[other], 100.0, 1.0, 0, other);
        }

        assert!((approx - direct).length() / direct.length() < 0.05);
        assert!(approx.x < 0.0 && approx.y < 0.0);
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(QuadNode::build(&[]).is_none());
    }
}
