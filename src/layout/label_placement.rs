use crate::config::LabelConfig;
use crate::geometry::{
    CenterRect, Point, normalize, quad_point, quad_tangent, t_for_arc_from_end,
    t_for_arc_from_start,
};
use crate::ir::StateShape;

use super::NodeLayout;

/// A node grown by the label padding.
#[derive(Debug, Clone, Copy)]
struct Obstacle {
    x: f32,
    y: f32,
    rx: f32,
    ry: f32,
    shape: StateShape,
}

/// Places edge labels one at a time, avoiding nodes and earlier labels.
pub(super) struct LabelPlacer<'a> {
    config: &'a LabelConfig,
    obstacles: Vec<Obstacle>,
    placed: Vec<CenterRect>,
}

impl<'a> LabelPlacer<'a> {
    pub(super) fn new<'n>(config: &'a LabelConfig, nodes: impl IntoIterator<Item = &'n NodeLayout>) -> Self {
        let obstacles = nodes
            .into_iter()
            .map(|node| Obstacle {
                x: node.x,
                y: node.y,
                rx: node.rx + config.obstacle_pad,
                ry: node.ry + config.obstacle_pad,
                shape: node.shape,
            })
            .collect();
        Self {
            config,
            obstacles,
            placed: Vec::new(),
        }
    }

    /// Records a label whose position is fixed (self-loops).
    pub(super) fn place_fixed(&mut self, center: Point, width: f32, height: f32) -> Point {
        self.placed.push(CenterRect::new(center, width, height));
        center
    }

    /// Searches along a quadratic curve for a free spot. Falls back to the
    /// midpoint of the allowed range even if it overlaps.
    pub(super) fn place_on_curve(&mut self, p0: Point, p1: Point, p2: Point, width: f32, height: f32) -> Point {
        let cfg = self.config;
        let t_min = cfg.min_edge_t.max(t_for_arc_from_start(cfg.min_arc, p0, p1, p2));
        let t_max = (1.0 - cfg.min_edge_t).min(t_for_arc_from_end(cfg.min_arc, p0, p1, p2));
        let at = |t: f32| -> Point {
            let p = quad_point(t, p0, p1, p2);
            let (tx, ty) = normalize(quad_tangent(t, p0, p1, p2));
            (p.0 - ty * cfg.normal_offset, p.1 + tx * cfg.normal_offset)
        };

        let chosen = ring_candidates(t_min, t_max, cfg.ring_step, cfg.ring_max)
            .into_iter()
            .chain(scan_candidates(t_min, t_max, cfg.scan_step))
            .map(&at)
            .find(|&p| self.fits(p, width, height));

        let center = chosen.unwrap_or_else(|| {
            let fallback = at((t_min + t_max) / 2.0);
            tracing::debug!(x = fallback.0, y = fallback.1, "no free label slot, using midpoint");
            fallback
        });
        self.placed.push(CenterRect::new(center, width, height));
        center
    }

    /// Midpoint of the central orthogonal segment, offset along its normal
    /// and bumped sideways away from nearby nodes.
    pub(super) fn place_orthogonal(&mut self, p1: Point, p2: Point, width: f32, height: f32) -> Point {
        let cfg = self.config;
        let (vx, vy) = normalize((p2.0 - p1.0, p2.1 - p1.1));
        let mut x = (p1.0 + p2.0) / 2.0 - vy * cfg.normal_offset;
        let y = (p1.1 + p2.1) / 2.0 + vx * cfg.normal_offset;
        for ob in &self.obstacles {
            if (x - ob.x).abs() < ob.rx + cfg.ortho_clearance && (y - ob.y).abs() < ob.ry + cfg.ortho_clearance {
                x += if x < ob.x { -cfg.ortho_bump } else { cfg.ortho_bump };
            }
        }
        self.placed.push(CenterRect::new((x, y), width, height));
        (x, y)
    }

    fn fits(&self, center: Point, width: f32, height: f32) -> bool {
        let (x, y) = center;
        let hits_node = self.obstacles.iter().any(|ob| match ob.shape {
            StateShape::Rectangle => {
                (x - ob.x).abs() < ob.rx + width.max(8.0) / 2.0
                    && (y - ob.y).abs() < ob.ry + height.max(8.0) / 2.0
            }
            StateShape::Oval => {
                (x - ob.x).hypot(y - ob.y) < ob.rx.max(ob.ry) + width.max(height) / 2.0
            }
        });
        if hits_node {
            return false;
        }
        let rect = CenterRect::new(center, width, height);
        !self.placed.iter().any(|other| other.intersects(&rect))
    }
}

/// Center of the range, then alternating steps outward, rounded to three
/// decimals. Steps past either bound are skipped.
fn ring_candidates(t_min: f32, t_max: f32, step: f32, max: f32) -> Vec<f32> {
    let center = ((t_min + t_max) / 2.0).min(t_max).max(t_min);
    let mut ring = vec![center];
    if step <= 0.0 {
        return ring;
    }
    let mut k = 1;
    loop {
        let offset = step * k as f32;
        if offset > max + 1e-6 {
            break;
        }
        let below = round3(center - offset);
        let above = round3(center + offset);
        if below >= t_min {
            ring.push(below);
        }
        if above <= t_max {
            ring.push(above);
        }
        k += 1;
    }
    ring
}

fn scan_candidates(t_min: f32, t_max: f32, step: f32) -> Vec<f32> {
    let mut out = Vec::new();
    if step <= 0.0 {
        return out;
    }
    let mut k = 0;
    loop {
        let t = t_min + step * k as f32;
        if t > t_max {
            break;
        }
        out.push(round3(t));
        k += 1;
    }
    out
}

fn round3(t: f32) -> f32 {
    (t * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oval(x: f32, y: f32) -> NodeLayout {
        NodeLayout {
            id: format!("{x},{y}"),
            x,
            y,
            rx: 32.0,
            ry: 22.0,
            shape: StateShape::Oval,
            title: String::new(),
            lines: Vec::new(),
            level: 0,
            is_start: false,
            is_final: false,
            pinned: false,
        }
    }

    #[test]
    fn ring_starts_at_center_and_alternates() {
        let ring = ring_candidates(0.2, 0.8, 0.03, 0.25);
        assert_eq!(ring[0], 0.5);
        assert_eq!(ring[1], 0.47);
        assert_eq!(ring[2], 0.53);
        assert_eq!(ring.len(), 1 + 2 * 8);
    }

    #[test]
    fn ring_respects_narrow_range() {
        let ring = ring_candidates(0.45, 0.55, 0.03, 0.25);
        assert!(ring.iter().all(|t| (0.45..=0.55).contains(t)));
    }

    #[test]
    fn scan_covers_range() {
        let scan = scan_candidates(0.12, 0.31, 0.02);
        assert_eq!(scan.first(), Some(&0.12));
        assert!(scan.iter().all(|t| *t <= 0.31));
        assert_eq!(scan.len(), 10);
    }

    #[test]
    fn second_label_on_same_curve_moves_off_the_first() {
        let config = LabelConfig::default();
        let nodes = [oval(0.0, 0.0), oval(400.0, 0.0)];
        let mut placer = LabelPlacer::new(&config, nodes.iter());
        let (p0, p1, p2) = ((31.0, 0.0), (270.0, -35.0), (369.0, 0.0));
        let first = placer.place_on_curve(p0, p1, p2, 30.0, 16.0);
        let second = placer.place_on_curve(p0, p1, p2, 30.0, 16.0);
        let a = CenterRect::new(first, 30.0, 16.0);
        let b = CenterRect::new(second, 30.0, 16.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn exhausted_search_falls_back_to_range_midpoint() {
        let config = LabelConfig::default();
        let mut wall = oval(200.0, 0.0);
        wall.rx = 4000.0;
        wall.ry = 4000.0;
        let nodes = [wall];
        let mut placer = LabelPlacer::new(&config, nodes.iter());
        let (p0, p1, p2) = ((0.0, 0.0), (200.0, 0.0), (400.0, 0.0));

        let t_min = config.min_edge_t.max(t_for_arc_from_start(config.min_arc, p0, p1, p2));
        let t_max = (1.0 - config.min_edge_t).min(t_for_arc_from_end(config.min_arc, p0, p1, p2));
        let mid = quad_point((t_min + t_max) / 2.0, p0, p1, p2);
        // Straight chord along +x, so the normal offset is straight down.
        let expected = (mid.0, mid.1 + config.normal_offset);

        let placed = placer.place_on_curve(p0, p1, p2, 30.0, 16.0);
        assert!((placed.0 - expected.0).abs() < 1e-3);
        assert!((placed.1 - expected.1).abs() < 1e-3);
        assert!((placed.0 - 200.0).abs() < 1.0);
        assert_eq!(placer.placed.len(), 1);
        assert!(!placer.fits(placed, 30.0, 16.0));
    }

    #[test]
    fn fixed_labels_block_later_ones() {
        let config = LabelConfig::default();
        let nodes: [NodeLayout; 0] = [];
        let mut placer = LabelPlacer::new(&config, nodes.iter());
        placer.place_fixed((100.0, 100.0), 40.0, 16.0);
        assert!(!placer.fits((110.0, 105.0), 40.0, 16.0));
        assert!(placer.fits((200.0, 100.0), 40.0, 16.0));
    }

    #[test]
    fn orthogonal_labels_are_bumped_away_from_nodes() {
        let config = LabelConfig::default();
        let nodes = [oval(100.0, 20.0)];
        let mut placer = LabelPlacer::new(&config, nodes.iter());
        // Segment midpoint (100, 0) + normal offset lands inside the padded node.
        let placed = placer.place_orthogonal((80.0, 0.0), (120.0, 0.0), 30.0, 16.0);
        assert_eq!(placed, (114.0, 10.0));
    }
}
