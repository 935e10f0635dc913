use indexmap::IndexMap;

use crate::geometry::{Bounds, Point};
use crate::ir::StateShape;

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub rx: f32,
    pub ry: f32,
    pub shape: StateShape,
    /// Bold first line (the state id) followed by the label lines.
    pub title: String,
    pub lines: Vec<String>,
    pub level: usize,
    pub is_start: bool,
    pub is_final: bool,
    /// The position came from a manual drag override.
    pub pinned: bool,
}

impl NodeLayout {
    pub fn center(&self) -> Point {
        (self.x, self.y)
    }
}

/// Which of several parallel edges between one unordered pair this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    pub index: usize,
    pub count: usize,
}

impl Lane {
    /// Signed distance from the middle lane, in lane steps.
    pub fn centered(&self) -> f32 {
        self.index as f32 - (self.count.max(1) as f32 - 1.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Side facing the vector `(dx, dy)`; ties prefer the horizontal sides.
    pub fn facing(dx: f32, dy: f32) -> Self {
        if dx.abs() >= dy.abs() {
            if dx >= 0.0 { Side::Right } else { Side::Left }
        } else if dy >= 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    pub fn outward_normal(self) -> Point {
        match self {
            Side::Right => (1.0, 0.0),
            Side::Left => (-1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub side: Side,
    /// Index into the fixed slot pool (0 = center, 1 = -offset, 2 = +offset).
    pub slot: usize,
    /// Extra displacement for overflow ports, as a fraction of the side.
    pub nudge: f32,
    pub point: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgePath {
    SelfLoop {
        center: Point,
        radius: f32,
    },
    Curve {
        start: Point,
        control: Point,
        end: Point,
    },
    Orthogonal {
        /// Port, elbow, elbow, arrow tip.
        points: [Point; 4],
        corner_radius: f32,
        from_port: Port,
        to_port: Port,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub dir: Point,
}

#[derive(Debug, Clone)]
pub struct EdgeLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub symbols: Vec<String>,
    pub lane: Lane,
    pub path: EdgePath,
    pub arrow: ArrowHead,
    pub label: EdgeLabel,
}

impl EdgeLayout {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Fixed decoration pointing into the start state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartArrow {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone)]
pub struct Layout {
    /// Nodes in state declaration order.
    pub nodes: IndexMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub levels: Vec<Vec<String>>,
    pub world_width: f32,
    pub start_arrow: Option<StartArrow>,
}

impl Layout {
    /// Bounding box of all node shapes (labels and edges excluded).
    pub fn content_bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for node in self.nodes.values() {
            bounds.include_box(node.center(), node.rx, node.ry);
        }
        bounds
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeLayout> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
    }
}
