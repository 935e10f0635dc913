use crate::layout::{EdgePath, Layout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub world_width: f32,
    pub levels: Vec<Vec<String>>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub start_arrow: Option<[[f32; 2]; 2]>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub shape: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub rx: f32,
    pub ry: f32,
    pub title: String,
    pub lines: Vec<String>,
    pub is_start: bool,
    pub is_final: bool,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub symbols: Vec<String>,
    pub kind: &'static str,
    pub lane: usize,
    pub lanes: usize,
    /// Control polygon: loop center, curve (start, control, end) or the
    /// orthogonal polyline.
    pub points: Vec<[f32; 2]>,
    pub arrow_tip: [f32; 2],
    pub label: LabelDump,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                shape: format!("{:?}", node.shape),
                level: node.level,
                x: node.x,
                y: node.y,
                rx: node.rx,
                ry: node.ry,
                title: node.title.clone(),
                lines: node.lines.clone(),
                is_start: node.is_start,
                is_final: node.is_final,
                pinned: node.pinned,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| {
                let (kind, points) = match &edge.path {
                    EdgePath::SelfLoop { center, .. } => ("self_loop", vec![pair(*center)]),
                    EdgePath::Curve {
                        start,
                        control,
                        end,
                    } => ("curve", vec![pair(*start), pair(*control), pair(*end)]),
                    EdgePath::Orthogonal { points, .. } => {
                        ("orthogonal", points.iter().copied().map(pair).collect())
                    }
                };
                EdgeDump {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    symbols: edge.symbols.clone(),
                    kind,
                    lane: edge.lane.index,
                    lanes: edge.lane.count,
                    points,
                    arrow_tip: pair(edge.arrow.tip),
                    label: LabelDump {
                        text: edge.label.text.clone(),
                        x: edge.label.x,
                        y: edge.label.y,
                        width: edge.label.width,
                        height: edge.label.height,
                    },
                }
            })
            .collect();

        LayoutDump {
            world_width: layout.world_width,
            levels: layout.levels.clone(),
            nodes,
            edges,
            start_arrow: layout
                .start_arrow
                .map(|arrow| [pair(arrow.from), pair(arrow.to)]),
        }
    }
}

fn pair((x, y): (f32, f32)) -> [f32; 2] {
    [x, y]
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
