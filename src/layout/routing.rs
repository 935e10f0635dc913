use crate::config::LayoutConfig;
use crate::geometry::{Point, border_point, chord_normal, normalize};

use super::ports::PortAllocator;
use super::{ArrowHead, EdgePath, Lane, NodeLayout, Side, StartArrow};

/// Extra inset of curve arrow tips beyond the border margin.
const CURVE_TIP_INSET: f32 = 1.2;
const START_BORDER_WIDTH: f32 = 2.5;
const NODE_BORDER_WIDTH: f32 = 1.8;

pub(super) struct RoutedEdge {
    pub path: EdgePath,
    pub arrow: ArrowHead,
}

/// Small circle above the node, arrowhead pointing down into it.
pub(super) fn route_self_loop(node: &NodeLayout, config: &LayoutConfig) -> RoutedEdge {
    let loop_cfg = &config.self_loop;
    let center = (node.x, node.y - (node.ry + loop_cfg.gap));
    let radius = loop_cfg.radius;
    let tip = (
        center.0,
        center.1 + radius - (config.arrow.margin + CURVE_TIP_INSET),
    );
    RoutedEdge {
        path: EdgePath::SelfLoop { center, radius },
        arrow: ArrowHead { tip, dir: (0.0, 1.0) },
    }
}

/// Quadratic curve between border points, bent away from the chord and
/// fanned out by lane so parallel edges stay apart.
pub(super) fn route_curve(
    from: &NodeLayout,
    to: &NodeLayout,
    lane: Lane,
    config: &LayoutConfig,
) -> RoutedEdge {
    let curve = &config.curve;
    let mut start = border_point(from.center(), to.center(), from.rx, from.ry, from.shape);
    let mut end = border_point(to.center(), from.center(), to.rx, to.ry, to.shape);

    let same_level = (from.y - to.y).abs() < curve.same_level_epsilon;
    let sign = if end.0 - start.0 >= 0.0 { 1.0 } else { -1.0 };
    let bend_y = if same_level {
        curve.bend_y_same_level
    } else {
        curve.bend_y_cross_level
    };
    let mut control = (
        (start.0 + end.0) / 2.0 + sign * curve.bend_x,
        (start.1 + end.1) / 2.0 - bend_y,
    );

    let offset = lane.centered();
    let (nx, ny) = chord_normal(start, end);
    control.0 += nx * curve.lane_bend * offset;
    control.1 += ny * curve.lane_bend * offset;
    start = (
        start.0 + nx * curve.dock_offset * offset,
        start.1 + ny * curve.dock_offset * offset,
    );
    end = (
        end.0 + nx * curve.dock_offset * offset,
        end.1 + ny * curve.dock_offset * offset,
    );

    let dir = (end.0 - control.0, end.1 - control.1);
    let (ux, uy) = normalize(dir);
    let inset = config.arrow.margin + CURVE_TIP_INSET;
    let tip = (end.0 - ux * inset, end.1 - uy * inset);

    RoutedEdge {
        path: EdgePath::Curve {
            start,
            control,
            end,
        },
        arrow: ArrowHead { tip, dir },
    }
}

/// Single-elbow orthogonal route between two rectangle ports.
pub(super) fn route_orthogonal(
    from: &NodeLayout,
    to: &NodeLayout,
    lane: Lane,
    ports: &mut PortAllocator<'_>,
    config: &LayoutConfig,
) -> RoutedEdge {
    let ortho = &config.ortho;
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let side_out = Side::facing(dx, dy);
    let side_in = Side::facing(-dx, -dy);

    let from_port = ports.take(from, side_out);
    let to_port = ports.take(to, side_in);
    let a = from_port.point;
    let b = to_port.point;

    let lane_offset = lane.centered() * ortho.lane_spacing;
    let stub_x = if dx >= 0.0 { ortho.stub_length } else { -ortho.stub_length };
    let stub_y = if dy >= 0.0 { ortho.stub_length } else { -ortho.stub_length };

    let p1 = if side_out.is_horizontal() {
        (a.0 + stub_x + lane_offset, a.1)
    } else {
        (a.0, a.1 + stub_y + lane_offset)
    };
    let p2 = if side_in.is_horizontal() {
        (b.0 - stub_x - lane_offset, b.1)
    } else {
        (b.0, b.1 - stub_y - lane_offset)
    };

    let (onx, ony) = side_in.outward_normal();
    let border = if to.is_start {
        START_BORDER_WIDTH
    } else {
        NODE_BORDER_WIDTH
    };
    let inset = config.arrow.margin + border + 0.5;
    // Tip is pulled inside the border so the head does not merge with the stroke.
    let tip = (b.0 - onx * inset, b.1 - ony * inset);

    RoutedEdge {
        path: EdgePath::Orthogonal {
            points: [a, p1, p2, tip],
            corner_radius: ortho.corner_radius,
            from_port,
            to_port,
        },
        arrow: ArrowHead {
            tip,
            dir: (-onx, -ony),
        },
    }
}

pub(super) fn start_arrow(node: &NodeLayout, config: &LayoutConfig) -> StartArrow {
    let left = node.x - node.rx;
    StartArrow {
        from: (left - config.arrow.start_length, node.y),
        to: (left - config.arrow.start_gap, node.y),
    }
}

/// Central segment of an orthogonal route, used for its label.
pub(super) fn central_segment(points: &[Point; 4]) -> (Point, Point) {
    (points[1], points[2])
}
