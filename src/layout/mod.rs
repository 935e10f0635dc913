mod edges;
pub(crate) mod label_placement;
mod placement;
mod ports;
mod ranking;
mod routing;
mod text;
pub(crate) mod types;
pub use edges::{GroupedEdge, group_edges};
pub use types::*;

use indexmap::IndexMap;

use crate::config::LayoutConfig;
use crate::geometry::Point;
use crate::ir::{Automaton, AutomatonError, StateShape};
use crate::theme::Theme;
use label_placement::LabelPlacer;
use ports::PortAllocator;

/// Runs the whole pipeline: levels, coordinates, overrides, edge grouping,
/// routing and label placement. Pure in its inputs; the same automaton,
/// config and overrides always produce the same layout.
pub fn compute_layout(
    automaton: &Automaton,
    theme: &Theme,
    config: &LayoutConfig,
    overrides: &IndexMap<String, Point>,
) -> Result<Layout, AutomatonError> {
    automaton.validate()?;

    let levels = ranking::assign_levels(automaton);
    let buckets = ranking::group_levels(&levels);
    let mut nodes = placement::size_nodes(automaton, &levels, config, &theme.font_family);
    let world_width = placement::world_width(&nodes, &buckets, config);
    placement::solve_positions(&mut nodes, &buckets, world_width, config);
    placement::apply_overrides(&mut nodes, overrides);

    let edges = layout_edges(&nodes, group_edges(automaton), theme, config);
    let start_arrow = nodes
        .get(&automaton.start_state)
        .map(|node| routing::start_arrow(node, config));

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        levels = buckets.len(),
        "computed automaton layout"
    );

    Ok(Layout {
        nodes,
        edges,
        levels: buckets,
        world_width,
        start_arrow,
    })
}

/// Routes grouped edges and places their labels in edge order; ports and
/// label slots are first-come first-served.
fn layout_edges(
    nodes: &IndexMap<String, NodeLayout>,
    grouped: Vec<GroupedEdge>,
    theme: &Theme,
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    let mut ports = PortAllocator::new(&config.ortho);
    let mut labels = LabelPlacer::new(&config.label, nodes.values());
    let mut out = Vec::with_capacity(grouped.len());

    for edge in grouped {
        let (Some(from), Some(to)) = (nodes.get(&edge.from), nodes.get(&edge.to)) else {
            continue;
        };
        let text = text::symbols_label(&edge.symbols, config.label.max_symbols);
        let width = config.label.min_width.max(
            text::text_width(
                &text,
                config.font_size,
                &theme.font_family,
                config.fast_text_metrics,
                false,
            ) + config.label.padding,
        );
        let height = config.label.height;

        let routed = if edge.from == edge.to {
            routing::route_self_loop(from, config)
        } else {
            match (from.shape, to.shape) {
                (StateShape::Rectangle, StateShape::Rectangle) => {
                    routing::route_orthogonal(from, to, edge.lane, &mut ports, config)
                }
                (StateShape::Oval, _) | (_, StateShape::Oval) => {
                    routing::route_curve(from, to, edge.lane, config)
                }
            }
        };
        let center = match &routed.path {
            EdgePath::SelfLoop { center, radius } => {
                let above = (center.0, center.1 - radius - config.self_loop.label_gap);
                labels.place_fixed(above, width, height)
            }
            EdgePath::Curve {
                start,
                control,
                end,
            } => labels.place_on_curve(*start, *control, *end, width, height),
            EdgePath::Orthogonal { points, .. } => {
                let (p1, p2) = routing::central_segment(points);
                labels.place_orthogonal(p1, p2, width, height)
            }
        };

        out.push(EdgeLayout {
            from: edge.from,
            to: edge.to,
            symbols: edge.symbols,
            lane: edge.lane,
            path: routed.path,
            arrow: routed.arrow,
            label: EdgeLabel {
                text,
                x: center.0,
                y: center.1,
                width,
                height,
            },
        });
    }
    out
}
