use indexmap::IndexMap;

use crate::config::LayoutConfig;
use crate::geometry::Point;
use crate::ir::{Automaton, StateShape};

use super::NodeLayout;
use super::text::measure_node_text;

/// Sizes every state from its shape and measured text. Positions are left
/// at the origin for the solver to fill in.
pub(super) fn size_nodes(
    automaton: &Automaton,
    levels: &IndexMap<String, usize>,
    config: &LayoutConfig,
    font_family: &str,
) -> IndexMap<String, NodeLayout> {
    let mut nodes = IndexMap::with_capacity(automaton.states.len());
    for (id, state) in &automaton.states {
        let text = measure_node_text(id, state.label.as_deref(), config, font_family);
        let base = match state.shape {
            StateShape::Oval => config.oval,
            StateShape::Rectangle => config.rectangle,
        };
        let rx = base.base_rx.max(text.width / 2.0 + config.text_pad_x);
        let ry = base.base_ry.max(text.height / 2.0 + config.text_pad_y);
        nodes.insert(
            id.clone(),
            NodeLayout {
                id: id.clone(),
                x: 0.0,
                y: 0.0,
                rx,
                ry,
                shape: state.shape,
                title: id.clone(),
                lines: text.lines,
                level: levels.get(id).copied().unwrap_or(0),
                is_start: automaton.is_start(id),
                is_final: state.is_final,
                pinned: false,
            },
        );
    }
    nodes
}

/// Width of the working area the levels are spread across.
pub(super) fn world_width(nodes: &IndexMap<String, NodeLayout>, levels: &[Vec<String>], config: &LayoutConfig) -> f32 {
    let max_cols = levels.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let widest = nodes
        .values()
        .map(|node| node.rx * 2.0)
        .fold(0.0f32, f32::max);
    let col_gap = if max_cols > 8 {
        120.0f32.max(widest + 40.0)
    } else {
        140.0f32.max(widest + 60.0)
    };
    config
        .min_world_width
        .max(config.padding_x * 2.0 + (max_cols - 1) as f32 * col_gap + widest)
}

/// Assigns centers: even spread per level, vertical bands sized to the
/// tallest node of each level, then left-to-right compaction and
/// re-centering of every level.
pub(super) fn solve_positions(
    nodes: &mut IndexMap<String, NodeLayout>,
    levels: &[Vec<String>],
    world_width: f32,
    config: &LayoutConfig,
) {
    let usable = world_width - 2.0 * config.padding_x;
    for level in levels {
        let cols = level.len();
        let step = if cols > 1 { usable / (cols - 1) as f32 } else { 0.0 };
        for (i, id) in level.iter().enumerate() {
            if let Some(node) = nodes.get_mut(id) {
                node.x = if cols > 1 {
                    config.padding_x + i as f32 * step
                } else {
                    config.padding_x + usable / 2.0
                };
            }
        }
    }

    let mut acc_y = config.padding_y;
    for level in levels {
        let max_ry = level
            .iter()
            .filter_map(|id| nodes.get(id))
            .map(|node| node.ry)
            .fold(0.0f32, f32::max);
        let max_ry = if max_ry > 0.0 { max_ry } else { config.oval.base_ry };
        let band_mid = acc_y + max_ry;
        for id in level {
            if let Some(node) = nodes.get_mut(id) {
                node.y = band_mid;
            }
        }
        acc_y += max_ry * 2.0 + config.level_pad_y;
    }

    for level in levels {
        compact_level(nodes, level, world_width, config);
    }
}

/// Pushes overlapping neighbors apart along x, then shifts the level so its
/// span is centered in the working width.
fn compact_level(
    nodes: &mut IndexMap<String, NodeLayout>,
    level: &[String],
    world_width: f32,
    config: &LayoutConfig,
) {
    if level.len() <= 1 {
        return;
    }
    let mut order: Vec<usize> = level
        .iter()
        .filter_map(|id| nodes.get_index_of(id))
        .collect();
    // Stable: equal x keeps declaration order.
    order.sort_by(|a, b| nodes[*a].x.total_cmp(&nodes[*b].x));

    for i in 1..order.len() {
        let (a, b) = (order[i - 1], order[i]);
        let gap = nodes[b].x - nodes[a].x;
        let needed = nodes[a].rx + nodes[b].rx + config.node_margin;
        if gap < needed {
            let delta = needed - gap;
            for &idx in &order[i..] {
                nodes[idx].x += delta;
            }
        }
    }

    let min_x = order
        .iter()
        .map(|&idx| nodes[idx].x - nodes[idx].rx)
        .fold(f32::INFINITY, f32::min);
    let max_x = order
        .iter()
        .map(|&idx| nodes[idx].x + nodes[idx].rx)
        .fold(f32::NEG_INFINITY, f32::max);
    let extra = (world_width - (max_x - min_x)) / 2.0 - config.padding_x - min_x;
    for &idx in &order {
        nodes[idx].x += extra;
    }
}

/// Manual positions win over the solver. Overrides for unknown ids and
/// non-finite coordinates are ignored.
pub(super) fn apply_overrides(nodes: &mut IndexMap<String, NodeLayout>, overrides: &IndexMap<String, Point>) {
    for (id, &(x, y)) in overrides {
        if !x.is_finite() || !y.is_finite() {
            tracing::warn!(node = %id, "ignoring non-finite position override");
            continue;
        }
        if let Some(node) = nodes.get_mut(id) {
            node.x = x;
            node.y = y;
            node.pinned = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::State;
    use crate::layout::ranking::{assign_levels, group_levels};

    fn config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn solve(automaton: &Automaton) -> (IndexMap<String, NodeLayout>, Vec<Vec<String>>) {
        let config = config();
        let levels = assign_levels(automaton);
        let buckets = group_levels(&levels);
        let mut nodes = size_nodes(automaton, &levels, &config, "sans-serif");
        let width = world_width(&nodes, &buckets, &config);
        solve_positions(&mut nodes, &buckets, width, &config);
        (nodes, buckets)
    }

    #[test]
    fn rectangles_are_at_least_base_size() {
        let mut automaton = Automaton::new("I0");
        automaton.insert_state("I0", State::new(StateShape::Rectangle));
        automaton.insert_state("q", State::new(StateShape::Oval));
        let (nodes, _) = solve(&automaton);
        assert_eq!((nodes["I0"].rx, nodes["I0"].ry), (55.0, 35.0));
        assert_eq!((nodes["q"].rx, nodes["q"].ry), (32.0, 22.0));
    }

    #[test]
    fn multi_line_labels_grow_the_node() {
        let mut automaton = Automaton::new("I0");
        let mut state = State::new(StateShape::Rectangle);
        state.label = Some("S' -> .S\\nS -> .A A\\nA -> .a A\\nA -> .b".to_string());
        automaton.insert_state("I0", state);
        let (nodes, _) = solve(&automaton);
        assert_eq!(nodes["I0"].lines.len(), 4);
        assert_eq!(nodes["I0"].ry, 5.0 * 14.0 / 2.0 + 10.0);
    }

    #[test]
    fn bands_stack_by_tallest_node() {
        let mut automaton = Automaton::new("a");
        automaton.insert_state("a", State::new(StateShape::Rectangle).with_transition("x", "b"));
        automaton.insert_state("b", State::new(StateShape::Oval));
        let (nodes, _) = solve(&automaton);
        assert_eq!(nodes["a"].y, 80.0 + 35.0);
        assert_eq!(nodes["b"].y, 80.0 + 70.0 + 60.0 + 22.0);
    }

    #[test]
    fn compaction_separates_wide_nodes_in_one_level() {
        let mut automaton = Automaton::new("root");
        let mut root = State::new(StateShape::Oval);
        for i in 0..12 {
            let id = format!("wide_state_number_{i}");
            root.add_transition("a", &id);
        }
        automaton.insert_state("root", root);
        for i in 0..12 {
            let mut state = State::new(StateShape::Rectangle);
            state.label = Some("a fairly long label line".to_string());
            automaton.insert_state(&format!("wide_state_number_{i}"), state);
        }
        let (nodes, buckets) = solve(&automaton);
        let mut level: Vec<&NodeLayout> = buckets[1].iter().map(|id| &nodes[id]).collect();
        level.sort_by(|a, b| a.x.total_cmp(&b.x));
        for pair in level.windows(2) {
            assert!(pair[1].x - pair[0].x >= pair[0].rx + pair[1].rx - 1e-3);
        }
    }

    #[test]
    fn overrides_replace_positions() {
        let mut automaton = Automaton::new("a");
        automaton.insert_state("a", State::new(StateShape::Oval));
        let (mut nodes, _) = solve(&automaton);
        let mut overrides = IndexMap::new();
        overrides.insert("a".to_string(), (10.0, -20.0));
        overrides.insert("missing".to_string(), (1.0, 1.0));
        overrides.insert("a_nan".to_string(), (f32::NAN, 0.0));
        apply_overrides(&mut nodes, &overrides);
        assert_eq!(nodes["a"].center(), (10.0, -20.0));
        assert!(nodes["a"].pinned);
        assert_eq!(nodes.len(), 1);
    }
}
