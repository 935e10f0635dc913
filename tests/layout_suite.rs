use std::path::Path;

use automaton_viz::layout::EdgePath;
use automaton_viz::{Automaton, Config, DiagramView, Layout, LayoutConfig, Theme, compute_layout};
use indexmap::IndexMap;

const FIXTURES: [&str; 5] = [
    "three_state.json",
    "rect_pair.json",
    "nfa_parallel.json",
    "disconnected.json",
    "dense.json",
];

fn load_fixture(name: &str) -> Automaton {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    Automaton::from_json(&input).expect("fixture parse failed")
}

fn layout_config() -> LayoutConfig {
    LayoutConfig {
        fast_text_metrics: true,
        ..LayoutConfig::default()
    }
}

fn layout_fixture(name: &str) -> Layout {
    compute_layout(
        &load_fixture(name),
        &Theme::light(),
        &layout_config(),
        &IndexMap::new(),
    )
    .expect("layout failed")
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.layout.fast_text_metrics = true;
    config
}

#[test]
fn render_all_fixtures() {
    for name in FIXTURES {
        let mut view = DiagramView::new(test_config());
        view.set_automaton(Some(load_fixture(name)));
        assert!(view.layout().is_some(), "{name}: no layout");
        let svg = view.render();
        assert!(svg.contains("<svg"), "{name}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{name}: missing </svg tag");
        assert!(svg.contains("class=\"nodes\""), "{name}: nodes group missing");
        assert!(!svg.contains("NaN"), "{name}: NaN in output");
    }
}

#[test]
fn every_coordinate_is_finite() {
    for name in FIXTURES {
        let layout = layout_fixture(name);
        for node in layout.nodes.values() {
            assert!(node.x.is_finite() && node.y.is_finite(), "{name}: node {}", node.id);
        }
        for edge in &layout.edges {
            let (x, y) = edge.arrow.tip;
            assert!(x.is_finite() && y.is_finite(), "{name}: arrow {}->{}", edge.from, edge.to);
            assert!(edge.label.x.is_finite() && edge.label.y.is_finite());
        }
    }
}

#[test]
fn start_state_is_level_zero_and_levels_partition_states() {
    for name in FIXTURES {
        let automaton = load_fixture(name);
        let layout = layout_fixture(name);
        assert_eq!(layout.nodes[&automaton.start_state].level, 0, "{name}");
        let total: usize = layout.levels.iter().map(Vec::len).sum();
        assert_eq!(total, automaton.states.len(), "{name}");
        for (index, level) in layout.levels.iter().enumerate() {
            for id in level {
                assert_eq!(layout.nodes[id].level, index, "{name}: {id}");
            }
        }
    }
}

#[test]
fn nodes_in_a_level_keep_their_margin() {
    let margin = layout_config().node_margin;
    for name in FIXTURES {
        let layout = layout_fixture(name);
        for level in &layout.levels {
            let mut row: Vec<_> = level.iter().map(|id| &layout.nodes[id]).collect();
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            for pair in row.windows(2) {
                let gap = (pair[1].x - pair[1].rx) - (pair[0].x + pair[0].rx);
                assert!(gap >= margin - 1e-2, "{name}: {} / {} gap {gap}", pair[0].id, pair[1].id);
            }
            // Every node of a level shares the band center.
            assert!(row.iter().all(|node| node.y == row[0].y), "{name}");
        }
    }
}

#[test]
fn levels_stack_top_to_bottom() {
    let layout = layout_fixture("three_state.json");
    assert!(layout.nodes["q0"].y < layout.nodes["q1"].y);
    assert!(layout.nodes["q1"].y < layout.nodes["q2"].y);
}

#[test]
fn parallel_symbols_merge_and_collapse() {
    let layout = layout_fixture("nfa_parallel.json");
    // s->p, s->q, p->s, p->q, q->q; the dangling q->ghost is skipped.
    assert_eq!(layout.edges.len(), 5);
    let merged = layout.edge("s", "p").unwrap();
    assert_eq!(merged.symbols.len(), 8);
    assert_eq!(merged.label.text, "a,b,c,d,e +3 more");
    let back = layout.edge("p", "s").unwrap();
    assert_eq!(merged.lane.count, 2);
    assert_ne!(merged.lane.index, back.lane.index);
    assert!(matches!(
        layout.edge("q", "q").unwrap().path,
        EdgePath::SelfLoop { .. }
    ));
    assert!(layout.edge("q", "ghost").is_none());
}

#[test]
fn opposite_edges_take_different_paths() {
    let layout = layout_fixture("nfa_parallel.json");
    let forward = &layout.edge("s", "p").unwrap().path;
    let backward = &layout.edge("p", "s").unwrap().path;
    let (EdgePath::Curve { control: c1, .. }, EdgePath::Curve { control: c2, .. }) = (forward, backward) else {
        panic!("oval pairs route as curves");
    };
    assert_ne!(c1, c2);
}

#[test]
fn rectangle_automaton_routes_orthogonally() {
    let layout = layout_fixture("rect_pair.json");
    for edge in layout.edges.iter().filter(|edge| !edge.is_self_loop()) {
        assert!(
            matches!(edge.path, EdgePath::Orthogonal { .. }),
            "{} -> {} should be orthogonal",
            edge.from,
            edge.to
        );
    }
    // Multi-line item sets grow the rectangle past its base height.
    let i0 = &layout.nodes["I0"];
    assert_eq!(i0.lines.len(), 3);
    assert!(i0.ry > 35.0);
}

#[test]
fn unreachable_states_sink_below_reachable_ones() {
    let layout = layout_fixture("disconnected.json");
    assert_eq!(layout.nodes["a"].level, 0);
    assert_eq!(layout.nodes["b"].level, 1);
    assert_eq!(layout.nodes["island1"].level, 2);
    assert_eq!(layout.nodes["island2"].level, 2);
}

#[test]
fn wide_levels_widen_the_world() {
    let layout = layout_fixture("dense.json");
    assert_eq!(layout.levels[1].len(), 12);
    assert!(layout.world_width > 1200.0);
}

#[test]
fn layout_is_deterministic_across_runs() {
    for name in FIXTURES {
        let a = layout_fixture(name);
        let b = layout_fixture(name);
        for (ea, eb) in a.edges.iter().zip(&b.edges) {
            assert_eq!(ea.path, eb.path, "{name}");
            assert_eq!((ea.label.x, ea.label.y), (eb.label.x, eb.label.y), "{name}");
        }
    }
}

#[test]
fn dragging_a_node_pins_it() {
    let mut view = DiagramView::new(test_config());
    view.set_automaton(Some(load_fixture("three_state.json")));
    let node = view.layout().unwrap().nodes["q1"].clone();
    let screen = view.transform().world_to_screen(node.center());

    view.pointer_down(screen);
    view.pointer_move((screen.0 + 30.0, screen.1 + 12.0));
    view.pointer_up();

    let moved = &view.layout().unwrap().nodes["q1"];
    let scale = view.transform().scale;
    assert!(moved.pinned);
    assert!((moved.x - (node.x + 30.0 / scale)).abs() < 1e-2);
    assert!((moved.y - (node.y + 12.0 / scale)).abs() < 1e-2);
    assert!(view.overrides().contains_key("q1"));
}

#[cfg(feature = "png")]
#[test]
fn export_produces_png_and_keeps_the_view() {
    let mut view = DiagramView::new(test_config());
    view.set_automaton(Some(load_fixture("rect_pair.json")));
    view.wheel((100.0, 100.0), -1.0);
    let before = view.transform();
    let artifact = view.export_png().expect("export failed");
    assert!(artifact.bytes.starts_with(b"\x89PNG"));
    assert!(artifact.width > 0 && artifact.height > 0);
    assert_eq!(view.transform(), before);
}
