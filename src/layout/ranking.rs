use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::ir::Automaton;

/// BFS depth of every state from the start state over the undirected
/// projection of the transition graph. States that cannot be reached get
/// `max_depth + 1`, so they still render together below the rest.
///
/// The returned map is in state declaration order.
pub(super) fn assign_levels(automaton: &Automaton) -> IndexMap<String, usize> {
    let adjacency = undirected_adjacency(automaton);

    let mut depth: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    if automaton.states.contains_key(&automaton.start_state) {
        depth.insert(automaton.start_state.as_str(), 0);
        queue.push_back(automaton.start_state.as_str());
    }
    while let Some(node) = queue.pop_front() {
        let next = depth.get(node).copied().unwrap_or(0) + 1;
        let Some(neighbors) = adjacency.get(node) else {
            continue;
        };
        for &neighbor in neighbors {
            if !depth.contains_key(neighbor) {
                depth.insert(neighbor, next);
                queue.push_back(neighbor);
            }
        }
    }

    let max_depth = depth.values().copied().max().unwrap_or(0);
    let unreachable = if depth.is_empty() { 0 } else { max_depth + 1 };
    automaton
        .states
        .keys()
        .map(|id| {
            let level = depth.get(id.as_str()).copied().unwrap_or(unreachable);
            (id.clone(), level)
        })
        .collect()
}

/// Buckets states by level, keeping declaration order inside each bucket.
pub(super) fn group_levels(levels: &IndexMap<String, usize>) -> Vec<Vec<String>> {
    let count = levels.values().copied().max().map_or(0, |max| max + 1);
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); count];
    for (id, level) in levels {
        buckets[*level].push(id.clone());
    }
    buckets.retain(|bucket| !bucket.is_empty());
    buckets
}

/// Neighbor lists in first-seen order so the BFS is deterministic.
fn undirected_adjacency(automaton: &Automaton) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for id in automaton.states.keys() {
        adjacency.entry(id.as_str()).or_default();
    }
    for (from, symbol, to) in automaton.transitions() {
        if !automaton.states.contains_key(to) {
            tracing::warn!(from, symbol, to, "transition targets an undeclared state");
            continue;
        }
        if seen.insert((from, to)) {
            adjacency.entry(from).or_default().push(to);
        }
        if seen.insert((to, from)) {
            adjacency.entry(to).or_default().push(from);
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{State, StateShape};

    fn chain() -> Automaton {
        let mut automaton = Automaton::new("q0");
        automaton.insert_state("q0", State::new(StateShape::Oval).with_transition("a", "q1"));
        automaton.insert_state("q1", State::new(StateShape::Oval).with_transition("b", "q2"));
        automaton.insert_state("q2", State::new(StateShape::Oval));
        automaton
    }

    #[test]
    fn levels_follow_bfs_depth() {
        let levels = assign_levels(&chain());
        assert_eq!(levels["q0"], 0);
        assert_eq!(levels["q1"], 1);
        assert_eq!(levels["q2"], 2);
    }

    #[test]
    fn reverse_edges_count_as_adjacent() {
        let mut automaton = Automaton::new("q0");
        automaton.insert_state("q0", State::new(StateShape::Oval));
        automaton.insert_state("q1", State::new(StateShape::Oval).with_transition("a", "q0"));
        let levels = assign_levels(&automaton);
        assert_eq!(levels["q1"], 1);
    }

    #[test]
    fn unreachable_states_sit_below_the_reachable_region() {
        let mut automaton = chain();
        automaton.insert_state("island", State::new(StateShape::Oval).with_transition("z", "other"));
        automaton.insert_state("other", State::new(StateShape::Oval));
        let levels = assign_levels(&automaton);
        assert_eq!(levels["island"], 3);
        assert_eq!(levels["other"], 3);

        let buckets = group_levels(&levels);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[3], vec!["island", "other"]);
    }

    #[test]
    fn dangling_targets_are_ignored() {
        let mut automaton = chain();
        automaton.states["q2"].add_transition("x", "ghost");
        let levels = assign_levels(&automaton);
        assert_eq!(levels.len(), 3);
        assert!(!levels.contains_key("ghost"));
    }
}
