use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ir::Automaton;

use super::Lane;

/// All transitions of one ordered (from, to) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedEdge {
    pub from: String,
    pub to: String,
    pub symbols: Vec<String>,
    pub lane: Lane,
}

/// Merges transitions by ordered pair and assigns lanes per unordered pair.
/// Order is first-seen order over the declaration-ordered transition list.
pub fn group_edges(automaton: &Automaton) -> Vec<GroupedEdge> {
    let mut grouped: IndexMap<(&str, &str), Vec<String>> = IndexMap::new();
    for (from, symbol, to) in automaton.transitions() {
        if !automaton.states.contains_key(to) {
            tracing::debug!(from, to, "skipping edge to undeclared state");
            continue;
        }
        grouped.entry((from, to)).or_default().push(symbol.to_string());
    }

    let mut pair_count: HashMap<(&str, &str), usize> = HashMap::new();
    let mut pair_index: Vec<usize> = Vec::with_capacity(grouped.len());
    for &(from, to) in grouped.keys() {
        let count = pair_count.entry(unordered(from, to)).or_insert(0);
        *count += 1;
        pair_index.push(*count - 1);
    }

    grouped
        .into_iter()
        .zip(pair_index)
        .map(|(((from, to), symbols), index)| {
            let count = pair_count.get(&unordered(from, to)).copied().unwrap_or(1);
            GroupedEdge {
                from: from.to_string(),
                to: to.to_string(),
                symbols,
                lane: Lane { index, count },
            }
        })
        .collect()
}

fn unordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}
