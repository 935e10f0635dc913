use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node outline used for a state. Oval states are drawn as ellipses and
/// routed with curves; rectangle states get orthogonal, port-based edges
/// when both endpoints are rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateShape {
    #[default]
    Oval,
    #[serde(alias = "rect")]
    Rectangle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub transitions: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub shape: StateShape,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Automaton {
    pub states: IndexMap<String, State>,
    pub start_state: String,
    #[serde(default)]
    pub alphabet: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    #[error("automaton has no states")]
    Empty,
    #[error("start state `{0}` is not a declared state")]
    MissingStartState(String),
}

impl State {
    pub fn new(shape: StateShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    pub fn with_transition(mut self, symbol: &str, to: &str) -> Self {
        self.add_transition(symbol, to);
        self
    }

    pub fn add_transition(&mut self, symbol: &str, to: &str) {
        self.transitions
            .entry(symbol.to_string())
            .or_default()
            .push(to.to_string());
    }
}

impl Automaton {
    pub fn new(start_state: &str) -> Self {
        Self {
            states: IndexMap::new(),
            start_state: start_state.to_string(),
            alphabet: Vec::new(),
        }
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Inserts (or replaces) a state, keeping declaration order for new ids.
    pub fn insert_state(&mut self, id: &str, state: State) -> &mut State {
        self.states.insert(id.to_string(), state);
        &mut self.states[id]
    }

    pub fn validate(&self) -> Result<(), AutomatonError> {
        if self.states.is_empty() {
            return Err(AutomatonError::Empty);
        }
        if !self.states.contains_key(&self.start_state) {
            return Err(AutomatonError::MissingStartState(self.start_state.clone()));
        }
        Ok(())
    }

    pub fn is_start(&self, id: &str) -> bool {
        self.start_state == id
    }

    /// Every (from, symbol, to) triple in declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.states.iter().flat_map(|(from, state)| {
            state.transitions.iter().flat_map(move |(symbol, targets)| {
                targets
                    .iter()
                    .map(move |to| (from.as_str(), symbol.as_str(), to.as_str()))
            })
        })
    }

    pub fn transition_count(&self) -> usize {
        self.transitions().count()
    }
}
