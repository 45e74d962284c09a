//! Legal-action generation and joint-action expansion.
//!
//! Per train, the admissible action kinds are a pure function of status and
//! location. The full decision space for one round is the Cartesian product
//! of the per-train sets, in ascending train-id order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    world::{Train, TrainId, WorldState},
};

/// One of the five commands a train accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Monitor,
    Start,
    Stop,
    Reverse,
    Evacuate,
}

/// Total number of action kinds.
pub const ACTION_KIND_COUNT: usize = 5;

impl ActionKind {
    /// Every kind, in wire-index order.
    pub const ALL: [ActionKind; ACTION_KIND_COUNT] = [
        ActionKind::Monitor,
        ActionKind::Start,
        ActionKind::Stop,
        ActionKind::Reverse,
        ActionKind::Evacuate,
    ];

    /// Stable numeric index (monitor 0, start 1, stop 2, reverse 3,
    /// evacuate 4); used by the dense value-network heads.
    pub fn index(self) -> usize {
        match self {
            ActionKind::Monitor => 0,
            ActionKind::Start => 1,
            ActionKind::Stop => 2,
            ActionKind::Reverse => 3,
            ActionKind::Evacuate => 4,
        }
    }

    /// Kind at a given wire index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Monitor => "monitor",
            ActionKind::Start => "start",
            ActionKind::Stop => "stop",
            ActionKind::Reverse => "reverse",
            ActionKind::Evacuate => "evacuate",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command addressed to one train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionCommand {
    pub train: TrainId,
    pub kind: ActionKind,
}

/// One command per train, in ascending train-id order. The unit submitted
/// to the simulator each round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointAction(Vec<ActionCommand>);

impl JointAction {
    /// Build a joint action from per-train kinds; command `i` addresses
    /// train `i`.
    pub fn from_kinds(kinds: &[ActionKind]) -> Self {
        JointAction(
            kinds
                .iter()
                .enumerate()
                .map(|(i, &kind)| ActionCommand {
                    train: TrainId(i as u8),
                    kind,
                })
                .collect(),
        )
    }

    /// Validate and wrap an explicit command sequence.
    ///
    /// # Errors
    ///
    /// Fails if the length differs from `expected_trains` or commands are
    /// not in ascending train-id order.
    pub fn from_commands(commands: Vec<ActionCommand>, expected_trains: usize) -> Result<Self> {
        if commands.len() != expected_trains {
            return Err(Error::JointActionLength {
                expected: expected_trains,
                got: commands.len(),
            });
        }
        for (i, command) in commands.iter().enumerate() {
            if command.train.index() != i {
                return Err(Error::JointActionOrder {
                    index: i,
                    expected: i as u8,
                    got: command.train.0,
                });
            }
        }
        Ok(JointAction(commands))
    }

    pub fn commands(&self) -> &[ActionCommand] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-train kinds in train-id order.
    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.0.iter().map(|c| c.kind)
    }
}

impl fmt::Display for JointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, command) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}", command.train, command.kind)?;
        }
        f.write_str("]")
    }
}

/// Admissible kinds for a single train, from its status and location.
///
/// Running trains may stop or reverse, stopped trains may start or reverse,
/// trapped (and unknown-status) trains may only be monitored. Any docked
/// train may additionally evacuate.
pub fn legal_kinds(train: &Train) -> Vec<ActionKind> {
    use crate::world::TrainStatus::*;

    let mut kinds = match train.status {
        Running => vec![ActionKind::Monitor, ActionKind::Stop, ActionKind::Reverse],
        Stopped => vec![ActionKind::Monitor, ActionKind::Start, ActionKind::Reverse],
        Trapped | Unknown => vec![ActionKind::Monitor],
    };
    if train.is_docked() {
        kinds.push(ActionKind::Evacuate);
    }
    kinds
}

/// Per-train legal kinds for one round, in ascending train-id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace {
    per_train: Vec<Vec<ActionKind>>,
}

impl ActionSpace {
    /// Compute the action space of a world state.
    pub fn from_state(state: &WorldState) -> Self {
        ActionSpace {
            per_train: state.trains.iter().map(legal_kinds).collect(),
        }
    }

    /// Number of trains covered.
    pub fn train_count(&self) -> usize {
        self.per_train.len()
    }

    /// Legal kinds for one train.
    pub fn kinds_for(&self, train: TrainId) -> &[ActionKind] {
        &self.per_train[train.index()]
    }

    /// Per-train sets in train-id order.
    pub fn per_train(&self) -> &[Vec<ActionKind>] {
        &self.per_train
    }

    /// Cardinality of the full expansion (product of per-train set sizes).
    pub fn expansion_len(&self) -> usize {
        self.per_train.iter().map(Vec::len).product()
    }

    /// Whether every command of a joint action is legal for its train.
    pub fn contains(&self, action: &JointAction) -> bool {
        action.len() == self.per_train.len()
            && action
                .commands()
                .iter()
                .all(|c| self.per_train[c.train.index()].contains(&c.kind))
    }

    /// Full Cartesian-product expansion: every joint action formed by one
    /// kind per train. Exhaustive, no sampling, no deduplication.
    pub fn expand(&self) -> Vec<JointAction> {
        let mut expansion = vec![Vec::new()];
        for kinds in &self.per_train {
            let mut next = Vec::with_capacity(expansion.len() * kinds.len());
            for prefix in &expansion {
                for &kind in kinds {
                    let mut extended = prefix.clone();
                    extended.push(kind);
                    next.push(extended);
                }
            }
            expansion = next;
        }
        expansion
            .into_iter()
            .map(|kinds| JointAction::from_kinds(&kinds))
            .collect()
    }
}
