//! Value-network decision policy: ε-greedy choice with legal-action
//! masking, experience replay, and a periodically hard-synced target
//! network.

use std::{fs::File, path::Path};

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    actions::{ACTION_KIND_COUNT, ActionKind, ActionSpace, JointAction},
    config::ValueAgentConfig,
    encoding::{dense_len, encode_dense},
    error::Error,
    ports::Policy,
    world::{Topology, WorldState},
};

use super::{
    network::{TrainSample, ValueNetwork},
    replay::{ReplayBuffer, Transition},
};

/// A choice whose transition cannot be completed until the next state's
/// encoding is available.
struct PendingTransition {
    state: Vec<f64>,
    actions: Vec<usize>,
    reward: Option<f64>,
}

/// Serialized checkpoint of the agent's learning state.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    online: ValueNetwork,
    target: ValueNetwork,
    epsilon: f64,
    steps: usize,
}

/// Reinforcement-learning policy over the dense state encoding.
///
/// Holds an online estimator and a target estimator scoring every
/// (train, action-kind) pair. Exploration decays multiplicatively per
/// episode toward a floor; exploitation masks illegal kinds before the
/// arg-max, so a kind outside a train's legal set is never selected.
pub struct ValueNetworkAgent {
    config: ValueAgentConfig,
    topology: Topology,
    online: ValueNetwork,
    target: ValueNetwork,
    buffer: ReplayBuffer,
    epsilon: f64,
    steps: usize,
    pending: Option<PendingTransition>,
    rng: StdRng,
}

impl ValueNetworkAgent {
    /// # Errors
    ///
    /// Fails when `batch_size`, `target_sync_every`, or `buffer_capacity`
    /// is zero; each would divide or index by zero during learning.
    pub fn new(config: ValueAgentConfig, topology: Topology) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "batch size must be at least 1".to_string(),
            });
        }
        if config.target_sync_every == 0 {
            return Err(Error::InvalidConfiguration {
                message: "target sync period must be at least 1".to_string(),
            });
        }
        let buffer = ReplayBuffer::new(config.buffer_capacity)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let online = ValueNetwork::new(
            &mut rng,
            dense_len(&topology),
            config.hidden,
            topology.trains,
            ACTION_KIND_COUNT,
        );
        let target = online.clone();
        let epsilon = config.epsilon;
        Ok(Self {
            config,
            topology,
            online,
            target,
            buffer,
            epsilon,
            steps: 0,
            pending: None,
            rng,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn buffered_transitions(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the target network currently equals the online network.
    pub fn target_in_sync(&self) -> bool {
        self.online == self.target
    }

    /// Persist networks, exploration rate, and step counter.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create checkpoint {path:?}"),
            source,
        })?;
        let checkpoint = Checkpoint {
            online: self.online.clone(),
            target: self.target.clone(),
            epsilon: self.epsilon,
            steps: self.steps,
        };
        rmp_serde::encode::write(&mut file, &checkpoint).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize checkpoint".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Restore a previously saved checkpoint into a fresh agent.
    pub fn load(path: &Path, config: ValueAgentConfig, topology: Topology) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open checkpoint {path:?}"),
            source,
        })?;
        let checkpoint: Checkpoint =
            rmp_serde::decode::from_read(file).map_err(|e| Error::SerializationContext {
                operation: "deserialize checkpoint".to_string(),
                message: e.to_string(),
            })?;

        let expected = dense_len(&topology);
        if checkpoint.online.input_dim() != expected {
            return Err(Error::VectorLengthMismatch {
                expected,
                got: checkpoint.online.input_dim(),
            });
        }

        let mut agent = Self::new(config, topology)?;
        agent.online = checkpoint.online;
        agent.target = checkpoint.target;
        agent.epsilon = checkpoint.epsilon;
        agent.steps = checkpoint.steps;
        Ok(agent)
    }

    /// Complete the pending transition with the encoding of the state now
    /// in hand, then run one replay update.
    fn finalize_pending(&mut self, next_state: &[f64], terminal: bool) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let Some(reward) = pending.reward else {
            // Chosen but never rewarded (aborted round); drop it.
            return Ok(());
        };

        self.buffer.push(Transition {
            state: pending.state,
            actions: pending.actions,
            reward,
            next_state: next_state.to_vec(),
            terminal,
        })?;
        self.replay()?;

        self.steps += 1;
        if self.steps % self.config.target_sync_every == 0 {
            // Hard sync: overwrite, no interpolation.
            self.target = self.online.clone();
            debug!("target network synced at step {}", self.steps);
        }
        Ok(())
    }

    fn replay(&mut self) -> Result<()> {
        let Some(batch) = self.buffer.sample(&mut self.rng, self.config.batch_size) else {
            return Ok(());
        };

        let targets: Vec<f64> = batch
            .iter()
            .map(|t| {
                if t.terminal {
                    t.reward
                } else {
                    t.reward + self.config.gamma * self.target.max_sum(&t.next_state)
                }
            })
            .collect();
        let samples: Vec<TrainSample<'_>> = batch
            .iter()
            .zip(&targets)
            .map(|(t, &target)| TrainSample {
                state: &t.state,
                actions: &t.actions,
                target,
            })
            .collect();

        let loss = self.online.train_batch(&samples, self.config.learning_rate);
        debug!("replay batch loss {loss:.4}");
        Ok(())
    }
}

impl Policy for ValueNetworkAgent {
    fn choose(&mut self, space: &ActionSpace, state: &WorldState) -> Result<JointAction> {
        let encoded = encode_dense(state, &self.topology);
        let expected = dense_len(&self.topology);
        if encoded.len() != expected {
            return Err(Error::VectorLengthMismatch {
                expected,
                got: encoded.len(),
            });
        }
        self.finalize_pending(&encoded, false)?;

        let scores = self.online.forward(&encoded);
        let mut kinds = Vec::with_capacity(space.train_count());
        for (train, legal) in space.per_train().iter().enumerate() {
            if legal.is_empty() {
                return Err(Error::EmptyActionSpace);
            }
            let kind = if self.rng.random::<f64>() < self.epsilon {
                *legal.choose(&mut self.rng).ok_or(Error::EmptyActionSpace)?
            } else {
                // Mask: arg-max over legal kinds only.
                *legal
                    .iter()
                    .max_by(|a, b| {
                        scores[train][a.index()]
                            .partial_cmp(&scores[train][b.index()])
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .ok_or(Error::EmptyActionSpace)?
            };
            kinds.push(kind);
        }

        let action = JointAction::from_kinds(&kinds);
        self.pending = Some(PendingTransition {
            state: encoded,
            actions: kinds.iter().map(|k| ActionKind::index(*k)).collect(),
            reward: None,
        });
        Ok(action)
    }

    fn respond(&mut self, reward: f64) -> Result<()> {
        match &mut self.pending {
            Some(pending) => {
                pending.reward = Some(reward);
                Ok(())
            }
            None => Err(Error::NoPendingChoice),
        }
    }

    fn name(&self) -> &str {
        "value-network"
    }

    /// Flush the trailing transition as terminal and decay exploration.
    fn end_episode(&mut self) -> Result<()> {
        if let Some(pending) = &self.pending {
            let state = pending.state.clone();
            // The terminal target ignores the bootstrap term, so the
            // recorded next state only fills the slot.
            self.finalize_pending(&state, true)?;
        }
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TrainStatus, test_fixtures};

    fn tiny_topology() -> Topology {
        Topology {
            trains: 2,
            stations: 3,
            tracks: 2,
            lines: 1,
        }
    }

    fn tiny_world() -> WorldState {
        use crate::world::{
            Direction, LineId, StationId, TrackId, Train, TrainId, TrainLocation,
        };
        let trains = (0..2)
            .map(|id| Train {
                id: TrainId(id),
                location: if id == 0 {
                    TrainLocation::AtStation {
                        station: StationId(1),
                        track: TrackId(0),
                    }
                } else {
                    TrainLocation::OnTrack {
                        track: TrackId(1),
                        position: 0.5,
                    }
                },
                passengers: 10,
                capacity: 100,
                delayed_rounds: 0,
                direction: Direction::Forward,
                line: LineId(0),
                status: if id == 0 {
                    TrainStatus::Stopped
                } else {
                    TrainStatus::Running
                },
            })
            .collect();
        WorldState {
            round: 0,
            score: 0.0,
            trains,
            stations: (0..3).map(test_fixtures::station).collect(),
        }
    }

    fn fast_config() -> ValueAgentConfig {
        ValueAgentConfig {
            batch_size: 2,
            target_sync_every: 3,
            hidden: [8, 4],
            ..ValueAgentConfig::default().with_seed(5)
        }
    }

    fn run_rounds(agent: &mut ValueNetworkAgent, world: &WorldState, rounds: usize) {
        let space = ActionSpace::from_state(world);
        for _ in 0..rounds {
            agent.choose(&space, world).unwrap();
            agent.respond(-1.0).unwrap();
        }
    }

    #[test]
    fn zero_valued_hyperparameters_are_rejected() {
        for broken in [
            ValueAgentConfig {
                buffer_capacity: 0,
                ..fast_config()
            },
            ValueAgentConfig {
                batch_size: 0,
                ..fast_config()
            },
            ValueAgentConfig {
                target_sync_every: 0,
                ..fast_config()
            },
        ] {
            assert!(matches!(
                ValueNetworkAgent::new(broken, tiny_topology()),
                Err(Error::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn exploration_never_leaves_the_legal_set() {
        let world = tiny_world();
        let space = ActionSpace::from_state(&world);
        let mut agent =
            ValueNetworkAgent::new(fast_config().with_epsilon(1.0), tiny_topology()).unwrap();

        for _ in 0..100 {
            let action = agent.choose(&space, &world).unwrap();
            assert!(space.contains(&action));
            agent.respond(0.0).unwrap();
        }
    }

    #[test]
    fn greedy_choice_is_masked_to_legal_kinds() {
        let world = tiny_world();
        let space = ActionSpace::from_state(&world);
        let mut config = fast_config();
        config.epsilon = 0.0;
        let mut agent = ValueNetworkAgent::new(config, tiny_topology()).unwrap();

        for _ in 0..50 {
            let action = agent.choose(&space, &world).unwrap();
            assert!(space.contains(&action));
            agent.respond(0.0).unwrap();
        }
    }

    #[test]
    fn transitions_are_buffered_one_round_late() {
        let world = tiny_world();
        let mut agent = ValueNetworkAgent::new(fast_config(), tiny_topology()).unwrap();

        run_rounds(&mut agent, &world, 1);
        // The first transition still awaits the next state's encoding.
        assert_eq!(agent.buffered_transitions(), 0);

        run_rounds(&mut agent, &world, 1);
        assert_eq!(agent.buffered_transitions(), 1);
    }

    #[test]
    fn end_episode_flushes_terminal_transition_and_decays_epsilon() {
        let world = tiny_world();
        let mut agent = ValueNetworkAgent::new(fast_config(), tiny_topology()).unwrap();
        let before = agent.epsilon();

        run_rounds(&mut agent, &world, 1);
        agent.end_episode().unwrap();

        assert_eq!(agent.buffered_transitions(), 1);
        assert!(agent.epsilon() < before);
    }

    #[test]
    fn epsilon_decay_respects_the_floor() {
        let mut config = fast_config();
        config.epsilon = 0.02;
        config.min_epsilon = 0.01;
        config.epsilon_decay = 0.1;
        let mut agent = ValueNetworkAgent::new(config, tiny_topology()).unwrap();

        agent.end_episode().unwrap();
        assert_eq!(agent.epsilon(), 0.01);
        agent.end_episode().unwrap();
        assert_eq!(agent.epsilon(), 0.01);
    }

    #[test]
    fn target_hard_syncs_after_configured_steps() {
        let world = tiny_world();
        let mut agent = ValueNetworkAgent::new(fast_config(), tiny_topology()).unwrap();
        let sync_every = agent.config.target_sync_every;

        // Each round past the first finalizes one transition (one step);
        // replay kicks in once the buffer holds a full batch, so the online
        // network drifts from the target between syncs.
        run_rounds(&mut agent, &world, sync_every + 1);
        assert_eq!(agent.steps(), sync_every);
        assert!(
            agent.target_in_sync(),
            "target must equal online parameter-for-parameter after sync"
        );

        run_rounds(&mut agent, &world, 1);
        assert_eq!(agent.steps(), sync_every + 1);
        assert!(!agent.target_in_sync(), "online drifts after the sync step");
    }

    #[test]
    fn checkpoint_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.msgpack");
        let world = tiny_world();

        let mut agent = ValueNetworkAgent::new(fast_config(), tiny_topology()).unwrap();
        run_rounds(&mut agent, &world, 5);
        agent.end_episode().unwrap();
        agent.save(&path).unwrap();

        let restored =
            ValueNetworkAgent::load(&path, fast_config(), tiny_topology()).unwrap();
        assert_eq!(restored.online, agent.online);
        assert_eq!(restored.target, agent.target);
        assert_eq!(restored.epsilon(), agent.epsilon());
        assert_eq!(restored.steps(), agent.steps());
    }

    #[test]
    fn checkpoint_for_wrong_topology_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.msgpack");

        let agent = ValueNetworkAgent::new(fast_config(), tiny_topology()).unwrap();
        agent.save(&path).unwrap();

        let result = ValueNetworkAgent::load(&path, fast_config(), Topology::default());
        assert!(matches!(result, Err(Error::VectorLengthMismatch { .. })));
    }
}
