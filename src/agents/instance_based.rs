//! Instance-based cognitive agent.
//!
//! Keeps a memory of past (candidate choice, observed outcome) pairs, each
//! keyed by the symbolic attribute mapping of the world state the candidate
//! was offered in. Choosing blends the outcomes of matching instances into
//! an expected-utility estimate, weighted by recency (power-law decay) and
//! perturbed by activation noise; candidates with no history fall back to a
//! default utility. Memory only grows; unbounded growth is the acknowledged
//! resource cost of this learner.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Result,
    actions::{ActionSpace, JointAction},
    config::InstanceAgentConfig,
    encoding::{ChoiceSignature, StateAttributes},
    error::Error,
    ports::Policy,
    world::WorldState,
};

/// One remembered outcome of a past choice.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Instance {
    outcome: f64,
    time: u64,
}

/// Decision policy backed by an instance memory with recency-weighted
/// outcome blending.
pub struct InstanceBasedAgent {
    config: InstanceAgentConfig,
    /// Instances grouped by state attributes, then by candidate action; the
    /// two levels together form the [`ChoiceSignature`] key.
    memory: HashMap<StateAttributes, HashMap<JointAction, Vec<Instance>>>,
    /// Logical clock; advances once per choice.
    time: u64,
    pending: Option<(StateAttributes, JointAction)>,
    rng: StdRng,
}

impl InstanceBasedAgent {
    pub fn new(config: InstanceAgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            config,
            memory: HashMap::new(),
            time: 0,
            pending: None,
            rng,
        }
    }

    /// Number of stored instances across all signatures.
    pub fn instance_count(&self) -> usize {
        self.memory
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Seed memory with a recorded (choice, outcome) pair, e.g. from
    /// historical round logs parsed outside the live session loop.
    pub fn populate(&mut self, signature: ChoiceSignature, outcome: f64) {
        let instance = Instance {
            outcome,
            time: self.time,
        };
        self.memory
            .entry(signature.attributes)
            .or_default()
            .entry(signature.action)
            .or_default()
            .push(instance);
    }

    /// Recency- and noise-weighted blend of a candidate's recorded outcomes.
    ///
    /// Activation of an instance is `-decay · ln(now − t)` plus logistic
    /// noise; retrieval probabilities are Boltzmann weights at temperature
    /// `noise · √2`; the estimate is the probability-weighted mean outcome.
    fn blended_estimate(&mut self, instances: &[Instance], now: u64) -> f64 {
        let temperature = (self.config.noise * std::f64::consts::SQRT_2).max(1e-9);

        let activations: Vec<f64> = instances
            .iter()
            .map(|instance| {
                let age = (now.saturating_sub(instance.time)).max(1) as f64;
                -self.config.decay * age.ln() + self.activation_noise()
            })
            .collect();

        // Softmax over activations, shifted for numerical stability.
        let peak = activations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = activations
            .iter()
            .map(|a| ((a - peak) / temperature).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        instances
            .iter()
            .zip(&weights)
            .map(|(instance, w)| instance.outcome * w / total)
            .sum()
    }

    fn activation_noise(&mut self) -> f64 {
        if self.config.noise <= 0.0 {
            return 0.0;
        }
        // Logistic sample scaled by the noise parameter.
        let u: f64 = self.rng.random_range(1e-9..1.0 - 1e-9);
        self.config.noise * ((1.0 - u) / u).ln()
    }
}

impl Policy for InstanceBasedAgent {
    fn choose(&mut self, space: &ActionSpace, state: &WorldState) -> Result<JointAction> {
        let attributes = StateAttributes::from_state(state);
        self.time += 1;
        let now = self.time;

        let candidates = space.expand();
        if candidates.is_empty() {
            return Err(Error::EmptyActionSpace);
        }

        let mut best: Option<(JointAction, f64)> = None;
        for candidate in candidates {
            let matched: Option<Vec<Instance>> = self
                .memory
                .get(&attributes)
                .and_then(|by_action| by_action.get(&candidate))
                .filter(|instances| !instances.is_empty())
                .cloned();
            let estimate = match matched {
                Some(instances) => self.blended_estimate(&instances, now),
                None => self.config.default_utility,
            };
            match &best {
                Some((_, top)) if estimate <= *top => {}
                _ => best = Some((candidate, estimate)),
            }
        }

        let (chosen, _) = best.ok_or(Error::EmptyActionSpace)?;
        self.pending = Some((attributes, chosen.clone()));
        Ok(chosen)
    }

    fn respond(&mut self, reward: f64) -> Result<()> {
        let (attributes, action) = self.pending.take().ok_or(Error::NoPendingChoice)?;
        let instance = Instance {
            outcome: reward,
            time: self.time,
        };
        self.memory
            .entry(attributes)
            .or_default()
            .entry(action)
            .or_default()
            .push(instance);
        Ok(())
    }

    fn name(&self) -> &str {
        "instance-based"
    }
}
