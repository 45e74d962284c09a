//! Random baseline policy: a uniformly random legal kind per train.

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Result,
    actions::{ActionSpace, JointAction},
    error::Error,
    ports::Policy,
    world::WorldState,
};

/// Uniform-random legal policy, the trivial baseline.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPolicy {
    fn choose(&mut self, space: &ActionSpace, _state: &WorldState) -> Result<JointAction> {
        let kinds = space
            .per_train()
            .iter()
            .map(|legal| legal.choose(&mut self.rng).copied())
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::EmptyActionSpace)?;
        Ok(JointAction::from_kinds(&kinds))
    }

    fn respond(&mut self, _reward: f64) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TrainStatus, test_fixtures};

    #[test]
    fn choices_are_always_legal() {
        let mut world = test_fixtures::world(0.0, 0);
        world.trains[2] = test_fixtures::docked_train(2, 5, TrainStatus::Trapped);
        let space = ActionSpace::from_state(&world);

        let mut policy = RandomPolicy::with_seed(7);
        for _ in 0..200 {
            let action = policy.choose(&space, &world).unwrap();
            assert!(space.contains(&action));
        }
    }
}
