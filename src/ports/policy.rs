//! Policy port - abstraction over round-by-round decision making.

use crate::{
    Result,
    actions::{ActionSpace, JointAction},
    world::WorldState,
};

/// Decision policy driving one joint action per round.
///
/// The session loop calls [`choose`](Policy::choose) with the legal action
/// space and the current world state, submits the returned joint action,
/// and afterwards delivers the score delta through
/// [`respond`](Policy::respond). Calls alternate strictly: one `respond`
/// follows each `choose` before the next `choose`.
///
/// Implementations range from adaptive learners (instance-based blending,
/// value-network bootstrapping) to the random baseline. Policies are
/// `Send` so a driver may move them across threads between episodes.
pub trait Policy: Send {
    /// Select a joint action from the legal action space.
    ///
    /// Every command of the returned action must come from the per-train
    /// legal sets; the session loop treats a violation as a programming
    /// error, not a recoverable condition.
    ///
    /// # Errors
    ///
    /// Fails if the action space is empty or internal state is corrupt.
    fn choose(&mut self, space: &ActionSpace, state: &WorldState) -> Result<JointAction>;

    /// Deliver the reward observed for the most recent choice.
    fn respond(&mut self, reward: f64) -> Result<()>;

    /// The policy's name, for logs and comparisons.
    fn name(&self) -> &str;

    /// Episode boundary hook.
    ///
    /// Called once after the round loop ends. Adaptive policies decay
    /// exploration or flush pending learning records here; the default
    /// does nothing.
    fn end_episode(&mut self) -> Result<()> {
        Ok(())
    }
}
