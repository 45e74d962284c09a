//! Decision policies: the two learners and the random baseline.

pub mod instance_based;
pub mod random;
pub mod value_net;

pub use instance_based::InstanceBasedAgent;
pub use random::RandomPolicy;
pub use value_net::ValueNetworkAgent;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Policy;

    #[test]
    fn every_policy_can_cross_threads() {
        fn is_send<T: Send>() {}
        is_send::<RandomPolicy>();
        is_send::<InstanceBasedAgent>();
        is_send::<ValueNetworkAgent>();
        is_send::<Box<dyn Policy>>();
    }
}
