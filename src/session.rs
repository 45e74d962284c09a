//! Session protocol and the episode round loop.
//!
//! A [`Session`] owns the channel for the lifetime of one episode and
//! speaks the reset/step protocol: send a directive, await exactly one
//! reply, then drain stale buffered frames with short bounded probes. The
//! drain timeout is the normal loop exit, not an error.

use log::{debug, info};

use crate::{
    Result,
    actions::{ActionSpace, JointAction},
    config::EpisodeConfig,
    error::Error,
    ports::{Channel, Codec, Policy, Received},
    wire::{ResponseMessage, reset_message, step_message},
    world::WorldState,
};

/// One episode's exclusive hold on a channel plus the negotiated codec.
///
/// Dropping the session closes the channel, so teardown happens on every
/// exit path, including early returns on protocol errors.
pub struct Session<C: Channel, K: Codec> {
    channel: C,
    codec: K,
    config: EpisodeConfig,
}

impl<C: Channel, K: Codec> Session<C, K> {
    pub fn new(channel: C, codec: K, config: EpisodeConfig) -> Self {
        Self {
            channel,
            codec,
            config,
        }
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Issue the reset directive and return the initial world state.
    pub fn reset(&mut self) -> Result<WorldState> {
        let frame = self.codec.encode(&reset_message())?;
        self.exchange("reset", &frame)
    }

    /// Submit a joint action and return the resulting world state.
    pub fn step(&mut self, action: &JointAction) -> Result<WorldState> {
        let frame = self.codec.encode(&step_message(action))?;
        self.exchange("step", &frame)
    }

    /// Close the channel explicitly. Also happens on drop.
    pub fn close(&mut self) -> Result<()> {
        self.channel.close()
    }

    fn exchange(&mut self, operation: &str, frame: &[u8]) -> Result<WorldState> {
        self.channel.send(frame)?;
        let reply = self.await_reply(operation)?;
        self.drain();

        let response: ResponseMessage = self.codec.decode(&reply).map_err(|e| match e {
            Error::Decode { message, .. } => Error::MalformedFrame {
                operation: operation.to_string(),
                message,
            },
            other => other,
        })?;
        response.into_state(&self.config.topology)
    }

    fn await_reply(&mut self, operation: &str) -> Result<Vec<u8>> {
        match self.channel.receive(self.config.reply_timeout)? {
            Received::Frame(frame) => Ok(frame),
            Received::Closed => Err(Error::ChannelClosed {
                operation: operation.to_string(),
            }),
            Received::TimedOut => Err(Error::ReplyTimeout {
                operation: operation.to_string(),
                millis: self
                    .config
                    .reply_timeout
                    .map(|t| t.as_millis() as u64)
                    .unwrap_or(0),
            }),
        }
    }

    /// Discard stale frames left over from a previous exchange.
    ///
    /// Probes with a short bounded wait until the channel falls silent or
    /// closes; both outcomes end the loop without error.
    fn drain(&mut self) {
        let mut discarded = 0usize;
        loop {
            match self.channel.receive(Some(self.config.drain_timeout)) {
                Ok(Received::Frame(_)) => discarded += 1,
                Ok(Received::TimedOut) | Ok(Received::Closed) => break,
                Err(e) => {
                    // The next exchange will surface the broken channel;
                    // the drain only notes it.
                    debug!("drain probe failed: {e}");
                    break;
                }
            }
        }
        if discarded > 0 {
            debug!("drained {discarded} stale frame(s)");
        }
    }
}

impl<C: Channel, K: Codec> Drop for Session<C, K> {
    fn drop(&mut self) {
        let _ = self.channel.close();
    }
}

/// Drive one full episode: reset, then up to `max_rounds` choose/step/
/// respond cycles. Returns the final score.
///
/// The reward delivered to the policy each round is the raw score delta
/// between consecutive snapshots. A joint action outside the legal set is
/// an invariant violation and aborts the episode.
///
/// # Errors
///
/// Protocol failures (closure or malformed frames during reset/step)
/// surface to the caller; the session's drop handler closes the channel.
pub fn run_episode<C: Channel, K: Codec>(
    session: &mut Session<C, K>,
    policy: &mut dyn Policy,
) -> Result<f64> {
    let mut previous = session.reset()?;

    for _ in 0..session.config.max_rounds {
        let space = ActionSpace::from_state(&previous);
        let action = policy.choose(&space, &previous)?;
        if !space.contains(&action) {
            let offender = action
                .commands()
                .iter()
                .find(|c| !space.kinds_for(c.train).contains(&c.kind));
            let (train, kind) = offender
                .map(|c| (c.train.0, c.kind.to_string()))
                .unwrap_or((0, "unknown".to_string()));
            return Err(Error::InvalidAction { train, kind });
        }

        let next = session.step(&action)?;
        let reward = next.score - previous.score;
        policy.respond(reward)?;

        info!(
            "round {}: action {} score {:.2}",
            next.round, action, next.score
        );
        previous = next;
    }

    policy.end_episode()?;
    Ok(previous.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{InMemoryChannel, MsgPackCodec},
        wire::test_fixtures::response,
    };

    fn encoded(response: &ResponseMessage) -> Vec<u8> {
        rmp_serde::to_vec_named(response).unwrap()
    }

    fn session_with(channel: InMemoryChannel) -> Session<InMemoryChannel, MsgPackCodec> {
        Session::new(channel, MsgPackCodec::new(), EpisodeConfig::default())
    }

    #[test]
    fn reset_returns_initial_state_and_drains_stale_frames() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(encoded(&response(1600.0, 0)));
        // Two stale frames buffered from a prior session.
        channel.push_frame(encoded(&response(-1.0, 98)));
        channel.push_frame(encoded(&response(-2.0, 99)));

        let mut session = session_with(channel);
        let state = session.reset().unwrap();
        assert_eq!(state.score, 1600.0);

        // The stale frames were consumed by the drain; a following step
        // would find an empty buffer, not round 98.
        let err = session.step(&monitor_all()).unwrap_err();
        assert!(matches!(err, Error::ReplyTimeout { .. }));
    }

    fn monitor_all() -> JointAction {
        use crate::actions::ActionKind;
        JointAction::from_kinds(&[ActionKind::Monitor; 8])
    }

    #[test]
    fn step_fails_when_channel_closes_before_reply() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(encoded(&response(0.0, 0)));
        channel.push_closure();

        let mut session = session_with(channel);
        session.reset().unwrap();
        let err = session.step(&monitor_all()).unwrap_err();
        assert!(matches!(err, Error::ChannelClosed { .. }));
    }

    /// Delivers one reply, then fails every receive with an I/O error.
    struct FailingDrainChannel {
        reply: Option<Vec<u8>>,
    }

    impl Channel for FailingDrainChannel {
        fn send(&mut self, _frame: &[u8]) -> Result<()> {
            Ok(())
        }

        fn receive(&mut self, _timeout: Option<std::time::Duration>) -> Result<Received> {
            match self.reply.take() {
                Some(frame) => Ok(Received::Frame(frame)),
                None => Err(Error::Io {
                    operation: "read frame".to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    ),
                }),
            }
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn drain_error_does_not_fail_the_completed_exchange() {
        let channel = FailingDrainChannel {
            reply: Some(encoded(&response(42.0, 0))),
        };
        let mut session = Session::new(channel, MsgPackCodec::new(), EpisodeConfig::default());

        // The reply arrived before the channel broke; the failing drain
        // probe must not clobber it.
        let state = session.reset().unwrap();
        assert_eq!(state.score, 42.0);

        let err = session.step(&monitor_all()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn malformed_reply_is_a_protocol_error() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(vec![0xc1, 0x00, 0x01]);

        let mut session = session_with(channel);
        let err = session.reset().unwrap_err();
        assert!(matches!(err, Error::MalformedFrame { .. }));
    }

    #[test]
    fn reset_sends_the_reset_directive() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(encoded(&response(0.0, 0)));

        let mut session = session_with(channel);
        session.reset().unwrap();

        let sent = &session.channel.sent()[0];
        let decoded: Vec<crate::wire::ActionRecord> = rmp_serde::from_slice(sent).unwrap();
        assert_eq!(decoded, reset_message());
    }

    struct ScriptedPolicy {
        rewards: Vec<f64>,
        episodes_ended: usize,
    }

    impl Policy for ScriptedPolicy {
        fn choose(&mut self, space: &ActionSpace, _state: &WorldState) -> Result<JointAction> {
            let kinds: Vec<_> = space.per_train().iter().map(|k| k[0]).collect();
            Ok(JointAction::from_kinds(&kinds))
        }

        fn respond(&mut self, reward: f64) -> Result<()> {
            self.rewards.push(reward);
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn end_episode(&mut self) -> Result<()> {
            self.episodes_ended += 1;
            Ok(())
        }
    }

    #[test]
    fn episode_rewards_are_score_deltas() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(encoded(&response(1600.0, 0)));
        channel.push_timeout();
        channel.push_frame(encoded(&response(1584.5, 1)));
        channel.push_timeout();
        channel.push_frame(encoded(&response(1590.0, 2)));

        let config = EpisodeConfig::default().with_max_rounds(2);
        let mut session = Session::new(channel, MsgPackCodec::new(), config);
        let mut policy = ScriptedPolicy {
            rewards: Vec::new(),
            episodes_ended: 0,
        };

        let final_score = run_episode(&mut session, &mut policy).unwrap();
        assert_eq!(final_score, 1590.0);
        assert_eq!(policy.rewards, vec![-15.5, 5.5]);
        assert_eq!(policy.episodes_ended, 1);
    }

    struct IllegalPolicy;

    impl Policy for IllegalPolicy {
        fn choose(&mut self, _space: &ActionSpace, _state: &WorldState) -> Result<JointAction> {
            use crate::actions::ActionKind;
            // Start is illegal for running trains on tracks.
            Ok(JointAction::from_kinds(&[ActionKind::Start; 8]))
        }

        fn respond(&mut self, _reward: f64) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "illegal"
        }
    }

    #[test]
    fn illegal_choice_aborts_the_episode() {
        let mut channel = InMemoryChannel::new();
        channel.push_frame(encoded(&response(0.0, 0)));

        let mut session = session_with(channel);
        let err = run_episode(&mut session, &mut IllegalPolicy).unwrap_err();
        assert!(matches!(err, Error::InvalidAction { .. }));
    }
}
