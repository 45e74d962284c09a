//! Floodline CLI - run live episodes against the metro simulator.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use floodline::{
    CodecKind, EpisodeConfig, InstanceAgentConfig, InstanceBasedAgent, Policy, RandomPolicy,
    Session, Topology, ValueAgentConfig, ValueNetworkAgent,
    adapters::{JsonCodec, MsgPackCodec, TcpChannel},
    run_episode,
};

#[derive(Parser)]
#[command(name = "floodline")]
#[command(version, about = "Decision core for the flood-affected metro simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes with a chosen policy against a live simulator
    Run(RunArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    Random,
    Instance,
    Value,
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Msgpack,
    Json,
}

impl CodecArg {
    fn kind(self) -> CodecKind {
        match self {
            CodecArg::Msgpack => CodecKind::MsgPack,
            CodecArg::Json => CodecKind::Json,
        }
    }
}

#[derive(clap::Args)]
struct RunArgs {
    /// Simulator address
    #[arg(long, default_value = "localhost:8765")]
    address: String,

    /// Decision policy
    #[arg(long, value_enum, default_value = "random")]
    policy: PolicyKind,

    /// Wire codec to use
    #[arg(long, value_enum, default_value = "msgpack")]
    codec: CodecArg,

    /// Rounds per episode
    #[arg(long, default_value_t = 30)]
    rounds: usize,

    /// Number of episodes
    #[arg(long, default_value_t = 1)]
    episodes: usize,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Value-agent checkpoint to load before and save after the run
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let topology = Topology::default();

    match args.policy {
        PolicyKind::Random => {
            let mut policy = match args.seed {
                Some(seed) => RandomPolicy::with_seed(seed),
                None => RandomPolicy::new(),
            };
            run_episodes(&args, &mut policy)
        }
        PolicyKind::Instance => {
            let mut config = InstanceAgentConfig::default();
            config.seed = args.seed;
            let mut policy = InstanceBasedAgent::new(config);
            run_episodes(&args, &mut policy)
        }
        PolicyKind::Value => {
            let mut config = ValueAgentConfig::default();
            config.seed = args.seed;
            let mut policy = match &args.checkpoint {
                Some(path) if path.exists() => {
                    ValueNetworkAgent::load(path, config, topology)
                        .context("load value-agent checkpoint")?
                }
                _ => ValueNetworkAgent::new(config, topology).context("build value agent")?,
            };
            run_episodes(&args, &mut policy)?;
            if let Some(path) = &args.checkpoint {
                policy.save(path).context("save value-agent checkpoint")?;
            }
            Ok(())
        }
    }
}

fn run_episodes(args: &RunArgs, policy: &mut dyn Policy) -> Result<()> {
    let bar = ProgressBar::new(args.episodes as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} episodes, last score {msg}")?,
    );

    for episode in 0..args.episodes {
        let config = EpisodeConfig::default().with_max_rounds(args.rounds);

        // One connection per episode; the session closes it on every exit
        // path, so a dropped connection only ends the current episode.
        let channel = TcpChannel::connect(&args.address)
            .with_context(|| format!("connect to {}", args.address))?;
        let score = match args.codec.kind() {
            CodecKind::MsgPack => {
                let mut session = Session::new(channel, MsgPackCodec::new(), config);
                run_episode(&mut session, policy)
            }
            CodecKind::Json => {
                let mut session = Session::new(channel, JsonCodec::new(), config);
                run_episode(&mut session, policy)
            }
        }
        .with_context(|| format!("episode {episode}"))?;

        bar.set_message(format!("{score:.2}"));
        bar.inc(1);
    }
    bar.finish();
    Ok(())
}
