use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gym_envs::{
    Env, GridWorldEnv, TetrisEnv, TetrisEnvConfig, grid_world::DEFAULT_SIZE, seeded_rng,
};
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "rollout")]
#[command(about = "Plays episodes with a uniformly random policy and reports their returns")]
struct Cli {
    #[command(subcommand)]
    env: EnvKind,
    #[arg(long, default_value_t = 10)]
    episodes: u32,
    /// Episodes still running after this many steps are cut off
    #[arg(long, default_value_t = 10_000)]
    max_steps: u32,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum EnvKind {
    Tetris {
        /// JSON file holding a tetris environment config
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        step_ms: Option<u64>,
    },
    GridWorld {
        #[arg(long, default_value_t = DEFAULT_SIZE)]
        size: i64,
    },
}

#[derive(Debug, Serialize)]
struct Episode {
    episode: u32,
    steps: u32,
    reward: f32,
    terminated: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    episodes: Vec<Episode>,
    mean_reward: f32,
    mean_steps: f32,
}

impl Summary {
    fn new(episodes: Vec<Episode>) -> Self {
        let count = episodes.len().max(1) as f32;
        let mean_reward = episodes.iter().map(|e| e.reward).sum::<f32>() / count;
        let mean_steps = episodes.iter().map(|e| e.steps as f32).sum::<f32>() / count;
        Self {
            episodes,
            mean_reward,
            mean_steps,
        }
    }
}

fn load_tetris_config(path: Option<&PathBuf>) -> Result<TetrisEnvConfig> {
    let Some(path) = path else {
        return Ok(TetrisEnvConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn run<E: Env>(env: &mut E, cli: &Cli) -> Result<Vec<Episode>> {
    let mut policy = seeded_rng(cli.seed);
    let space = env.action_space();
    let mut episodes = Vec::with_capacity(cli.episodes as usize);

    for episode in 0..cli.episodes {
        env.reset(cli.seed.map(|seed| seed.wrapping_add(u64::from(episode))));
        let mut record = Episode {
            episode,
            steps: 0,
            reward: 0.0,
            terminated: false,
        };
        while record.steps < cli.max_steps {
            let action = space.sample(&mut policy);
            let step = env
                .step_index(action)
                .with_context(|| format!("episode {episode}, step {}", record.steps))?;
            record.steps += 1;
            record.reward += step.reward;
            debug!("Action {action}, reward {}", step.reward);
            if step.done() {
                record.terminated = step.terminated;
                break;
            }
        }
        info!(
            "Episode {episode}: {} steps, reward {:.1}",
            record.steps, record.reward
        );
        episodes.push(record);
    }
    Ok(episodes)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let episodes = match &cli.env {
        EnvKind::Tetris { config, step_ms } => {
            let mut config = load_tetris_config(config.as_ref())?;
            if let Some(step_ms) = step_ms {
                config.step_duration_ms = *step_ms;
            }
            config.seed = cli.seed.or(config.seed);
            info!("Starting tetris rollout with {config:?}");
            run(&mut TetrisEnv::new(config), &cli)?
        }
        EnvKind::GridWorld { size } => {
            info!("Starting grid world rollout on a {size}x{size} grid");
            run(&mut GridWorldEnv::new(*size, cli.seed)?, &cli)?
        }
    };

    let summary = Summary::new(episodes);
    info!(
        "Mean reward {:.2} over {} episodes",
        summary.mean_reward,
        summary.episodes.len()
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
