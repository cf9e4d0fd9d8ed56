#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Calm Rally session against a simulated player.

mod config_file;
mod player;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use calm_rally_core::{Directive, DirectiveSink, Phase, SessionConfig};
use calm_rally_director::Director;
use clap::Parser;
use player::{Outcome, Profile, SimulatedPlayer};

/// Runs a headless therapy session and prints the directives it produces.
#[derive(Debug, Parser)]
#[command(name = "calm-rally", version)]
struct Cli {
    /// Path to a TOML session configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for every random decision in the session and the simulated player.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Behaviour of the simulated player.
    #[arg(long, value_enum, default_value_t = Profile::Steady)]
    profile: Profile,
    /// Simulation ticks per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    tick_hz: u32,
    /// Print directives as JSON lines instead of debug text.
    #[arg(long)]
    json: bool,
}

/// Sink printing each directive and buffering it for the simulated player.
#[derive(Debug)]
struct ConsoleSink {
    json: bool,
    clock: Duration,
    pending: Vec<Directive>,
}

impl ConsoleSink {
    fn new(json: bool) -> Self {
        Self {
            json,
            clock: Duration::ZERO,
            pending: Vec::new(),
        }
    }

    fn drain(&mut self) -> Vec<Directive> {
        std::mem::take(&mut self.pending)
    }
}

impl DirectiveSink for ConsoleSink {
    fn submit(&mut self, directive: Directive) {
        if self.json {
            match serde_json::to_string(&directive) {
                Ok(line) => println!("{line}"),
                Err(error) => log::warn!("failed to encode {directive:?}: {error}"),
            }
        } else {
            println!("{:>8.2}s  {directive:?}", self.clock.as_secs_f32());
        }
        self.pending.push(directive);
    }
}

/// Entry point for the Calm Rally command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config_file::load(path)?,
        None => SessionConfig::default(),
    };
    let time_limit = time_limit(&config);
    let dt = Duration::from_secs_f64(1.0 / f64::from(cli.tick_hz));

    let mut director = Director::new(config, cli.seed, ConsoleSink::new(cli.json))
        .context("failed to start session")?;
    let mut player = SimulatedPlayer::new(cli.profile, cli.seed);
    log::info!("running session with {:?} player", cli.profile);

    while director.phase() != Phase::Ended {
        if player.elapsed() >= time_limit {
            log::warn!("session did not end within {time_limit:?}, stopping");
            break;
        }

        director.sink_mut().clock = player.elapsed();
        director.report_player_position(player.head_position(), player.elapsed());
        director.tick(dt);
        forward(&mut director, &mut player);

        for outcome in player.advance(dt) {
            match outcome {
                Outcome::Hit {
                    ball,
                    speed,
                    position,
                    quality,
                } => director.report_ball_hit(ball, speed, position, quality),
                Outcome::Miss { ball } => director.report_ball_missed(ball),
            }
        }
        forward(&mut director, &mut player);
    }

    match director.summary() {
        Some(summary) => log::info!(
            "finished: {} hits ({} fast) of {} balls, {:.1}% accuracy",
            summary.correct_hits,
            summary.fast_ball_hits,
            summary.total_balls_spawned,
            summary.accuracy
        ),
        None => log::warn!("session stopped before it ended"),
    }
    Ok(())
}

/// Simulated time after which a session that never ended is abandoned.
fn time_limit(config: &SessionConfig) -> Duration {
    config
        .game_time
        .saturating_add(config.intro_duration)
        .saturating_mul(4)
        .saturating_add(Duration::from_secs(60))
}

fn forward(director: &mut Director<ConsoleSink>, player: &mut SimulatedPlayer) {
    for directive in director.sink_mut().drain() {
        player.observe(&directive);
    }
}
