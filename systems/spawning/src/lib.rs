#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting ball spawn commands.

use calm_rally_core::{Command, DifficultySnapshot, Event, Phase, SessionConfig};
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    jitter: Vec2,
    misses_before_assist: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided jitter extents, assist
    /// threshold and seed.
    #[must_use]
    pub const fn new(jitter: Vec2, misses_before_assist: u32, rng_seed: u64) -> Self {
        Self {
            jitter,
            misses_before_assist,
            rng_seed,
        }
    }

    /// Derives the configuration from session parameters.
    #[must_use]
    pub fn from_session(config: &SessionConfig, rng_seed: u64) -> Self {
        Self::new(
            config.spawn_jitter,
            config.misses_before_simplify,
            rng_seed,
        )
    }
}

/// Pure system that launches a ball each time the spawn timer falls due.
#[derive(Debug)]
pub struct Spawning {
    jitter: Vec2,
    misses_before_assist: u32,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            jitter: config.jitter.abs(),
            misses_before_assist: config.misses_before_assist,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the difficulty snapshot to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        snapshot: &DifficultySnapshot,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if matches!(event, Event::SpawnDue) {
                if let Some(command) = self.try_spawn(snapshot) {
                    out.push(command);
                }
            }
        }
    }

    /// Builds a spawn command for the current state, if gameplay is running.
    pub fn try_spawn(&mut self, snapshot: &DifficultySnapshot) -> Option<Command> {
        if snapshot.phase != Phase::Active {
            return None;
        }

        Some(Command::SpawnBall {
            speed: snapshot.current_speed,
            jitter: self.next_jitter(),
            trajectory_assist: snapshot.consecutive_misses >= self.misses_before_assist,
        })
    }

    fn next_jitter(&mut self) -> Vec3 {
        let x = self.rng.gen_range(-self.jitter.x..=self.jitter.x);
        let y = self.rng.gen_range(-self.jitter.y..=self.jitter.y);
        Vec3::new(x, y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(phase: Phase, consecutive_misses: u32) -> DifficultySnapshot {
        DifficultySnapshot {
            phase,
            current_speed: 4.0,
            correct_hits: 0,
            consecutive_misses,
            wave_timer: Duration::ZERO,
        }
    }

    #[test]
    fn jitter_stays_within_extents() {
        let mut spawning = Spawning::new(Config::new(Vec2::new(0.3, 0.2), 2, 7));
        for _ in 0..256 {
            let jitter = spawning.next_jitter();
            assert!(jitter.x.abs() <= 0.3 + 1e-6);
            assert!(jitter.y.abs() <= 0.2 + 1e-6);
            assert_eq!(jitter.z, 0.0);
        }
    }

    #[test]
    fn zero_jitter_spawns_at_anchor() {
        let mut spawning = Spawning::new(Config::new(Vec2::ZERO, 2, 7));
        assert_eq!(spawning.next_jitter(), Vec3::ZERO);
    }

    #[test]
    fn no_spawn_outside_active_phase() {
        let mut spawning = Spawning::new(Config::new(Vec2::ZERO, 2, 7));
        for phase in [
            Phase::Intro,
            Phase::Paused,
            Phase::OverstimulatedPause,
            Phase::Ended,
        ] {
            assert_eq!(spawning.try_spawn(&snapshot(phase, 0)), None);
        }
    }

    #[test]
    fn assist_follows_miss_streak() {
        let mut spawning = Spawning::new(Config::new(Vec2::ZERO, 2, 7));
        let command = spawning.try_spawn(&snapshot(Phase::Active, 2));
        assert_eq!(
            command,
            Some(Command::SpawnBall {
                speed: 4.0,
                jitter: Vec3::ZERO,
                trajectory_assist: true,
            })
        );
    }
}
