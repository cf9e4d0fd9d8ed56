//! Scripted stand-in for a patient playing the session.

use std::{collections::BTreeMap, time::Duration};

use calm_rally_core::{BallId, Directive};
use clap::ValueEnum;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const COURT_LENGTH: f32 = 6.0;
const HEAD_HEIGHT: f32 = 1.6;
const CONTACT_HEIGHT: f32 = 1.2;
const CONTACT_DEPTH: f32 = 0.5;
const SWAY: f32 = 0.05;

/// Behaviour the simulated player follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Profile {
    /// Moves and returns most balls.
    Steady,
    /// Moves but misses most balls.
    Struggling,
    /// Stands still and never swings.
    Idle,
}

impl Profile {
    fn hit_chance(self) -> f64 {
        match self {
            Self::Steady => 0.85,
            Self::Struggling => 0.35,
            Self::Idle => 0.0,
        }
    }
}

/// Result of a ball reaching the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Outcome {
    /// The player returned the ball.
    Hit {
        ball: BallId,
        speed: f32,
        position: Vec3,
        quality: bool,
    },
    /// The ball went past the player.
    Miss { ball: BallId },
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    speed: f32,
    jitter: Vec3,
    arrives_at: Duration,
}

/// Tracks launched balls and decides how each one ends.
#[derive(Debug)]
pub(crate) struct SimulatedPlayer {
    profile: Profile,
    rng: ChaCha8Rng,
    in_flight: BTreeMap<BallId, InFlight>,
    elapsed: Duration,
}

impl SimulatedPlayer {
    pub(crate) fn new(profile: Profile, seed: u64) -> Self {
        Self {
            profile,
            rng: ChaCha8Rng::seed_from_u64(seed),
            in_flight: BTreeMap::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Head position at the current simulated time.
    pub(crate) fn head_position(&self) -> Vec3 {
        if self.profile == Profile::Idle {
            return Vec3::new(0.0, HEAD_HEIGHT, 0.0);
        }
        let t = self.elapsed.as_secs_f32();
        Vec3::new(
            SWAY * (t * 1.3).sin(),
            HEAD_HEIGHT + SWAY * 0.4 * (t * 0.7).sin(),
            0.0,
        )
    }

    /// Updates the set of balls in flight from a directive.
    pub(crate) fn observe(&mut self, directive: &Directive) {
        match directive {
            Directive::SpawnBall {
                ball,
                speed,
                jitter,
                ..
            } => {
                let travel = Duration::from_secs_f32(COURT_LENGTH / speed.max(f32::EPSILON));
                let _ = self.in_flight.insert(
                    *ball,
                    InFlight {
                        speed: *speed,
                        jitter: *jitter,
                        arrives_at: self.elapsed + travel,
                    },
                );
            }
            Directive::DespawnBall { ball } => {
                let _ = self.in_flight.remove(ball);
            }
            _ => {}
        }
    }

    /// Advances simulated time and resolves every ball that arrived.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<Outcome> {
        self.elapsed += dt;
        let arrived: Vec<BallId> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.arrives_at <= self.elapsed)
            .map(|(ball, _)| *ball)
            .collect();

        let mut outcomes = Vec::with_capacity(arrived.len());
        for ball in arrived {
            let Some(flight) = self.in_flight.remove(&ball) else {
                continue;
            };
            if self.rng.gen_bool(self.profile.hit_chance()) {
                outcomes.push(Outcome::Hit {
                    ball,
                    speed: flight.speed,
                    position: Vec3::new(
                        flight.jitter.x,
                        CONTACT_HEIGHT + flight.jitter.y,
                        CONTACT_DEPTH,
                    ),
                    quality: self.rng.gen_bool(0.5),
                });
            } else {
                outcomes.push(Outcome::Miss { ball });
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(ball: u32, speed: f32) -> Directive {
        Directive::SpawnBall {
            ball: BallId::new(ball),
            speed,
            jitter: Vec3::ZERO,
            trajectory_assist: false,
        }
    }

    #[test]
    fn balls_arrive_after_crossing_the_court() {
        let mut player = SimulatedPlayer::new(Profile::Steady, 1);
        player.observe(&spawn(0, 3.0));

        assert!(player.advance(Duration::from_millis(1_900)).is_empty());
        assert_eq!(player.advance(Duration::from_millis(100)).len(), 1);
    }

    #[test]
    fn idle_player_misses_everything() {
        let mut player = SimulatedPlayer::new(Profile::Idle, 1);
        player.observe(&spawn(0, 6.0));
        player.observe(&spawn(1, 6.0));

        let outcomes = player.advance(Duration::from_secs(1));
        assert_eq!(
            outcomes,
            vec![
                Outcome::Miss {
                    ball: BallId::new(0)
                },
                Outcome::Miss {
                    ball: BallId::new(1)
                },
            ]
        );
    }

    #[test]
    fn despawned_balls_are_forgotten() {
        let mut player = SimulatedPlayer::new(Profile::Steady, 1);
        player.observe(&spawn(0, 3.0));
        player.observe(&Directive::DespawnBall {
            ball: BallId::new(0),
        });
        assert!(player.advance(Duration::from_secs(10)).is_empty());
    }
}
