#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Inactivity monitor that escalates from encouragement to a calming pause.
//!
//! Head positions are sampled at a fixed interval of scaled time. Samples that
//! moved less than the stillness threshold accumulate stillness. The first
//! stage encourages the player once per stillness streak; the second stage
//! requests an overstimulated pause and starts the streak over.

use std::time::Duration;

use calm_rally_core::{Command, Event, Phase, SessionConfig};
use glam::Vec3;

/// Configuration parameters required to construct the inactivity monitor.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    sample_interval: Duration,
    stillness_threshold: f32,
    encouragement_after: Duration,
    overstimulation_after: Duration,
}

impl Config {
    /// Creates a new configuration from the sampling cadence and stage limits.
    #[must_use]
    pub const fn new(
        sample_interval: Duration,
        stillness_threshold: f32,
        encouragement_after: Duration,
        overstimulation_after: Duration,
    ) -> Self {
        Self {
            sample_interval,
            stillness_threshold,
            encouragement_after,
            overstimulation_after,
        }
    }

    /// Derives the configuration from session parameters.
    #[must_use]
    pub fn from_session(config: &SessionConfig) -> Self {
        Self::new(
            config.inactivity_sample_interval,
            config.stillness_threshold,
            config.encouragement_after,
            config.overstimulation_after,
        )
    }
}

/// Intervention requested after a stillness sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intervention {
    /// Gently encourage the player to move.
    Encourage,
    /// Enter the calming pause.
    Overstimulated,
}

impl Intervention {
    fn command(self) -> Command {
        match self {
            Self::Encourage => Command::EncouragePlayer,
            Self::Overstimulated => Command::EnterOverstimulatedPause,
        }
    }
}

/// Stateful monitor tracking how long the player has been still.
#[derive(Debug)]
pub struct Inactivity {
    config: Config,
    still_for: Duration,
    encouraged: bool,
    last_position: Option<Vec3>,
}

impl Inactivity {
    /// Creates a monitor with no stillness accumulated.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            still_for: Duration::ZERO,
            encouraged: false,
            last_position: None,
        }
    }

    /// Stillness accumulated in the current streak.
    #[must_use]
    pub const fn still_for(&self) -> Duration {
        self.still_for
    }

    /// Clears the stillness streak, as after movement or a hit.
    pub fn reset(&mut self) {
        self.still_for = Duration::ZERO;
        self.encouraged = false;
    }

    /// Feeds one head position sample and reports any intervention it triggers.
    ///
    /// The first sample only establishes a baseline.
    pub fn sample(&mut self, position: Vec3) -> Option<Intervention> {
        if !position.is_finite() {
            log::warn!("ignoring non-finite head position sample");
            return None;
        }

        let moved = self
            .last_position
            .replace(position)
            .map_or(true, |previous| {
                previous.distance(position) >= self.config.stillness_threshold
            });
        if moved {
            self.reset();
            return None;
        }

        self.still_for = self.still_for.saturating_add(self.config.sample_interval);

        if self.still_for >= self.config.overstimulation_after {
            log::info!("player still for {:?}, requesting calming pause", self.still_for);
            self.reset();
            return Some(Intervention::Overstimulated);
        }
        if self.still_for >= self.config.encouragement_after && !self.encouraged {
            log::info!("player still for {:?}, encouraging", self.still_for);
            self.encouraged = true;
            return Some(Intervention::Encourage);
        }
        None
    }

    /// Consumes events to emit encouragement and calming pause commands.
    pub fn handle(&mut self, events: &[Event], phase: Phase, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::BallHit { .. } => self.reset(),
                Event::InactivitySampleDue { position } if phase == Phase::Active => {
                    let Some(position) = position else {
                        log::debug!("no head position reported yet, skipping sample");
                        continue;
                    };
                    if let Some(intervention) = self.sample(*position) {
                        out.push(intervention.command());
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Inactivity {
        Inactivity::new(Config::from_session(&SessionConfig::default()))
    }

    #[test]
    fn first_sample_sets_baseline() {
        let mut inactivity = monitor();
        assert_eq!(inactivity.sample(Vec3::ZERO), None);
        assert_eq!(inactivity.still_for(), Duration::ZERO);
    }

    #[test]
    fn movement_below_threshold_counts_as_stillness() {
        let mut inactivity = monitor();
        let _ = inactivity.sample(Vec3::ZERO);
        let _ = inactivity.sample(Vec3::new(0.005, 0.0, 0.0));
        assert_eq!(inactivity.still_for(), Duration::from_secs(1));
    }

    #[test]
    fn non_finite_sample_is_ignored() {
        let mut inactivity = monitor();
        let _ = inactivity.sample(Vec3::ZERO);
        assert_eq!(inactivity.sample(Vec3::splat(f32::NAN)), None);
        let _ = inactivity.sample(Vec3::ZERO);
        assert_eq!(inactivity.still_for(), Duration::from_secs(1));
    }
}
