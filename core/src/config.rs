//! Tunable parameters for a single therapy session.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Badge text shown when the player reaches the hit milestone.
pub const DEFAULT_MILESTONE_TEXT: &str = "Backhand Badge Earned!";

/// Message shown when the session slows down after repeated misses.
pub const DEFAULT_SIMPLIFY_MESSAGE: &str = "Don't worry! Let's try slower.";

/// Narration text shown before gameplay begins.
pub const DEFAULT_INTRODUCTION: &str = "The ball will begin moving slowly. Then it will get a little faster. \
Watch the color to know the speed. Try to hit each ball calmly.";

/// Parameters controlling difficulty, pacing, inactivity handling and feedback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lowest speed assigned to spawned balls.
    pub min_speed: f32,
    /// Highest speed assigned to spawned balls.
    pub max_speed: f32,
    /// Step applied when the speed is raised or lowered.
    pub speed_increment: f32,
    /// Interval between successive ball spawns.
    pub spawn_delay: Duration,
    /// Wait before the first spawn once gameplay starts.
    pub spawn_warmup: Duration,
    /// Length of the gameplay countdown.
    pub game_time: Duration,
    /// Consecutive misses after which the session slows down and assists.
    pub misses_before_simplify: u32,
    /// Replaces hit and miss driven speed changes with a periodic wave.
    pub enable_wave_mode: bool,
    /// Number of correct hits between speed increases.
    pub hits_per_speed_step: u32,
    /// Distance below the maximum speed within which a hit counts as fast.
    pub fast_ball_margin: f32,
    /// Narration played before gameplay, skipped when absent or empty.
    pub introduction: Option<String>,
    /// Length of the narrated introduction.
    pub intro_duration: Duration,
    /// Interval between head position samples.
    pub inactivity_sample_interval: Duration,
    /// Minimum head displacement treated as movement.
    pub stillness_threshold: f32,
    /// Stillness after which the player is gently encouraged.
    pub encouragement_after: Duration,
    /// Stillness after which the session enters an overstimulated pause.
    pub overstimulation_after: Duration,
    /// Wall-clock length of the overstimulated pause.
    pub overstimulation_recovery: Duration,
    /// Lifetime of the racket glow raised by encouragement.
    pub racket_glow_duration: Duration,
    /// Correct hit count that awards the badge.
    pub milestone_hits: u32,
    /// Text shown on the milestone badge.
    pub milestone_text: String,
    /// How long the milestone badge stays visible.
    pub badge_duration: Duration,
    /// Text shown when the session simplifies.
    pub simplify_message: String,
    /// How long temporary messages stay visible.
    pub message_duration: Duration,
    /// Scene light fraction applied while paused.
    pub dimmed_light_fraction: f32,
    /// Wall-clock length of scene light fades.
    pub light_fade: Duration,
    /// Correct hits required for closing voice praise.
    pub praise_hits: u32,
    /// Chance that a fast hit triggers voice praise.
    pub voice_praise_chance: f32,
    /// Upper bound on simultaneously tracked balls.
    pub max_live_balls: usize,
    /// Horizontal and vertical extent of spawn position jitter.
    pub spawn_jitter: Vec2,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_speed: 3.0,
            max_speed: 15.0,
            speed_increment: 0.5,
            spawn_delay: Duration::from_secs(3),
            spawn_warmup: Duration::from_secs(2),
            game_time: Duration::from_secs(180),
            misses_before_simplify: 2,
            enable_wave_mode: false,
            hits_per_speed_step: 3,
            fast_ball_margin: 1.0,
            introduction: Some(DEFAULT_INTRODUCTION.to_owned()),
            intro_duration: Duration::from_secs(8),
            inactivity_sample_interval: Duration::from_secs(1),
            stillness_threshold: 0.01,
            encouragement_after: Duration::from_secs(10),
            overstimulation_after: Duration::from_secs(20),
            overstimulation_recovery: Duration::from_secs(5),
            racket_glow_duration: Duration::from_secs(3),
            milestone_hits: 10,
            milestone_text: DEFAULT_MILESTONE_TEXT.to_owned(),
            badge_duration: Duration::from_secs(3),
            simplify_message: DEFAULT_SIMPLIFY_MESSAGE.to_owned(),
            message_duration: Duration::from_secs(2),
            dimmed_light_fraction: 0.4,
            light_fade: Duration::from_secs(1),
            praise_hits: 10,
            voice_praise_chance: 0.5,
            max_live_balls: 32,
            spawn_jitter: Vec2::new(0.3, 0.2),
        }
    }
}

impl SessionConfig {
    /// Reports whether a ball travelling at `speed` counts as a fast ball.
    #[must_use]
    pub fn is_fast_ball(&self, speed: f32) -> bool {
        speed >= self.max_speed - self.fast_ball_margin
    }

    /// Clamps `speed` into the configured speed range.
    #[must_use]
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(self.min_speed, self.max_speed)
    }

    /// Narration text to play, if any.
    #[must_use]
    pub fn introduction_text(&self) -> Option<&str> {
        self.introduction
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Checks the configuration for values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speeds = [self.min_speed, self.max_speed, self.speed_increment];
        if speeds.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::NonFinite("speed"));
        }
        if self.min_speed <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed(self.min_speed));
        }
        if self.min_speed >= self.max_speed {
            return Err(ConfigError::InvertedSpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.speed_increment <= 0.0 {
            return Err(ConfigError::NonPositiveIncrement(self.speed_increment));
        }
        if self.spawn_delay.is_zero() {
            return Err(ConfigError::ZeroDuration("spawn_delay"));
        }
        if self.game_time.is_zero() {
            return Err(ConfigError::ZeroDuration("game_time"));
        }
        if self.misses_before_simplify == 0 {
            return Err(ConfigError::ZeroMissThreshold);
        }
        if self.inactivity_sample_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("inactivity_sample_interval"));
        }
        if self.hits_per_speed_step == 0 {
            return Err(ConfigError::ZeroHitsPerStep);
        }
        if self.encouragement_after >= self.overstimulation_after {
            return Err(ConfigError::InactivityStagesOutOfOrder);
        }
        if self.max_live_balls == 0 {
            return Err(ConfigError::NoBallCapacity);
        }
        if !self.stillness_threshold.is_finite() || self.stillness_threshold < 0.0 {
            return Err(ConfigError::NonFinite("stillness_threshold"));
        }
        if !self.fast_ball_margin.is_finite() || self.fast_ball_margin < 0.0 {
            return Err(ConfigError::NonFinite("fast_ball_margin"));
        }
        if !self.spawn_jitter.is_finite() || self.spawn_jitter.min_element() < 0.0 {
            return Err(ConfigError::InvalidJitter);
        }
        if !(0.0..=1.0).contains(&self.dimmed_light_fraction) {
            return Err(ConfigError::OutOfUnitRange("dimmed_light_fraction"));
        }
        if !(0.0..=1.0).contains(&self.voice_praise_chance) {
            return Err(ConfigError::OutOfUnitRange("voice_praise_chance"));
        }
        Ok(())
    }
}

/// Reasons a [`SessionConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric parameter was not finite or fell below zero.
    #[error("`{0}` must be a finite non-negative number")]
    NonFinite(&'static str),
    /// The minimum speed was zero or negative.
    #[error("minimum speed must be positive, got {0}")]
    NonPositiveSpeed(f32),
    /// The minimum speed was not below the maximum speed.
    #[error("minimum speed {min} must be below maximum speed {max}")]
    InvertedSpeedRange {
        /// Configured minimum speed.
        min: f32,
        /// Configured maximum speed.
        max: f32,
    },
    /// The speed increment was zero or negative.
    #[error("speed increment must be positive, got {0}")]
    NonPositiveIncrement(f32),
    /// A period that drives a repeating timer was zero.
    #[error("`{0}` must be longer than zero")]
    ZeroDuration(&'static str),
    /// Simplification was configured to trigger after zero misses.
    #[error("misses before simplifying must be at least one")]
    ZeroMissThreshold,
    /// Speed steps were configured to happen every zero hits.
    #[error("hits per speed step must be at least one")]
    ZeroHitsPerStep,
    /// The encouragement stage did not precede the overstimulation stage.
    #[error("encouragement must trigger before overstimulation")]
    InactivityStagesOutOfOrder,
    /// The live ball registry was given no room.
    #[error("at least one live ball must be allowed")]
    NoBallCapacity,
    /// Spawn jitter extents were negative or non-finite.
    #[error("spawn jitter extents must be finite and non-negative")]
    InvalidJitter,
    /// A fraction fell outside `0.0..=1.0`.
    #[error("`{0}` must lie between 0 and 1")]
    OutOfUnitRange(&'static str),
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SessionConfig};
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_speed_range_is_rejected() {
        let config = SessionConfig {
            min_speed: 10.0,
            max_speed: 5.0,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSpeedRange {
                min: 10.0,
                max: 5.0
            })
        );
    }

    #[test]
    fn zero_spawn_delay_is_rejected() {
        let config = SessionConfig {
            spawn_delay: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("spawn_delay"))
        );
    }

    #[test]
    fn invalid_fast_ball_margin_is_rejected() {
        for margin in [f32::NAN, -1.0] {
            let config = SessionConfig {
                fast_ball_margin: margin,
                ..SessionConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::NonFinite("fast_ball_margin"))
            );
        }
    }

    #[test]
    fn fast_ball_threshold_sits_one_below_maximum() {
        let config = SessionConfig::default();
        assert!(config.is_fast_ball(14.0));
        assert!(config.is_fast_ball(15.0));
        assert!(!config.is_fast_ball(13.9));
    }

    #[test]
    fn blank_introduction_is_skipped() {
        let config = SessionConfig {
            introduction: Some("   ".to_owned()),
            ..SessionConfig::default()
        };
        assert_eq!(config.introduction_text(), None);
    }
}
