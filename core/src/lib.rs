#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Calm Rally session engine.
//!
//! This crate defines the message surface that connects collaborators, the
//! authoritative session, and pure systems. Collaborators (ball physics, head
//! tracking, pause input) submit [`Command`] values describing what happened,
//! the session executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for systems to react to deterministically.
//! Systems consume event streams, query immutable snapshots, and respond with
//! new command batches. Presentation collaborators only ever see
//! [`Directive`] values delivered through a [`DirectiveSink`].

mod config;

use std::time::Duration;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, SessionConfig, DEFAULT_INTRODUCTION, DEFAULT_MILESTONE_TEXT,
    DEFAULT_SIMPLIFY_MESSAGE,
};

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Narrated introduction before gameplay starts.
    Intro,
    /// Gameplay with the countdown and spawns running.
    Active,
    /// Player requested pause.
    Paused,
    /// Automatic calming pause after prolonged stillness.
    OverstimulatedPause,
    /// Terminal phase once the countdown elapsed.
    Ended,
}

impl Phase {
    /// Reports whether the scaled clock is stopped in this phase.
    #[must_use]
    pub const fn freezes_scaled_time(self) -> bool {
        matches!(self, Self::Paused | Self::OverstimulatedPause)
    }

    /// Reports whether ball hit and miss reports are still accepted.
    #[must_use]
    pub const fn accepts_ball_reports(self) -> bool {
        matches!(
            self,
            Self::Active | Self::Paused | Self::OverstimulatedPause
        )
    }

    /// Reports whether the heads-up display is shown in this phase.
    #[must_use]
    pub const fn shows_hud(self) -> bool {
        self.accepts_ball_reports()
    }
}

/// Unique identifier assigned to a spawned ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(u32);

impl BallId {
    /// Creates a new ball identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Coarse speed band displayed on the scoreboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedLevel {
    /// Speeds up to and including 5.
    Slow,
    /// Speeds above 5 up to and including 10.
    Medium,
    /// Speeds above 10.
    Fast,
}

impl SpeedLevel {
    /// Classifies a ball speed into its display band.
    #[must_use]
    pub fn from_speed(speed: f32) -> Self {
        if speed <= 5.0 {
            Self::Slow
        } else if speed <= 10.0 {
            Self::Medium
        } else {
            Self::Fast
        }
    }

    /// Label shown to the player.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Medium => "Medium",
            Self::Fast => "Fast",
        }
    }
}

/// Formats a remaining duration as `mm:ss`, rounding partial seconds down.
#[must_use]
pub fn format_clock(remaining: Duration) -> String {
    let seconds = remaining.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Audio cues the presentation layer can play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundKind {
    /// Regular hit confirmation.
    Hit,
    /// Hit on a fast ball.
    SuperHit,
    /// Spoken praise.
    VoicePraise,
    /// Gentle chime used for encouragement.
    SoftChime,
    /// Background music used during calm phases.
    CalmMusic,
    /// Spoken introduction.
    Narration,
}

/// Floating icons spawned near the scoreboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconKind {
    /// Shown for every hit.
    Smiley,
    /// Shown for fast hits.
    Star,
}

/// Particle effects spawned at a hit position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Burst shown for fast hits.
    Star,
    /// Sparkle shown for quality hits.
    Sparkle,
}

/// Full-screen overlays toggled by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Pause menu.
    Pause,
    /// Calming overlay for the overstimulated pause.
    Overstimulation,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the session, playing the introduction when one is configured.
    BeginSession,
    /// Advances both clocks by the provided wall-clock delta.
    Tick {
        /// Real time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Physics collaborator reports that the racket struck a ball.
    ReportBallHit {
        /// Ball that was struck.
        ball: BallId,
        /// Speed the ball was travelling at.
        speed: f32,
        /// World position of the contact.
        position: Vec3,
        /// Whether the racket moved fast enough for a quality hit.
        quality: bool,
    },
    /// Physics collaborator reports that a ball left play without being hit.
    ReportBallMissed {
        /// Ball that was missed.
        ball: BallId,
    },
    /// Physics collaborator reports that a ball object no longer exists.
    ReportBallDestroyed {
        /// Ball that was destroyed.
        ball: BallId,
    },
    /// Tracking collaborator reports the current head position.
    ReportPlayerPosition {
        /// Head position in world space.
        position: Vec3,
        /// Collaborator timestamp of the sample.
        timestamp: Duration,
    },
    /// Player toggled pause.
    RequestPauseToggle,
    /// Requests that a new ball be launched.
    SpawnBall {
        /// Speed assigned to the ball.
        speed: f32,
        /// Offset applied to the spawn anchor.
        jitter: Vec3,
        /// Whether the trajectory guide is shown for the ball.
        trajectory_assist: bool,
    },
    /// Sets the speed assigned to future balls.
    SetSpeed {
        /// New speed, clamped into the configured range.
        speed: f32,
    },
    /// Advances the wave oscillation to a new point.
    AdvanceWave {
        /// Position within the wave cycle.
        wave_timer: Duration,
        /// Speed dictated by the wave at that position.
        speed: f32,
    },
    /// Slows the session down after repeated misses and assists live balls.
    Simplify {
        /// Reduced speed, absent when the wave controls speed.
        speed: Option<f32>,
    },
    /// Encourages a still player with glowing balls and racket.
    EncouragePlayer,
    /// Enters the automatic calming pause.
    EnterOverstimulatedPause,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Reports that time advanced.
    TimeAdvanced {
        /// Scaled time that elapsed, zero while paused.
        scaled: Duration,
        /// Wall-clock time that elapsed.
        realtime: Duration,
    },
    /// Narration began ahead of gameplay.
    IntroductionStarted {
        /// Narration text.
        text: String,
    },
    /// The session moved between lifecycle phases.
    PhaseChanged {
        /// Phase that was exited.
        from: Phase,
        /// Phase that was entered.
        to: Phase,
    },
    /// The spawn timer elapsed.
    SpawnDue,
    /// The inactivity sampling timer elapsed.
    InactivitySampleDue {
        /// Most recent head position, absent when tracking never reported.
        position: Option<Vec3>,
    },
    /// A ball entered play.
    BallSpawned {
        /// Identifier assigned to the ball.
        ball: BallId,
        /// Speed assigned to the ball.
        speed: f32,
        /// Offset applied to the spawn anchor.
        jitter: Vec3,
        /// Whether the trajectory guide is shown.
        trajectory_assist: bool,
    },
    /// The oldest ball was dropped to respect the live ball limit.
    BallEvicted {
        /// Ball that was dropped.
        ball: BallId,
    },
    /// A ball was struck.
    BallHit {
        /// Ball that was struck.
        ball: BallId,
        /// Speed the ball was travelling at.
        speed: f32,
        /// World position of the contact.
        position: Vec3,
        /// Whether the hit was a quality hit.
        quality: bool,
        /// Whether the ball counts as a fast ball.
        fast: bool,
        /// Correct hits including this one.
        correct_hits: u32,
    },
    /// A ball left play without being hit.
    BallMissed {
        /// Ball that was missed.
        ball: BallId,
        /// Consecutive misses including this one.
        consecutive_misses: u32,
    },
    /// Correct hits reached the milestone count.
    MilestoneReached {
        /// Correct hits at the milestone.
        correct_hits: u32,
    },
    /// The session slowed down after repeated misses.
    DifficultySimplified {
        /// Speed assigned to future balls.
        speed: f32,
        /// Live balls that now show the trajectory guide.
        assisted: Vec<BallId>,
    },
    /// A still player was encouraged.
    EncouragementTriggered {
        /// Live balls that now glow.
        glowing: Vec<BallId>,
        /// Whether the racket glow was switched on.
        racket_glow: bool,
    },
    /// The encouragement racket glow ran out.
    RacketGlowExpired,
    /// The countdown elapsed and the session ended.
    SessionEnded {
        /// Final results.
        summary: SessionSummary,
        /// Balls still in play that were removed.
        despawned: Vec<BallId>,
    },
}

/// Instructions for presentation collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Launch a ball.
    SpawnBall {
        /// Identifier to attach to the ball.
        ball: BallId,
        /// Launch speed.
        speed: f32,
        /// Offset applied to the spawn anchor.
        jitter: Vec3,
        /// Whether to draw the trajectory guide.
        trajectory_assist: bool,
    },
    /// Remove a ball from the scene.
    DespawnBall {
        /// Ball to remove.
        ball: BallId,
    },
    /// Toggle the trajectory guide of a ball.
    SetBallTrajectoryAssist {
        /// Target ball.
        ball: BallId,
        /// Whether the guide is shown.
        enabled: bool,
    },
    /// Toggle the glow of a ball.
    SetBallGlow {
        /// Target ball.
        ball: BallId,
        /// Whether the ball glows.
        enabled: bool,
    },
    /// Toggle the racket glow.
    SetRacketGlow {
        /// Whether the racket glows.
        enabled: bool,
    },
    /// Play an audio cue.
    PlaySound {
        /// Cue to play.
        kind: SoundKind,
        /// Skip playback when the cue is already playing.
        exclusive: bool,
    },
    /// Float an icon upward near the scoreboard.
    ShowFloatingIcon {
        /// Icon to show.
        kind: IconKind,
        /// Screen-space anchor of the icon.
        anchor: Vec2,
        /// Screen-space offset from the anchor.
        jitter: Vec2,
    },
    /// Spawn a short-lived particle effect.
    ShowParticleEffect {
        /// Effect to spawn.
        kind: ParticleKind,
        /// World position of the effect.
        position: Vec3,
        /// Lifetime of the effect.
        ttl: Duration,
    },
    /// Fade the scene light.
    SetSceneLightIntensity {
        /// Target intensity relative to the original.
        fraction: f32,
        /// Wall-clock length of the fade.
        fade: Duration,
    },
    /// Toggle a full-screen overlay.
    ShowOverlay {
        /// Overlay to toggle.
        kind: OverlayKind,
        /// Whether the overlay is shown.
        visible: bool,
    },
    /// Refresh the scoreboard.
    UpdateScoreboard {
        /// Correct hits so far.
        hits: u32,
        /// Current speed band.
        speed_level: SpeedLevel,
        /// Remaining time formatted as `mm:ss`.
        remaining: String,
    },
    /// Show a badge.
    ShowBadge {
        /// Badge text.
        text: String,
        /// How long the badge stays visible.
        duration: Duration,
    },
    /// Show a temporary message.
    ShowTemporaryMessage {
        /// Message text.
        text: String,
        /// How long the message stays visible.
        duration: Duration,
    },
    /// Show the introduction narration panel.
    ShowIntroduction {
        /// Narration text.
        text: String,
    },
    /// Hide the introduction narration panel.
    HideIntroduction,
    /// Toggle the heads-up display.
    SetHudVisible {
        /// Whether the display is shown.
        visible: bool,
    },
    /// Show the closing statistics.
    ShowFinalStats {
        /// Correct hits.
        hits: u32,
        /// Hit accuracy in percent.
        accuracy: f32,
    },
}

/// Receives directives emitted by the session director.
pub trait DirectiveSink {
    /// Accepts a single directive.
    fn submit(&mut self, directive: Directive);
}

impl DirectiveSink for Vec<Directive> {
    fn submit(&mut self, directive: Directive) {
        self.push(directive);
    }
}

/// Sink that discards every directive.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DirectiveSink for NullSink {
    fn submit(&mut self, _directive: Directive) {}
}

/// Final results of a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Balls hit.
    pub correct_hits: u32,
    /// Fast balls hit.
    pub fast_ball_hits: u32,
    /// Balls launched.
    pub total_balls_spawned: u32,
    /// Hit accuracy in percent, zero when nothing was launched.
    pub accuracy: f32,
}

impl SessionSummary {
    /// Builds a summary, deriving accuracy from the counters.
    #[must_use]
    pub fn new(correct_hits: u32, fast_ball_hits: u32, total_balls_spawned: u32) -> Self {
        let accuracy = if total_balls_spawned == 0 {
            0.0
        } else {
            correct_hits as f32 / total_balls_spawned as f32 * 100.0
        };
        Self {
            correct_hits,
            fast_ball_hits,
            total_balls_spawned,
            accuracy,
        }
    }
}

/// Read-only view of the state difficulty and spawning decisions depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultySnapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Speed assigned to future balls.
    pub current_speed: f32,
    /// Correct hits so far.
    pub correct_hits: u32,
    /// Misses since the last hit.
    pub consecutive_misses: u32,
    /// Position within the wave cycle.
    pub wave_timer: Duration,
}

/// Read-only view of the values shown on the scoreboard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scoreboard {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Correct hits so far.
    pub hits: u32,
    /// Speed assigned to future balls.
    pub speed: f32,
    /// Remaining countdown.
    pub remaining: Duration,
}

/// Read-only view of a ball in play.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallSnapshot {
    /// Identifier of the ball.
    pub id: BallId,
    /// Speed assigned at launch.
    pub assigned_speed: f32,
    /// Whether the trajectory guide is shown.
    pub trajectory_assist: bool,
    /// Whether the ball glows.
    pub glowing: bool,
}

#[cfg(test)]
mod tests {
    use super::{format_clock, BallId, Directive, SessionSummary, SoundKind, SpeedLevel};
    use glam::Vec3;
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn speed_levels_follow_band_edges() {
        assert_eq!(SpeedLevel::from_speed(3.0), SpeedLevel::Slow);
        assert_eq!(SpeedLevel::from_speed(5.0), SpeedLevel::Slow);
        assert_eq!(SpeedLevel::from_speed(5.5), SpeedLevel::Medium);
        assert_eq!(SpeedLevel::from_speed(10.0), SpeedLevel::Medium);
        assert_eq!(SpeedLevel::from_speed(10.5), SpeedLevel::Fast);
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::from_secs(180)), "03:00");
        assert_eq!(format_clock(Duration::from_millis(59_900)), "00:59");
        assert_eq!(format_clock(Duration::ZERO), "00:00");
    }

    #[test]
    fn accuracy_is_zero_without_spawns() {
        let summary = SessionSummary::new(0, 0, 0);
        assert_eq!(summary.accuracy, 0.0);
    }

    #[test]
    fn accuracy_is_percentage_of_spawned_balls() {
        let summary = SessionSummary::new(3, 1, 4);
        assert!((summary.accuracy - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ball_id_round_trips_through_bincode() {
        assert_round_trip(&BallId::new(7));
    }

    #[test]
    fn spawn_directive_round_trips_through_bincode() {
        assert_round_trip(&Directive::SpawnBall {
            ball: BallId::new(1),
            speed: 3.5,
            jitter: Vec3::new(0.1, -0.2, 0.0),
            trajectory_assist: true,
        });
    }

    #[test]
    fn sound_directive_round_trips_through_bincode() {
        assert_round_trip(&Directive::PlaySound {
            kind: SoundKind::SoftChime,
            exclusive: true,
        });
    }
}
