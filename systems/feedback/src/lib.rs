#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Feedback system translating session events into presentation directives.

use std::time::Duration;

use calm_rally_core::{
    format_clock, Directive, Event, IconKind, OverlayKind, ParticleKind, Phase, Scoreboard,
    SessionConfig, SoundKind, SpeedLevel,
};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ICON_ANCHOR: Vec2 = Vec2::ZERO;
const SMILEY_JITTER: Vec2 = Vec2::new(30.0, 20.0);
const STAR_JITTER_X: f32 = 40.0;
const STAR_RISE: f32 = 30.0;
const STAR_EFFECT_TTL: Duration = Duration::from_secs(2);
const SPARKLE_TTL: Duration = Duration::from_secs(1);
const FULL_LIGHT: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Eq)]
struct ScoreLine {
    hits: u32,
    speed_level: SpeedLevel,
    remaining: String,
}

/// Pure system that turns events into sounds, visuals and HUD updates.
#[derive(Debug)]
pub struct Feedback {
    rng: ChaCha8Rng,
    last_score: Option<ScoreLine>,
}

impl Feedback {
    /// Creates a feedback system whose cosmetic randomness derives from `rng_seed`.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            last_score: None,
        }
    }

    /// Consumes events to emit presentation directives.
    pub fn handle(&mut self, events: &[Event], config: &SessionConfig, out: &mut Vec<Directive>) {
        for event in events {
            match event {
                Event::IntroductionStarted { text } => {
                    out.push(Directive::SetHudVisible { visible: false });
                    out.push(Directive::ShowIntroduction { text: text.clone() });
                    out.push(sound(SoundKind::Narration, false));
                }
                Event::PhaseChanged { from, to } => self.phase_changed(*from, *to, config, out),
                Event::BallSpawned {
                    ball,
                    speed,
                    jitter,
                    trajectory_assist,
                } => out.push(Directive::SpawnBall {
                    ball: *ball,
                    speed: *speed,
                    jitter: *jitter,
                    trajectory_assist: *trajectory_assist,
                }),
                Event::BallEvicted { ball } => out.push(Directive::DespawnBall { ball: *ball }),
                Event::BallHit {
                    position,
                    quality,
                    fast,
                    ..
                } => {
                    out.push(sound(SoundKind::Hit, false));
                    out.push(Directive::ShowFloatingIcon {
                        kind: IconKind::Smiley,
                        anchor: ICON_ANCHOR,
                        jitter: self.symmetric_jitter(SMILEY_JITTER),
                    });

                    if *fast {
                        let jitter = Vec2::new(
                            self.rng.gen_range(-STAR_JITTER_X..=STAR_JITTER_X),
                            self.rng.gen_range(0.0..=STAR_RISE),
                        );
                        out.push(Directive::ShowFloatingIcon {
                            kind: IconKind::Star,
                            anchor: ICON_ANCHOR,
                            jitter,
                        });
                        out.push(Directive::ShowParticleEffect {
                            kind: ParticleKind::Star,
                            position: *position,
                            ttl: STAR_EFFECT_TTL,
                        });
                        out.push(sound(SoundKind::SuperHit, false));
                        if self.rng.gen::<f32>() < config.voice_praise_chance {
                            out.push(sound(SoundKind::VoicePraise, false));
                        }
                    }

                    if *quality {
                        out.push(Directive::ShowParticleEffect {
                            kind: ParticleKind::Sparkle,
                            position: *position,
                            ttl: SPARKLE_TTL,
                        });
                    }
                }
                Event::MilestoneReached { .. } => out.push(Directive::ShowBadge {
                    text: config.milestone_text.clone(),
                    duration: config.badge_duration,
                }),
                Event::DifficultySimplified { assisted, .. } => {
                    out.extend(
                        assisted
                            .iter()
                            .map(|ball| Directive::SetBallTrajectoryAssist {
                                ball: *ball,
                                enabled: true,
                            }),
                    );
                    out.push(Directive::ShowTemporaryMessage {
                        text: config.simplify_message.clone(),
                        duration: config.message_duration,
                    });
                }
                Event::EncouragementTriggered {
                    glowing,
                    racket_glow,
                } => {
                    out.push(sound(SoundKind::SoftChime, true));
                    out.extend(glowing.iter().map(|ball| Directive::SetBallGlow {
                        ball: *ball,
                        enabled: true,
                    }));
                    if *racket_glow {
                        out.push(Directive::SetRacketGlow { enabled: true });
                    }
                }
                Event::RacketGlowExpired => out.push(Directive::SetRacketGlow { enabled: false }),
                Event::SessionEnded { summary, despawned } => {
                    out.extend(
                        despawned
                            .iter()
                            .map(|ball| Directive::DespawnBall { ball: *ball }),
                    );
                    out.push(Directive::SetHudVisible { visible: false });
                    out.push(Directive::ShowFinalStats {
                        hits: summary.correct_hits,
                        accuracy: summary.accuracy,
                    });
                    if summary.correct_hits >= config.praise_hits {
                        out.push(sound(SoundKind::VoicePraise, false));
                    }
                }
                Event::TimeAdvanced { .. }
                | Event::SpawnDue
                | Event::InactivitySampleDue { .. }
                | Event::BallMissed { .. } => {}
            }
        }
    }

    /// Emits a scoreboard update when any displayed value changed.
    pub fn refresh_scoreboard(&mut self, scoreboard: &Scoreboard, out: &mut Vec<Directive>) {
        if !scoreboard.phase.shows_hud() {
            return;
        }

        let line = ScoreLine {
            hits: scoreboard.hits,
            speed_level: SpeedLevel::from_speed(scoreboard.speed),
            remaining: format_clock(scoreboard.remaining),
        };
        if self.last_score.as_ref() == Some(&line) {
            return;
        }

        out.push(Directive::UpdateScoreboard {
            hits: line.hits,
            speed_level: line.speed_level,
            remaining: line.remaining.clone(),
        });
        self.last_score = Some(line);
    }

    fn phase_changed(
        &mut self,
        from: Phase,
        to: Phase,
        config: &SessionConfig,
        out: &mut Vec<Directive>,
    ) {
        match (from, to) {
            (Phase::Intro, Phase::Active) => {
                out.push(Directive::HideIntroduction);
                out.push(Directive::SetHudVisible { visible: true });
                out.push(sound(SoundKind::CalmMusic, true));
                self.last_score = None;
            }
            (Phase::Active, Phase::Paused) => {
                out.push(Directive::ShowOverlay {
                    kind: OverlayKind::Pause,
                    visible: true,
                });
                out.push(dim(config));
                out.push(sound(SoundKind::CalmMusic, true));
            }
            (Phase::Paused, Phase::Active) => {
                out.push(Directive::ShowOverlay {
                    kind: OverlayKind::Pause,
                    visible: false,
                });
                out.push(restore(config));
            }
            (Phase::Active, Phase::OverstimulatedPause) => {
                out.push(Directive::ShowOverlay {
                    kind: OverlayKind::Overstimulation,
                    visible: true,
                });
                out.push(dim(config));
                out.push(sound(SoundKind::CalmMusic, true));
            }
            (Phase::OverstimulatedPause, Phase::Active) => {
                out.push(Directive::ShowOverlay {
                    kind: OverlayKind::Overstimulation,
                    visible: false,
                });
                out.push(restore(config));
            }
            _ => {}
        }
    }

    fn symmetric_jitter(&mut self, extent: Vec2) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(-extent.x..=extent.x),
            self.rng.gen_range(-extent.y..=extent.y),
        )
    }
}

fn sound(kind: SoundKind, exclusive: bool) -> Directive {
    Directive::PlaySound { kind, exclusive }
}

fn dim(config: &SessionConfig) -> Directive {
    Directive::SetSceneLightIntensity {
        fraction: config.dimmed_light_fraction,
        fade: config.light_fade,
    }
}

fn restore(config: &SessionConfig) -> Directive {
    Directive::SetSceneLightIntensity {
        fraction: FULL_LIGHT,
        fade: config.light_fade,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoreboard(hits: u32, remaining: Duration) -> Scoreboard {
        Scoreboard {
            phase: Phase::Active,
            hits,
            speed: 3.0,
            remaining,
        }
    }

    #[test]
    fn scoreboard_updates_only_on_change() {
        let mut feedback = Feedback::new(1);
        let mut out = Vec::new();
        feedback.refresh_scoreboard(&scoreboard(0, Duration::from_secs(180)), &mut out);
        feedback.refresh_scoreboard(&scoreboard(0, Duration::from_millis(179_500)), &mut out);
        assert_eq!(out.len(), 2);

        feedback.refresh_scoreboard(&scoreboard(0, Duration::from_millis(179_200)), &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn scoreboard_hidden_outside_gameplay() {
        let mut feedback = Feedback::new(1);
        let mut out = Vec::new();
        let mut ended = scoreboard(3, Duration::ZERO);
        ended.phase = Phase::Ended;
        feedback.refresh_scoreboard(&ended, &mut out);
        assert!(out.is_empty());
    }
}
