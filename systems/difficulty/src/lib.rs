#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive difficulty system that tunes ball speed to player performance.
//!
//! Outside wave mode every third correct hit raises the speed by one step and
//! a run of misses lowers it again. In wave mode the speed follows a fixed
//! oscillation instead, while repeated misses still trigger the trajectory
//! guide and encouragement message.

use std::time::Duration;

use calm_rally_core::{Command, DifficultySnapshot, Event, Phase, SessionConfig};

/// Length of one full wave cycle.
pub const WAVE_CYCLE: Duration = Duration::from_secs(80);
/// End of the opening ramp from minimum to plateau speed.
pub const WAVE_RAMP_END: Duration = Duration::from_secs(30);
/// End of the plateau, where the climb to maximum speed begins.
pub const WAVE_PLATEAU_END: Duration = Duration::from_secs(50);
/// Plateau speed expressed as a fraction of the maximum speed.
pub const WAVE_PLATEAU_FRACTION: f32 = 0.6;

/// Outcome of a difficulty decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyUpdate {
    /// New speed for future balls, absent when the speed is unchanged.
    pub speed: Option<f32>,
    /// Whether live balls should show the trajectory guide.
    pub simplify: bool,
}

impl DifficultyUpdate {
    const UNCHANGED: Self = Self {
        speed: None,
        simplify: false,
    };
}

/// Speed reached by the wave after advancing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveStep {
    /// Position within the wave cycle.
    pub wave_timer: Duration,
    /// Speed dictated by the wave at that position.
    pub speed: f32,
}

/// Decides the speed after a correct hit.
///
/// `correct_hits` already includes the hit being processed.
#[must_use]
pub fn on_hit(config: &SessionConfig, correct_hits: u32, current_speed: f32) -> DifficultyUpdate {
    if config.enable_wave_mode || correct_hits == 0 {
        return DifficultyUpdate::UNCHANGED;
    }
    if correct_hits % config.hits_per_speed_step != 0 || current_speed >= config.max_speed {
        return DifficultyUpdate::UNCHANGED;
    }
    DifficultyUpdate {
        speed: Some(config.clamp_speed(current_speed + config.speed_increment)),
        simplify: false,
    }
}

/// Decides the reaction to a miss.
///
/// `consecutive_misses` already includes the miss being processed. Every
/// miss at or past the threshold lowers the speed by one step.
#[must_use]
pub fn on_miss(
    config: &SessionConfig,
    consecutive_misses: u32,
    current_speed: f32,
) -> DifficultyUpdate {
    if consecutive_misses < config.misses_before_simplify {
        return DifficultyUpdate::UNCHANGED;
    }
    let speed = if config.enable_wave_mode {
        None
    } else {
        Some(config.clamp_speed(current_speed - config.speed_increment))
    };
    DifficultyUpdate {
        speed,
        simplify: true,
    }
}

/// Speed dictated by the wave at `wave_timer`.
#[must_use]
pub fn wave_speed(config: &SessionConfig, wave_timer: Duration) -> f32 {
    let t = wrap(wave_timer).as_secs_f32();
    let ramp_end = WAVE_RAMP_END.as_secs_f32();
    let plateau_end = WAVE_PLATEAU_END.as_secs_f32();
    let cycle = WAVE_CYCLE.as_secs_f32();
    let plateau = config.max_speed * WAVE_PLATEAU_FRACTION;

    let speed = if t < ramp_end {
        lerp(config.min_speed, plateau, t / ramp_end)
    } else if t < plateau_end {
        plateau
    } else {
        lerp(
            plateau,
            config.max_speed,
            (t - plateau_end) / (cycle - plateau_end),
        )
    };
    config.clamp_speed(speed)
}

/// Advances the wave by `dt` of scaled time.
#[must_use]
pub fn wave_tick(config: &SessionConfig, wave_timer: Duration, dt: Duration) -> WaveStep {
    let wave_timer = wrap(wave_timer.saturating_add(dt));
    WaveStep {
        wave_timer,
        speed: wave_speed(config, wave_timer),
    }
}

fn wrap(wave_timer: Duration) -> Duration {
    let cycle = WAVE_CYCLE.as_nanos();
    let wrapped = wave_timer.as_nanos() % cycle;
    Duration::from_nanos(u64::try_from(wrapped).unwrap_or_default())
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Pure system that turns hits, misses and elapsed time into speed commands.
#[derive(Debug, Default)]
pub struct Difficulty;

impl Difficulty {
    /// Creates a new difficulty system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes events and the current snapshot to emit difficulty commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        snapshot: &DifficultySnapshot,
        config: &SessionConfig,
        out: &mut Vec<Command>,
    ) {
        if snapshot.phase == Phase::Ended {
            return;
        }

        let mut speed = snapshot.current_speed;
        let mut wave_timer = snapshot.wave_timer;

        for event in events {
            match event {
                Event::BallHit { correct_hits, .. } => {
                    if let Some(next) = on_hit(config, *correct_hits, speed).speed {
                        log::debug!("raising speed {speed} -> {next} after {correct_hits} hits");
                        speed = next;
                        out.push(Command::SetSpeed { speed });
                    }
                }
                Event::BallMissed {
                    consecutive_misses, ..
                } => {
                    let update = on_miss(config, *consecutive_misses, speed);
                    if update.simplify {
                        if let Some(next) = update.speed {
                            speed = next;
                        }
                        out.push(Command::Simplify {
                            speed: update.speed,
                        });
                    }
                }
                Event::TimeAdvanced { scaled, .. }
                    if config.enable_wave_mode && snapshot.phase == Phase::Active =>
                {
                    let step = wave_tick(config, wave_timer, *scaled);
                    wave_timer = step.wave_timer;
                    out.push(Command::AdvanceWave {
                        wave_timer: step.wave_timer,
                        speed: step.speed,
                    });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_resets_at_cycle_end() {
        assert_eq!(wrap(WAVE_CYCLE), Duration::ZERO);
        assert_eq!(
            wrap(WAVE_CYCLE + Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn lerp_clamps_progress() {
        assert_eq!(lerp(1.0, 3.0, 2.0), 3.0);
        assert_eq!(lerp(1.0, 3.0, -1.0), 1.0);
    }
}
