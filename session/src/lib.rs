#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Calm Rally.
//!
//! The session owns the lifecycle phase, the countdown, the hit and miss
//! counters, the live ball registry and every pending timer. It changes only
//! through [`apply`], which appends the resulting [`Event`]s for the pure
//! systems to react to.

mod registry;
pub mod scheduler;

use std::time::Duration;

use calm_rally_core::{
    BallId, Command, ConfigError, Event, Phase, SessionConfig, SessionSummary,
};
use glam::Vec3;

use registry::BallRegistry;
use scheduler::{ClockSource, Scheduler};

/// Actions the session defers to its scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    IntroFinished,
    Spawn,
    InactivitySample,
    AutoResume,
    RacketGlowOff,
}

/// Represents the authoritative state of a therapy session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    phase: Phase,
    begun: bool,
    time_remaining: Duration,
    current_speed: f32,
    wave_timer: Duration,
    correct_hits: u32,
    fast_ball_hits: u32,
    consecutive_misses: u32,
    total_balls_spawned: u32,
    balls: BallRegistry,
    scheduler: Scheduler<Timer>,
    player_position: Option<Vec3>,
    racket_glow: bool,
    summary: Option<SessionSummary>,
}

impl Session {
    /// Creates a session in the introduction phase after validating `config`.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            phase: Phase::Intro,
            begun: false,
            time_remaining: config.game_time,
            current_speed: config.min_speed,
            wave_timer: Duration::ZERO,
            correct_hits: 0,
            fast_ball_hits: 0,
            consecutive_misses: 0,
            total_balls_spawned: 0,
            balls: BallRegistry::new(config.max_live_balls),
            scheduler: Scheduler::new(),
            player_position: None,
            racket_glow: false,
            summary: None,
            config,
        })
    }

    fn set_phase(&mut self, to: Phase, out_events: &mut Vec<Event>) {
        let from = self.phase;
        self.phase = to;
        log::debug!("session phase {from:?} -> {to:?}");
        out_events.push(Event::PhaseChanged { from, to });
    }

    fn begin(&mut self, out_events: &mut Vec<Event>) {
        if self.begun {
            log::debug!("session already begun");
            return;
        }
        self.begun = true;

        match self.config.introduction_text().map(str::to_owned) {
            Some(text) if !self.config.intro_duration.is_zero() => {
                let _ = self.scheduler.schedule_once(
                    Timer::IntroFinished,
                    ClockSource::Scaled,
                    self.config.intro_duration,
                );
                out_events.push(Event::IntroductionStarted { text });
            }
            _ => self.start_gameplay(out_events),
        }
    }

    fn start_gameplay(&mut self, out_events: &mut Vec<Event>) {
        let _ = self.scheduler.schedule_periodic(
            Timer::Spawn,
            ClockSource::Scaled,
            self.config.spawn_warmup,
            self.config.spawn_delay,
        );
        let interval = self.config.inactivity_sample_interval;
        let _ = self.scheduler.schedule_periodic(
            Timer::InactivitySample,
            ClockSource::Scaled,
            interval,
            interval,
        );
        log::info!(
            "gameplay started: {:?} countdown at speed {}",
            self.time_remaining,
            self.current_speed
        );
        self.set_phase(Phase::Active, out_events);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let scaled = if self.phase.freezes_scaled_time() {
            Duration::ZERO
        } else {
            dt
        };
        out_events.push(Event::TimeAdvanced {
            scaled,
            realtime: dt,
        });

        if self.phase == Phase::Active {
            self.time_remaining = self.time_remaining.saturating_sub(scaled);
            if self.time_remaining.is_zero() {
                self.end(out_events);
                return;
            }
        }

        let mut fired = Vec::new();
        self.scheduler.advance(scaled, dt, &mut fired);
        for timer in fired {
            if self.phase == Phase::Ended {
                break;
            }
            self.fire(timer, out_events);
        }
    }

    fn fire(&mut self, timer: Timer, out_events: &mut Vec<Event>) {
        match (timer, self.phase) {
            (Timer::IntroFinished, Phase::Intro) => self.start_gameplay(out_events),
            (Timer::Spawn, Phase::Active) => out_events.push(Event::SpawnDue),
            (Timer::InactivitySample, Phase::Active) => {
                out_events.push(Event::InactivitySampleDue {
                    position: self.player_position,
                });
            }
            (Timer::AutoResume, Phase::OverstimulatedPause) => {
                self.set_phase(Phase::Active, out_events);
            }
            (Timer::RacketGlowOff, _) if self.racket_glow => {
                self.racket_glow = false;
                out_events.push(Event::RacketGlowExpired);
            }
            (timer, phase) => log::debug!("discarding {timer:?} timer in {phase:?}"),
        }
    }

    fn end(&mut self, out_events: &mut Vec<Event>) {
        self.scheduler.cancel_all();
        self.racket_glow = false;
        let despawned = self.balls.drain();
        let summary = SessionSummary::new(
            self.correct_hits,
            self.fast_ball_hits,
            self.total_balls_spawned,
        );
        self.summary = Some(summary);
        self.set_phase(Phase::Ended, out_events);
        log::info!(
            "session ended: {} hits of {} balls ({:.1}% accuracy)",
            summary.correct_hits,
            summary.total_balls_spawned,
            summary.accuracy
        );
        out_events.push(Event::SessionEnded { summary, despawned });
    }

    fn record_hit(
        &mut self,
        ball: BallId,
        speed: f32,
        position: Vec3,
        quality: bool,
        out_events: &mut Vec<Event>,
    ) {
        if !self.phase.accepts_ball_reports() {
            log::debug!("ignoring hit on {ball:?} in {:?}", self.phase);
            return;
        }
        if !speed.is_finite() || !position.is_finite() {
            log::warn!("dropping hit on {ball:?} with non-finite speed or position");
            return;
        }
        if self.balls.remove(ball).is_none() {
            log::warn!("dropping hit on unknown ball {ball:?}");
            return;
        }

        let fast = self.config.is_fast_ball(speed);
        self.correct_hits = self.correct_hits.saturating_add(1);
        self.consecutive_misses = 0;
        if fast {
            self.fast_ball_hits = self.fast_ball_hits.saturating_add(1);
        }
        out_events.push(Event::BallHit {
            ball,
            speed,
            position,
            quality,
            fast,
            correct_hits: self.correct_hits,
        });

        if self.correct_hits == self.config.milestone_hits {
            out_events.push(Event::MilestoneReached {
                correct_hits: self.correct_hits,
            });
        }
    }

    fn record_miss(&mut self, ball: BallId, out_events: &mut Vec<Event>) {
        if !self.phase.accepts_ball_reports() {
            log::debug!("ignoring miss of {ball:?} in {:?}", self.phase);
            return;
        }
        if self.balls.remove(ball).is_none() {
            log::warn!("dropping miss of unknown ball {ball:?}");
            return;
        }

        self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        out_events.push(Event::BallMissed {
            ball,
            consecutive_misses: self.consecutive_misses,
        });
    }

    fn spawn_ball(
        &mut self,
        speed: f32,
        jitter: Vec3,
        trajectory_assist: bool,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase != Phase::Active {
            log::debug!("discarding spawn in {:?}", self.phase);
            return;
        }
        if !speed.is_finite() || !jitter.is_finite() {
            log::warn!("discarding spawn with non-finite speed or jitter");
            return;
        }

        let speed = self.config.clamp_speed(speed);
        let (ball, evicted) = self.balls.insert(speed, trajectory_assist);
        self.total_balls_spawned = self.total_balls_spawned.saturating_add(1);

        if let Some(evicted) = evicted {
            log::warn!("live ball limit reached, evicting {evicted:?}");
            out_events.push(Event::BallEvicted { ball: evicted });
        }
        out_events.push(Event::BallSpawned {
            ball,
            speed,
            jitter,
            trajectory_assist,
        });
    }

    fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.current_speed = self.config.clamp_speed(speed);
        } else {
            log::warn!("ignoring non-finite speed {speed}");
        }
    }

    fn simplify(&mut self, speed: Option<f32>, out_events: &mut Vec<Event>) {
        if let Some(speed) = speed {
            self.set_speed(speed);
        }
        let assisted = self.balls.assist_all();
        log::info!(
            "simplifying after {} misses, speed now {}",
            self.consecutive_misses,
            self.current_speed
        );
        out_events.push(Event::DifficultySimplified {
            speed: self.current_speed,
            assisted,
        });
    }

    fn encourage(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Active {
            log::debug!("skipping encouragement in {:?}", self.phase);
            return;
        }

        let glowing = self.balls.glow_all();
        let racket_glow = !self.racket_glow;
        self.racket_glow = true;
        // a repeated encouragement extends the current glow
        let _ = self.scheduler.cancel_action(Timer::RacketGlowOff);
        let _ = self.scheduler.schedule_once(
            Timer::RacketGlowOff,
            ClockSource::Scaled,
            self.config.racket_glow_duration,
        );
        out_events.push(Event::EncouragementTriggered {
            glowing,
            racket_glow,
        });
    }

    fn enter_overstimulated_pause(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Active {
            log::debug!("skipping overstimulated pause in {:?}", self.phase);
            return;
        }
        let _ = self.scheduler.schedule_once(
            Timer::AutoResume,
            ClockSource::Realtime,
            self.config.overstimulation_recovery,
        );
        self.set_phase(Phase::OverstimulatedPause, out_events);
    }

    fn toggle_pause(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            Phase::Active => self.set_phase(Phase::Paused, out_events),
            Phase::Paused => self.set_phase(Phase::Active, out_events),
            phase => log::debug!("ignoring pause toggle in {phase:?}"),
        }
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    if session.phase == Phase::Ended {
        log::debug!("session ended, ignoring {command:?}");
        return;
    }

    match command {
        Command::BeginSession => session.begin(out_events),
        Command::Tick { dt } => session.tick(dt, out_events),
        Command::ReportBallHit {
            ball,
            speed,
            position,
            quality,
        } => session.record_hit(ball, speed, position, quality, out_events),
        Command::ReportBallMissed { ball } => session.record_miss(ball, out_events),
        Command::ReportBallDestroyed { ball } => {
            if !session.balls.mark_destroyed(ball) {
                log::debug!("destroy report for unknown ball {ball:?}");
            }
        }
        Command::ReportPlayerPosition {
            position,
            timestamp,
        } => {
            if position.is_finite() {
                session.player_position = Some(position);
            } else {
                log::warn!("dropping non-finite head position at {timestamp:?}");
            }
        }
        Command::RequestPauseToggle => session.toggle_pause(out_events),
        Command::SpawnBall {
            speed,
            jitter,
            trajectory_assist,
        } => session.spawn_ball(speed, jitter, trajectory_assist, out_events),
        Command::SetSpeed { speed } => session.set_speed(speed),
        Command::AdvanceWave { wave_timer, speed } => {
            if session.config.enable_wave_mode && session.phase == Phase::Active {
                session.wave_timer = wave_timer;
                session.set_speed(speed);
            }
        }
        Command::Simplify { speed } => session.simplify(speed, out_events),
        Command::EncouragePlayer => session.encourage(out_events),
        Command::EnterOverstimulatedPause => session.enter_overstimulated_pause(out_events),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use super::Session;
    use calm_rally_core::{
        BallId, BallSnapshot, DifficultySnapshot, Phase, Scoreboard, SessionConfig,
        SessionSummary,
    };

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(session: &Session) -> Phase {
        session.phase
    }

    /// Configuration the session runs with.
    #[must_use]
    pub fn config(session: &Session) -> &SessionConfig {
        &session.config
    }

    /// Captures the state difficulty and spawning decisions depend on.
    #[must_use]
    pub fn difficulty(session: &Session) -> DifficultySnapshot {
        DifficultySnapshot {
            phase: session.phase,
            current_speed: session.current_speed,
            correct_hits: session.correct_hits,
            consecutive_misses: session.consecutive_misses,
            wave_timer: session.wave_timer,
        }
    }

    /// Captures the values shown on the scoreboard.
    #[must_use]
    pub fn scoreboard(session: &Session) -> Scoreboard {
        Scoreboard {
            phase: session.phase,
            hits: session.correct_hits,
            speed: session.current_speed,
            remaining: session.time_remaining,
        }
    }

    /// Remaining countdown.
    #[must_use]
    pub fn time_remaining(session: &Session) -> Duration {
        session.time_remaining
    }

    /// Live balls ordered by identifier.
    #[must_use]
    pub fn live_balls(session: &Session) -> Vec<BallSnapshot> {
        session.balls.snapshots()
    }

    /// Reports whether `ball` is still in play.
    #[must_use]
    pub fn is_ball_live(session: &Session, ball: BallId) -> bool {
        session.balls.is_live(ball)
    }

    /// Number of live balls.
    #[must_use]
    pub fn live_ball_count(session: &Session) -> usize {
        session.balls.live_count()
    }

    /// Results accumulated so far.
    #[must_use]
    pub fn totals(session: &Session) -> SessionSummary {
        SessionSummary::new(
            session.correct_hits,
            session.fast_ball_hits,
            session.total_balls_spawned,
        )
    }

    /// Final results, available once the session ended.
    #[must_use]
    pub fn summary(session: &Session) -> Option<SessionSummary> {
        session.summary
    }

    /// Reports whether the encouragement racket glow is on.
    #[must_use]
    pub fn racket_glow(session: &Session) -> bool {
        session.racket_glow
    }

    /// Number of timers still pending.
    #[must_use]
    pub fn pending_timers(session: &Session) -> usize {
        session.scheduler.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> SessionConfig {
        SessionConfig {
            introduction: None,
            ..SessionConfig::default()
        }
    }

    fn started(config: SessionConfig) -> (Session, Vec<Event>) {
        let mut session = Session::new(config).expect("valid config");
        let mut events = Vec::new();
        apply(&mut session, Command::BeginSession, &mut events);
        (session, events)
    }

    fn spawn(session: &mut Session) -> BallId {
        let mut events = Vec::new();
        apply(
            session,
            Command::SpawnBall {
                speed: 3.0,
                jitter: Vec3::ZERO,
                trajectory_assist: false,
            },
            &mut events,
        );
        events
            .iter()
            .find_map(|event| match event {
                Event::BallSpawned { ball, .. } => Some(*ball),
                _ => None,
            })
            .expect("ball spawned")
    }

    #[test]
    fn introduction_defers_gameplay() {
        let (mut session, events) = started(SessionConfig::default());
        assert!(matches!(
            events.as_slice(),
            [Event::IntroductionStarted { .. }]
        ));
        assert_eq!(query::phase(&session), Phase::Intro);

        let mut events = Vec::new();
        apply(
            &mut session,
            Command::Tick {
                dt: Duration::from_secs(8),
            },
            &mut events,
        );
        assert_eq!(query::phase(&session), Phase::Active);
        assert_eq!(query::time_remaining(&session), Duration::from_secs(180));
    }

    #[test]
    fn missing_introduction_starts_gameplay_immediately() {
        let (session, events) = started(quick_config());
        assert_eq!(
            events,
            vec![Event::PhaseChanged {
                from: Phase::Intro,
                to: Phase::Active
            }]
        );
        assert_eq!(query::phase(&session), Phase::Active);
    }

    #[test]
    fn hit_on_unknown_ball_is_dropped() {
        let (mut session, _) = started(quick_config());
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::ReportBallHit {
                ball: BallId::new(99),
                speed: 3.0,
                position: Vec3::ZERO,
                quality: false,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::totals(&session).correct_hits, 0);
    }

    #[test]
    fn non_finite_hit_is_dropped() {
        let (mut session, _) = started(quick_config());
        let ball = spawn(&mut session);
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::ReportBallHit {
                ball,
                speed: f32::NAN,
                position: Vec3::ZERO,
                quality: false,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert!(query::is_ball_live(&session, ball));
    }

    #[test]
    fn hit_resets_consecutive_misses() {
        let (mut session, _) = started(quick_config());
        let missed = spawn(&mut session);
        let hit = spawn(&mut session);
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::ReportBallMissed { ball: missed },
            &mut events,
        );
        assert_eq!(query::difficulty(&session).consecutive_misses, 1);

        apply(
            &mut session,
            Command::ReportBallHit {
                ball: hit,
                speed: 14.5,
                position: Vec3::ZERO,
                quality: true,
            },
            &mut events,
        );
        let snapshot = query::difficulty(&session);
        assert_eq!(snapshot.consecutive_misses, 0);
        assert_eq!(snapshot.correct_hits, 1);
        assert_eq!(query::totals(&session).fast_ball_hits, 1);
    }

    #[test]
    fn pause_toggle_is_ignored_during_introduction() {
        let (mut session, _) = started(SessionConfig::default());
        let mut events = Vec::new();
        apply(&mut session, Command::RequestPauseToggle, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::phase(&session), Phase::Intro);
    }

    #[test]
    fn countdown_freezes_while_paused() {
        let (mut session, _) = started(quick_config());
        let mut events = Vec::new();
        apply(&mut session, Command::RequestPauseToggle, &mut events);
        apply(
            &mut session,
            Command::Tick {
                dt: Duration::from_secs(30),
            },
            &mut events,
        );
        assert_eq!(query::time_remaining(&session), Duration::from_secs(180));
        assert!(events.contains(&Event::TimeAdvanced {
            scaled: Duration::ZERO,
            realtime: Duration::from_secs(30),
        }));
    }

    #[test]
    fn speed_is_clamped_into_range() {
        let (mut session, _) = started(quick_config());
        let mut events = Vec::new();
        apply(&mut session, Command::SetSpeed { speed: 99.0 }, &mut events);
        assert_eq!(query::difficulty(&session).current_speed, 15.0);
        apply(&mut session, Command::SetSpeed { speed: -1.0 }, &mut events);
        assert_eq!(query::difficulty(&session).current_speed, 3.0);
    }

    #[test]
    fn ended_session_ignores_commands() {
        let config = SessionConfig {
            game_time: Duration::from_secs(1),
            ..quick_config()
        };
        let (mut session, _) = started(config);
        let _ = spawn(&mut session);
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(query::phase(&session), Phase::Ended);
        assert_eq!(query::pending_timers(&session), 0);
        assert_eq!(query::live_ball_count(&session), 0);

        events.clear();
        apply(
            &mut session,
            Command::SpawnBall {
                speed: 3.0,
                jitter: Vec3::ZERO,
                trajectory_assist: false,
            },
            &mut events,
        );
        assert!(events.is_empty());
    }
}
