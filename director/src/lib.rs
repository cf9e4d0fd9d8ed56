#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session director wiring the authoritative session to the pure systems.
//!
//! Every input is applied as a [`Command`]; the resulting events are fanned
//! out to the difficulty, spawning, inactivity and feedback systems, their
//! commands are applied in turn, and the loop repeats until no events remain.
//! Directives produced along the way are flushed to the [`DirectiveSink`] in
//! the order they were emitted.

use std::time::Duration;

use calm_rally_core::{
    BallId, Command, ConfigError, Directive, DirectiveSink, Event, Phase, SessionConfig,
    SessionSummary,
};
use calm_rally_session::{self as session, query, Session};
use calm_rally_system_difficulty::Difficulty;
use calm_rally_system_feedback::Feedback;
use calm_rally_system_inactivity::{self as inactivity, Inactivity};
use calm_rally_system_spawning::{self as spawning, Spawning};
use glam::Vec3;

const MAX_SETTLE_ROUNDS: usize = 16;
const FEEDBACK_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Drives a single therapy session from start to finish.
#[derive(Debug)]
pub struct Director<S> {
    session: Session,
    difficulty: Difficulty,
    spawning: Spawning,
    inactivity: Inactivity,
    feedback: Feedback,
    sink: S,
    events: Vec<Event>,
    follow_up: Vec<Event>,
    commands: Vec<Command>,
    directives: Vec<Directive>,
}

impl<S: DirectiveSink> Director<S> {
    /// Creates a director and begins the session.
    ///
    /// All randomness derives from `seed`, so identical inputs replay to
    /// identical directives.
    pub fn new(config: SessionConfig, seed: u64, sink: S) -> Result<Self, ConfigError> {
        let spawning = Spawning::new(spawning::Config::from_session(&config, seed));
        let inactivity = Inactivity::new(inactivity::Config::from_session(&config));
        let mut director = Self {
            session: Session::new(config)?,
            difficulty: Difficulty::new(),
            spawning,
            inactivity,
            feedback: Feedback::new(seed ^ FEEDBACK_SEED_SALT),
            sink,
            events: Vec::new(),
            follow_up: Vec::new(),
            commands: Vec::new(),
            directives: Vec::new(),
        };
        director.submit(Command::BeginSession);
        Ok(director)
    }

    /// Applies a command and settles every consequence.
    pub fn submit(&mut self, command: Command) {
        self.events.clear();
        session::apply(&mut self.session, command, &mut self.events);

        let mut rounds = 0;
        while !self.events.is_empty() {
            if rounds == MAX_SETTLE_ROUNDS {
                log::warn!(
                    "dropping {} events that did not settle after {rounds} rounds",
                    self.events.len()
                );
                self.events.clear();
                break;
            }
            rounds += 1;
            self.dispatch();
        }

        self.feedback
            .refresh_scoreboard(&query::scoreboard(&self.session), &mut self.directives);
        self.flush();
    }

    /// Advances the session clocks by `dt` of wall-clock time.
    pub fn tick(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });
    }

    /// Reports that the racket struck `ball`.
    pub fn report_ball_hit(&mut self, ball: BallId, speed: f32, position: Vec3, quality: bool) {
        self.submit(Command::ReportBallHit {
            ball,
            speed,
            position,
            quality,
        });
    }

    /// Reports that `ball` left play without being hit.
    pub fn report_ball_missed(&mut self, ball: BallId) {
        self.submit(Command::ReportBallMissed { ball });
    }

    /// Reports that `ball` no longer exists.
    pub fn report_ball_destroyed(&mut self, ball: BallId) {
        self.submit(Command::ReportBallDestroyed { ball });
    }

    /// Reports the current head position.
    pub fn report_player_position(&mut self, position: Vec3, timestamp: Duration) {
        self.submit(Command::ReportPlayerPosition {
            position,
            timestamp,
        });
    }

    /// Toggles the player pause.
    pub fn request_pause_toggle(&mut self) {
        self.submit(Command::RequestPauseToggle);
    }

    /// Read-only access to the session for queries.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        query::phase(&self.session)
    }

    /// Final results, available once the session ended.
    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        query::summary(&self.session)
    }

    /// Read-only access to the inactivity monitor.
    #[must_use]
    pub fn inactivity(&self) -> &Inactivity {
        &self.inactivity
    }

    /// Read-only access to the directive sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the directive sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the director, returning the directive sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn dispatch(&mut self) {
        self.commands.clear();
        let config = query::config(&self.session);
        self.difficulty.handle(
            &self.events,
            &query::difficulty(&self.session),
            config,
            &mut self.commands,
        );
        self.feedback
            .handle(&self.events, config, &mut self.directives);

        // speed changes from this round apply before spawning samples the speed
        self.follow_up.clear();
        for command in self.commands.drain(..) {
            session::apply(&mut self.session, command, &mut self.follow_up);
        }

        let snapshot = query::difficulty(&self.session);
        self.spawning
            .handle(&self.events, &snapshot, &mut self.commands);
        self.inactivity
            .handle(&self.events, snapshot.phase, &mut self.commands);
        for command in self.commands.drain(..) {
            session::apply(&mut self.session, command, &mut self.follow_up);
        }

        std::mem::swap(&mut self.events, &mut self.follow_up);
    }

    fn flush(&mut self) {
        for directive in self.directives.drain(..) {
            self.sink.submit(directive);
        }
    }
}
