use std::time::Duration;

use calm_rally_core::{BallId, Command, Event, Phase, SessionConfig};
use calm_rally_session::{apply, query, Session};
use calm_rally_system_inactivity::{Config, Inactivity, Intervention};
use glam::Vec3;

struct Harness {
    session: Session,
    inactivity: Inactivity,
    interventions: Vec<Command>,
}

impl Harness {
    fn new() -> Self {
        let config = SessionConfig {
            introduction: None,
            ..SessionConfig::default()
        };
        let mut harness = Self {
            inactivity: Inactivity::new(Config::from_session(&config)),
            session: Session::new(config).expect("valid config"),
            interventions: Vec::new(),
        };
        harness.process(Command::BeginSession);
        harness
    }

    fn process(&mut self, command: Command) {
        let mut events = Vec::new();
        apply(&mut self.session, command, &mut events);
        while !events.is_empty() {
            let mut commands = Vec::new();
            self.inactivity
                .handle(&events, query::phase(&self.session), &mut commands);
            events.clear();
            for command in commands {
                self.interventions.push(command.clone());
                apply(&mut self.session, command, &mut events);
            }
        }
    }

    fn hold_still_for(&mut self, seconds: u32) {
        for _ in 0..seconds {
            self.process(Command::ReportPlayerPosition {
                position: Vec3::new(0.0, 1.6, 0.0),
                timestamp: Duration::ZERO,
            });
            self.process(Command::Tick {
                dt: Duration::from_secs(1),
            });
        }
    }

    fn count(&self, target: &Command) -> usize {
        self.interventions
            .iter()
            .filter(|command| *command == target)
            .count()
    }
}

#[test]
fn encouragement_fires_exactly_once_per_streak() {
    let mut harness = Harness::new();

    // first sample establishes the baseline, ten further still samples follow
    harness.hold_still_for(11);
    assert_eq!(harness.count(&Command::EncouragePlayer), 1);

    harness.hold_still_for(8);
    assert_eq!(harness.count(&Command::EncouragePlayer), 1);
    assert_eq!(harness.count(&Command::EnterOverstimulatedPause), 0);
}

#[test]
fn prolonged_stillness_enters_calming_pause_and_resets() {
    let mut harness = Harness::new();

    harness.hold_still_for(21);
    assert_eq!(harness.count(&Command::EnterOverstimulatedPause), 1);
    assert_eq!(query::phase(&harness.session), Phase::OverstimulatedPause);
    assert_eq!(harness.inactivity.still_for(), Duration::ZERO);

    harness.process(Command::Tick {
        dt: Duration::from_secs(5),
    });
    assert_eq!(query::phase(&harness.session), Phase::Active);
}

#[test]
fn calming_pause_rearms_encouragement() {
    let mut harness = Harness::new();
    harness.hold_still_for(21);
    assert_eq!(harness.count(&Command::EncouragePlayer), 1);

    harness.process(Command::Tick {
        dt: Duration::from_secs(5),
    });
    assert_eq!(query::phase(&harness.session), Phase::Active);

    harness.hold_still_for(11);
    assert_eq!(harness.count(&Command::EncouragePlayer), 2);
    assert_eq!(harness.count(&Command::EnterOverstimulatedPause), 1);
}

#[test]
fn movement_cancels_streak() {
    let mut harness = Harness::new();
    harness.hold_still_for(9);

    harness.process(Command::ReportPlayerPosition {
        position: Vec3::new(0.5, 1.6, 0.0),
        timestamp: Duration::ZERO,
    });
    harness.process(Command::Tick {
        dt: Duration::from_secs(1),
    });
    assert_eq!(harness.inactivity.still_for(), Duration::ZERO);

    harness.hold_still_for(9);
    assert_eq!(harness.count(&Command::EncouragePlayer), 0);
}

#[test]
fn hit_resets_streak() {
    let mut harness = Harness::new();
    harness.hold_still_for(6);
    assert!(harness.inactivity.still_for() > Duration::ZERO);

    let mut commands = Vec::new();
    harness.inactivity.handle(
        &[Event::BallHit {
            ball: BallId::new(0),
            speed: 3.0,
            position: Vec3::ZERO,
            quality: false,
            fast: false,
            correct_hits: 1,
        }],
        Phase::Active,
        &mut commands,
    );
    assert!(commands.is_empty());
    assert_eq!(harness.inactivity.still_for(), Duration::ZERO);
}

#[test]
fn samples_are_ignored_while_paused() {
    let mut inactivity = Inactivity::new(Config::from_session(&SessionConfig::default()));
    let mut commands = Vec::new();
    let sample = Event::InactivitySampleDue {
        position: Some(Vec3::ZERO),
    };
    for _ in 0..30 {
        inactivity.handle(
            std::slice::from_ref(&sample),
            Phase::Paused,
            &mut commands,
        );
    }
    assert!(commands.is_empty());
    assert_eq!(inactivity.still_for(), Duration::ZERO);
}

#[test]
fn stage_thresholds_follow_stillness_duration() {
    let mut inactivity = Inactivity::new(Config::from_session(&SessionConfig::default()));
    let mut outcomes = Vec::new();
    for _ in 0..=20 {
        outcomes.push(inactivity.sample(Vec3::ZERO));
    }

    assert_eq!(outcomes[10], Some(Intervention::Encourage));
    assert_eq!(outcomes[20], Some(Intervention::Overstimulated));
    let fired = outcomes.iter().filter(|outcome| outcome.is_some()).count();
    assert_eq!(fired, 2);
}
