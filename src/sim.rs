use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::advisory::Advisory;
use crate::rally::{CourtPoint, FaultKind, PointType, RallyPhase, Team};
use crate::state::{Command, Tracker};

pub const DEMO_OPPONENT: &str = "Demo Opponent";

/// Chance that the serving side wins the rally. Receivers side out more
/// often than not.
const SERVE_HOLD_CHANCE: f64 = 0.45;
const SERVICE_FAULT_CHANCE: f64 = 0.08;
const TIMEOUT_CHANCE: f64 = 0.03;
const MAX_COMMANDS_PER_MATCH: usize = 5_000;

/// Produces plausible operator input for a tracker, one command at a time.
pub struct RallySim {
    rng: StdRng,
}

impl RallySim {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Next command for the tracker as it stands, or `None` once the match
    /// has been played out and saved.
    pub fn next_command(&mut self, tracker: &Tracker) -> Option<Command> {
        let state = tracker.state();
        match state.phase {
            RallyPhase::MatchComplete { .. } => {
                if state.saved {
                    return None;
                }
                let opponent = if tracker.opponent().is_empty() {
                    DEMO_OPPONENT.to_string()
                } else {
                    tracker.opponent().to_string()
                };
                Some(Command::Save {
                    opponent,
                    date: tracker.date(),
                })
            }
            RallyPhase::SetComplete { .. } => Some(Command::StartNewSet { keep_lineup: true }),
            RallyPhase::AwaitingOutcome { .. } => Some(Command::ClassifyOutcome(
                PointType::ALL[self.rng.gen_range(0..PointType::ALL.len())],
            )),
            RallyPhase::AwaitingFaultKind { .. } => Some(Command::ConfirmServiceFault(
                FaultKind::ALL[self.rng.gen_range(0..FaultKind::ALL.len())],
            )),
            RallyPhase::Idle => Some(self.idle_command(tracker)),
        }
    }

    fn idle_command(&mut self, tracker: &Tracker) -> Command {
        let state = tracker.state();
        if self.rng.gen_bool(TIMEOUT_CHANCE) {
            let team = self.pick_team();
            if state.timeouts_left(team) > 0 {
                return Command::TakeTimeout(team);
            }
        }
        if self.rng.gen_bool(SERVICE_FAULT_CHANCE) {
            return Command::ServiceFault {
                serving: state.serving,
            };
        }
        let team = if self.rng.gen_bool(SERVE_HOLD_CHANCE) {
            state.serving
        } else {
            state.serving.other()
        };
        let at = CourtPoint::new(
            self.rng.gen_range(0.0..=100.0),
            self.rng.gen_range(0.0..=100.0),
        );
        Command::ScoreRally { team, at }
    }

    fn pick_team(&mut self) -> Team {
        if self.rng.gen_bool(0.5) {
            Team::Home
        } else {
            Team::Away
        }
    }
}

/// Drives `tracker` until the match is over and saved. Returns the number of
/// commands applied.
pub fn play_match(tracker: &mut Tracker, sim: &mut RallySim) -> Result<usize, Advisory> {
    let mut applied = 0;
    while let Some(cmd) = sim.next_command(tracker) {
        tracker.apply(cmd)?;
        applied += 1;
        if applied >= MAX_COMMANDS_PER_MATCH {
            return Err(Advisory::invalid("simulation did not finish the match"));
        }
    }
    Ok(applied)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Command(Command),
    Log(String),
}

/// Runs a simulated match on its own thread. The feed keeps a private copy
/// of the tracker so it can pick sensible commands; the receiver applies
/// them to the real one in order.
pub fn spawn_demo_feed(
    tx: Sender<FeedEvent>,
    mut mirror: Tracker,
    seed: Option<u64>,
    interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut sim = RallySim::new(seed);
        let _ = tx.send(FeedEvent::Log("[INFO] Demo feed started".to_string()));
        loop {
            thread::sleep(interval);
            let Some(cmd) = sim.next_command(&mirror) else {
                let _ = tx.send(FeedEvent::Log("[INFO] Demo match finished".to_string()));
                break;
            };
            if let Err(err) = mirror.apply(cmd.clone()) {
                let _ = tx.send(FeedEvent::Log(format!("[WARN] Demo feed stopped: {err}")));
                break;
            }
            if tx.send(FeedEvent::Command(cmd)).is_err() {
                break;
            }
        }
    })
}
