use volley_tracker::advisory::{Advisory, AdvisoryKind, Limit};
use volley_tracker::rally::{CourtPoint, PointType, Score, Team};
use volley_tracker::roster::PlayerEdit;
use volley_tracker::state::{Command, Notice, Tracker};
use volley_tracker::subs::SubstitutionEntry;

/// Starter roster plus bench players 8-14.
fn tracker_with_bench() -> Tracker {
    let mut tracker = Tracker::default();
    for _ in 0..7 {
        tracker.apply(Command::AddPlayer).expect("add player");
    }
    tracker
}

fn sub(tracker: &mut Tracker, bench: u32, court: u32) -> Result<Vec<Notice>, Advisory> {
    tracker.apply(Command::Substitute {
        team: Team::Home,
        bench,
        court,
    })
}

fn point(tracker: &mut Tracker, team: Team) {
    tracker
        .apply(Command::ScoreRally {
            team,
            at: CourtPoint::CENTER,
        })
        .expect("rally accepted");
    tracker
        .apply(Command::ClassifyOutcome(PointType::Attack))
        .expect("outcome accepted");
}

#[test]
fn substitute_takes_the_same_position() {
    let mut tracker = tracker_with_bench();
    let notices = sub(&mut tracker, 8, 3).expect("substitution");

    assert_eq!(
        notices,
        vec![Notice::Substituted {
            team: Team::Home,
            player_out: 3,
            player_in: 8,
            position: 3,
        }]
    );
    assert_eq!(tracker.lineup(Team::Home).at(3), Some(8));
    assert!(!tracker.lineup(Team::Home).is_on_court(3));
    let subs = &tracker.state().subs;
    assert_eq!(subs.records(Team::Home).len(), 1);
    assert_eq!(subs.remaining(Team::Home), 5);
    assert_eq!(
        subs.history(),
        &[SubstitutionEntry {
            set_number: 1,
            team: Team::Home,
            player_out: 3,
            player_in: 8,
        }]
    );
}

#[test]
fn seventh_substitution_in_a_set_is_rejected() {
    let mut tracker = tracker_with_bench();
    for (bench, court) in (8..=13).zip(1..=6) {
        sub(&mut tracker, bench, court).expect("within limit");
    }
    let before = tracker.lineup(Team::Home).clone();

    let err = sub(&mut tracker, 14, 8).expect_err("limit reached");
    assert_eq!(err, Advisory::LimitExceeded(Limit::Substitutions(Team::Home)));
    assert_eq!(tracker.lineup(Team::Home), &before);
    assert_eq!(tracker.state().subs.records(Team::Home).len(), 6);

    // Away keeps its own count.
    tracker
        .apply(Command::Substitute {
            team: Team::Away,
            bench: 107,
            court: 101,
        })
        .expect("away has substitutions left");
    assert_eq!(tracker.lineup(Team::Away).at(1), Some(107));
}

#[test]
fn substitution_limit_resets_with_the_set() {
    let mut tracker = tracker_with_bench();
    for (bench, court) in (8..=13).zip(1..=6) {
        sub(&mut tracker, bench, court).expect("within limit");
    }
    while tracker.state().set_winner.is_none() {
        point(&mut tracker, Team::Home);
    }
    tracker
        .apply(Command::StartNewSet { keep_lineup: true })
        .expect("new set");

    sub(&mut tracker, 14, 8).expect("fresh set");
    let history = tracker.state().subs.history();
    assert_eq!(history.len(), 7);
    assert_eq!(history[6].set_number, 2);
    assert_eq!(tracker.state().subs.remaining(Team::Home), 5);
}

#[test]
fn invalid_swaps_are_rejected() {
    let mut tracker = tracker_with_bench();

    let err = sub(&mut tracker, 8, 8).expect_err("same player");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);

    let err = sub(&mut tracker, 2, 3).expect_err("already on court");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);

    let err = sub(&mut tracker, 8, 14).expect_err("court player on bench");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);

    let err = sub(&mut tracker, 8, 7).expect_err("libero is not rotational");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);

    tracker
        .apply(Command::UpdatePlayer {
            id: 9,
            edit: PlayerEdit::Libero(true),
        })
        .expect("bench player may become libero");
    let err = sub(&mut tracker, 9, 2).expect_err("libero cannot sub in");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);

    assert!(tracker.state().subs.history().is_empty());
    assert_eq!(tracker.lineup(Team::Home).at(2), Some(2));
}

#[test]
fn substitution_waits_for_pending_rally() {
    let mut tracker = tracker_with_bench();
    tracker
        .apply(Command::ScoreRally {
            team: Team::Home,
            at: CourtPoint::CENTER,
        })
        .expect("rally accepted");
    let err = sub(&mut tracker, 8, 1).expect_err("rally pending");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
}

#[test]
fn two_timeouts_per_team_per_set() {
    let mut tracker = Tracker::default();
    point(&mut tracker, Team::Away);

    let notices = tracker
        .apply(Command::TakeTimeout(Team::Home))
        .expect("first timeout");
    assert_eq!(
        notices,
        vec![Notice::TimeoutTaken {
            team: Team::Home,
            remaining: 1
        }]
    );
    point(&mut tracker, Team::Away);
    tracker
        .apply(Command::TakeTimeout(Team::Home))
        .expect("second timeout");

    let err = tracker
        .apply(Command::TakeTimeout(Team::Home))
        .expect_err("third timeout");
    assert_eq!(err, Advisory::LimitExceeded(Limit::Timeouts(Team::Home)));
    assert_eq!(
        tracker.state().timeouts.home,
        vec![Score::new(0, 1), Score::new(0, 2)]
    );
    assert_eq!(tracker.state().timeouts_left(Team::Home), 0);

    tracker
        .apply(Command::TakeTimeout(Team::Away))
        .expect("away still has timeouts");
    assert_eq!(tracker.state().timeouts_left(Team::Away), 1);
}

#[test]
fn timeouts_reset_with_the_set() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::TakeTimeout(Team::Away))
        .expect("timeout");
    tracker
        .apply(Command::TakeTimeout(Team::Away))
        .expect("timeout");
    while tracker.state().set_winner.is_none() {
        point(&mut tracker, Team::Home);
    }
    tracker
        .apply(Command::StartNewSet { keep_lineup: true })
        .expect("new set");

    assert_eq!(tracker.state().timeouts_left(Team::Away), 2);
    tracker
        .apply(Command::TakeTimeout(Team::Away))
        .expect("fresh set");
}

#[test]
fn timeout_waits_for_pending_rally() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::ServiceFault {
            serving: Team::Home,
        })
        .expect("fault accepted");
    let err = tracker
        .apply(Command::TakeTimeout(Team::Away))
        .expect_err("fault pending");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
    assert!(tracker.state().timeouts.away.is_empty());
}

#[test]
fn home_substitute_must_be_on_the_roster() {
    let mut tracker = tracker_with_bench();
    let err = sub(&mut tracker, 999, 1).expect_err("unknown player");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
    assert_eq!(tracker.lineup(Team::Home).at(1), Some(1));
    assert!(tracker.state().subs.history().is_empty());
    assert_eq!(tracker.state().subs.remaining(Team::Home), 6);
}

#[test]
fn away_substitute_needs_no_roster_entry() {
    let mut tracker = Tracker::default();
    let notices = tracker
        .apply(Command::Substitute {
            team: Team::Away,
            bench: 150,
            court: 101,
        })
        .expect("away substitution");
    assert_eq!(
        notices,
        vec![Notice::Substituted {
            team: Team::Away,
            player_out: 101,
            player_in: 150,
            position: 1,
        }]
    );
    assert_eq!(tracker.lineup(Team::Away).at(1), Some(150));
}
