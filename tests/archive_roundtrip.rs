use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use volley_tracker::advisory::{Advisory, AdvisoryKind, Field};
use volley_tracker::export::export_saved_match_xlsx;
use volley_tracker::persist::{export_archive, read_archive_export};
use volley_tracker::rally::{CourtPoint, FaultKind, PointType, Score, SetsWon, Team};
use volley_tracker::state::{Command, Notice, Tracker};

fn match_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "volley_tracker_{}_{}",
        std::process::id(),
        name
    ))
}

fn point(tracker: &mut Tracker, team: Team) {
    tracker
        .apply(Command::ScoreRally {
            team,
            at: CourtPoint::new(40.0, 70.0),
        })
        .expect("rally accepted");
    tracker
        .apply(Command::ClassifyOutcome(PointType::Attack))
        .expect("outcome accepted");
}

/// Home wins 3-0: 25-1 (one away point from a service fault), then 25-0 twice.
fn play_straight_sets(tracker: &mut Tracker) {
    tracker
        .apply(Command::ServiceFault {
            serving: Team::Home,
        })
        .expect("fault");
    tracker
        .apply(Command::ConfirmServiceFault(FaultKind::Out))
        .expect("fault kind");
    tracker.apply(Command::AddPlayer).expect("add player");
    tracker
        .apply(Command::Substitute {
            team: Team::Home,
            bench: 8,
            court: 4,
        })
        .expect("substitution");
    for set in 0..3 {
        while tracker.state().set_winner.is_none() {
            point(tracker, Team::Home);
        }
        if set < 2 {
            tracker
                .apply(Command::StartNewSet { keep_lineup: true })
                .expect("new set");
        }
    }
}

fn save(tracker: &mut Tracker, opponent: &str) -> Result<Vec<Notice>, Advisory> {
    tracker.apply(Command::Save {
        opponent: opponent.to_string(),
        date: match_date(),
    })
}

#[test]
fn save_requires_an_opponent_name() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    let err = save(&mut tracker, "   ").expect_err("blank opponent");
    assert_eq!(err, Advisory::MissingRequiredField(Field::OpponentName));
    assert!(tracker.archive().is_empty());
}

#[test]
fn save_requires_a_finished_match() {
    let mut tracker = Tracker::default();
    point(&mut tracker, Team::Home);
    let err = save(&mut tracker, "Rivals").expect_err("match running");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
    assert!(tracker.archive().is_empty());
}

#[test]
fn saved_match_captures_the_whole_match() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    let notices = save(&mut tracker, " Rivals ").expect("save");
    assert_eq!(notices, vec![Notice::MatchSaved { index: 0 }]);

    let saved = tracker.archive().latest().expect("saved match");
    assert_eq!(saved.opponent, "Rivals");
    assert_eq!(saved.date, match_date());
    assert_eq!(saved.final_score, SetsWon::new(3, 0));
    assert_eq!(saved.winner, Team::Home);
    assert_eq!(saved.per_set_logs.len(), 3);
    assert_eq!(saved.per_set_logs[0].final_score, Score::new(25, 1));
    assert_eq!(saved.per_set_logs[2].set_number, 3);
    assert_eq!(saved.substitutions.len(), 1);
    assert_eq!(saved.substitutions[0].player_in, 8);
    assert_eq!(saved.statistics.away.service_fault, 1);
    assert_eq!(saved.statistics.home.attack, 75);
    assert_eq!(saved.points_for(Team::Home), 75);
    assert_eq!(saved.score_event_log.len(), 76);
    assert_eq!(saved.score_event_log[0].score, Score::new(0, 1));
    assert_eq!(tracker.opponent(), "Rivals");
}

#[test]
fn second_save_of_same_match_is_rejected() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    save(&mut tracker, "Rivals").expect("save");
    let err = save(&mut tracker, "Rivals").expect_err("already saved");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
    assert_eq!(tracker.archive().len(), 1);
}

#[test]
fn archived_match_is_unaffected_by_later_play() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    save(&mut tracker, "Rivals").expect("save");
    let snapshot = tracker.archive().get(0).cloned().expect("saved");

    tracker
        .apply(Command::NewMatch {
            opponent: "Next Club".to_string(),
        })
        .expect("new match");
    assert_eq!(tracker.state().score, Score::new(0, 0));
    assert_eq!(tracker.state().sets, SetsWon::new(0, 0));
    assert!(tracker.state().score_log.is_empty());
    point(&mut tracker, Team::Away);

    assert_eq!(tracker.archive().get(0), Some(&snapshot));
    assert_eq!(tracker.opponent(), "Next Club");
}

#[test]
fn new_match_requires_an_opponent_name() {
    let mut tracker = Tracker::default();
    point(&mut tracker, Team::Home);
    let err = tracker
        .apply(Command::NewMatch {
            opponent: String::new(),
        })
        .expect_err("blank opponent");
    assert_eq!(err, Advisory::MissingRequiredField(Field::OpponentName));
    assert_eq!(tracker.state().score, Score::new(1, 0));
}

#[test]
fn archive_export_reads_back_identically() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    save(&mut tracker, "Rivals").expect("save");

    let path = temp_path("archive.json");
    export_archive(tracker.archive(), &path).expect("export");
    let raw = fs::read_to_string(&path).expect("read export");
    assert!(raw.contains("\"finalScore\""));
    assert!(raw.contains("\"scoreEventLog\""));
    assert!(raw.contains("\"serviceFault\""));
    assert!(raw.contains("\"2026-03-14\""));

    let restored = read_archive_export(&path).expect("read back");
    assert_eq!(&restored, tracker.archive());
    let _ = fs::remove_file(&path);
}

#[test]
fn unknown_export_version_is_refused() {
    let path = temp_path("bad_version.json");
    fs::write(&path, r#"{"version": 99, "matches": []}"#).expect("write fixture");
    assert!(read_archive_export(&path).is_err());
    let _ = fs::remove_file(&path);
}

#[test]
fn saved_match_exports_to_workbook() {
    let mut tracker = Tracker::default();
    play_straight_sets(&mut tracker);
    save(&mut tracker, "Rivals").expect("save");
    let saved = tracker.archive().latest().expect("saved");

    let path = temp_path("match.xlsx");
    let report = export_saved_match_xlsx(saved, tracker.roster(), &path).expect("workbook");
    assert_eq!(report.sets, 3);
    assert_eq!(report.rallies, 76);
    assert_eq!(report.substitutions, 1);
    assert_eq!(report.score_events, 76);
    assert!(path.exists());
    let _ = fs::remove_file(&path);
}
