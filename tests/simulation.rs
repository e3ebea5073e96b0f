use std::sync::mpsc;
use std::time::Duration;

use volley_tracker::rally::{DECIDING_SET_TARGET, MIN_LEAD, SET_TARGET, SETS_TO_WIN, Team};
use volley_tracker::sim::{self, FeedEvent, RallySim};
use volley_tracker::state::{Command, Tracker};

#[test]
fn seeded_simulation_is_reproducible() {
    let mut a = Tracker::default();
    let mut b = Tracker::default();
    let applied_a = sim::play_match(&mut a, &mut RallySim::new(Some(7))).expect("match a");
    let applied_b = sim::play_match(&mut b, &mut RallySim::new(Some(7))).expect("match b");

    assert_eq!(applied_a, applied_b);
    let saved_a = a.archive().latest().expect("saved a");
    let saved_b = b.archive().latest().expect("saved b");
    assert_eq!(saved_a.final_score, saved_b.final_score);
    assert_eq!(saved_a.score_event_log, saved_b.score_event_log);
    assert_eq!(saved_a.per_set_logs, saved_b.per_set_logs);
}

#[test]
fn simulated_matches_follow_the_scoring_rules() {
    for seed in 0..8u64 {
        let mut tracker = Tracker::default();
        sim::play_match(&mut tracker, &mut RallySim::new(Some(seed))).expect("match played");
        let saved = tracker.archive().latest().expect("saved");

        let winner_sets = *saved.final_score.get(saved.winner);
        let loser_sets = *saved.final_score.get(saved.winner.other());
        assert_eq!(winner_sets, SETS_TO_WIN);
        assert!(loser_sets < SETS_TO_WIN);
        assert_eq!(
            saved.per_set_logs.len(),
            (winner_sets + loser_sets) as usize
        );

        for set in &saved.per_set_logs {
            let target = if set.set_number == 5 {
                DECIDING_SET_TARGET
            } else {
                SET_TARGET
            };
            let won = *set.final_score.get(set.winner);
            let lost = *set.final_score.get(set.winner.other());
            assert!(won >= target, "seed {seed} set {}", set.set_number);
            assert!(won >= lost + MIN_LEAD, "seed {seed} set {}", set.set_number);
            if won > target {
                assert_eq!(won, lost + MIN_LEAD, "seed {seed} set {}", set.set_number);
            }
            assert_eq!(set.rallies.len(), (won + lost) as usize);

            let events = saved
                .score_event_log
                .iter()
                .filter(|e| e.set_number == set.set_number)
                .count();
            assert_eq!(events, set.rallies.len());
        }

        let total = saved.points_for(Team::Home) + saved.points_for(Team::Away);
        assert_eq!(total as usize, saved.score_event_log.len());
    }
}

#[test]
fn simulation_stops_once_match_is_saved() {
    let mut tracker = Tracker::default();
    let mut rng = RallySim::new(Some(11));
    sim::play_match(&mut tracker, &mut rng).expect("match played");
    assert!(tracker.state().saved);
    assert!(rng.next_command(&tracker).is_none());
    assert_eq!(sim::play_match(&mut tracker, &mut rng), Ok(0));
    assert_eq!(tracker.archive().len(), 1);
}

#[test]
fn demo_feed_commands_replay_cleanly() {
    let (tx, rx) = mpsc::channel();
    let handle = sim::spawn_demo_feed(tx, Tracker::default(), Some(3), Duration::ZERO);

    let mut tracker = Tracker::default();
    let mut logs = Vec::new();
    for event in rx {
        match event {
            FeedEvent::Command(cmd) => {
                let is_save = matches!(cmd, Command::Save { .. });
                tracker.apply(cmd).expect("feed command applies");
                if is_save {
                    assert_eq!(tracker.archive().len(), 1);
                }
            }
            FeedEvent::Log(line) => logs.push(line),
        }
    }
    handle.join().expect("feed thread");

    assert!(tracker.state().match_ended());
    assert_eq!(tracker.archive().len(), 1);
    assert!(logs.iter().any(|l| l.contains("finished")));
}
