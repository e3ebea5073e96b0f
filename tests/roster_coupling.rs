use volley_tracker::advisory::AdvisoryKind;
use volley_tracker::lineup::Slot;
use volley_tracker::rally::{CourtPoint, PointType, Team};
use volley_tracker::roster::{PlayerEdit, Role};
use volley_tracker::state::{Command, Notice, Tracker};

#[test]
fn added_player_gets_next_id_and_defaults() {
    let mut tracker = Tracker::default();
    let notices = tracker.apply(Command::AddPlayer).expect("add");
    assert_eq!(notices, vec![Notice::PlayerAdded(8)]);

    let player = tracker.roster().get(8).expect("player 8");
    assert_eq!(player.name, "Player 8");
    assert_eq!(player.number, 8);
    assert_eq!(player.role(), Role::Outside);
    assert!(!player.is_libero());
}

#[test]
fn name_and_number_edits_apply() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::UpdatePlayer {
            id: 2,
            edit: PlayerEdit::Name("Ana".to_string()),
        })
        .expect("rename");
    tracker
        .apply(Command::UpdatePlayer {
            id: 2,
            edit: PlayerEdit::Number(14),
        })
        .expect("renumber");
    assert_eq!(tracker.roster().display_name(2), "#14 Ana");

    let err = tracker
        .apply(Command::UpdatePlayer {
            id: 99,
            edit: PlayerEdit::Number(1),
        })
        .expect_err("unknown player");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
}

#[test]
fn removing_a_player_clears_their_slot() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::RemovePlayer(3))
        .expect("remove");

    assert!(!tracker.roster().contains(3));
    assert_eq!(tracker.lineup(Team::Home).at(3), None);
    assert!(tracker.apply(Command::Rotate(Team::Home)).is_err());

    // Serve still changes hands, but the gap blocks rotation.
    tracker
        .apply(Command::ChooseServe(Team::Away))
        .expect("choose serve");
    tracker
        .apply(Command::ScoreRally {
            team: Team::Home,
            at: CourtPoint::CENTER,
        })
        .expect("rally");
    let notices = tracker
        .apply(Command::ClassifyOutcome(PointType::Sideout))
        .expect("outcome");
    assert!(notices.contains(&Notice::SideOut {
        team: Team::Home,
        rotated: false
    }));
    assert_eq!(tracker.lineup(Team::Home).at(1), Some(1));

    let err = tracker
        .apply(Command::RemovePlayer(3))
        .expect_err("already removed");
    assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
}

#[test]
fn removing_the_libero_empties_the_libero_slot() {
    let mut tracker = Tracker::default();
    tracker.apply(Command::RemovePlayer(7)).expect("remove");
    assert_eq!(tracker.lineup(Team::Home).libero(), None);
    assert_eq!(tracker.displayed_lineup(Team::Home)[5], Some(6));
}

#[test]
fn rotational_player_cannot_become_libero() {
    let mut tracker = Tracker::default();
    for edit in [PlayerEdit::Libero(true), PlayerEdit::Role(Role::Libero)] {
        let err = tracker
            .apply(Command::UpdatePlayer { id: 2, edit })
            .expect_err("player 2 is in position 2");
        assert_eq!(err.kind(), AdvisoryKind::InvalidStateTransition);
    }
    assert_eq!(tracker.roster().get(2).map(|p| p.role()), Some(Role::Outside));
}

#[test]
fn clearing_libero_flag_vacates_libero_slot() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::UpdatePlayer {
            id: 7,
            edit: PlayerEdit::Libero(false),
        })
        .expect("clear flag");

    assert_eq!(tracker.roster().get(7).map(|p| p.role()), Some(Role::Outside));
    assert_eq!(tracker.lineup(Team::Home).libero(), None);
    // Middle 6 in position 6 is shown as themselves again.
    assert_eq!(tracker.displayed_lineup(Team::Home)[5], Some(6));
}

#[test]
fn role_change_away_from_libero_also_vacates_slot() {
    let mut tracker = Tracker::default();
    tracker
        .apply(Command::UpdatePlayer {
            id: 7,
            edit: PlayerEdit::Role(Role::Setter),
        })
        .expect("change role");
    assert_eq!(tracker.lineup(Team::Home).libero(), None);
}

#[test]
fn bench_player_can_be_made_libero_and_assigned() {
    let mut tracker = Tracker::default();
    tracker.apply(Command::AddPlayer).expect("add");
    tracker
        .apply(Command::UpdatePlayer {
            id: 8,
            edit: PlayerEdit::Role(Role::Libero),
        })
        .expect("bench player may become libero");
    assert!(tracker.roster().is_libero(8));

    tracker
        .apply(Command::Assign {
            team: Team::Home,
            slot: Slot::Libero,
            player: Some(8),
        })
        .expect("assign libero");
    assert_eq!(tracker.lineup(Team::Home).libero(), Some(8));
    assert_eq!(tracker.displayed_lineup(Team::Home)[5], Some(8));
}

#[test]
fn role_cycle_covers_every_role() {
    let mut role = Role::Setter;
    let mut seen = Vec::new();
    for _ in 0..Role::ALL.len() {
        seen.push(role);
        role = role.next();
    }
    assert_eq!(role, Role::Setter);
    assert_eq!(seen, Role::ALL.to_vec());
}
