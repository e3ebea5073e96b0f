use chrono::{Local, NaiveDate};

use crate::advisory::{Advisory, Field, Limit, MAX_TIMEOUTS_PER_SET};
use crate::archive::{MatchArchive, SavedMatch};
use crate::config::{NewSetServe, TrackerConfig};
use crate::lineup::{self, Lineup, Slot};
use crate::rally::{
    self, CourtPoint, FaultKind, Outcome, PerTeam, PointType, RallyPhase, RallyRecord, Score,
    SetsWon, Team, SETS_TO_WIN,
};
use crate::roster::{PlayerEdit, PlayerId, Role, Roster};
use crate::stats::{MatchStatistics, ScoreEvent, SetLog};
use crate::subs::SubstitutionTracker;

/// Everything that changes while a match is played. Read it through
/// [`Tracker::state`]; it is only ever written by [`apply_command`].
#[derive(Debug, Clone)]
pub struct MatchState {
    pub score: Score,
    pub sets: SetsWon,
    pub serving: Team,
    pub phase: RallyPhase,
    pub set_winner: Option<Team>,
    pub match_winner: Option<Team>,
    /// Spatial rally log of the set in progress.
    pub rallies: Vec<RallyRecord>,
    /// Rally logs of finished sets, in order.
    pub saved_sets: Vec<SetLog>,
    /// Score at the moment each timeout was called, this set.
    pub timeouts: PerTeam<Vec<Score>>,
    pub subs: SubstitutionTracker,
    pub set_stats: MatchStatistics,
    pub match_stats: MatchStatistics,
    pub score_log: Vec<ScoreEvent>,
    pub serve_choice_open: bool,
    pub first_server: Team,
    pub saved: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            score: Score::default(),
            sets: SetsWon::default(),
            serving: Team::Home,
            phase: RallyPhase::Idle,
            set_winner: None,
            match_winner: None,
            rallies: Vec::with_capacity(64),
            saved_sets: Vec::with_capacity(5),
            timeouts: PerTeam::default(),
            subs: SubstitutionTracker::default(),
            set_stats: MatchStatistics::default(),
            match_stats: MatchStatistics::default(),
            score_log: Vec::with_capacity(256),
            serve_choice_open: true,
            first_server: Team::Home,
            saved: false,
        }
    }

    pub fn set_ended(&self) -> bool {
        matches!(
            self.phase,
            RallyPhase::SetComplete { .. } | RallyPhase::MatchComplete { .. }
        )
    }

    pub fn match_ended(&self) -> bool {
        matches!(self.phase, RallyPhase::MatchComplete { .. })
    }

    /// Number of the set being played, or of the one just finished.
    pub fn set_number(&self) -> u8 {
        let played = self.sets.home + self.sets.away;
        if self.set_ended() { played } else { played + 1 }
    }

    pub fn target(&self) -> u16 {
        rally::set_target(self.sets)
    }

    pub fn timeouts_left(&self, team: Team) -> usize {
        MAX_TIMEOUTS_PER_SET.saturating_sub(self.timeouts.get(team).len())
    }

    pub fn score_log_for_set(&self, set_number: u8) -> impl Iterator<Item = &ScoreEvent> {
        self.score_log
            .iter()
            .filter(move |e| e.set_number == set_number)
    }

    fn ensure_accepting_rally(&self) -> Result<(), Advisory> {
        if self.match_ended() {
            return Err(Advisory::invalid("the match is over"));
        }
        if self.set_ended() {
            return Err(Advisory::invalid("the set is over; start the next set"));
        }
        if self.phase.is_pending() {
            return Err(Advisory::invalid("a rally is still awaiting classification"));
        }
        Ok(())
    }

    fn ensure_between_rallies(&self) -> Result<(), Advisory> {
        if self.phase.is_pending() {
            return Err(Advisory::invalid("a rally is still awaiting classification"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ScoreRally { team: Team, at: CourtPoint },
    ClassifyOutcome(PointType),
    ServiceFault { serving: Team },
    ConfirmServiceFault(FaultKind),
    CancelRally,
    ChooseServe(Team),
    TakeTimeout(Team),
    Rotate(Team),
    Assign {
        team: Team,
        slot: Slot,
        player: Option<PlayerId>,
    },
    Substitute {
        team: Team,
        bench: PlayerId,
        court: PlayerId,
    },
    StartNewSet { keep_lineup: bool },
    SetOpponent(String),
    SetDate(NaiveDate),
    Save { opponent: String, date: NaiveDate },
    NewMatch { opponent: String },
    AddPlayer,
    UpdatePlayer { id: PlayerId, edit: PlayerEdit },
    RemovePlayer(PlayerId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    RallyPending { team: Team },
    FaultPending { serving: Team },
    RallyCancelled,
    PointScored {
        team: Team,
        outcome: Outcome,
        score: Score,
    },
    /// Serve moved to `team`; `rotated` is false when its lineup was incomplete.
    SideOut { team: Team, rotated: bool },
    ServeRetained { team: Team },
    SetEnded {
        set_number: u8,
        winner: Team,
        score: Score,
    },
    MatchEnded { winner: Team, sets: SetsWon },
    ServeChosen(Team),
    TimeoutTaken { team: Team, remaining: usize },
    Rotated(Team),
    Assigned { team: Team, slot: Slot },
    Substituted {
        team: Team,
        player_out: PlayerId,
        player_in: PlayerId,
        position: u8,
    },
    NewSetStarted { set_number: u8, serving: Team },
    LineupEditRequested,
    OpponentChanged,
    DateChanged,
    MatchSaved { index: usize },
    NewMatchStarted,
    PlayerAdded(PlayerId),
    PlayerUpdated(PlayerId),
    PlayerRemoved(PlayerId),
}

impl Notice {
    pub fn describe(&self) -> String {
        match self {
            Notice::RallyPending { team } => format!("rally to {}, awaiting outcome", team.label()),
            Notice::FaultPending { serving } => {
                format!("service fault by {}, awaiting kind", serving.label())
            }
            Notice::RallyCancelled => "pending rally cancelled".to_string(),
            Notice::PointScored {
                team,
                outcome,
                score,
            } => format!(
                "{} scores ({}) {}",
                team.label(),
                outcome.label(),
                score.display()
            ),
            Notice::SideOut { team, rotated } => {
                if *rotated {
                    format!("side-out: {} serves and rotates", team.label())
                } else {
                    format!("side-out: {} serves (lineup incomplete, no rotation)", team.label())
                }
            }
            Notice::ServeRetained { team } => format!("{} keeps serve", team.label()),
            Notice::SetEnded {
                set_number,
                winner,
                score,
            } => format!(
                "set {set_number} to {} ({})",
                winner.label(),
                score.display()
            ),
            Notice::MatchEnded { winner, sets } => format!(
                "match to {} ({}-{})",
                winner.label(),
                sets.home,
                sets.away
            ),
            Notice::ServeChosen(team) => format!("{} serves first", team.label()),
            Notice::TimeoutTaken { team, remaining } => {
                format!("timeout {} ({remaining} left)", team.label())
            }
            Notice::Rotated(team) => format!("{} rotated", team.label()),
            Notice::Assigned { team, slot } => {
                format!("{} {} assigned", team.label(), slot.label())
            }
            Notice::Substituted {
                team,
                player_out,
                player_in,
                position,
            } => format!(
                "{} sub: {player_in} in for {player_out} at pos {position}",
                team.label()
            ),
            Notice::NewSetStarted {
                set_number,
                serving,
            } => format!("set {set_number} started, {} serves", serving.label()),
            Notice::LineupEditRequested => "edit the lineup before the first rally".to_string(),
            Notice::OpponentChanged => "opponent updated".to_string(),
            Notice::DateChanged => "match date updated".to_string(),
            Notice::MatchSaved { index } => format!("match saved (#{})", index + 1),
            Notice::NewMatchStarted => "new match started".to_string(),
            Notice::PlayerAdded(id) => format!("player {id} added"),
            Notice::PlayerUpdated(id) => format!("player {id} updated"),
            Notice::PlayerRemoved(id) => format!("player {id} removed"),
        }
    }
}

/// Owns the roster, both lineups, the match in progress and the archive.
///
/// All mutation goes through [`apply_command`], which takes `&mut Tracker`:
/// there is exactly one writer at a time. Front ends that receive input from
/// several sources must funnel it into one queue and apply commands in order.
#[derive(Debug, Clone)]
pub struct Tracker {
    roster: Roster,
    lineups: PerTeam<Lineup>,
    state: MatchState,
    archive: MatchArchive,
    opponent: String,
    date: NaiveDate,
    new_set_serve: NewSetServe,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(Roster::starter(), default_lineups())
    }
}

impl Tracker {
    pub fn new(roster: Roster, lineups: PerTeam<Lineup>) -> Self {
        Self {
            roster,
            lineups,
            state: MatchState::new(),
            archive: MatchArchive::new(),
            opponent: String::new(),
            date: Local::now().date_naive(),
            new_set_serve: NewSetServe::Home,
        }
    }

    pub fn from_config(cfg: &TrackerConfig) -> Self {
        let mut tracker = Self::default().with_new_set_serve(cfg.new_set_serve);
        tracker.opponent = cfg.opponent.clone();
        tracker
    }

    pub fn with_new_set_serve(mut self, policy: NewSetServe) -> Self {
        self.new_set_serve = policy;
        self
    }

    pub fn apply(&mut self, cmd: Command) -> Result<Vec<Notice>, Advisory> {
        apply_command(self, cmd)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn lineup(&self, team: Team) -> &Lineup {
        self.lineups.get(team)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn archive(&self) -> &MatchArchive {
        &self.archive
    }

    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Lineup as shown on court, libero standing in for back-row middles.
    pub fn displayed_lineup(&self, team: Team) -> [Option<PlayerId>; 6] {
        self.lineups.get(team).displayed(&self.roster)
    }

    /// Nominal spot of whoever stands in `pos` for `team`.
    pub fn court_spot(&self, team: Team, pos: u8) -> CourtPoint {
        let is_setter = self
            .lineups
            .get(team)
            .at(pos)
            .and_then(|id| self.roster.get(id))
            .is_some_and(|p| p.role() == Role::Setter);
        lineup::court_spot(team, pos, self.state.serving == team || is_setter)
    }
}

/// Home: starter roster ids 1-6 with libero 7. Away: unnamed ids 101-106.
pub fn default_lineups() -> PerTeam<Lineup> {
    PerTeam::new(
        Lineup::new([1, 2, 3, 4, 5, 6], Some(7)),
        Lineup::new([101, 102, 103, 104, 105, 106], None),
    )
}

pub fn apply_command(tracker: &mut Tracker, cmd: Command) -> Result<Vec<Notice>, Advisory> {
    let mut notices = Vec::new();
    match cmd {
        Command::ScoreRally { team, at } => {
            tracker.state.ensure_accepting_rally()?;
            tracker.state.phase = RallyPhase::AwaitingOutcome { team, at };
            notices.push(Notice::RallyPending { team });
        }
        Command::ClassifyOutcome(kind) => {
            let RallyPhase::AwaitingOutcome { team, at } = tracker.state.phase else {
                return Err(Advisory::invalid("no rally is awaiting classification"));
            };
            award_point(tracker, team, Outcome::Point(kind), at, &mut notices);
        }
        Command::ServiceFault { serving } => {
            tracker.state.ensure_accepting_rally()?;
            if serving != tracker.state.serving {
                return Err(Advisory::invalid(format!(
                    "{} is not serving",
                    serving.label()
                )));
            }
            tracker.state.phase = RallyPhase::AwaitingFaultKind { serving };
            notices.push(Notice::FaultPending { serving });
        }
        Command::ConfirmServiceFault(kind) => {
            let RallyPhase::AwaitingFaultKind { serving } = tracker.state.phase else {
                return Err(Advisory::invalid("no service fault is pending"));
            };
            award_point(
                tracker,
                serving.other(),
                Outcome::ServiceFault(kind),
                CourtPoint::CENTER,
                &mut notices,
            );
        }
        Command::CancelRally => {
            if !tracker.state.phase.is_pending() {
                return Err(Advisory::invalid("nothing to cancel"));
            }
            tracker.state.phase = RallyPhase::Idle;
            notices.push(Notice::RallyCancelled);
        }
        Command::ChooseServe(team) => {
            tracker.state.ensure_between_rallies()?;
            if !tracker.state.serve_choice_open {
                return Err(Advisory::invalid(
                    "first serve can only be chosen before the first point",
                ));
            }
            tracker.state.serving = team;
            tracker.state.first_server = team;
            notices.push(Notice::ServeChosen(team));
        }
        Command::TakeTimeout(team) => {
            tracker.state.ensure_accepting_rally()?;
            if tracker.state.timeouts.get(team).len() >= MAX_TIMEOUTS_PER_SET {
                return Err(Advisory::LimitExceeded(Limit::Timeouts(team)));
            }
            let score = tracker.state.score;
            tracker.state.timeouts.get_mut(team).push(score);
            notices.push(Notice::TimeoutTaken {
                team,
                remaining: tracker.state.timeouts_left(team),
            });
        }
        Command::Rotate(team) => {
            tracker.state.ensure_between_rallies()?;
            let lineup = tracker.lineups.get_mut(team);
            if let Some(pos) = lineup.first_empty_position() {
                return Err(Advisory::MissingRequiredField(Field::LineupPosition(pos)));
            }
            lineup.rotate();
            notices.push(Notice::Rotated(team));
        }
        Command::Assign { team, slot, player } => {
            tracker.state.ensure_between_rallies()?;
            validate_assignment(&tracker.roster, team, slot, player)?;
            tracker.lineups.get_mut(team).assign(slot, player);
            notices.push(Notice::Assigned { team, slot });
        }
        Command::Substitute { team, bench, court } => {
            tracker.state.ensure_accepting_rally()?;
            let position = tracker.state.subs.validate(
                team,
                tracker.lineups.get(team),
                &tracker.roster,
                bench,
                court,
            )?;
            let set_number = tracker.state.set_number();
            tracker
                .lineups
                .get_mut(team)
                .assign(Slot::Position(position), Some(bench));
            tracker.state.subs.record(set_number, team, court, bench);
            notices.push(Notice::Substituted {
                team,
                player_out: court,
                player_in: bench,
                position,
            });
        }
        Command::StartNewSet { keep_lineup } => {
            if !matches!(tracker.state.phase, RallyPhase::SetComplete { .. }) {
                return Err(Advisory::invalid("no finished set to move on from"));
            }
            start_new_set(tracker, &mut notices);
            if !keep_lineup {
                notices.push(Notice::LineupEditRequested);
            }
        }
        Command::SetOpponent(name) => {
            tracker.opponent = name.trim().to_string();
            notices.push(Notice::OpponentChanged);
        }
        Command::SetDate(date) => {
            tracker.date = date;
            notices.push(Notice::DateChanged);
        }
        Command::Save { opponent, date } => {
            let opponent = opponent.trim().to_string();
            if opponent.is_empty() {
                return Err(Advisory::MissingRequiredField(Field::OpponentName));
            }
            let Some(winner) = tracker.state.match_winner else {
                return Err(Advisory::invalid("only a finished match can be saved"));
            };
            if tracker.state.saved {
                return Err(Advisory::invalid("this match is already saved"));
            }
            let saved = SavedMatch {
                opponent: opponent.clone(),
                date,
                final_score: tracker.state.sets,
                winner,
                per_set_logs: tracker.state.saved_sets.clone(),
                substitutions: tracker.state.subs.history().to_vec(),
                statistics: tracker.state.match_stats,
                score_event_log: tracker.state.score_log.clone(),
            };
            let index = tracker.archive.append(saved);
            tracker.state.saved = true;
            tracker.opponent = opponent;
            tracker.date = date;
            notices.push(Notice::MatchSaved { index });
        }
        Command::NewMatch { opponent } => {
            let opponent = opponent.trim().to_string();
            if opponent.is_empty() {
                return Err(Advisory::MissingRequiredField(Field::OpponentName));
            }
            tracker.state = MatchState::new();
            tracker.opponent = opponent;
            notices.push(Notice::NewMatchStarted);
        }
        Command::AddPlayer => {
            let id = tracker.roster.add_player();
            notices.push(Notice::PlayerAdded(id));
        }
        Command::UpdatePlayer { id, edit } => {
            let becomes_libero = matches!(
                edit,
                PlayerEdit::Libero(true) | PlayerEdit::Role(Role::Libero)
            );
            if becomes_libero
                && [Team::Home, Team::Away]
                    .iter()
                    .any(|t| tracker.lineups.get(*t).position_of(id).is_some())
            {
                return Err(Advisory::invalid(format!(
                    "{} holds a rotational position; move them out before making them libero",
                    tracker.roster.display_name(id)
                )));
            }
            tracker.roster.update(id, edit)?;
            if !tracker.roster.is_libero(id) {
                for team in [Team::Home, Team::Away] {
                    let lineup = tracker.lineups.get_mut(team);
                    if lineup.libero() == Some(id) {
                        lineup.assign(Slot::Libero, None);
                    }
                }
            }
            notices.push(Notice::PlayerUpdated(id));
        }
        Command::RemovePlayer(id) => {
            tracker.roster.remove(id)?;
            tracker.lineups.home.clear_player(id);
            tracker.lineups.away.clear_player(id);
            notices.push(Notice::PlayerRemoved(id));
        }
    }
    Ok(notices)
}

fn validate_assignment(
    roster: &Roster,
    team: Team,
    slot: Slot,
    player: Option<PlayerId>,
) -> Result<(), Advisory> {
    if let Slot::Position(pos) = slot
        && !lineup::POSITIONS.contains(&pos)
    {
        return Err(Advisory::invalid(format!("position {pos} does not exist")));
    }
    let Some(id) = player else {
        return Ok(());
    };
    // Away players have no roster entries.
    if team == Team::Home && !roster.contains(id) {
        return Err(Advisory::invalid(format!("player {id} is not on the roster")));
    }
    match slot {
        Slot::Position(_) if roster.is_libero(id) => Err(Advisory::invalid(
            "a libero is assigned through the libero slot",
        )),
        Slot::Libero if roster.contains(id) && !roster.is_libero(id) => Err(Advisory::invalid(
            format!("{} is not a libero", roster.display_name(id)),
        )),
        _ => Ok(()),
    }
}

fn award_point(
    tracker: &mut Tracker,
    team: Team,
    outcome: Outcome,
    at: CourtPoint,
    notices: &mut Vec<Notice>,
) {
    let set_number = tracker.state.set_number();
    let state = &mut tracker.state;

    state.rallies.push(RallyRecord { team, outcome, at });
    state.set_stats.record(team, outcome);
    state.match_stats.record(team, outcome);
    *state.score.get_mut(team) += 1;
    state.score_log.push(ScoreEvent {
        set_number,
        score: state.score,
        team,
        outcome,
    });
    state.serve_choice_open = false;
    notices.push(Notice::PointScored {
        team,
        outcome,
        score: state.score,
    });

    if state.serving != team {
        state.serving = team;
        let rotated = tracker.lineups.get_mut(team).rotate();
        notices.push(Notice::SideOut { team, rotated });
    } else {
        notices.push(Notice::ServeRetained { team });
    }

    match rally::set_winner(tracker.state.score, tracker.state.sets) {
        Some(winner) => finish_set(&mut tracker.state, winner, notices),
        None => tracker.state.phase = RallyPhase::Idle,
    }
}

fn finish_set(state: &mut MatchState, winner: Team, notices: &mut Vec<Notice>) {
    let set_number = state.set_number();
    *state.sets.get_mut(winner) += 1;
    state.set_winner = Some(winner);
    if !state.rallies.is_empty() {
        state.saved_sets.push(SetLog {
            set_number,
            final_score: state.score,
            winner,
            rallies: state.rallies.clone(),
        });
    }
    notices.push(Notice::SetEnded {
        set_number,
        winner,
        score: state.score,
    });

    if *state.sets.get(winner) >= SETS_TO_WIN {
        state.match_winner = Some(winner);
        state.phase = RallyPhase::MatchComplete { winner };
        notices.push(Notice::MatchEnded {
            winner,
            sets: state.sets,
        });
    } else {
        state.phase = RallyPhase::SetComplete { winner };
    }
}

fn start_new_set(tracker: &mut Tracker, notices: &mut Vec<Notice>) {
    let serving = match tracker.new_set_serve {
        NewSetServe::Home => Team::Home,
        NewSetServe::Alternate => tracker.state.first_server.other(),
    };
    let state = &mut tracker.state;
    state.score = Score::default();
    state.rallies.clear();
    state.timeouts = PerTeam::default();
    state.subs.start_set();
    state.set_stats = MatchStatistics::default();
    state.set_winner = None;
    state.phase = RallyPhase::Idle;
    state.serving = serving;
    state.first_server = serving;
    notices.push(Notice::NewSetStarted {
        set_number: state.set_number(),
        serving,
    });
}
