use serde::{Deserialize, Serialize};

use crate::advisory::{Advisory, Limit, MAX_SUBSTITUTIONS_PER_SET};
use crate::lineup::Lineup;
use crate::rally::{PerTeam, Team};
use crate::roster::{PlayerId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRecord {
    pub player_out: PlayerId,
    pub player_in: PlayerId,
}

/// Match-wide history entry; per-set records are cleared, these are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionEntry {
    pub set_number: u8,
    pub team: Team,
    pub player_out: PlayerId,
    pub player_in: PlayerId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTracker {
    current_set: PerTeam<Vec<SubstitutionRecord>>,
    history: Vec<SubstitutionEntry>,
}

impl SubstitutionTracker {
    pub fn records(&self, team: Team) -> &[SubstitutionRecord] {
        self.current_set.get(team)
    }

    pub fn remaining(&self, team: Team) -> usize {
        MAX_SUBSTITUTIONS_PER_SET.saturating_sub(self.records(team).len())
    }

    pub fn history(&self) -> &[SubstitutionEntry] {
        &self.history
    }

    /// Checks a swap without changing anything and returns the position the
    /// bench player will take.
    pub fn validate(
        &self,
        team: Team,
        lineup: &Lineup,
        roster: &Roster,
        bench: PlayerId,
        court: PlayerId,
    ) -> Result<u8, Advisory> {
        if self.records(team).len() >= MAX_SUBSTITUTIONS_PER_SET {
            return Err(Advisory::LimitExceeded(Limit::Substitutions(team)));
        }
        if bench == court {
            return Err(Advisory::invalid("a player cannot replace themselves"));
        }
        if team == Team::Home && !roster.contains(bench) {
            return Err(Advisory::invalid(format!(
                "player {bench} is not on the roster"
            )));
        }
        if lineup.is_on_court(bench) {
            return Err(Advisory::invalid(format!(
                "{} is already on court",
                roster.display_name(bench)
            )));
        }
        if roster.is_libero(bench) {
            return Err(Advisory::invalid(
                "a libero enters only through the libero slot",
            ));
        }
        lineup.position_of(court).ok_or_else(|| {
            Advisory::invalid(format!(
                "{} is not in a rotational position",
                roster.display_name(court)
            ))
        })
    }

    pub fn record(&mut self, set_number: u8, team: Team, player_out: PlayerId, player_in: PlayerId) {
        self.current_set.get_mut(team).push(SubstitutionRecord {
            player_out,
            player_in,
        });
        self.history.push(SubstitutionEntry {
            set_number,
            team,
            player_out,
            player_in,
        });
    }

    pub fn start_set(&mut self) {
        self.current_set = PerTeam::default();
    }
}
