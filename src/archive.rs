use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rally::{SetsWon, Team};
use crate::stats::{MatchStatistics, ScoreEvent, SetLog};
use crate::subs::SubstitutionEntry;

/// Immutable snapshot of a finished match. This is the exported shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatch {
    pub opponent: String,
    pub date: NaiveDate,
    pub final_score: SetsWon,
    pub winner: Team,
    pub per_set_logs: Vec<SetLog>,
    pub substitutions: Vec<SubstitutionEntry>,
    pub statistics: MatchStatistics,
    pub score_event_log: Vec<ScoreEvent>,
}

impl SavedMatch {
    pub fn points_for(&self, team: Team) -> u32 {
        self.statistics.get(team).total()
    }
}

/// Append-only list of saved matches for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchArchive {
    matches: Vec<SavedMatch>,
}

impl MatchArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, saved: SavedMatch) -> usize {
        self.matches.push(saved);
        self.matches.len() - 1
    }

    pub fn matches(&self) -> &[SavedMatch] {
        &self.matches
    }

    pub fn get(&self, idx: usize) -> Option<&SavedMatch> {
        self.matches.get(idx)
    }

    pub fn latest(&self) -> Option<&SavedMatch> {
        self.matches.last()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl From<Vec<SavedMatch>> for MatchArchive {
    fn from(matches: Vec<SavedMatch>) -> Self {
        Self { matches }
    }
}
