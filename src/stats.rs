use serde::{Deserialize, Serialize};

use crate::rally::{Outcome, PerTeam, PointType, RallyRecord, Score, Team};

/// Per-type point tallies for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointCounters {
    pub direct: u32,
    pub sideout: u32,
    pub block: u32,
    pub attack: u32,
    pub error: u32,
    pub service_fault: u32,
}

impl PointCounters {
    pub fn bump(&mut self, outcome: Outcome) {
        *self.slot_mut(outcome) += 1;
    }

    pub fn count(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Point(PointType::Direct) => self.direct,
            Outcome::Point(PointType::Sideout) => self.sideout,
            Outcome::Point(PointType::Block) => self.block,
            Outcome::Point(PointType::Attack) => self.attack,
            Outcome::Point(PointType::Error) => self.error,
            Outcome::ServiceFault(_) => self.service_fault,
        }
    }

    pub fn total(&self) -> u32 {
        self.direct + self.sideout + self.block + self.attack + self.error + self.service_fault
    }

    /// (label, count) rows in display order.
    pub fn rows(&self) -> [(&'static str, u32); 6] {
        [
            ("Ace", self.direct),
            ("Sideout", self.sideout),
            ("Block", self.block),
            ("Attack", self.attack),
            ("Error", self.error),
            ("Service fault", self.service_fault),
        ]
    }

    fn slot_mut(&mut self, outcome: Outcome) -> &mut u32 {
        match outcome {
            Outcome::Point(PointType::Direct) => &mut self.direct,
            Outcome::Point(PointType::Sideout) => &mut self.sideout,
            Outcome::Point(PointType::Block) => &mut self.block,
            Outcome::Point(PointType::Attack) => &mut self.attack,
            Outcome::Point(PointType::Error) => &mut self.error,
            Outcome::ServiceFault(_) => &mut self.service_fault,
        }
    }
}

pub type MatchStatistics = PerTeam<PointCounters>;

impl MatchStatistics {
    pub fn record(&mut self, team: Team, outcome: Outcome) {
        self.get_mut(team).bump(outcome);
    }
}

/// One entry of the match-wide score log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub set_number: u8,
    /// Score after the point.
    pub score: Score,
    pub team: Team,
    pub outcome: Outcome,
}

impl ScoreEvent {
    pub fn score_label(&self) -> String {
        self.score.display()
    }
}

/// A finished set's spatial rally log, kept read-only for overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub set_number: u8,
    pub final_score: Score,
    pub winner: Team,
    pub rallies: Vec<RallyRecord>,
}

/// Rallies won by `team`, i.e. the dots drawn on the opponent's half.
pub fn rallies_won_by(rallies: &[RallyRecord], team: Team) -> impl Iterator<Item = &RallyRecord> {
    rallies.iter().filter(move |r| r.team == team)
}

/// Bucket rally spots into a `cols` x `rows` grid over one half.
pub fn heat_grid(
    rallies: &[RallyRecord],
    team: Team,
    cols: usize,
    rows: usize,
) -> Vec<Vec<u32>> {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let mut grid = vec![vec![0u32; cols]; rows];
    for r in rallies_won_by(rallies, team) {
        let col = ((r.at.x() / 100.0) * cols as f32) as usize;
        let row = ((r.at.y() / 100.0) * rows as f32) as usize;
        grid[row.min(rows - 1)][col.min(cols - 1)] += 1;
    }
    grid
}
