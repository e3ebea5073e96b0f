use serde::{Deserialize, Serialize};

pub const SET_TARGET: u16 = 25;
pub const DECIDING_SET_TARGET: u16 = 15;
pub const MIN_LEAD: u16 = 2;
pub const SETS_TO_WIN: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::Home => "home",
            Team::Away => "away",
        }
    }
}

/// One value per side. Used for scores, set counts, counters and lineups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTeam<T> {
    pub home: T,
    pub away: T,
}

impl<T> PerTeam<T> {
    pub fn new(home: T, away: T) -> Self {
        Self { home, away }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        }
    }
}

pub type Score = PerTeam<u16>;
pub type SetsWon = PerTeam<u8>;

impl Score {
    pub fn display(&self) -> String {
        format!("{}-{}", self.home, self.away)
    }
}

/// How a rally was won, as chosen by the operator after the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointType {
    Direct,
    Sideout,
    Block,
    Attack,
    Error,
}

impl PointType {
    pub const ALL: [PointType; 5] = [
        PointType::Direct,
        PointType::Sideout,
        PointType::Block,
        PointType::Attack,
        PointType::Error,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PointType::Direct => "Ace",
            PointType::Sideout => "Sideout",
            PointType::Block => "Block",
            PointType::Attack => "Attack",
            PointType::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    Net,
    Out,
    FootFault,
}

impl FaultKind {
    pub const ALL: [FaultKind; 3] = [FaultKind::Net, FaultKind::Out, FaultKind::FootFault];

    pub fn label(self) -> &'static str {
        match self {
            FaultKind::Net => "Net",
            FaultKind::Out => "Out",
            FaultKind::FootFault => "Foot fault",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Point(PointType),
    ServiceFault(FaultKind),
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Point(kind) => kind.label(),
            Outcome::ServiceFault(_) => "Service fault",
        }
    }

    pub fn fault(self) -> Option<FaultKind> {
        match self {
            Outcome::ServiceFault(kind) => Some(kind),
            Outcome::Point(_) => None,
        }
    }
}

/// Normalized spot on a team's half, 0-100 on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCourtPoint")]
pub struct CourtPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct RawCourtPoint {
    x: f32,
    y: f32,
}

impl From<RawCourtPoint> for CourtPoint {
    fn from(raw: RawCourtPoint) -> Self {
        CourtPoint::new(raw.x, raw.y)
    }
}

impl CourtPoint {
    pub const CENTER: CourtPoint = CourtPoint { x: 50.0, y: 50.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_axis(x),
            y: clamp_axis(y),
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

fn clamp_axis(v: f32) -> f32 {
    if v.is_nan() { 50.0 } else { v.clamp(0.0, 100.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RallyRecord {
    pub team: Team,
    pub outcome: Outcome,
    pub at: CourtPoint,
}

/// Where the rally resolver stands. At most one rally is ever pending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RallyPhase {
    Idle,
    AwaitingOutcome { team: Team, at: CourtPoint },
    AwaitingFaultKind { serving: Team },
    SetComplete { winner: Team },
    MatchComplete { winner: Team },
}

impl RallyPhase {
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            RallyPhase::AwaitingOutcome { .. } | RallyPhase::AwaitingFaultKind { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            RallyPhase::Idle => "idle",
            RallyPhase::AwaitingOutcome { .. } => "awaiting outcome",
            RallyPhase::AwaitingFaultKind { .. } => "awaiting fault kind",
            RallyPhase::SetComplete { .. } => "set complete",
            RallyPhase::MatchComplete { .. } => "match complete",
        }
    }
}

pub fn is_deciding_set(sets: SetsWon) -> bool {
    sets.home == SETS_TO_WIN - 1 && sets.away == SETS_TO_WIN - 1
}

pub fn set_target(sets: SetsWon) -> u16 {
    if is_deciding_set(sets) {
        DECIDING_SET_TARGET
    } else {
        SET_TARGET
    }
}

/// The team that has taken the set at this score, if any.
pub fn set_winner(score: Score, sets: SetsWon) -> Option<Team> {
    let target = set_target(sets);
    if score.home >= target && score.home >= score.away + MIN_LEAD {
        Some(Team::Home)
    } else if score.away >= target && score.away >= score.home + MIN_LEAD {
        Some(Team::Away)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deciding_set_uses_lower_target() {
        assert_eq!(set_target(SetsWon::new(2, 2)), 15);
        assert_eq!(set_target(SetsWon::new(2, 1)), 25);
        assert_eq!(set_target(SetsWon::new(0, 0)), 25);
    }

    #[test]
    fn set_needs_target_and_two_point_lead() {
        let sets = SetsWon::new(0, 0);
        assert_eq!(set_winner(Score::new(25, 23), sets), Some(Team::Home));
        assert_eq!(set_winner(Score::new(25, 24), sets), None);
        assert_eq!(set_winner(Score::new(24, 22), sets), None);
        assert_eq!(set_winner(Score::new(28, 30), sets), Some(Team::Away));
    }

    #[test]
    fn court_point_is_clamped() {
        let p = CourtPoint::new(-4.0, 140.0);
        assert_eq!((p.x(), p.y()), (0.0, 100.0));
        assert_eq!(CourtPoint::new(f32::NAN, 10.0).x(), 50.0);
    }
}
