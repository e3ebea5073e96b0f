use serde::{Deserialize, Serialize};

use crate::rally::{CourtPoint, Team};
use crate::roster::{Player, PlayerId, Role, Roster};

/// Rotational positions in serve order. Position 1 (right back) serves.
pub const POSITIONS: [u8; 6] = [1, 2, 3, 4, 5, 6];
/// Back-row positions where a libero stands in for a middle blocker.
pub const LIBERO_SWAP_POSITIONS: [u8; 2] = [5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Position(u8),
    Libero,
}

impl Slot {
    pub fn label(self) -> String {
        match self {
            Slot::Position(pos) => format!("Pos {pos}"),
            Slot::Libero => "Libero".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    positions: [Option<PlayerId>; 6],
    libero: Option<PlayerId>,
}

impl Lineup {
    pub fn new(positions: [PlayerId; 6], libero: Option<PlayerId>) -> Self {
        Self {
            positions: positions.map(Some),
            libero,
        }
    }

    pub fn at(&self, pos: u8) -> Option<PlayerId> {
        slot_index(pos).and_then(|idx| self.positions[idx])
    }

    pub fn libero(&self) -> Option<PlayerId> {
        self.libero
    }

    pub fn get(&self, slot: Slot) -> Option<PlayerId> {
        match slot {
            Slot::Position(pos) => self.at(pos),
            Slot::Libero => self.libero,
        }
    }

    /// Next server: whoever stands in position 1.
    pub fn server(&self) -> Option<PlayerId> {
        self.at(1)
    }

    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }

    pub fn first_empty_position(&self) -> Option<u8> {
        POSITIONS.into_iter().find(|pos| self.at(*pos).is_none())
    }

    /// Shift every occupant one step: position p moves to p-1, 1 wraps to 6.
    /// Returns false (and leaves the lineup alone) when a position is empty.
    pub fn rotate(&mut self) -> bool {
        if !self.is_complete() {
            return false;
        }
        self.positions.rotate_left(1);
        true
    }

    /// Overwrites a slot. Duplicate assignments are not rejected here;
    /// see [`Lineup::duplicates`].
    pub fn assign(&mut self, slot: Slot, player: Option<PlayerId>) {
        match slot {
            Slot::Position(pos) => {
                if let Some(idx) = slot_index(pos) {
                    self.positions[idx] = player;
                }
            }
            Slot::Libero => self.libero = player,
        }
    }

    pub fn position_of(&self, id: PlayerId) -> Option<u8> {
        POSITIONS.into_iter().find(|pos| self.at(*pos) == Some(id))
    }

    pub fn is_on_court(&self, id: PlayerId) -> bool {
        self.position_of(id).is_some() || self.libero == Some(id)
    }

    /// Removes a player from every slot they hold.
    pub fn clear_player(&mut self, id: PlayerId) {
        for slot in self.positions.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if self.libero == Some(id) {
            self.libero = None;
        }
    }

    /// Players assigned to more than one rotational position.
    pub fn duplicates(&self) -> Vec<PlayerId> {
        let mut out = Vec::new();
        for (idx, id) in self.positions.iter().enumerate() {
            let Some(id) = id else {
                continue;
            };
            if self.positions[idx + 1..].contains(&Some(*id)) && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// Who is shown in each position. A middle blocker rotating into the
    /// back row (5, 6) is replaced by the libero; the stored rotation is
    /// never touched.
    pub fn displayed(&self, roster: &Roster) -> [Option<PlayerId>; 6] {
        let mut out = self.positions;
        let Some(libero) = self.libero else {
            return out;
        };
        for pos in LIBERO_SWAP_POSITIONS {
            let idx = (pos - 1) as usize;
            let is_middle = out[idx]
                .and_then(|id| roster.get(id))
                .is_some_and(|p| p.role() == Role::Middle);
            if is_middle {
                out[idx] = Some(libero);
            }
        }
        out
    }

    pub fn bench<'a>(&self, roster: &'a Roster) -> Vec<&'a Player> {
        roster
            .players()
            .iter()
            .filter(|p| !self.is_on_court(p.id))
            .collect()
    }
}

fn slot_index(pos: u8) -> Option<usize> {
    if (1..=6).contains(&pos) {
        Some((pos - 1) as usize)
    } else {
        None
    }
}

/// Nominal spot of a rotational position on its own half, in the same
/// 0-100 frame used for rally coordinates. The home half has the net at
/// y = 0, the away half at y = 100. Front-row players stand at the net when
/// their team serves (and setters always do); otherwise they wait at the
/// 3 m line.
pub fn court_spot(team: Team, pos: u8, at_net: bool) -> CourtPoint {
    let (x, back_row) = match (team, pos) {
        (Team::Home, 1) => (75.0, true),
        (Team::Home, 2) => (75.0, false),
        (Team::Home, 3) => (50.0, false),
        (Team::Home, 4) => (25.0, false),
        (Team::Home, 5) => (25.0, true),
        (Team::Home, 6) => (50.0, true),
        (Team::Away, 1) => (25.0, true),
        (Team::Away, 2) => (25.0, false),
        (Team::Away, 3) => (50.0, false),
        (Team::Away, 4) => (75.0, false),
        (Team::Away, 5) => (75.0, true),
        (Team::Away, 6) => (50.0, true),
        _ => return CourtPoint::CENTER,
    };
    let y = match (team, back_row, at_net) {
        (Team::Home, true, _) => 78.0,
        (Team::Home, false, true) => 12.0,
        (Team::Home, false, false) => 33.0,
        (Team::Away, true, _) => 22.0,
        (Team::Away, false, true) => 88.0,
        (Team::Away, false, false) => 67.0,
    };
    CourtPoint::new(x, y)
}
