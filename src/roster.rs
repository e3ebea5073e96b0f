use serde::{Deserialize, Serialize};

use crate::advisory::Advisory;

pub type PlayerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Setter,
    Outside,
    Middle,
    Opposite,
    Libero,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Setter,
        Role::Outside,
        Role::Middle,
        Role::Opposite,
        Role::Libero,
    ];

    /// Outfield role a player falls back to when the libero flag is cleared.
    pub const DEFAULT_OUTFIELD: Role = Role::Outside;

    pub fn code(self) -> &'static str {
        match self {
            Role::Setter => "S",
            Role::Outside => "OH",
            Role::Middle => "MB",
            Role::Opposite => "OPP",
            Role::Libero => "L",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Setter => "Setter",
            Role::Outside => "Outside hitter",
            Role::Middle => "Middle blocker",
            Role::Opposite => "Opposite",
            Role::Libero => "Libero",
        }
    }

    pub fn next(self) -> Self {
        let idx = Role::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Role::ALL[(idx + 1) % Role::ALL.len()]
    }
}

/// A registered player. The libero flag is not stored separately: a player is
/// a libero exactly when their role is [`Role::Libero`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub number: u8,
    role: Role,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, number: u8, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            number,
            role,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_libero(&self) -> bool {
        self.role == Role::Libero
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_libero(&mut self, libero: bool) {
        if libero {
            self.role = Role::Libero;
        } else if self.role == Role::Libero {
            self.role = Role::DEFAULT_OUTFIELD;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEdit {
    Name(String),
    Number(u8),
    Role(Role),
    Libero(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Six outfield players and one libero, ids 1-7.
    pub fn starter() -> Self {
        let roles = [
            Role::Setter,
            Role::Outside,
            Role::Middle,
            Role::Opposite,
            Role::Outside,
            Role::Middle,
        ];
        let mut players: Vec<Player> = roles
            .iter()
            .enumerate()
            .map(|(idx, role)| {
                let id = idx as PlayerId + 1;
                Player::new(id, format!("Player {id}"), id as u8, *role)
            })
            .collect();
        players.push(Player::new(7, "Libero", 7, Role::Libero));
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_libero(&self, id: PlayerId) -> bool {
        self.get(id).is_some_and(Player::is_libero)
    }

    pub fn add_player(&mut self) -> PlayerId {
        let id = self.players.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let number = u8::try_from(id).unwrap_or(u8::MAX);
        self.players
            .push(Player::new(id, format!("Player {id}"), number, Role::Outside));
        id
    }

    pub fn update(&mut self, id: PlayerId, edit: PlayerEdit) -> Result<(), Advisory> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Advisory::invalid(format!("no player with id {id}")))?;
        match edit {
            PlayerEdit::Name(name) => player.name = name,
            PlayerEdit::Number(number) => player.number = number,
            PlayerEdit::Role(role) => player.set_role(role),
            PlayerEdit::Libero(libero) => player.set_libero(libero),
        }
        Ok(())
    }

    pub fn remove(&mut self, id: PlayerId) -> Result<Player, Advisory> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Advisory::invalid(format!("no player with id {id}")))?;
        Ok(self.players.remove(idx))
    }

    /// "#7 Libero" style label; unknown ids (opponent players) show the id.
    pub fn display_name(&self, id: PlayerId) -> String {
        match self.get(id) {
            Some(p) => format!("#{} {}", p.number, p.name),
            None => format!("#{id}"),
        }
    }
}
