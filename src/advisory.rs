use std::fmt;

use thiserror::Error;

use crate::rally::Team;

pub const MAX_TIMEOUTS_PER_SET: usize = 2;
pub const MAX_SUBSTITUTIONS_PER_SET: usize = 6;

/// A recoverable, user-facing rejection. Returned by the reducer instead of
/// applying a command; the tracker is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Advisory {
    #[error("limit reached: {0}")]
    LimitExceeded(Limit),
    #[error("missing {0}")]
    MissingRequiredField(Field),
    #[error("not allowed: {0}")]
    InvalidStateTransition(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryKind {
    LimitExceeded,
    MissingRequiredField,
    InvalidStateTransition,
}

impl Advisory {
    pub fn kind(&self) -> AdvisoryKind {
        match self {
            Advisory::LimitExceeded(_) => AdvisoryKind::LimitExceeded,
            Advisory::MissingRequiredField(_) => AdvisoryKind::MissingRequiredField,
            Advisory::InvalidStateTransition(_) => AdvisoryKind::InvalidStateTransition,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Advisory::InvalidStateTransition(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Timeouts(Team),
    Substitutions(Team),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Timeouts(team) => write!(
                f,
                "max {MAX_TIMEOUTS_PER_SET} timeouts per set ({})",
                team.label()
            ),
            Limit::Substitutions(team) => write!(
                f,
                "max {MAX_SUBSTITUTIONS_PER_SET} substitutions per set ({})",
                team.label()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    OpponentName,
    /// A rotational position with no player in it.
    LineupPosition(u8),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::OpponentName => write!(f, "opponent name"),
            Field::LineupPosition(pos) => write!(f, "player in position {pos}"),
        }
    }
}
