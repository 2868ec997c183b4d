use std::fmt;

use serde::Serialize;

use crate::model::Position;

/// Required slot count per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Formation {
    pub name: &'static str,
    pub goalkeepers: usize,
    pub fullbacks: usize,
    pub center_backs: usize,
    pub midfielders: usize,
    pub forwards: usize,
    pub coaches: usize,
}

pub const FORMATIONS: [Formation; 5] = [
    Formation::outfield("4-3-3", 2, 2, 3, 3),
    Formation::outfield("3-4-3", 0, 3, 4, 3),
    Formation::outfield("3-5-2", 0, 3, 5, 2),
    Formation::outfield("4-4-2", 2, 2, 4, 2),
    Formation::outfield("5-3-2", 2, 3, 3, 2),
];

impl Formation {
    const fn outfield(
        name: &'static str,
        fullbacks: usize,
        center_backs: usize,
        midfielders: usize,
        forwards: usize,
    ) -> Self {
        Self {
            name,
            goalkeepers: 1,
            fullbacks,
            center_backs,
            midfielders,
            forwards,
            coaches: 0,
        }
    }

    /// Looks up one of the static schemes by its label ("4-3-3").
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        FORMATIONS.iter().copied().find(|f| f.name == label)
    }

    pub fn with_coach(mut self) -> Self {
        self.coaches = 1;
        self
    }

    pub fn slots(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => self.goalkeepers,
            Position::Fullback => self.fullbacks,
            Position::CenterBack => self.center_backs,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
            Position::Coach => self.coaches,
        }
    }

    /// Positions with at least one slot, in display order.
    pub fn required(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        Position::DISPLAY_ORDER
            .iter()
            .map(|p| (*p, self.slots(*p)))
            .filter(|(_, n)| *n > 0)
    }

    pub fn total_slots(&self) -> usize {
        Position::DISPLAY_ORDER.iter().map(|p| self.slots(*p)).sum()
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coaches > 0 {
            write!(f, "{} (+coach)", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}
