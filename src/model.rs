use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Fullback,
    CenterBack,
    Midfielder,
    Forward,
    Coach,
}

impl Position {
    /// Squad listing order: goalkeeper first, forwards last, coach after the XI.
    pub const DISPLAY_ORDER: [Position; 6] = [
        Position::Goalkeeper,
        Position::Fullback,
        Position::CenterBack,
        Position::Midfielder,
        Position::Forward,
        Position::Coach,
    ];

    /// Cartola `posicao_id`.
    pub fn from_cartola_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Fullback),
            3 => Some(Position::CenterBack),
            4 => Some(Position::Midfielder),
            5 => Some(Position::Forward),
            6 => Some(Position::Coach),
            _ => None,
        }
    }

    pub fn cartola_id(self) -> u32 {
        match self {
            Position::Goalkeeper => 1,
            Position::Fullback => 2,
            Position::CenterBack => 3,
            Position::Midfielder => 4,
            Position::Forward => 5,
            Position::Coach => 6,
        }
    }

    pub fn display_rank(self) -> usize {
        Self::DISPLAY_ORDER
            .iter()
            .position(|p| *p == self)
            .unwrap_or(Self::DISPLAY_ORDER.len())
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Fullback => "FB",
            Position::CenterBack => "CB",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
            Position::Coach => "COACH",
        }
    }

    pub fn from_text(raw: &str) -> Option<Self> {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "gk" | "goalkeeper" | "goleiro" | "gol" => Some(Position::Goalkeeper),
            "fb" | "fullback" | "lateral" | "lat" => Some(Position::Fullback),
            "cb" | "centerback" | "center-back" | "zagueiro" | "zag" => Some(Position::CenterBack),
            "mid" | "midfielder" | "meia" | "mei" => Some(Position::Midfielder),
            "fwd" | "forward" | "atacante" | "ata" => Some(Position::Forward),
            "coach" | "tecnico" | "técnico" | "tec" => Some(Position::Coach),
            _ => s.parse::<u32>().ok().and_then(Self::from_cartola_id),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
    #[default]
    Unknown,
}

impl Venue {
    /// Fixture files describe the venue in free text ("Casa", "Fora", "Casa x Fora" ...).
    pub fn from_mando(raw: &str) -> Self {
        if raw.contains("Casa") && !raw.contains("Fora") {
            Venue::Home
        } else {
            Venue::Away
        }
    }

    pub fn from_text(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" | "casa" => Some(Venue::Home),
            "away" | "fora" => Some(Venue::Away),
            "unknown" | "n/a" => Some(Venue::Unknown),
            _ => None,
        }
    }
}

/// Cartola scout codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scout {
    Goal,
    Assist,
    ShotPost,
    ShotSaved,
    ShotWide,
    FoulSuffered,
    PenaltyProvoked,
    PenaltyMissed,
    Offside,
    PenaltyConceded,
    Tackle,
    CleanSheet,
    Save,
    PenaltySaved,
    GoalConceded,
    FoulCommitted,
    YellowCard,
    RedCard,
    OwnGoal,
}

impl Scout {
    pub const ALL: [Scout; 19] = [
        Scout::Goal,
        Scout::Assist,
        Scout::ShotPost,
        Scout::ShotSaved,
        Scout::ShotWide,
        Scout::FoulSuffered,
        Scout::PenaltyProvoked,
        Scout::PenaltyMissed,
        Scout::Offside,
        Scout::PenaltyConceded,
        Scout::Tackle,
        Scout::CleanSheet,
        Scout::Save,
        Scout::PenaltySaved,
        Scout::GoalConceded,
        Scout::FoulCommitted,
        Scout::YellowCard,
        Scout::RedCard,
        Scout::OwnGoal,
    ];

    /// Column header used by the source CSV files.
    pub fn code(self) -> &'static str {
        match self {
            Scout::Goal => "G",
            Scout::Assist => "A",
            Scout::ShotPost => "FT",
            Scout::ShotSaved => "FD",
            Scout::ShotWide => "FF",
            Scout::FoulSuffered => "FS",
            Scout::PenaltyProvoked => "PS",
            Scout::PenaltyMissed => "PP",
            Scout::Offside => "I",
            Scout::PenaltyConceded => "PC",
            Scout::Tackle => "DS",
            Scout::CleanSheet => "SG",
            Scout::Save => "DE",
            Scout::PenaltySaved => "DP",
            Scout::GoalConceded => "GS",
            Scout::FoulCommitted => "FC",
            Scout::YellowCard => "CA",
            Scout::RedCard => "CV",
            Scout::OwnGoal => "GC",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code.trim())
    }
}

/// Counters keyed by scout. Absent keys read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoutCounts(BTreeMap<Scout, u32>);

impl ScoutCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scout: Scout) -> u32 {
        self.0.get(&scout).copied().unwrap_or(0)
    }

    pub fn set(&mut self, scout: Scout, value: u32) {
        if value == 0 {
            self.0.remove(&scout);
        } else {
            self.0.insert(scout, value);
        }
    }

    pub fn with(mut self, scout: Scout, value: u32) -> Self {
        self.set(scout, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scout, u32)> + '_ {
        self.0.iter().map(|(s, v)| (*s, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Scout, u32)> for ScoutCounts {
    fn from_iter<I: IntoIterator<Item = (Scout, u32)>>(iter: I) -> Self {
        let mut out = ScoutCounts::new();
        for (scout, value) in iter {
            out.set(scout, value);
        }
        out
    }
}

/// One player in one round. Scout counters are season totals as of that round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRoundRecord {
    pub player_id: u32,
    pub round_id: u32,
    pub name: String,
    pub position: Position,
    pub club_id: u32,
    #[serde(default)]
    pub club_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub price: f64,
    pub round_points: f64,
    #[serde(default = "default_played")]
    pub played: bool,
    #[serde(default)]
    pub scouts: ScoutCounts,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub venue: Venue,
}

fn default_played() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub round_id: u32,
    pub club_id: u32,
    pub opponent: String,
    pub venue: Venue,
}

/// One row per player over a round range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPlayer {
    pub player_id: u32,
    pub name: String,
    pub position: Position,
    pub club_id: u32,
    pub club_name: String,
    pub photo_url: Option<String>,
    pub current_price: f64,
    pub total_points: f64,
    pub mean_points: f64,
    pub rounds_played: usize,
    pub last_round: u32,
    pub scouts: ScoutCounts,
    pub secondary_score: f64,
    pub offensive_scouts: u32,
    pub defensive_scouts: u32,
}
