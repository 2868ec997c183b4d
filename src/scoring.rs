use crate::model::{Scout, ScoutCounts};

/// Positive-side scouts counted by the "safe" score. Goals and assists stay out:
/// they swing far more from round to round than the structural scouts.
pub const SECONDARY_WEIGHTS: [(Scout, f64); 9] = [
    (Scout::Tackle, 1.2),
    (Scout::Save, 1.0),
    (Scout::CleanSheet, 5.0),
    (Scout::FoulSuffered, 0.5),
    (Scout::ShotSaved, 1.2),
    (Scout::ShotPost, 3.0),
    (Scout::ShotWide, 0.8),
    (Scout::PenaltyProvoked, 1.0),
    (Scout::PenaltySaved, 7.0),
];

const OFFENSIVE: [Scout; 6] = [
    Scout::Goal,
    Scout::Assist,
    Scout::ShotSaved,
    Scout::ShotWide,
    Scout::ShotPost,
    Scout::FoulSuffered,
];

const DEFENSIVE: [Scout; 3] = [Scout::Tackle, Scout::Save, Scout::CleanSheet];

pub fn secondary_score(scouts: &ScoutCounts) -> f64 {
    SECONDARY_WEIGHTS
        .iter()
        .map(|(scout, w)| w * scouts.get(*scout) as f64)
        .sum()
}

pub fn offensive_total(scouts: &ScoutCounts) -> u32 {
    OFFENSIVE.iter().map(|s| scouts.get(*s)).sum()
}

pub fn defensive_total(scouts: &ScoutCounts) -> u32 {
    DEFENSIVE.iter().map(|s| scouts.get(*s)).sum()
}
