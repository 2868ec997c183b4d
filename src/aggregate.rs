use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::model::{AggregatedPlayer, PlayerRoundRecord, Position, Venue};
use crate::scoring;

/// Inclusive range of rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRange {
    first: u32,
    last: u32,
}

impl RoundRange {
    pub fn new(first: u32, last: u32) -> Result<Self, AggregateError> {
        if first > last {
            return Err(AggregateError::InvalidRoundRange { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn single(round: u32) -> Self {
        Self {
            first: round,
            last: round,
        }
    }

    /// Every round present in `records`; `None` when there are no records.
    pub fn spanning(records: &[PlayerRoundRecord]) -> Option<Self> {
        let first = records.iter().map(|r| r.round_id).min()?;
        let last = records.iter().map(|r| r.round_id).max()?;
        Some(Self { first, last })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn contains(&self, round: u32) -> bool {
        (self.first..=self.last).contains(&round)
    }
}

/// Record-level filters. Empty lists mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateFilters {
    #[serde(default)]
    pub clubs: Vec<u32>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub venues: Vec<Venue>,
    #[serde(default = "default_played_only")]
    pub played_only: bool,
}

fn default_played_only() -> bool {
    true
}

impl Default for AggregateFilters {
    fn default() -> Self {
        Self {
            clubs: Vec::new(),
            positions: Vec::new(),
            venues: Vec::new(),
            played_only: true,
        }
    }
}

impl AggregateFilters {
    pub fn accepts(&self, record: &PlayerRoundRecord) -> bool {
        if self.played_only && !record.played {
            return false;
        }
        if !self.clubs.is_empty() && !self.clubs.contains(&record.club_id) {
            return false;
        }
        if !self.positions.is_empty() && !self.positions.contains(&record.position) {
            return false;
        }
        if !self.venues.is_empty() && !self.venues.contains(&record.venue) {
            return false;
        }
        true
    }
}

/// Collapses the records inside `range` that pass `filters` into one row per player,
/// ordered by player id. Points are summed; everything else comes from the player's
/// latest round, since scout counters are already season totals.
pub fn aggregate(
    records: &[PlayerRoundRecord],
    range: RoundRange,
    filters: &AggregateFilters,
) -> Vec<AggregatedPlayer> {
    let mut groups: BTreeMap<u32, Vec<&PlayerRoundRecord>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| range.contains(r.round_id) && filters.accepts(r))
    {
        groups.entry(record.player_id).or_default().push(record);
    }

    groups
        .into_values()
        .filter_map(|group| summarize(&group))
        .collect()
}

fn summarize(group: &[&PlayerRoundRecord]) -> Option<AggregatedPlayer> {
    // Ties on round id cannot happen after dedup; the first one wins otherwise.
    let snapshot = group
        .iter()
        .copied()
        .reduce(|best, r| if r.round_id > best.round_id { r } else { best })?;
    let total_points: f64 = group.iter().map(|r| r.round_points).sum();
    let rounds_played = group.len();

    Some(AggregatedPlayer {
        player_id: snapshot.player_id,
        name: snapshot.name.clone(),
        position: snapshot.position,
        club_id: snapshot.club_id,
        club_name: snapshot.club_name.clone(),
        photo_url: snapshot.photo_url.clone(),
        current_price: snapshot.price,
        total_points,
        mean_points: total_points / rounds_played as f64,
        rounds_played,
        last_round: snapshot.round_id,
        scouts: snapshot.scouts.clone(),
        secondary_score: scoring::secondary_score(&snapshot.scouts),
        offensive_scouts: scoring::offensive_total(&snapshot.scouts),
        defensive_scouts: scoring::defensive_total(&snapshot.scouts),
    })
}

/// Price window used only when presenting a list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl DisplayFilter {
    pub fn apply<'a>(&self, players: &'a [AggregatedPlayer]) -> Vec<&'a AggregatedPlayer> {
        players
            .iter()
            .filter(|p| self.min_price.is_none_or(|min| p.current_price >= min))
            .filter(|p| self.max_price.is_none_or(|max| p.current_price <= max))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        assert_eq!(
            RoundRange::new(5, 2),
            Err(AggregateError::InvalidRoundRange { first: 5, last: 2 })
        );
        let r = RoundRange::new(2, 5).unwrap();
        assert!(r.contains(2) && r.contains(5));
        assert!(!r.contains(6));
    }

    #[test]
    fn spanning_empty_is_none() {
        assert!(RoundRange::spanning(&[]).is_none());
    }
}
