use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::formation::Formation;
use crate::model::{AggregatedPlayer, Position};

/// Float noise allowance when comparing a squad cost against the budget.
pub const BUDGET_EPSILON: f64 = 1e-6;

/// Score field the optimizer ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    TotalPoints,
    SecondaryScore,
}

impl Criterion {
    pub fn score(self, player: &AggregatedPlayer) -> f64 {
        match self {
            Criterion::TotalPoints => player.total_points,
            Criterion::SecondaryScore => player.secondary_score,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "points" | "total_points" | "pontos" => Some(Criterion::TotalPoints),
            "secondary" | "secondary_score" | "safe" => Some(Criterion::SecondaryScore),
            _ => None,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::TotalPoints => f.write_str("total_points"),
            Criterion::SecondaryScore => f.write_str("secondary_score"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    BudgetMet,
    NoSwapAvailable,
    IterationCap,
    TimeLimit,
}

/// One accepted replacement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Swap {
    pub position: Position,
    pub outgoing_id: u32,
    pub outgoing_name: String,
    pub incoming_id: u32,
    pub incoming_name: String,
    /// Score lost per currency unit saved; negative when the incoming player scores more.
    pub ratio: f64,
    pub saving: f64,
    pub cost_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineup {
    pub formation: Formation,
    pub criterion: Criterion,
    /// Display order: goalkeeper first, then by score inside each position.
    pub squad: Vec<AggregatedPlayer>,
    pub total_cost: f64,
    pub total_score: f64,
    pub budget: f64,
    pub remaining_balance: f64,
    pub within_budget: bool,
    pub iterations: usize,
    pub swaps: Vec<Swap>,
    pub stop_reason: StopReason,
}

impl Lineup {
    pub fn count(&self, position: Position) -> usize {
        self.squad.iter().filter(|p| p.position == position).count()
    }
}

struct SwapCandidate<'a> {
    slot: usize,
    incoming: &'a AggregatedPlayer,
    ratio: f64,
    saving: f64,
}

/// Builds the best squad by `criterion` for `formation`, then trades down one player at a
/// time (always the swap with the lowest score loss per currency saved) until the squad
/// fits `budget`, no cheaper alternative exists, or `config` stops the loop.
///
/// An over-budget squad is still a successful result; check `within_budget`.
pub fn optimize(
    candidates: &[AggregatedPlayer],
    formation: Formation,
    budget: f64,
    criterion: Criterion,
    config: &OptimizerConfig,
) -> Result<Lineup, OptimizeError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(OptimizeError::InvalidBudget(budget));
    }

    let pool = ranked_pool(candidates, criterion);
    if pool.is_empty() {
        return Err(OptimizeError::EmptyPool);
    }

    let mut squad = construct(&pool, formation)?;
    let mut in_squad: HashSet<u32> = squad.iter().map(|p| p.player_id).collect();
    let mut swaps: Vec<Swap> = Vec::new();
    let started = Instant::now();

    let stop_reason = loop {
        let cost = squad_cost(&squad);
        if cost <= budget + BUDGET_EPSILON {
            break StopReason::BudgetMet;
        }
        if swaps.len() >= config.max_iterations {
            break StopReason::IterationCap;
        }
        if let Some(limit) = config.time_limit
            && started.elapsed() >= limit
        {
            break StopReason::TimeLimit;
        }
        let Some(best) = best_swap(&squad, &pool, &in_squad, criterion) else {
            break StopReason::NoSwapAvailable;
        };

        let outgoing = squad[best.slot];
        in_squad.remove(&outgoing.player_id);
        in_squad.insert(best.incoming.player_id);
        squad[best.slot] = best.incoming;
        let cost_after = squad_cost(&squad);
        debug!(
            "swap {} {} -> {} (ratio {:.3}, saves {:.2}, cost {:.2})",
            outgoing.position,
            outgoing.name,
            best.incoming.name,
            best.ratio,
            best.saving,
            cost_after
        );
        swaps.push(Swap {
            position: outgoing.position,
            outgoing_id: outgoing.player_id,
            outgoing_name: outgoing.name.clone(),
            incoming_id: best.incoming.player_id,
            incoming_name: best.incoming.name.clone(),
            ratio: best.ratio,
            saving: best.saving,
            cost_after,
        });
    };

    squad.sort_by(|a, b| {
        a.position
            .display_rank()
            .cmp(&b.position.display_rank())
            .then_with(|| criterion.score(b).total_cmp(&criterion.score(a)))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    let total_cost = squad_cost(&squad);
    let total_score: f64 = squad.iter().map(|p| criterion.score(p)).sum();
    let within_budget = total_cost <= budget + BUDGET_EPSILON;
    if within_budget {
        info!(
            "{} by {}: cost {:.2} / {:.2}, score {:.2}, {} swaps",
            formation,
            criterion,
            total_cost,
            budget,
            total_score,
            swaps.len()
        );
    } else {
        warn!(
            "{} by {}: budget {:.2} not met (cost {:.2}, stopped: {:?})",
            formation, criterion, budget, total_cost, stop_reason
        );
    }

    Ok(Lineup {
        formation,
        criterion,
        squad: squad.into_iter().cloned().collect(),
        total_cost,
        total_score,
        budget,
        remaining_balance: budget - total_cost,
        within_budget,
        iterations: swaps.len(),
        swaps,
        stop_reason,
    })
}

/// Usable candidates ranked by score desc, player id asc. Duplicate ids count once.
fn ranked_pool(candidates: &[AggregatedPlayer], criterion: Criterion) -> Vec<&AggregatedPlayer> {
    let mut seen: HashSet<u32> = HashSet::with_capacity(candidates.len());
    let mut pool: Vec<&AggregatedPlayer> = Vec::with_capacity(candidates.len());
    for player in candidates {
        if !player.current_price.is_finite() || !criterion.score(player).is_finite() {
            warn!("ignoring candidate {} ({}): non-finite price or score", player.player_id, player.name);
            continue;
        }
        if !seen.insert(player.player_id) {
            warn!("ignoring repeated candidate {}", player.player_id);
            continue;
        }
        pool.push(player);
    }
    pool.sort_by(|a, b| {
        criterion
            .score(b)
            .total_cmp(&criterion.score(a))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    pool
}

fn construct<'a>(
    pool: &[&'a AggregatedPlayer],
    formation: Formation,
) -> Result<Vec<&'a AggregatedPlayer>, OptimizeError> {
    let mut squad = Vec::with_capacity(formation.total_slots());
    for (position, required) in formation.required() {
        let picks: Vec<&AggregatedPlayer> = pool
            .iter()
            .copied()
            .filter(|p| p.position == position)
            .take(required)
            .collect();
        if picks.len() < required {
            return Err(OptimizeError::InsufficientCandidates {
                position,
                required,
                available: picks.len(),
            });
        }
        squad.extend(picks);
    }
    Ok(squad)
}

fn best_swap<'a>(
    squad: &[&'a AggregatedPlayer],
    pool: &[&'a AggregatedPlayer],
    in_squad: &HashSet<u32>,
    criterion: Criterion,
) -> Option<SwapCandidate<'a>> {
    squad
        .iter()
        .enumerate()
        .filter_map(|(slot, outgoing)| {
            let incoming = pool
                .iter()
                .copied()
                .filter(|c| {
                    c.position == outgoing.position
                        && c.current_price < outgoing.current_price
                        && !in_squad.contains(&c.player_id)
                })
                .min_by(|a, b| {
                    criterion
                        .score(b)
                        .total_cmp(&criterion.score(a))
                        .then_with(|| a.current_price.total_cmp(&b.current_price))
                        .then_with(|| a.player_id.cmp(&b.player_id))
                })?;
            let saving = outgoing.current_price - incoming.current_price;
            let ratio = (criterion.score(outgoing) - criterion.score(incoming)) / saving;
            Some(SwapCandidate {
                slot,
                incoming,
                ratio,
                saving,
            })
        })
        .min_by(|a, b| compare_swaps(a, b, squad))
}

fn compare_swaps(a: &SwapCandidate<'_>, b: &SwapCandidate<'_>, squad: &[&AggregatedPlayer]) -> Ordering {
    a.ratio
        .total_cmp(&b.ratio)
        .then_with(|| b.saving.total_cmp(&a.saving))
        .then_with(|| squad[a.slot].player_id.cmp(&squad[b.slot].player_id))
        .then_with(|| a.incoming.player_id.cmp(&b.incoming.player_id))
}

fn squad_cost(squad: &[&AggregatedPlayer]) -> f64 {
    squad.iter().map(|p| p.current_price).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationOutcome {
    pub formation: Formation,
    #[serde(serialize_with = "serialize_outcome")]
    pub result: Result<Lineup, OptimizeError>,
}

fn serialize_outcome<S: serde::Serializer>(
    result: &Result<Lineup, OptimizeError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Repr<'a> {
        Lineup(&'a Lineup),
        Error(String),
    }
    match result {
        Ok(lineup) => Repr::Lineup(lineup).serialize(serializer),
        Err(err) => Repr::Error(err.to_string()).serialize(serializer),
    }
}

/// Runs `optimize` for each formation in parallel. Output follows input order.
pub fn optimize_formations(
    candidates: &[AggregatedPlayer],
    formations: &[Formation],
    budget: f64,
    criterion: Criterion,
    config: &OptimizerConfig,
) -> Vec<FormationOutcome> {
    formations
        .par_iter()
        .map(|formation| FormationOutcome {
            formation: *formation,
            result: optimize(candidates, *formation, budget, criterion, config),
        })
        .collect()
}

/// Highest-scoring lineup that fits its budget; the cheapest one when none does.
pub fn best_lineup(outcomes: &[FormationOutcome]) -> Option<&Lineup> {
    let lineups: Vec<&Lineup> = outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();
    let fitting = lineups
        .iter()
        .copied()
        .filter(|l| l.within_budget)
        .max_by(|a, b| {
            a.total_score
                .total_cmp(&b.total_score)
                .then_with(|| b.total_cost.total_cmp(&a.total_cost))
        });
    fitting.or_else(|| {
        lineups
            .iter()
            .copied()
            .min_by(|a, b| a.total_cost.total_cmp(&b.total_cost))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoutCounts;

    fn player(id: u32, position: Position, price: f64, points: f64) -> AggregatedPlayer {
        AggregatedPlayer {
            player_id: id,
            name: format!("P{id}"),
            position,
            club_id: 1,
            club_name: String::new(),
            photo_url: None,
            current_price: price,
            total_points: points,
            mean_points: points,
            rounds_played: 1,
            last_round: 1,
            scouts: ScoutCounts::new(),
            secondary_score: 0.0,
            offensive_scouts: 0,
            defensive_scouts: 0,
        }
    }

    #[test]
    fn criterion_parse_aliases() {
        assert_eq!(Criterion::parse("Points"), Some(Criterion::TotalPoints));
        assert_eq!(Criterion::parse("secondary_score"), Some(Criterion::SecondaryScore));
        assert_eq!(Criterion::parse("xg"), None);
    }

    #[test]
    fn ranked_pool_drops_nan_and_repeats() {
        let pool = vec![
            player(1, Position::Forward, 10.0, 5.0),
            player(2, Position::Forward, f64::NAN, 5.0),
            player(1, Position::Forward, 10.0, 5.0),
            player(3, Position::Forward, 10.0, 9.0),
        ];
        let ranked = ranked_pool(&pool, Criterion::TotalPoints);
        let ids: Vec<u32> = ranked.iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn swap_prefers_smallest_loss_per_unit_saved() {
        // A: loses 2 points to save 1 (ratio 2). B: loses 2 points to save 4 (ratio 0.5).
        let a = player(1, Position::Midfielder, 10.0, 10.0);
        let a_alt = player(2, Position::Midfielder, 9.0, 8.0);
        let b = player(3, Position::Forward, 10.0, 9.0);
        let b_alt = player(4, Position::Forward, 6.0, 7.0);
        let squad = vec![&a, &b];
        let pool = vec![&a, &b, &a_alt, &b_alt];
        let in_squad: HashSet<u32> = [1, 3].into_iter().collect();
        let best = best_swap(&squad, &pool, &in_squad, Criterion::TotalPoints).unwrap();
        assert_eq!(best.slot, 1);
        assert_eq!(best.incoming.player_id, 4);
        assert!((best.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dominant_swap_wins_with_negative_ratio() {
        let a = player(1, Position::Midfielder, 10.0, 10.0);
        let a_alt = player(2, Position::Midfielder, 9.0, 1.0);
        let b = player(3, Position::Forward, 10.0, 4.0);
        let b_alt = player(4, Position::Forward, 8.0, 6.0);
        let squad = vec![&a, &b];
        let pool = vec![&a, &b_alt, &b, &a_alt];
        let in_squad: HashSet<u32> = [1, 3].into_iter().collect();
        let best = best_swap(&squad, &pool, &in_squad, Criterion::TotalPoints).unwrap();
        assert_eq!(best.incoming.player_id, 4);
        assert!((best.ratio + 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_cheaper_alternative_means_no_swap() {
        let a = player(1, Position::Goalkeeper, 5.0, 3.0);
        let pricier = player(2, Position::Goalkeeper, 9.0, 1.0);
        let other_position = player(3, Position::Forward, 1.0, 1.0);
        let squad = vec![&a];
        let pool = vec![&a, &pricier, &other_position];
        let in_squad: HashSet<u32> = [1].into_iter().collect();
        assert!(best_swap(&squad, &pool, &in_squad, Criterion::TotalPoints).is_none());
    }
}
