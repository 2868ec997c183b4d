use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::AggregatedPlayer;
use crate::optimizer::{Lineup, Swap};

pub fn write_lineup_xlsx(path: &Path, lineup: &Lineup) -> Result<()> {
    let mut squad_rows = vec![vec![
        "Position".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Club".to_string(),
        "Price".to_string(),
        "Total Points".to_string(),
        "Secondary Score".to_string(),
        "Rounds".to_string(),
    ]];
    squad_rows.extend(lineup.squad.iter().map(squad_row));
    squad_rows.push(Vec::new());
    squad_rows.push(vec!["Formation".to_string(), lineup.formation.to_string()]);
    squad_rows.push(vec!["Criterion".to_string(), lineup.criterion.to_string()]);
    squad_rows.push(vec!["Total Cost".to_string(), format!("{:.2}", lineup.total_cost)]);
    squad_rows.push(vec!["Budget".to_string(), format!("{:.2}", lineup.budget)]);
    squad_rows.push(vec![
        "Balance".to_string(),
        format!("{:.2}", lineup.remaining_balance),
    ]);
    squad_rows.push(vec![
        "Within Budget".to_string(),
        if lineup.within_budget { "yes" } else { "no" }.to_string(),
    ]);

    let mut swap_rows = vec![vec![
        "#".to_string(),
        "Position".to_string(),
        "Out".to_string(),
        "In".to_string(),
        "Ratio".to_string(),
        "Saving".to_string(),
        "Cost After".to_string(),
    ]];
    swap_rows.extend(
        lineup
            .swaps
            .iter()
            .enumerate()
            .map(|(idx, swap)| swap_row(idx + 1, swap)),
    );

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Squad")?;
        write_rows(sheet, &squad_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Swaps")?;
        write_rows(sheet, &swap_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

pub fn lineup_json(lineup: &Lineup) -> Result<String> {
    serde_json::to_string_pretty(lineup).context("serialize lineup")
}

fn squad_row(player: &AggregatedPlayer) -> Vec<String> {
    vec![
        player.position.to_string(),
        player.player_id.to_string(),
        player.name.clone(),
        player.club_name.clone(),
        format!("{:.2}", player.current_price),
        format!("{:.2}", player.total_points),
        format!("{:.2}", player.secondary_score),
        player.rounds_played.to_string(),
    ]
}

fn swap_row(step: usize, swap: &Swap) -> Vec<String> {
    vec![
        step.to_string(),
        swap.position.to_string(),
        swap.outgoing_name.clone(),
        swap.incoming_name.clone(),
        format!("{:.3}", swap.ratio),
        format!("{:.2}", swap.saving),
        format!("{:.2}", swap.cost_after),
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
