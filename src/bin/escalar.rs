use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing_subscriber::EnvFilter;

use cartola_robo::aggregate::{AggregateFilters, RoundRange, aggregate};
use cartola_robo::config::OptimizerConfig;
use cartola_robo::export;
use cartola_robo::formation::{FORMATIONS, Formation};
use cartola_robo::loader;
use cartola_robo::model::{Position, Venue};
use cartola_robo::optimizer::{self, Criterion, Lineup};

const DEFAULT_BUDGET: f64 = 100.0;
const DEFAULT_FORMATION: &str = "4-3-3";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let data_dir = parse_string_arg("--data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let budget = parse_f64_arg("--budget").unwrap_or(DEFAULT_BUDGET);
    let criterion = match parse_string_arg("--criterion") {
        Some(raw) => Criterion::parse(&raw).ok_or_else(|| anyhow!("unknown criterion `{raw}`"))?,
        None => Criterion::TotalPoints,
    };
    let with_coach = has_flag("--with-coach");

    let dataset = loader::load_dir(&data_dir)
        .with_context(|| format!("loading rounds from {}", data_dir.display()))?;
    if !dataset.report.defaulted_columns.is_empty() {
        eprintln!(
            "defaulted columns: {}",
            dataset
                .report
                .defaulted_columns
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let range = match parse_string_arg("--rounds") {
        Some(raw) => parse_round_range(&raw)?,
        None => RoundRange::spanning(&dataset.records).context("dataset has no rounds")?,
    };
    let filters = AggregateFilters {
        clubs: parse_list_arg("--clubs", |s| s.parse::<u32>().ok())?,
        positions: parse_list_arg("--positions", Position::from_text)?,
        venues: parse_list_arg("--venues", Venue::from_text)?,
        played_only: !has_flag("--include-benched"),
    };

    let pool = aggregate(&dataset.records, range, &filters);
    if pool.is_empty() {
        bail!(
            "no players left for rounds {}-{} with the given filters",
            range.first(),
            range.last()
        );
    }
    let config = OptimizerConfig::from_env();

    let lineup = if has_flag("--all-formations") {
        let formations: Vec<Formation> = FORMATIONS
            .iter()
            .map(|f| if with_coach { f.with_coach() } else { *f })
            .collect();
        let outcomes = optimizer::optimize_formations(&pool, &formations, budget, criterion, &config);
        for outcome in &outcomes {
            match &outcome.result {
                Ok(l) => println!(
                    "{:<14} cost {:>7.2}  score {:>7.2}  {}",
                    outcome.formation.to_string(),
                    l.total_cost,
                    l.total_score,
                    if l.within_budget { "ok" } else { "over budget" }
                ),
                Err(err) => println!("{:<14} {err}", outcome.formation.to_string()),
            }
        }
        optimizer::best_lineup(&outcomes)
            .cloned()
            .context("no formation could be filled from the pool")?
    } else {
        let label = parse_string_arg("--formation").unwrap_or_else(|| DEFAULT_FORMATION.to_string());
        let mut formation =
            Formation::parse(&label).ok_or_else(|| anyhow!("unknown formation `{label}`"))?;
        if with_coach {
            formation = formation.with_coach();
        }
        optimizer::optimize(&pool, formation, budget, criterion, &config)?
    };

    if has_flag("--json") {
        println!("{}", export::lineup_json(&lineup)?);
    } else {
        print_lineup(&lineup);
    }
    if let Some(path) = parse_string_arg("--xlsx") {
        let path = PathBuf::from(path);
        export::write_lineup_xlsx(&path, &lineup)?;
        println!("workbook written: {}", path.display());
    }
    Ok(())
}

fn print_lineup(lineup: &Lineup) {
    println!();
    println!("Formation {} by {}", lineup.formation, lineup.criterion);
    for p in &lineup.squad {
        println!(
            "  {:<5} {:<24} {:<20} C$ {:>6.2}  pts {:>7.2}  sec {:>7.2}",
            p.position.to_string(),
            p.name,
            p.club_name,
            p.current_price,
            p.total_points,
            p.secondary_score
        );
    }
    println!();
    println!(
        "Cost C$ {:.2} of {:.2} (balance {:.2}) after {} swaps, stopped: {:?}",
        lineup.total_cost, lineup.budget, lineup.remaining_balance, lineup.iterations, lineup.stop_reason
    );
    if !lineup.within_budget {
        println!("WARNING: budget not met with the current pool");
    }
}

fn parse_round_range(raw: &str) -> Result<RoundRange> {
    let raw = raw.trim();
    let (first, last) = match raw.split_once('-') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (raw, raw),
    };
    let first = first.parse::<u32>().with_context(|| format!("bad round `{first}`"))?;
    let last = last.parse::<u32>().with_context(|| format!("bad round `{last}`"))?;
    Ok(RoundRange::new(first, last)?)
}

fn parse_list_arg<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
    let Some(raw) = parse_string_arg(name) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push(parse(trimmed).ok_or_else(|| anyhow!("{name}: cannot parse `{trimmed}`"))?);
    }
    Ok(out)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_string_arg(name).and_then(|raw| raw.parse::<f64>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
