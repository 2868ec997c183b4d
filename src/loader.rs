// Round and fixture CSV loading.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::LoadError;
use crate::model::{FixtureRecord, PlayerRoundRecord, Position, Scout, ScoutCounts, Venue};

const ROUND_FILE_PREFIX: &str = "rodada-";
const FIXTURE_FILE_PREFIX: &str = "confrontos_";

const COL_PLAYER_ID: &str = "atletas.atleta_id";
const COL_ROUND_ID: &str = "atletas.rodada_id";
const COL_POSITION: &str = "atletas.posicao_id";
const COL_CLUB_ID: &str = "atletas.clube_id";
const COL_PRICE: &str = "atletas.preco_num";
const COL_POINTS: &str = "atletas.pontos_num";
const COL_NAME: &str = "atletas.apelido";
const COL_CLUB_NAME: &str = "atletas.clube.id.full.name";
const COL_PHOTO: &str = "atletas.foto";
const COL_PLAYED: &str = "atletas.entrou_em_campo";

const COL_FX_ROUND: &str = "rodada_id";
const COL_FX_CLUB: &str = "clube_id";
const COL_FX_MANDO: &str = "Mando";
const COL_FX_OPPONENT: &str = "Adversario";

/// What the loader had to default, skip or collapse.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub round_files: Vec<PathBuf>,
    pub fixture_file: Option<PathBuf>,
    pub rows_read: usize,
    pub skipped_rows: usize,
    pub duplicates_dropped: usize,
    pub defaulted_columns: BTreeSet<String>,
    pub fixtures_read: usize,
    pub fixtures_matched: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<PlayerRoundRecord>,
    pub fixtures: Vec<FixtureRecord>,
    pub report: LoadReport,
}

struct RoundColumns {
    player_id: usize,
    round_id: usize,
    position: usize,
    club_id: usize,
    price: usize,
    points: usize,
    name: Option<usize>,
    club_name: Option<usize>,
    photo: Option<usize>,
    played: Option<usize>,
    scouts: Vec<(Scout, usize)>,
}

impl RoundColumns {
    fn from_headers(
        headers: &csv::StringRecord,
        source: &Path,
        report: &mut LoadReport,
    ) -> Result<Self, LoadError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.trim(), idx))
            .collect();
        let required = |column: &'static str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| LoadError::MissingColumn {
                    path: source.to_path_buf(),
                    column,
                })
        };
        let mut optional = |column: &str| {
            let found = index.get(column).copied();
            if found.is_none() {
                warn!("{}: column `{}` missing, using defaults", source.display(), column);
                report.defaulted_columns.insert(column.to_string());
            }
            found
        };

        let name = optional(COL_NAME);
        let club_name = optional(COL_CLUB_NAME);
        let photo = optional(COL_PHOTO);
        let played = optional(COL_PLAYED);
        let scouts = Scout::ALL
            .iter()
            .filter_map(|s| optional(s.code()).map(|idx| (*s, idx)))
            .collect();

        Ok(Self {
            player_id: required(COL_PLAYER_ID)?,
            round_id: required(COL_ROUND_ID)?,
            position: required(COL_POSITION)?,
            club_id: required(COL_CLUB_ID)?,
            price: required(COL_PRICE)?,
            points: required(COL_POINTS)?,
            name,
            club_name,
            photo,
            played,
            scouts,
        })
    }

    fn parse(&self, row: &csv::StringRecord) -> Result<PlayerRoundRecord, String> {
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();
        let player_id = parse_id(cell(self.player_id)).ok_or("bad player id")?;
        let round_id = parse_id(cell(self.round_id)).ok_or("bad round id")?;
        let position = parse_id(cell(self.position))
            .and_then(Position::from_cartola_id)
            .ok_or_else(|| format!("player {player_id}: unknown position `{}`", cell(self.position)))?;
        let club_id = parse_id(cell(self.club_id)).ok_or("bad club id")?;
        let price = parse_finite(cell(self.price))
            .ok_or_else(|| format!("player {player_id}: non-finite price"))?;
        let round_points = parse_finite(cell(self.points))
            .ok_or_else(|| format!("player {player_id}: non-finite points"))?;

        let mut scouts = ScoutCounts::new();
        for (scout, idx) in &self.scouts {
            let raw = cell(*idx);
            let value = parse_count(raw)
                .ok_or_else(|| format!("player {player_id}: bad {} value `{raw}`", scout.code()))?;
            scouts.set(*scout, value);
        }

        let name = self
            .name
            .map(|idx| cell(idx).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("#{player_id}"));
        let club_name = self.club_name.map(|idx| cell(idx).to_string()).unwrap_or_default();
        let photo_url = self
            .photo
            .map(|idx| cell(idx).to_string())
            .filter(|s| !s.is_empty());
        let played = self.played.map(|idx| parse_flag(cell(idx))).unwrap_or(true);

        Ok(PlayerRoundRecord {
            player_id,
            round_id,
            name,
            position,
            club_id,
            club_name,
            photo_url,
            price,
            round_points,
            played,
            scouts,
            opponent: None,
            venue: Venue::Unknown,
        })
    }
}

/// Reads one round file. Rows that do not parse are skipped and counted.
pub fn read_rounds<R: Read>(
    rdr: R,
    source: &Path,
    report: &mut LoadReport,
) -> Result<Vec<PlayerRoundRecord>, LoadError> {
    let csv_err = |e: csv::Error| LoadError::Csv {
        path: source.to_path_buf(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = RoundColumns::from_headers(&headers, source, report)?;

    let mut out = Vec::new();
    for (line, result) in reader.records().enumerate() {
        report.rows_read += 1;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", source.display(), line + 2, e);
                report.skipped_rows += 1;
                continue;
            }
        };
        match columns.parse(&row) {
            Ok(record) => out.push(record),
            Err(reason) => {
                warn!("{}: skipping row {}: {}", source.display(), line + 2, reason);
                report.skipped_rows += 1;
            }
        }
    }
    Ok(out)
}

/// Reads a fixture table. Repeated (round, club) pairs keep the first row.
pub fn read_fixtures<R: Read>(rdr: R, source: &Path) -> Result<Vec<FixtureRecord>, LoadError> {
    let csv_err = |e: csv::Error| LoadError::Csv {
        path: source.to_path_buf(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let find = |column: &str| headers.iter().position(|h| h.trim() == column);
    let required = |column: &'static str| {
        find(column).ok_or_else(|| LoadError::MissingColumn {
            path: source.to_path_buf(),
            column,
        })
    };
    let round_idx = required(COL_FX_ROUND)?;
    let club_idx = required(COL_FX_CLUB)?;
    let mando_idx = required(COL_FX_MANDO)?;
    let opponent_idx = find(COL_FX_OPPONENT);

    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut out = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("{}: skipping malformed fixture row: {}", source.display(), e);
                continue;
            }
        };
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();
        let (Some(round_id), Some(club_id)) = (parse_id(cell(round_idx)), parse_id(cell(club_idx)))
        else {
            warn!("{}: skipping fixture row without round/club id", source.display());
            continue;
        };
        if !seen.insert((round_id, club_id)) {
            warn!(
                "{}: duplicate fixture for round {} club {}, keeping the first",
                source.display(),
                round_id,
                club_id
            );
            continue;
        }
        out.push(FixtureRecord {
            round_id,
            club_id,
            opponent: opponent_idx.map(|idx| cell(idx).to_string()).unwrap_or_default(),
            venue: Venue::from_mando(cell(mando_idx)),
        });
    }
    Ok(out)
}

/// Collapses repeated (player, round) rows, keeping the last one seen.
/// Output is ordered by round then player.
pub fn dedup_records(records: Vec<PlayerRoundRecord>) -> (Vec<PlayerRoundRecord>, usize) {
    let total = records.len();
    let mut latest: HashMap<(u32, u32), PlayerRoundRecord> = HashMap::with_capacity(total);
    for record in records {
        latest.insert((record.player_id, record.round_id), record);
    }
    let mut out: Vec<PlayerRoundRecord> = latest.into_values().collect();
    out.sort_by_key(|r| (r.round_id, r.player_id));
    let dropped = total - out.len();
    (out, dropped)
}

/// Copies venue and opponent from the matching fixture; returns how many rows matched.
pub fn join_fixtures(records: &mut [PlayerRoundRecord], fixtures: &[FixtureRecord]) -> usize {
    let by_key: HashMap<(u32, u32), &FixtureRecord> = fixtures
        .iter()
        .map(|f| ((f.round_id, f.club_id), f))
        .collect();
    let mut matched = 0usize;
    for record in records.iter_mut() {
        match by_key.get(&(record.round_id, record.club_id)) {
            Some(fixture) => {
                record.venue = fixture.venue;
                record.opponent = Some(fixture.opponent.clone()).filter(|s| !s.is_empty());
                matched += 1;
            }
            None => {
                record.venue = Venue::Unknown;
                record.opponent = None;
            }
        }
    }
    matched
}

/// Loads every `rodada-*.csv` in `dir` plus the first `confrontos_*.csv`, if any.
pub fn load_dir(dir: &Path) -> Result<Dataset, LoadError> {
    let mut report = LoadReport::default();
    let round_files = list_files(dir, ROUND_FILE_PREFIX)?;
    if round_files.is_empty() {
        return Err(LoadError::NoRoundFiles(dir.to_path_buf()));
    }

    let mut records = Vec::new();
    for path in &round_files {
        let file = open(path)?;
        records.extend(read_rounds(file, path, &mut report)?);
    }
    let (mut records, dropped) = dedup_records(records);
    if dropped > 0 {
        warn!("dropped {} duplicate player/round rows", dropped);
    }
    report.duplicates_dropped = dropped;
    report.round_files = round_files;

    let fixtures = match list_files(dir, FIXTURE_FILE_PREFIX)?.into_iter().next() {
        Some(path) => {
            let fixtures = read_fixtures(open(&path)?, &path)?;
            report.fixture_file = Some(path);
            fixtures
        }
        None => {
            warn!("no fixture file in {}, venues stay unknown", dir.display());
            Vec::new()
        }
    };
    report.fixtures_read = fixtures.len();
    report.fixtures_matched = join_fixtures(&mut records, &fixtures);

    info!(
        "loaded {} records from {} files ({} skipped, {} fixtures)",
        records.len(),
        report.round_files.len(),
        report.skipped_rows,
        fixtures.len()
    );
    Ok(Dataset {
        records,
        fixtures,
        report,
    })
}

fn list_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut out: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".csv"))
        })
        .collect();
    out.sort();
    Ok(out)
}

fn open(path: &Path) -> Result<fs::File, LoadError> {
    fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

// Exported frames sometimes carry ids as floats ("262.0").
fn parse_id(raw: &str) -> Option<u32> {
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

fn parse_count(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Some(0);
    }
    parse_id(raw)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "true" | "1" | "1.0" | "yes")
}
