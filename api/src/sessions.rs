//! Qualifying and results sheets: one table of timing slips per session.

use crate::wire::{SessionRecord, TimingRecord};
use std::cmp::Ordering;

/// Column headers in display order.
pub const COLUMNS: [&str; 20] = [
    "id", "main_id", "timestamp", "car_number", "name", "dial_in", "rt", "ft60", "ft330", "ft660",
    "mph660", "ft1000", "mph1000", "ft1320", "mph1320", "mov", "dov", "win", "flag", "position",
];

/// Index of the `position` column in [`COLUMNS`].
pub const POSITION_COLUMN: usize = 19;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// "Q1", "Q2", ... derived from the API's `rnd`.
    pub key: String,
    pub category: String,
    pub rows: Vec<TimingRecord>,
}

impl Session {
    fn number(&self) -> Option<i64> {
        self.key.trim_start_matches('Q').parse().ok()
    }
}

/// Group records into sessions, rows ordered by finishing position and
/// sessions ordered by their round number.
pub fn sessions_from_records(records: Vec<SessionRecord>) -> Vec<Session> {
    let mut sessions: Vec<Session> = records
        .into_iter()
        .map(|record| {
            let mut rows = record.results;
            sort_by_position(&mut rows);
            Session { key: format!("Q{}", record.rnd.trim()), category: record.category, rows }
        })
        .collect();

    sessions.sort_by(|a, b| match (a.number(), b.number()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sessions
}

/// Numeric positions first (ascending); the rest keep their relative order.
pub fn sort_by_position(rows: &mut [TimingRecord]) {
    rows.sort_by(|a, b| match (numeric(&a.position), numeric(&b.position)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// User-selected table ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { column: POSITION_COLUMN, direction: SortDirection::Ascending }
    }
}

impl SortState {
    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: usize) {
        if self.column == column {
            self.direction = match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.column = column;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn sort_rows(&self, rows: &mut [TimingRecord]) {
        let column = self.column;
        rows.sort_by(|a, b| {
            let (x, y) = (cell(a, column), cell(b, column));
            let ord = if column == POSITION_COLUMN {
                match (numeric(x), numeric(y)) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    _ => x.cmp(y),
                }
            } else {
                x.cmp(y)
            };
            match self.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
}

/// Cell text for a column index from [`COLUMNS`].
pub fn cell(row: &TimingRecord, column: usize) -> &str {
    match column {
        0 => &row.id,
        1 => &row.main_id,
        2 => &row.timestamp,
        3 => &row.car_number,
        4 => &row.name,
        5 => &row.dial_in,
        6 => &row.rt,
        7 => &row.ft60,
        8 => &row.ft330,
        9 => &row.ft660,
        10 => &row.mph660,
        11 => &row.ft1000,
        12 => &row.mph1000,
        13 => &row.ft1320,
        14 => &row.mph1320,
        15 => &row.mov,
        16 => &row.dov,
        17 => &row.win,
        18 => &row.flag,
        _ => &row.position,
    }
}

/// Lane shorthand used in the tables.
pub fn lane_letter(lane: &str) -> &str {
    if lane.eq_ignore_ascii_case("left") {
        "L"
    } else if lane.eq_ignore_ascii_case("right") {
        "R"
    } else {
        lane
    }
}

fn numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}
