//! Ladder builder: flat per-round result lists → ordered rounds of matches.

use crate::wire::{ResultRecord, RoundRecord, scalar_text};
use crate::{Match, Round, RoundLabel, Slot};
use serde_json::Value;
use std::fmt;

/// Structural problems in a ladder payload. Layout relies on the shape
/// invariants of [`build_bracket`], so these fail the whole build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedInputError {
    MissingRound { index: usize },
    InvalidRound { index: usize, value: String },
    ResultsNotList { index: usize },
    InvalidResult { index: usize, position: usize, reason: String },
}

impl fmt::Display for MalformedInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedInputError::MissingRound { index } => {
                write!(f, "round record {index} has no `Round` label")
            }
            MalformedInputError::InvalidRound { index, value } => {
                write!(f, "round record {index} has a non-numeric `Round` label {value:?}")
            }
            MalformedInputError::ResultsNotList { index } => {
                write!(f, "round record {index}: `results` is not a list")
            }
            MalformedInputError::InvalidResult { index, position, reason } => {
                write!(f, "round record {index}, result {position}: {reason}")
            }
        }
    }
}

impl std::error::Error for MalformedInputError {}

/// A record that passed validation, still in API order.
struct ValidRound<'a> {
    label: RoundLabel,
    record: &'a RoundRecord,
    results: Vec<ResultRecord>,
}

/// Build the ladder from the API's round records.
///
/// Rounds are ordered numerically with the "100" winner round last (ties keep
/// input order). Regular rounds pair results positionally, two at a time, with
/// a synthetic bye for an odd tail. The winner round yields one match of its
/// first result against a "WINNER" placeholder. Rounds without matches are dropped.
pub fn build_bracket(raw: &[RoundRecord]) -> Result<Vec<Round>, MalformedInputError> {
    let mut valid = raw
        .iter()
        .enumerate()
        .map(|(index, record)| validate(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    // Vec::sort_by_key is stable.
    valid.sort_by_key(|r| r.label);

    let rounds = valid
        .into_iter()
        .map(|v| {
            let matches = if v.label.is_final() {
                winner_matches(&v.results)
            } else {
                pair_results(&v.results)
            };
            Round {
                label: v.label,
                category: v.record.category.clone(),
                positions: v.record.positions.clone(),
                qualifying_mode: v.record.qualifying_mode.clone(),
                matches,
            }
        })
        .filter(|round| !round.matches.is_empty())
        .collect();

    Ok(rounds)
}

fn validate(index: usize, record: &RoundRecord) -> Result<ValidRound<'_>, MalformedInputError> {
    let label = match &record.round {
        None | Some(Value::Null) => return Err(MalformedInputError::MissingRound { index }),
        Some(v @ (Value::String(_) | Value::Number(_))) => {
            let text = scalar_text(v);
            RoundLabel::parse(&text)
                .ok_or(MalformedInputError::InvalidRound { index, value: text })?
        }
        Some(other) => {
            return Err(MalformedInputError::InvalidRound { index, value: other.to_string() });
        }
    };

    let Some(Value::Array(items)) = &record.results else {
        return Err(MalformedInputError::ResultsNotList { index });
    };

    let results = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            if !item.is_object() {
                return Err(MalformedInputError::InvalidResult {
                    index,
                    position,
                    reason: format!("expected an object, got {item}"),
                });
            }
            serde_json::from_value::<ResultRecord>(item.clone()).map_err(|e| {
                MalformedInputError::InvalidResult { index, position, reason: e.to_string() }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidRound { label, record, results })
}

/// Pair results in array order; upstream order already reflects seeding.
fn pair_results(results: &[ResultRecord]) -> Vec<Match> {
    results
        .chunks(2)
        .map(|pair| Match {
            player1: Slot::from_result(&pair[0]),
            player2: pair.get(1).map(Slot::from_result).unwrap_or_else(Slot::bye),
        })
        .collect()
}

fn winner_matches(results: &[ResultRecord]) -> Vec<Match> {
    results
        .first()
        .map(|first| Match { player1: Slot::from_result(first), player2: Slot::winner_placeholder() })
        .into_iter()
        .collect()
}
