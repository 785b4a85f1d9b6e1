pub mod client;
pub mod ladder;
pub mod pairings;
pub mod sessions;
pub mod wire;

use std::fmt;

pub use wire::ResultRecord;

// ---------------------------------------------------------------------------
// Domain types, independent of the results API wire format
// ---------------------------------------------------------------------------

/// Label of an elimination round. The API marks the winner pseudo-round with "100".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoundLabel {
    Numeric(i64),
    /// Sorts after every numeric round, whatever its number.
    Final,
}

impl RoundLabel {
    pub const FINAL_SENTINEL: &'static str = "100";

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == Self::FINAL_SENTINEL {
            return Some(RoundLabel::Final);
        }
        raw.parse::<i64>().ok().map(RoundLabel::Numeric)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, RoundLabel::Final)
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundLabel::Numeric(n) => write!(f, "Round {n}"),
            RoundLabel::Final => write!(f, "Winner"),
        }
    }
}

/// One stage of the ladder, earliest first once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub label: RoundLabel,
    pub category: String,
    pub positions: String,
    pub qualifying_mode: String,
    pub matches: Vec<Match>,
}

/// A head-to-head pairing. Both slots are always present; missing competitors
/// are filled with synthetic bye / winner placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub player1: Slot,
    pub player2: Slot,
}

impl Match {
    /// The slot with the strictly larger elapsed time, if both parse.
    pub fn leader(&self) -> Option<&Slot> {
        let a = parse_time(&self.player1.score)?;
        let b = parse_time(&self.player2.score)?;
        if a > b {
            Some(&self.player1)
        } else if b > a {
            Some(&self.player2)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot {
    pub name: String,
    /// Car number.
    pub id: String,
    /// Elapsed time as sent by the API; "0" = no time recorded.
    pub score: String,
    pub rt: String,
    pub lane_choice: String,
    /// None for synthetic slots.
    pub raw: Option<ResultRecord>,
}

impl Slot {
    pub const BYE: &'static str = "BYE";
    pub const WINNER: &'static str = "WINNER";

    pub fn bye() -> Self {
        Self {
            name: Self::BYE.into(),
            id: Self::BYE.into(),
            score: "0".into(),
            rt: "0".into(),
            lane_choice: String::new(),
            raw: None,
        }
    }

    pub fn winner_placeholder() -> Self {
        Self {
            name: Self::WINNER.into(),
            id: "-".into(),
            score: "-".into(),
            rt: "-".into(),
            lane_choice: "-".into(),
            raw: None,
        }
    }

    pub fn from_result(result: &ResultRecord) -> Self {
        let name = if result.driver_name.trim().is_empty() {
            Self::BYE.to_owned()
        } else {
            result.driver_name.clone()
        };
        Self {
            name,
            id: result.car_number.clone(),
            score: result.et.clone(),
            rt: result.rt.clone(),
            lane_choice: result.lane_choice.clone(),
            raw: Some(result.clone()),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.name == Self::BYE
    }

    pub fn is_placeholder(&self) -> bool {
        self.raw.is_none()
    }

    pub fn has_lane_choice(&self) -> bool {
        self.lane_choice.eq_ignore_ascii_case("yes")
    }

    pub fn has_time(&self) -> bool {
        has_value(&self.score)
    }

    pub fn has_reaction_time(&self) -> bool {
        has_value(&self.rt)
    }

    /// ET for display; "0" and blanks render as "-".
    pub fn display_score(&self) -> &str {
        if self.has_time() { self.score.trim() } else { "-" }
    }

    pub fn display_rt(&self) -> &str {
        if self.has_reaction_time() { self.rt.trim() } else { "-" }
    }

    pub fn display_car(&self) -> &str {
        let id = self.id.trim();
        if id.is_empty() { "-" } else { id }
    }
}

/// Parse a timing string on demand. Non-numeric text yields `None`.
pub fn parse_time(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn has_value(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && raw != "0" && raw != "-"
}
