use dragrace_api::Round;

// ---------------------------------------------------------------------------
// LayoutConfig: every spacing constant the layout math uses
// ---------------------------------------------------------------------------

/// Layout constants. Units are whatever the caller renders in: pixels for the
/// defaults, terminal cells for [`LayoutConfig::terminal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Distance between adjacent first-round matches. Doubles every round.
    pub base_spacing: f64,
    /// Offset of the first first-round match.
    pub first_round_offset: f64,
    pub round_column_width: f64,
    pub inter_round_gap: f64,
    /// Leading space before the first column.
    pub header_padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_spacing: 200.0,
            first_round_offset: 100.0,
            round_column_width: 320.0,
            inter_round_gap: 128.0,
            header_padding: 48.0,
        }
    }
}

impl LayoutConfig {
    /// Cell-based preset for the ratatui ladder: 6-row match boxes, 2 rows apart.
    pub fn terminal() -> Self {
        Self {
            base_spacing: 8.0,
            first_round_offset: 2.0,
            round_column_width: 30.0,
            inter_round_gap: 6.0,
            header_padding: 2.0,
        }
    }

    /// `base_spacing * 2^round`
    pub fn spacing(&self, round: usize) -> f64 {
        self.base_spacing * 2f64.powi(round as i32)
    }
}

// ---------------------------------------------------------------------------
// LadderGrid: vertical position of every match, computed once per shape
// ---------------------------------------------------------------------------

/// Pre-computed ladder geometry.
///
/// Positions are filled bottom-up, round 0 first, so every round reads the
/// finished positions of the round feeding it:
///
/// ```text
///   round 0:  i * spacing(0) + first_round_offset
///   round r:  average of feeders 2i and 2i+1 in round r-1
///   winner:   the finals match it comes from (or the span of round r-1)
/// ```
///
/// The grid depends only on the bracket's shape (match counts per round),
/// never on match contents.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderGrid {
    config: LayoutConfig,
    /// `positions[round][match]`
    positions: Vec<Vec<f64>>,
}

impl LadderGrid {
    pub fn compute(match_counts: &[usize], config: &LayoutConfig) -> Self {
        let total = match_counts.len();
        let mut positions: Vec<Vec<f64>> = Vec::with_capacity(total);

        for (round, &count) in match_counts.iter().enumerate() {
            let column = match positions.last() {
                None => (0..count)
                    .map(|i| i as f64 * config.spacing(0) + config.first_round_offset)
                    .collect(),
                Some(prev) => (0..count)
                    .map(|i| position_from_feeders(prev, round, i, count, total, config))
                    .collect(),
            };
            positions.push(column);
        }

        Self { config: *config, positions }
    }

    /// Grid for a built bracket.
    pub fn from_rounds(rounds: &[Round], config: &LayoutConfig) -> Self {
        let counts: Vec<usize> = rounds.iter().map(|r| r.matches.len()).collect();
        Self::compute(&counts, config)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn round_count(&self) -> usize {
        self.positions.len()
    }

    pub fn match_count(&self, round: usize) -> usize {
        self.positions.get(round).map_or(0, Vec::len)
    }

    pub fn vertical_position(&self, round: usize, index: usize) -> Option<f64> {
        self.positions.get(round)?.get(index).copied()
    }

    /// Length of the vertical segment joining match `index` to its sibling
    /// `index + 1` before both feed the next round. Zero for odd indices,
    /// unpaired matches and the last round.
    pub fn connector_height(&self, round: usize, index: usize) -> f64 {
        let total = self.round_count();
        if index % 2 != 0 || round + 1 >= total || index + 1 >= self.match_count(round) {
            return 0.0;
        }
        // Semifinals feeding the finals match.
        if total > 2 && round + 3 == total {
            let (Some(top), Some(bottom)) =
                (self.vertical_position(round, index), self.vertical_position(round, index + 1))
            else {
                return 0.0;
            };
            return (bottom - top).abs();
        }
        self.config.spacing(round)
    }

    /// Left edge of a round's column.
    pub fn column_x(&self, round: usize) -> f64 {
        self.config.header_padding
            + round as f64 * (self.config.round_column_width + self.config.inter_round_gap)
    }

    /// Never narrower than the viewport, so a wide ladder scrolls and a
    /// narrow one fills the view.
    pub fn container_width(&self, viewport: f64) -> f64 {
        let rounds = self.round_count();
        if rounds == 0 {
            return viewport;
        }
        let content = self.config.header_padding
            + rounds as f64 * self.config.round_column_width
            + (rounds - 1) as f64 * self.config.inter_round_gap;
        content.max(viewport)
    }

    /// Largest match position, or 0 for an empty grid.
    pub fn max_position(&self) -> f64 {
        self.positions.iter().flatten().copied().fold(0.0, f64::max)
    }

    /// The last column of a multi-round ladder holds the winner card.
    pub fn is_winner_round(&self, round: usize) -> bool {
        let total = self.round_count();
        total > 1 && round + 1 == total
    }

    /// A single-round ladder has nothing to crown and is not drawn.
    pub fn is_visible(&self, round: usize) -> bool {
        round < self.round_count() && self.round_count() > 1
    }

    pub fn visible_rounds(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.round_count()).filter(|&r| self.is_visible(r))
    }

    pub fn round_title(&self, round: usize) -> String {
        if self.is_winner_round(round) {
            "Winner".to_string()
        } else {
            format!("Round {}", round + 1)
        }
    }
}

/// Position of match `index` in `round` (> 0) given the finished `prev` round.
fn position_from_feeders(
    prev: &[f64],
    round: usize,
    index: usize,
    count: usize,
    total: usize,
    config: &LayoutConfig,
) -> f64 {
    let is_winner = round + 1 == total;
    let is_penultimate = round + 2 == total;

    if is_winner || is_penultimate {
        if let [only] = prev {
            return *only;
        }
        if (is_winner || count == 1)
            && let (Some(first), Some(last)) = (prev.first(), prev.last())
        {
            return (first + last) / 2.0;
        }
    }

    match (prev.get(2 * index), prev.get(2 * index + 1)) {
        (Some(top), Some(bottom)) => (top + bottom) / 2.0,
        (Some(single), None) => *single,
        // Feeders missing after a dropped round.
        _ => index as f64 * config.spacing(round) + config.first_round_offset,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
