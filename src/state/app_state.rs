use crate::app::MenuItem;
use crate::components::ladder::{content_height, content_width};
use crate::components::ladder_grid::{LadderGrid, LayoutConfig};
use crate::state::generation::RequestTracker;
use chrono::NaiveDate;
use dragrace_api::Round;
use dragrace_api::client::{View, parse_display_date};
use dragrace_api::pairings::Pairing;
use dragrace_api::sessions::{Session, SortState};
use dragrace_api::wire::{CategoryEntry, EventDate};

// ---------------------------------------------------------------------------
// Category menus, one per view
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct CategoryMenu {
    pub entries: Vec<CategoryEntry>,
    pub selected: usize,
    /// Date the entries were fetched for; `None` until the first load.
    pub loaded_for: Option<NaiveDate>,
}

impl CategoryMenu {
    /// Replace the entries, keeping the current code selected when it is
    /// still offered, else the preferred code, else the first entry.
    pub fn load(&mut self, entries: Vec<CategoryEntry>, date: NaiveDate, preferred: Option<&str>) {
        let current = self.selected_code().map(str::to_owned);
        self.selected = [current.as_deref(), preferred]
            .into_iter()
            .flatten()
            .find_map(|code| entries.iter().position(|e| e.code.eq_ignore_ascii_case(code)))
            .unwrap_or(0);
        self.entries = entries;
        self.loaded_for = Some(date);
    }

    pub fn selected_entry(&self) -> Option<&CategoryEntry> {
        self.entries.get(self.selected)
    }

    pub fn selected_code(&self) -> Option<&str> {
        self.selected_entry().map(|e| e.code.as_str())
    }

    /// Move the selection, wrapping. Returns true when it changed.
    pub fn cycle(&mut self, forward: bool) -> bool {
        let len = self.entries.len();
        if len < 2 {
            return false;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
        true
    }

    pub fn is_current(&self, date: NaiveDate) -> bool {
        self.loaded_for == Some(date)
    }
}

// ---------------------------------------------------------------------------
// Ladder state
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LadderState {
    pub rounds: Vec<Round>,
    /// Rebuilt whenever `rounds` changes.
    pub grid: LadderGrid,
    pub scroll_x: u16,
    pub scroll_y: u16,
    pub tracker: RequestTracker,
    pub loaded: bool,
    pub error: Option<String>,
    pub last_updated: Option<String>,
}

impl Default for LadderState {
    fn default() -> Self {
        Self {
            rounds: Vec::new(),
            grid: LadderGrid::compute(&[], &LayoutConfig::terminal()),
            scroll_x: 0,
            scroll_y: 0,
            tracker: RequestTracker::default(),
            loaded: false,
            error: None,
            last_updated: None,
        }
    }
}

impl LadderState {
    /// Replace the ladder wholesale if `generation` is still current.
    pub fn apply(&mut self, generation: u64, rounds: Vec<Round>, stamp: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        self.grid = LadderGrid::from_rounds(&rounds, &LayoutConfig::terminal());
        self.rounds = rounds;
        self.loaded = true;
        self.error = None;
        self.last_updated = Some(stamp);
        self.clamp_scroll();
        true
    }

    pub fn fail(&mut self, generation: u64, message: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// Forget the ladder on screen, e.g. after the category changed.
    pub fn reset(&mut self) {
        self.rounds.clear();
        self.grid = LadderGrid::compute(&[], &LayoutConfig::terminal());
        self.loaded = false;
        self.error = None;
        self.scroll_x = 0;
        self.scroll_y = 0;
    }

    pub fn has_visible_rounds(&self) -> bool {
        self.grid.visible_rounds().next().is_some()
    }

    pub fn scroll_right(&mut self) {
        let step = self.column_stride();
        self.scroll_x = self.scroll_x.saturating_add(step).min(self.max_scroll_x());
    }

    pub fn scroll_left(&mut self) {
        self.scroll_x = self.scroll_x.saturating_sub(self.column_stride());
    }

    pub fn scroll_down(&mut self) {
        self.scroll_y = self.scroll_y.saturating_add(2).min(self.max_scroll_y());
    }

    pub fn scroll_up(&mut self) {
        self.scroll_y = self.scroll_y.saturating_sub(2);
    }

    fn column_stride(&self) -> u16 {
        let config = self.grid.config();
        (config.round_column_width + config.inter_round_gap).round() as u16
    }

    fn max_scroll_x(&self) -> u16 {
        content_width(&self.grid).saturating_sub(1)
    }

    fn max_scroll_y(&self) -> u16 {
        content_height(&self.grid).saturating_sub(1)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_x = self.scroll_x.min(self.max_scroll_x());
        self.scroll_y = self.scroll_y.min(self.max_scroll_y());
    }
}

// ---------------------------------------------------------------------------
// Qualifying / results sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SessionsState {
    pub sessions: Vec<Session>,
    pub selected_session: usize,
    pub sort: SortState,
    /// Column the sort cursor sits on.
    pub cursor_column: usize,
    pub scroll_offset: u16,
    pub tracker: RequestTracker,
    pub loaded: bool,
    pub error: Option<String>,
    pub last_updated: Option<String>,
}

impl SessionsState {
    pub fn apply(&mut self, generation: u64, sessions: Vec<Session>, stamp: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        let previous_key = self.current().map(|s| s.key.clone());
        self.sessions = sessions;
        self.selected_session = previous_key
            .and_then(|key| self.sessions.iter().position(|s| s.key == key))
            .unwrap_or(0);
        self.loaded = true;
        self.error = None;
        self.last_updated = Some(stamp);
        self.resort();
        true
    }

    pub fn fail(&mut self, generation: u64, message: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        self.error = Some(message);
        true
    }

    pub fn reset(&mut self) {
        self.sessions.clear();
        self.selected_session = 0;
        self.scroll_offset = 0;
        self.loaded = false;
        self.error = None;
    }

    pub fn current(&self) -> Option<&Session> {
        self.sessions.get(self.selected_session)
    }

    pub fn next_session(&mut self) {
        if !self.sessions.is_empty() {
            self.selected_session = (self.selected_session + 1) % self.sessions.len();
            self.scroll_offset = 0;
        }
    }

    pub fn prev_session(&mut self) {
        let len = self.sessions.len();
        if len > 0 {
            self.selected_session = (self.selected_session + len - 1) % len;
            self.scroll_offset = 0;
        }
    }

    pub fn move_cursor(&mut self, forward: bool, columns: usize) {
        if columns == 0 {
            return;
        }
        self.cursor_column = if forward {
            (self.cursor_column + 1) % columns
        } else {
            (self.cursor_column + columns - 1) % columns
        };
    }

    /// Sort by the column under the cursor (again: flip direction).
    pub fn toggle_sort(&mut self) {
        self.sort.toggle(self.cursor_column);
        self.resort();
    }

    pub fn scroll_down(&mut self) {
        let rows = self.current().map_or(0, |s| s.rows.len());
        let max = rows.saturating_sub(1) as u16;
        self.scroll_offset = self.scroll_offset.saturating_add(1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn resort(&mut self) {
        let sort = self.sort;
        for session in &mut self.sessions {
            sort.sort_rows(&mut session.rows);
        }
    }
}

// ---------------------------------------------------------------------------
// Pairing sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PairingState {
    pub pairings: Vec<Pairing>,
    /// Highlighted pair.
    pub selected: usize,
    pub tracker: RequestTracker,
    pub loaded: bool,
    pub error: Option<String>,
    pub last_updated: Option<String>,
}

impl PairingState {
    pub fn apply(&mut self, generation: u64, pairings: Vec<Pairing>, stamp: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        self.pairings = pairings;
        self.selected = self.selected.min(self.pairings.len().saturating_sub(1));
        self.loaded = true;
        self.error = None;
        self.last_updated = Some(stamp);
        true
    }

    pub fn fail(&mut self, generation: u64, message: String) -> bool {
        if !self.tracker.accept(generation) {
            return false;
        }
        self.error = Some(message);
        true
    }

    pub fn reset(&mut self) {
        self.pairings.clear();
        self.selected = 0;
        self.loaded = false;
        self.error = None;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.pairings.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Event calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CalendarState {
    pub events: Vec<EventDate>,
    pub selected: usize,
    pub error: Option<String>,
}

impl CalendarState {
    pub fn load(&mut self, events: Vec<EventDate>) {
        self.events = events;
        self.selected = self.selected.min(self.events.len().saturating_sub(1));
        self.error = None;
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.events.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Date of the highlighted event, if it carries a readable one.
    pub fn selected_date(&self, fallback: NaiveDate) -> Option<NaiveDate> {
        let event = self.events.get(self.selected)?;
        Some(parse_display_date(&event.race_time, fallback))
    }

    /// Highlight the first event on `date`, if any.
    pub fn focus_date(&mut self, date: NaiveDate) {
        if let Some(idx) = self
            .events
            .iter()
            .position(|e| parse_display_date(&e.race_time, NaiveDate::MIN) == date)
        {
            self.selected = idx;
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub date: NaiveDate,
    pub ladder_menu: CategoryMenu,
    pub qualifying_menu: CategoryMenu,
    pub pairing_menu: CategoryMenu,
    pub results_menu: CategoryMenu,
    pub ladder: LadderState,
    pub qualifying: SessionsState,
    pub pairing: PairingState,
    pub results: SessionsState,
    pub calendar: CalendarState,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            date,
            ladder_menu: CategoryMenu::default(),
            qualifying_menu: CategoryMenu::default(),
            pairing_menu: CategoryMenu::default(),
            results_menu: CategoryMenu::default(),
            ladder: LadderState::default(),
            qualifying: SessionsState::default(),
            pairing: PairingState::default(),
            results: SessionsState::default(),
            calendar: CalendarState::default(),
            last_error: None,
        }
    }

    pub fn menu(&self, view: View) -> &CategoryMenu {
        match view {
            View::Ladder => &self.ladder_menu,
            View::Qualifying => &self.qualifying_menu,
            View::Pairing => &self.pairing_menu,
            View::Results => &self.results_menu,
        }
    }

    pub fn menu_mut(&mut self, view: View) -> &mut CategoryMenu {
        match view {
            View::Ladder => &mut self.ladder_menu,
            View::Qualifying => &mut self.qualifying_menu,
            View::Pairing => &mut self.pairing_menu,
            View::Results => &mut self.results_menu,
        }
    }

    /// Sheet state behind a sessions view; ladder and pairings have their own.
    pub fn sessions_mut(&mut self, view: View) -> Option<&mut SessionsState> {
        match view {
            View::Qualifying => Some(&mut self.qualifying),
            View::Results => Some(&mut self.results),
            View::Ladder | View::Pairing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dragrace_api::{Match, RoundLabel, Slot};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn entry(code: &str) -> CategoryEntry {
        CategoryEntry { label: code.to_lowercase(), code: code.into() }
    }

    fn ladder(matches: usize) -> Vec<Round> {
        vec![Round {
            label: RoundLabel::Numeric(1),
            category: String::new(),
            positions: String::new(),
            qualifying_mode: String::new(),
            matches: (0..matches)
                .map(|_| Match { player1: Slot::bye(), player2: Slot::bye() })
                .collect(),
        }]
    }

    fn session(key: &str) -> Session {
        Session { key: key.into(), ..Default::default() }
    }

    #[test]
    fn menu_prefers_current_then_preferred_code() {
        let mut menu = CategoryMenu::default();
        menu.load(vec![entry("A"), entry("B"), entry("C")], day(1), Some("c"));
        assert_eq!(menu.selected_code(), Some("C"));

        menu.cycle(false);
        assert_eq!(menu.selected_code(), Some("B"));
        menu.load(vec![entry("B"), entry("C")], day(2), Some("C"));
        assert_eq!(menu.selected_code(), Some("B"));
        assert!(menu.is_current(day(2)));

        menu.load(vec![entry("X")], day(3), Some("C"));
        assert_eq!(menu.selected_code(), Some("X"));
    }

    #[test]
    fn menu_cycle_wraps_and_ignores_single_entry() {
        let mut menu = CategoryMenu::default();
        menu.load(vec![entry("A"), entry("B")], day(1), None);
        assert!(menu.cycle(true));
        assert!(menu.cycle(true));
        assert_eq!(menu.selected_code(), Some("A"));

        menu.load(vec![entry("A")], day(1), None);
        assert!(!menu.cycle(true));
    }

    #[test]
    fn stale_ladder_response_is_discarded() {
        let mut state = LadderState::default();
        let first = state.tracker.begin_change();
        let second = state.tracker.begin_change();

        assert!(state.apply(second, ladder(2), "10:00".into()));
        assert!(!state.apply(first, ladder(4), "10:01".into()));
        assert_eq!(state.rounds[0].matches.len(), 2);
        assert_eq!(state.last_updated.as_deref(), Some("10:00"));
    }

    #[test]
    fn ladder_failure_keeps_previous_rounds() {
        let mut state = LadderState::default();
        let g = state.tracker.begin_poll();
        assert!(state.apply(g, ladder(2), "10:00".into()));
        let g = state.tracker.begin_poll();
        assert!(state.fail(g, "timeout".into()));
        assert_eq!(state.rounds.len(), 1);
        assert_eq!(state.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn ladder_scroll_is_bounded() {
        let mut state = LadderState::default();
        let g = state.tracker.begin_change();
        state.apply(g, ladder(2), String::new());
        for _ in 0..50 {
            state.scroll_down();
            state.scroll_right();
        }
        assert!(state.scroll_y < content_height(&state.grid));
        assert!(state.scroll_x < content_width(&state.grid));
        state.reset();
        assert_eq!((state.scroll_x, state.scroll_y), (0, 0));
        assert!(!state.has_visible_rounds());
    }

    #[test]
    fn refreshed_sessions_keep_selected_key() {
        let mut state = SessionsState::default();
        let g = state.tracker.begin_change();
        state.apply(g, vec![session("Q1"), session("Q2")], String::new());
        state.next_session();
        assert_eq!(state.current().map(|s| s.key.as_str()), Some("Q2"));

        let g = state.tracker.begin_poll();
        state.apply(g, vec![session("Q1"), session("Q2"), session("Q3")], String::new());
        assert_eq!(state.current().map(|s| s.key.as_str()), Some("Q2"));
    }

    #[test]
    fn sort_cursor_wraps() {
        let mut state = SessionsState::default();
        state.move_cursor(false, 20);
        assert_eq!(state.cursor_column, 19);
        state.move_cursor(true, 20);
        assert_eq!(state.cursor_column, 0);
    }

    #[test]
    fn pairing_selection_survives_refresh_within_bounds() {
        let pair = |n: usize| Pairing { number: n, ..Default::default() };
        let mut state = PairingState::default();
        let g = state.tracker.begin_change();
        assert!(state.apply(g, vec![pair(1), pair(2), pair(3)], "10:00".into()));
        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(state.selected, 2);

        let poll = state.tracker.begin_poll();
        assert!(state.apply(poll, vec![pair(1)], "10:02".into()));
        assert_eq!(state.selected, 0);
        assert!(!state.apply(g, Vec::new(), "late".into()));
        assert_eq!(state.pairings.len(), 1);

        state.reset();
        assert!(!state.loaded);
        assert!(state.pairings.is_empty());
    }

    #[test]
    fn calendar_dates() {
        let mut cal = CalendarState::default();
        cal.load(vec![
            EventDate { name: "Heat 1".into(), race_time: "2025-03-01 09:00:00".into() },
            EventDate { name: "Heat 2".into(), race_time: "2025-03-08".into() },
        ]);
        cal.select_next();
        cal.select_next();
        assert_eq!(cal.selected, 1);
        assert_eq!(cal.selected_date(day(20)), Some(day(8)));
        cal.focus_date(day(1));
        assert_eq!(cal.selected, 0);
    }
}
