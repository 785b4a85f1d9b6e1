use crate::args::CliArgs;
use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::NetworkRequest;
use chrono::{Days, Local, NaiveDate};
use dragrace_api::Round;
use dragrace_api::client::View;
use dragrace_api::pairings::Pairing;
use dragrace_api::sessions::Session;
use dragrace_api::wire::{CategoryEntry, EventDate};
use log::{debug, warn};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuItem {
    #[default]
    Ladder,
    Qualifying,
    Pairing,
    Results,
    Calendar,
    Help,
}

impl MenuItem {
    /// The result sheet a tab shows, if any.
    pub fn view(&self) -> Option<View> {
        match self {
            MenuItem::Ladder => Some(View::Ladder),
            MenuItem::Qualifying => Some(View::Qualifying),
            MenuItem::Pairing => Some(View::Pairing),
            MenuItem::Results => Some(View::Results),
            MenuItem::Calendar | MenuItem::Help => None,
        }
    }
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(cli: &CliArgs) -> Self {
        let settings = AppSettings::load(cli);
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(settings.start_date), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    /// Requests issued once the UI is up.
    pub fn startup_requests(&mut self) -> Vec<NetworkRequest> {
        let mut requests = vec![NetworkRequest::LoadDates];
        requests.extend(self.ensure_view_loaded());
        requests
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_dates_loaded(&mut self, events: Vec<EventDate>) {
        self.state.calendar.load(events);
        self.state.calendar.focus_date(self.state.date);
    }

    /// Store a category menu and, if it belongs to the tab on screen, fetch
    /// the sheet for the selected category.
    pub fn on_categories_loaded(
        &mut self,
        view: View,
        date: NaiveDate,
        categories: Vec<CategoryEntry>,
    ) -> Vec<NetworkRequest> {
        if date != self.state.date {
            debug!("dropping {} categories for {date}", view.label());
            return Vec::new();
        }
        let preferred = self.settings.preferred_category.clone();
        self.state.menu_mut(view).load(categories, date, preferred.as_deref());

        if self.state.active_tab.view() == Some(view) {
            self.request_sheet(view, true).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    pub fn on_ladder_loaded(&mut self, generation: u64, rounds: Vec<Round>) {
        if self.state.ladder.apply(generation, rounds, timestamp()) {
            self.state.last_error = None;
        } else {
            let latest = self.state.ladder.tracker.latest();
            debug!("discarding stale ladder (generation {generation}, latest {latest})");
        }
    }

    pub fn on_pairings_loaded(&mut self, generation: u64, pairings: Vec<Pairing>) {
        if self.state.pairing.apply(generation, pairings, timestamp()) {
            self.state.last_error = None;
        } else {
            let latest = self.state.pairing.tracker.latest();
            debug!("discarding stale pairings (generation {generation}, latest {latest})");
        }
    }

    pub fn on_sessions_loaded(&mut self, view: View, generation: u64, sessions: Vec<Session>) {
        let Some(sheet) = self.state.sessions_mut(view) else {
            return;
        };
        if sheet.apply(generation, sessions, timestamp()) {
            self.state.last_error = None;
        } else {
            let latest = sheet.tracker.latest();
            debug!("discarding stale {} sheet (generation {generation}, latest {latest})", view.label());
        }
    }

    pub fn on_error(&mut self, target: Option<(View, u64)>, message: String) {
        let applied = match target {
            Some((View::Ladder, generation)) => self.state.ladder.fail(generation, message.clone()),
            Some((View::Pairing, generation)) => self.state.pairing.fail(generation, message.clone()),
            Some((view, generation)) => self
                .state
                .sessions_mut(view)
                .is_some_and(|sheet| sheet.fail(generation, message.clone())),
            None => {
                self.state.calendar.error = Some(message.clone());
                true
            }
        };
        if applied {
            self.state.last_error = Some(message);
        } else {
            warn!("ignoring error from a superseded request: {message}");
        }
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if self.state.active_tab == next {
            return Vec::new();
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.ensure_view_loaded()
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Category / date selection: user changes, they supersede in-flight fetches
    // -----------------------------------------------------------------------

    pub fn cycle_category(&mut self, forward: bool) -> Vec<NetworkRequest> {
        let Some(view) = self.state.active_tab.view() else {
            return Vec::new();
        };
        if !self.state.menu_mut(view).cycle(forward) {
            return Vec::new();
        }
        self.reset_sheet(view);
        self.request_sheet(view, true).into_iter().collect()
    }

    pub fn shift_date(&mut self, days: i64) -> Vec<NetworkRequest> {
        let date = self.state.date;
        let shifted = if days >= 0 {
            date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        match shifted {
            Some(next) => self.set_date(next),
            None => Vec::new(),
        }
    }

    /// Jump to the highlighted calendar event and show its ladder.
    pub fn open_calendar_event(&mut self) -> Vec<NetworkRequest> {
        let Some(date) = self.state.calendar.selected_date(self.state.date) else {
            return Vec::new();
        };
        let mut requests = self.set_date(date);
        requests.extend(self.update_tab(MenuItem::Ladder));
        requests
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Vec<NetworkRequest> {
        if date == self.state.date {
            return Vec::new();
        }
        self.state.date = date;
        self.state.calendar.focus_date(date);
        for view in View::ALL {
            self.reset_sheet(view);
            // New date, new menus; also supersedes fetches for the old date.
            self.begin_change(view);
        }
        self.ensure_view_loaded()
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Periodic refresh of the sheet on screen. Does not supersede user changes.
    pub fn refresh_tick(&mut self) -> Option<NetworkRequest> {
        let view = self.state.active_tab.view()?;
        if !self.state.menu(view).is_current(self.state.date) {
            return Some(NetworkRequest::LoadCategories { view, date: self.state.date });
        }
        self.request_sheet(view, false)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Menu first, then the sheet, for whatever tab is active.
    fn ensure_view_loaded(&mut self) -> Vec<NetworkRequest> {
        let Some(view) = self.state.active_tab.view() else {
            return Vec::new();
        };
        if !self.state.menu(view).is_current(self.state.date) {
            return vec![NetworkRequest::LoadCategories { view, date: self.state.date }];
        }
        let loaded = match view {
            View::Ladder => self.state.ladder.loaded,
            View::Qualifying => self.state.qualifying.loaded,
            View::Pairing => self.state.pairing.loaded,
            View::Results => self.state.results.loaded,
        };
        if loaded {
            Vec::new()
        } else {
            self.request_sheet(view, true).into_iter().collect()
        }
    }

    fn request_sheet(&mut self, view: View, user_change: bool) -> Option<NetworkRequest> {
        let category = self.state.menu(view).selected_code()?.to_owned();
        let date = self.state.date;
        let generation = if user_change { self.begin_change(view) } else { self.begin_poll(view) };
        Some(match view {
            View::Ladder => NetworkRequest::LoadLadder { category, date, generation },
            View::Pairing => NetworkRequest::LoadPairings { category, date, generation },
            View::Qualifying | View::Results => {
                NetworkRequest::LoadSessions { view, category, date, generation }
            }
        })
    }

    fn begin_change(&mut self, view: View) -> u64 {
        match view {
            View::Ladder => self.state.ladder.tracker.begin_change(),
            View::Qualifying => self.state.qualifying.tracker.begin_change(),
            View::Pairing => self.state.pairing.tracker.begin_change(),
            View::Results => self.state.results.tracker.begin_change(),
        }
    }

    fn begin_poll(&mut self, view: View) -> u64 {
        match view {
            View::Ladder => self.state.ladder.tracker.begin_poll(),
            View::Qualifying => self.state.qualifying.tracker.begin_poll(),
            View::Pairing => self.state.pairing.tracker.begin_poll(),
            View::Results => self.state.results.tracker.begin_poll(),
        }
    }

    fn reset_sheet(&mut self, view: View) {
        match view {
            View::Ladder => self.state.ladder.reset(),
            View::Qualifying => self.state.qualifying.reset(),
            View::Pairing => self.state.pairing.reset(),
            View::Results => self.state.results.reset(),
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
