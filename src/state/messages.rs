use crate::state::network::LoadingState;
use chrono::NaiveDate;
use crossterm::event::KeyEvent;
use dragrace_api::Round;
use dragrace_api::client::View;
use dragrace_api::pairings::Pairing;
use dragrace_api::sessions::Session;
use dragrace_api::wire::{CategoryEntry, EventDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkRequest {
    LoadDates,
    LoadCategories { view: View, date: NaiveDate },
    LoadLadder { category: String, date: NaiveDate, generation: u64 },
    /// Qualifying or results sheet.
    LoadSessions { view: View, category: String, date: NaiveDate, generation: u64 },
    LoadPairings { category: String, date: NaiveDate, generation: u64 },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    DatesLoaded { events: Vec<EventDate> },
    CategoriesLoaded { view: View, date: NaiveDate, categories: Vec<CategoryEntry> },
    LadderLoaded { generation: u64, rounds: Vec<Round> },
    SessionsLoaded { view: View, generation: u64, sessions: Vec<Session> },
    PairingsLoaded { generation: u64, pairings: Vec<Pairing> },
    /// `target` names the sheet and generation a failed fetch belonged to.
    Error { target: Option<(View, u64)>, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    RefreshTick,
}
