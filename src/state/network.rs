use crate::state::messages::{NetworkRequest, NetworkResponse};
use dragrace_api::client::{ApiError, RaceApi, View};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    client: RaceApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: RaceApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let target = request_target(&request);
            let result = match request {
                NetworkRequest::LoadDates => self.handle_load_dates().await,
                NetworkRequest::LoadCategories { view, date } => {
                    self.handle_load_categories(view, date).await
                }
                NetworkRequest::LoadLadder { category, date, generation } => {
                    self.handle_load_ladder(category, date, generation).await
                }
                NetworkRequest::LoadSessions { view, category, date, generation } => {
                    self.handle_load_sessions(view, category, date, generation).await
                }
                NetworkRequest::LoadPairings { category, date, generation } => {
                    self.handle_load_pairings(category, date, generation).await
                }
            };

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                target,
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_dates(&self) -> Result<NetworkResponse, ApiError> {
        debug!("loading event calendar");
        let events = self.client.fetch_dates().await?;
        Ok(NetworkResponse::DatesLoaded { events })
    }

    async fn handle_load_categories(
        &self,
        view: View,
        date: chrono::NaiveDate,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading {} categories for {date}", view.label());
        let categories = self.client.fetch_categories(view, date).await?;
        Ok(NetworkResponse::CategoriesLoaded { view, date, categories })
    }

    async fn handle_load_ladder(
        &self,
        category: String,
        date: chrono::NaiveDate,
        generation: u64,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading ladder {category} {date} (generation {generation})");
        let rounds = self.client.fetch_ladder(&category, date).await?;
        Ok(NetworkResponse::LadderLoaded { generation, rounds })
    }

    async fn handle_load_sessions(
        &self,
        view: View,
        category: String,
        date: chrono::NaiveDate,
        generation: u64,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading {} {category} {date} (generation {generation})", view.label());
        let sessions = match view {
            View::Results => self.client.fetch_results(&category, date).await?,
            _ => self.client.fetch_qualifying(&category, date).await?,
        };
        Ok(NetworkResponse::SessionsLoaded { view, generation, sessions })
    }

    async fn handle_load_pairings(
        &self,
        category: String,
        date: chrono::NaiveDate,
        generation: u64,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading pairings {category} {date} (generation {generation})");
        let pairings = self.client.fetch_pairings(&category, date).await?;
        Ok(NetworkResponse::PairingsLoaded { generation, pairings })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

/// Which sheet a failed request should report its error to.
fn request_target(request: &NetworkRequest) -> Option<(View, u64)> {
    match request {
        NetworkRequest::LoadLadder { generation, .. } => Some((View::Ladder, *generation)),
        NetworkRequest::LoadSessions { view, generation, .. } => Some((*view, *generation)),
        NetworkRequest::LoadPairings { generation, .. } => Some((View::Pairing, *generation)),
        NetworkRequest::LoadDates | NetworkRequest::LoadCategories { .. } => None,
    }
}
