use crate::Round;
use crate::ladder::{MalformedInputError, build_bracket};
use crate::pairings::{Pairing, pairings_from_records};
use crate::sessions::{Session, sessions_from_records};
use crate::wire::{ApiEnvelope, CategoryEntry, EventDate, PairingRecord, RoundRecord, SessionRecord};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "https://www.outix.co/thirdparty";
/// Header the results API authenticates with.
pub const AUTH_HEADER: &str = "Auth-Token";
const API_DATE_FORMAT: &str = "%Y-%m-%d";

const GET_DATES: &str = "/getdates";

/// The result sheets the dashboard can show. Each has its own category menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Ladder,
    Qualifying,
    Pairing,
    Results,
}

impl View {
    pub const ALL: [View; 4] = [View::Ladder, View::Qualifying, View::Pairing, View::Results];

    pub fn label(&self) -> &'static str {
        match self {
            View::Ladder => "Ladder",
            View::Qualifying => "Qualifying",
            View::Pairing => "Pairing",
            View::Results => "Results",
        }
    }

    fn categories_endpoint(&self) -> &'static str {
        match self {
            View::Ladder => "/getcategories/ladder",
            View::Qualifying => "/getcategories/qualifying",
            // Plural here, singular for the sheet itself.
            View::Pairing => "/getcategories/pairings",
            View::Results => "/getcategories/results",
        }
    }

    fn all_results_endpoint(&self) -> &'static str {
        match self {
            View::Ladder => "/getAllResults/ladder",
            View::Qualifying => "/getAllResults/qualifying",
            View::Pairing => "/getAllResults/pairing",
            View::Results => "/getAllResults/results",
        }
    }
}

/// Where and how to reach the results API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Either the API root or a forwarding proxy URL such as
    /// `http://localhost:3000/forward?url=https://host/thirdparty`.
    pub base_url: String,
    pub auth_token: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_token: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `DRAGTUI_API_BASE` and `DRAGTUI_AUTH_TOKEN`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("DRAGTUI_API_BASE")
            && !base.trim().is_empty()
        {
            config.base_url = base.trim().trim_end_matches('/').to_owned();
        }
        if let Ok(token) = std::env::var("DRAGTUI_AUTH_TOKEN") {
            config.auth_token = token.trim().to_owned();
        }
        config
    }
}

/// Results API client.
#[derive(Debug, Clone)]
pub struct RaceApi {
    client: Client,
    config: ApiConfig,
}

impl Default for RaceApi {
    fn default() -> Self {
        Self::new(ApiConfig::default())
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    Decode(serde_json::Error, String),
    /// The envelope carried `error: true`.
    Rejected(String, String),
    Malformed(MalformedInputError, String),
    InvalidUrl(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Decode(e, url) => write!(f, "Unexpected payload from {url}: {e}"),
            ApiError::Rejected(msg, url) => write!(f, "API rejected {url}: {msg}"),
            ApiError::Malformed(e, url) => write!(f, "Malformed ladder from {url}: {e}"),
            ApiError::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl RaceApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("dragtui/0.1 (terminal results viewer)")
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Event calendar.
    pub async fn fetch_dates(&self) -> ApiResult<Vec<EventDate>> {
        let url = build_api_url(&self.config.base_url, GET_DATES, "", None)?;
        let msg = self.get_msg(url.clone()).await?;
        decode_menu(msg, &url)
    }

    /// Categories running on `date` for one view.
    pub async fn fetch_categories(&self, view: View, date: NaiveDate) -> ApiResult<Vec<CategoryEntry>> {
        let url = build_api_url(&self.config.base_url, view.categories_endpoint(), "", Some(date))?;
        let msg = self.get_msg(url.clone()).await?;
        decode_menu(msg, &url)
    }

    /// Ladder for one category and day, shaped into rounds of matches.
    pub async fn fetch_ladder(&self, category: &str, date: NaiveDate) -> ApiResult<Vec<Round>> {
        let url = build_api_url(
            &self.config.base_url,
            View::Ladder.all_results_endpoint(),
            category,
            Some(date),
        )?;
        let msg = self.get_msg(url.clone()).await?;
        let records: Vec<RoundRecord> = decode_list(msg, &url)?;
        debug!("ladder {category} {date}: {} round records", records.len());
        build_bracket(&records).map_err(|e| ApiError::Malformed(e, url.to_string()))
    }

    pub async fn fetch_qualifying(&self, category: &str, date: NaiveDate) -> ApiResult<Vec<Session>> {
        self.fetch_sessions(View::Qualifying, category, date).await
    }

    pub async fn fetch_results(&self, category: &str, date: NaiveDate) -> ApiResult<Vec<Session>> {
        self.fetch_sessions(View::Results, category, date).await
    }

    /// Next-round pairings for one category and day, two drivers per pair.
    pub async fn fetch_pairings(&self, category: &str, date: NaiveDate) -> ApiResult<Vec<Pairing>> {
        let url = build_api_url(
            &self.config.base_url,
            View::Pairing.all_results_endpoint(),
            category,
            Some(date),
        )?;
        let msg = self.get_msg(url.clone()).await?;
        let records: Vec<PairingRecord> = decode_list(msg, &url)?;
        Ok(pairings_from_records(records))
    }

    async fn fetch_sessions(&self, view: View, category: &str, date: NaiveDate) -> ApiResult<Vec<Session>> {
        let url = build_api_url(&self.config.base_url, view.all_results_endpoint(), category, Some(date))?;
        let msg = self.get_msg(url.clone()).await?;
        let records: Vec<SessionRecord> = decode_list(msg, &url)?;
        Ok(sessions_from_records(records))
    }

    /// GET `url`, check the status and the envelope, return the `msg` payload.
    async fn get_msg(&self, url: Url) -> ApiResult<Value> {
        let url_text = url.to_string();
        let response = self
            .client
            .get(url)
            .header(AUTH_HEADER, self.config.auth_token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url_text.clone()))?;

        let envelope = response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url_text.clone()))?
            .json::<ApiEnvelope>()
            .await
            .map_err(|e| ApiError::Parsing(e, url_text.clone()))?;

        if let Some(message) = envelope.error_message() {
            return Err(ApiError::Rejected(message, url_text));
        }
        Ok(envelope.msg)
    }
}

// ---------------------------------------------------------------------------
// Payload decoding
// ---------------------------------------------------------------------------

/// Menus tolerate a non-list `msg` (the API answers "no data" that way).
fn decode_menu<T: DeserializeOwned>(msg: Value, url: &Url) -> ApiResult<Vec<T>> {
    if !msg.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(msg).map_err(|e| ApiError::Decode(e, url.to_string()))
}

/// Result sheets accept a list or nothing at all; anything else is an error.
fn decode_list<T: DeserializeOwned>(msg: Value, url: &Url) -> ApiResult<Vec<T>> {
    match msg {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(msg).map_err(|e| ApiError::Decode(e, url.to_string())),
        other => Err(ApiError::Other(format!("expected a list from {url}, got {other}"))),
    }
}

// ---------------------------------------------------------------------------
// URL and date helpers
// ---------------------------------------------------------------------------

/// `{base}{endpoint}[/{category}]` plus `displaydate` when a date is given.
///
/// The path is appended textually so that a proxy base of the form
/// `.../forward?url=https://host/root` keeps the target inside its `url` parameter.
pub fn build_api_url(
    base_url: &str,
    endpoint: &str,
    category: &str,
    date: Option<NaiveDate>,
) -> ApiResult<Url> {
    let category_path = if category.is_empty() {
        String::new()
    } else {
        format!("/{category}")
    };
    let raw = format!("{}{endpoint}{category_path}", base_url.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if let Some(date) = date {
        url.query_pairs_mut()
            .append_pair("displaydate", &date.format(API_DATE_FORMAT).to_string());
    }
    Ok(url)
}

/// Interpret a user- or API-supplied date.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and date-times (RFC 3339 or
/// `YYYY-MM-DD[ T]HH:MM:SS`); anything else falls back to `today`.
pub fn parse_display_date(input: &str, today: NaiveDate) -> NaiveDate {
    let input = input.trim();
    if input.is_empty() {
        return today;
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, API_DATE_FORMAT) {
        return date;
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%d/%m/%Y") {
        return date;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return dt.date_naive();
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return dt.date();
        }
    }
    today
}

/// Local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoundLabel;
    use mockito::Matcher;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn api_for(server: &mockito::ServerGuard) -> RaceApi {
        RaceApi::new(ApiConfig {
            base_url: server.url(),
            auth_token: "secret-token".into(),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn date_formats() {
        let today = day(2025, 6, 1);
        assert_eq!(parse_display_date("2025-03-01", today), day(2025, 3, 1));
        assert_eq!(parse_display_date("01/03/2025", today), day(2025, 3, 1));
        assert_eq!(parse_display_date("2025-03-01T10:30:00+11:00", today), day(2025, 3, 1));
        assert_eq!(parse_display_date("2025-03-01 18:00:00", today), day(2025, 3, 1));
        assert_eq!(parse_display_date("", today), today);
        assert_eq!(parse_display_date("next tuesday", today), today);
    }

    #[test]
    fn url_with_category_and_date() {
        let url = build_api_url(
            "https://api.example.com/thirdparty/",
            "/getAllResults/ladder",
            "SUPER_GAS",
            Some(day(2025, 3, 1)),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/thirdparty/getAllResults/ladder/SUPER_GAS?displaydate=2025-03-01"
        );
    }

    #[test]
    fn url_without_category_or_date() {
        let url = build_api_url("https://api.example.com/thirdparty", GET_DATES, "", None).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/thirdparty/getdates");
    }

    #[test]
    fn proxy_base_keeps_target_in_url_parameter() {
        let url = build_api_url(
            "http://localhost:3000/forward?url=https://api.example.com/thirdparty",
            "/getAllResults/results",
            "TOP_SPORTSMAN",
            Some(day(2025, 3, 1)),
        )
        .unwrap();
        let pairs: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(url.path(), "/forward");
        assert_eq!(
            pairs,
            vec![
                (
                    "url".to_string(),
                    "https://api.example.com/thirdparty/getAllResults/results/TOP_SPORTSMAN".to_string()
                ),
                ("displaydate".to_string(), "2025-03-01".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_base_is_reported() {
        let err = build_api_url("not a url", GET_DATES, "", None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn fetch_ladder_sends_token_and_builds_rounds() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/getAllResults/ladder/SUPER_GAS")
            .match_query(Matcher::UrlEncoded("displaydate".into(), "2025-03-01".into()))
            .match_header(AUTH_HEADER, "secret-token")
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":false,"msg":[
                    {"Round":"100","Category":"Super Gas","results":[{"driver_name":"A","et":"9.9"}]},
                    {"Round":"1","Category":"Super Gas","results":[
                        {"driver_name":"A","et":"9.9"},{"driver_name":"B","et":"10.1"},
                        {"driver_name":"C","et":"0"}
                    ]}
                ]}"#,
            )
            .create_async()
            .await;

        let rounds = api_for(&server).fetch_ladder("SUPER_GAS", day(2025, 3, 1)).await.unwrap();
        mock.assert_async().await;

        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].label, RoundLabel::Numeric(1));
        assert_eq!(rounds[0].matches.len(), 2);
        assert!(rounds[0].matches[1].player2.is_bye());
        assert_eq!(rounds[1].label, RoundLabel::Final);
        assert_eq!(rounds[1].matches[0].player2.name, "WINNER");
    }

    #[tokio::test]
    async fn malformed_ladder_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getAllResults/ladder/SUPER_GAS")
            .match_query(Matcher::Any)
            .with_body(r#"{"msg":[{"Category":"Super Gas","results":[]}]}"#)
            .create_async()
            .await;

        let err = api_for(&server).fetch_ladder("SUPER_GAS", day(2025, 3, 1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(MalformedInputError::MissingRound { index: 0 }, _)));
    }

    #[tokio::test]
    async fn error_envelope_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getdates")
            .with_body(r#"{"error":true,"msg":"Invalid token"}"#)
            .create_async()
            .await;

        let err = api_for(&server).fetch_dates().await.unwrap_err();
        assert!(matches!(&err, ApiError::Rejected(msg, _) if msg == "Invalid token"));
    }

    #[tokio::test]
    async fn http_failure_is_an_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getdates")
            .with_status(503)
            .create_async()
            .await;

        let err = api_for(&server).fetch_dates().await.unwrap_err();
        assert!(matches!(err, ApiError::Api(_, _)));
    }

    #[tokio::test]
    async fn menus_tolerate_non_list_payloads() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getcategories/qualifying")
            .match_query(Matcher::Any)
            .with_body(r#"{"error":false,"msg":"No categories"}"#)
            .create_async()
            .await;

        let categories = api_for(&server)
            .fetch_categories(View::Qualifying, day(2025, 3, 1))
            .await
            .unwrap();
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn categories_and_dates_decode() {
        let mut server = mockito::Server::new_async().await;
        let _cats = server
            .mock("GET", "/getcategories/ladder")
            .match_query(Matcher::UrlEncoded("displaydate".into(), "2025-03-01".into()))
            .with_body(r#"{"msg":[{"Category":"Super Gas","CategoryCode":"SUPER_GAS"}]}"#)
            .create_async()
            .await;
        let _dates = server
            .mock("GET", "/getdates")
            .with_body(r#"{"msg":[{"EventName":"Winternationals","RaceTime":"2025-03-01 09:00:00"}]}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let cats = api.fetch_categories(View::Ladder, day(2025, 3, 1)).await.unwrap();
        assert_eq!(cats, vec![CategoryEntry { label: "Super Gas".into(), code: "SUPER_GAS".into() }]);

        let dates = api.fetch_dates().await.unwrap();
        assert_eq!(dates[0].name, "Winternationals");
        assert_eq!(parse_display_date(&dates[0].race_time, day(2000, 1, 1)), day(2025, 3, 1));
    }

    #[tokio::test]
    async fn results_are_grouped_into_sessions() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getAllResults/results/SUPER_GAS")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"msg":[
                    {"rnd":2,"results":[{"name":"B","position":"2"},{"name":"A","position":"1"}]},
                    {"rnd":"1","results":[]}
                ]}"#,
            )
            .create_async()
            .await;

        let sessions = api_for(&server).fetch_results("SUPER_GAS", day(2025, 3, 1)).await.unwrap();
        let keys: Vec<&str> = sessions.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Q1", "Q2"]);
        assert_eq!(sessions[1].rows[0].name, "A");
    }

    #[tokio::test]
    async fn pairing_menu_and_sheet_use_their_own_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let cats = server
            .mock("GET", "/getcategories/pairings")
            .match_query(Matcher::UrlEncoded("displaydate".into(), "2025-03-01".into()))
            .with_body(r#"{"msg":[{"Category":"Super Gas","CategoryCode":"SUPER_GAS"}]}"#)
            .create_async()
            .await;
        let sheet = server
            .mock("GET", "/getAllResults/pairing/SUPER_GAS")
            .match_query(Matcher::UrlEncoded("displaydate".into(), "2025-03-01".into()))
            .match_header(AUTH_HEADER, "secret-token")
            .with_body(
                r#"{"error":false,"msg":[{"Category":"Super Gas","results":[
                    {"driver_name":"Ann","car_number":12,"et":"8.91","rt":"0.04","ladder_id":5,"pair_num":1,"position":"Left","lane_choice":"Yes"},
                    {"driver_name":"Bo","car_number":"7","et":"9.02","rt":"0.06","ladder_id":5,"pair_num":1,"position":"Right","lane_choice":"No"},
                    {"driver_name":"Cy","car_number":"3","position":"Left"}
                ]}]}"#,
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let categories = api.fetch_categories(View::Pairing, day(2025, 3, 1)).await.unwrap();
        assert_eq!(categories[0].code, "SUPER_GAS");

        let pairings = api.fetch_pairings("SUPER_GAS", day(2025, 3, 1)).await.unwrap();
        cats.assert_async().await;
        sheet.assert_async().await;

        assert_eq!(pairings.len(), 1);
        let pair = &pairings[0];
        assert_eq!(pair.label(), "1");
        assert_eq!((pair.left.driver_name.as_str(), pair.right.driver_name.as_str()), ("Ann", "Bo"));
        assert_eq!(pair.left.car_number, "12");
        assert_eq!(pair.left.lane_choice, "Yes");
        assert_eq!(pair.right.position, "Right");
        assert_eq!(pair.right.et, "9.02");
    }

    #[tokio::test]
    async fn empty_pairing_sheet() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getAllResults/pairing/SUPER_GAS")
            .match_query(Matcher::Any)
            .with_body(r#"{"error":false,"msg":""}"#)
            .create_async()
            .await;

        let pairings = api_for(&server).fetch_pairings("SUPER_GAS", day(2025, 3, 1)).await.unwrap();
        assert!(pairings.is_empty());
    }

    #[tokio::test]
    async fn object_payload_for_a_sheet_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/getAllResults/qualifying/SUPER_GAS")
            .match_query(Matcher::Any)
            .with_body(r#"{"msg":{"unexpected":true}}"#)
            .create_async()
            .await;

        let err = api_for(&server).fetch_qualifying("SUPER_GAS", day(2025, 3, 1)).await.unwrap_err();
        assert!(matches!(err, ApiError::Other(_)));
    }
}
