use crate::args::CliArgs;
use chrono::NaiveDate;
use dragrace_api::client::{ApiConfig, parse_display_date, today};
use log::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub api: ApiConfig,
    /// Category code to select once a category menu arrives.
    pub preferred_category: Option<String>,
    pub start_date: NaiveDate,
}

impl AppSettings {
    /// API settings from the environment, the rest from parsed arguments.
    pub fn load(cli: &CliArgs) -> Self {
        Self::from_parts(ApiConfig::from_env(), cli, today())
    }

    fn from_parts(api: ApiConfig, cli: &CliArgs, today: NaiveDate) -> Self {
        let preferred_category = cli
            .category
            .as_deref()
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());
        let start_date = cli
            .date
            .as_deref()
            .map_or(today, |d| parse_display_date(d, today));
        let log_level = cli
            .log_level
            .as_deref()
            .and_then(|level| level.trim().parse::<LevelFilter>().ok());

        Self { full_screen: false, log_level, api, preferred_category, start_date }
    }
}
