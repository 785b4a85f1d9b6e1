/// Raw wire types for the event results API.
/// Endpoints live under `{base}/getAllResults/...`, `{base}/getcategories/...`
/// and `{base}/getdates`; every body is wrapped in `{ "error": bool, "msg": ... }`.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub error: bool,
    /// Payload on success, human-readable reason on failure.
    #[serde(default)]
    pub msg: Value,
}

impl ApiEnvelope {
    /// Server-side failure text, when the envelope flags one.
    pub fn error_message(&self) -> Option<String> {
        if !self.error {
            return None;
        }
        Some(match &self.msg {
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => "API returned an error".to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ladder  (/getAllResults/ladder/{category})
// ---------------------------------------------------------------------------

/// One elimination round as sent by the API.
///
/// `Round` and `results` stay untyped so that structural problems surface as
/// `MalformedInputError` from the bracket builder rather than as a decode error.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RoundRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(rename = "Round", default)]
    pub round: Option<Value>,
    #[serde(rename = "Category", default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(rename = "Positions", default, deserialize_with = "lenient_string")]
    pub positions: String,
    #[serde(rename = "Qualifying_Mode", default, deserialize_with = "lenient_string")]
    pub qualifying_mode: String,
    #[serde(default)]
    pub results: Option<Value>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ResultRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub driver_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub car_number: String,
    /// Elapsed time; `"0"` when no pass was recorded.
    #[serde(default, deserialize_with = "lenient_string")]
    pub et: String,
    /// Reaction time.
    #[serde(default, deserialize_with = "lenient_string")]
    pub rt: String,
    /// "Yes" | "No"
    #[serde(default, deserialize_with = "lenient_string")]
    pub lane_choice: String,
    /// "Left" | "Right"
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
}

// ---------------------------------------------------------------------------
// Menus  (/getcategories/{view}, /getdates)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct CategoryEntry {
    #[serde(rename = "Category", default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(rename = "CategoryCode", default, deserialize_with = "lenient_string")]
    pub code: String,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct EventDate {
    #[serde(rename = "EventName", default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Event start, usually `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "RaceTime", default, deserialize_with = "lenient_string")]
    pub race_time: String,
}

// ---------------------------------------------------------------------------
// Timing sessions  (/getAllResults/{qualifying,results}/{category})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SessionRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rnd: String,
    #[serde(rename = "Category", default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default)]
    pub results: Vec<TimingRecord>,
}

/// One timing slip. Every field is rendered verbatim, so all of them are text.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct TimingRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub main_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub car_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dial_in: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ft60: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ft330: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ft660: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mph660: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ft1000: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mph1000: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ft1320: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mph1320: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mov: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dov: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub win: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub flag: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "Position")]
    pub position: String,
}

// ---------------------------------------------------------------------------
// Pairings  (/getAllResults/pairing/{category})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PairingRecord {
    #[serde(rename = "Category", default, deserialize_with = "lenient_string")]
    pub category: String,
    /// Drivers in lane order: entries `2k` and `2k + 1` race each other.
    #[serde(default)]
    pub results: Vec<PairingEntry>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct PairingEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub driver_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub car_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub et: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ladder_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pair_num: String,
    /// "Left" | "Right"
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
    /// "Yes" | "No"
    #[serde(default, deserialize_with = "lenient_string")]
    pub lane_choice: String,
}

/// Accept strings, numbers, booleans and null for fields the UI treats as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(scalar_text).unwrap_or_default())
}

/// Text form of a scalar JSON value; arrays and objects collapse to "".
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_decode_as_text() {
        let raw: ResultRecord = serde_json::from_str(
            r#"{"driver_name":"Ann","car_number":42,"et":8.913,"rt":null,"lane_choice":"Yes"}"#,
        )
        .unwrap();
        assert_eq!(raw.car_number, "42");
        assert_eq!(raw.et, "8.913");
        assert_eq!(raw.rt, "");
        assert_eq!(raw.position, "");
    }

    #[test]
    fn round_record_keeps_untyped_round_and_results() {
        let raw: RoundRecord = serde_json::from_str(
            r#"{"Round":"2","Category":"Super Gas","Positions":16,"results":"oops"}"#,
        )
        .unwrap();
        assert_eq!(raw.round, Some(Value::String("2".into())));
        assert_eq!(raw.positions, "16");
        assert_eq!(raw.results, Some(Value::String("oops".into())));
    }

    #[test]
    fn error_envelope_surfaces_message() {
        let env: ApiEnvelope = serde_json::from_str(r#"{"error":true,"msg":"bad token"}"#).unwrap();
        assert_eq!(env.error_message().as_deref(), Some("bad token"));

        let env: ApiEnvelope = serde_json::from_str(r#"{"error":true}"#).unwrap();
        assert_eq!(env.error_message().as_deref(), Some("API returned an error"));

        let env: ApiEnvelope = serde_json::from_str(r#"{"msg":[]}"#).unwrap();
        assert!(env.error_message().is_none());
    }

    #[test]
    fn pairing_record_decodes_numeric_ids() {
        let raw: PairingRecord = serde_json::from_str(
            r#"{"Category":"Super Gas","results":[
                {"driver_name":"Ann","car_number":12,"ladder_id":88,"pair_num":1,"position":"Left","lane_choice":"Yes"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(raw.category, "Super Gas");
        assert_eq!(raw.results[0].ladder_id, "88");
        assert_eq!(raw.results[0].pair_num, "1");
        assert_eq!(raw.results[0].et, "");
    }

    #[test]
    fn timing_record_accepts_capitalised_position() {
        let raw: TimingRecord =
            serde_json::from_str(r#"{"name":"Bo","Position":"3","win":1}"#).unwrap();
        assert_eq!(raw.position, "3");
        assert_eq!(raw.win, "1");
    }
}
