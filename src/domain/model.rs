use crate::domain::handicap::score_differential;
use crate::utils::error::{HandicapError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 球員識別碼，來源可能是整數或字串，一律以字串保存
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawPlayerId")]
pub struct PlayerId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlayerId {
    Int(i64),
    Text(String),
}

impl From<RawPlayerId> for PlayerId {
    fn from(raw: RawPlayerId) -> Self {
        match raw {
            RawPlayerId::Int(id) => PlayerId(id.to_string()),
            RawPlayerId::Text(id) => PlayerId(id.trim().to_string()),
        }
    }
}

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 差點差值：資料庫的 numeric 欄位經 JSON 傳出時可能是數字，也可能是字串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Differential {
    Numeric(f64),
    NumericString(String),
}

impl Differential {
    /// 轉為浮點數；非數字或非有限值直接拒絕，不讓 NaN 流進計算
    pub fn value(&self) -> Result<f64> {
        let parsed = match self {
            Differential::Numeric(value) => Some(*value),
            Differential::NumericString(raw) => raw.trim().parse::<f64>().ok(),
        };

        match parsed {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(HandicapError::InvalidDifferential {
                value: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Differential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Differential::Numeric(value) => write!(f, "{}", value),
            Differential::NumericString(raw) => f.write_str(raw),
        }
    }
}

impl From<f64> for Differential {
    fn from(value: f64) -> Self {
        Differential::Numeric(value)
    }
}

impl From<&str> for Differential {
    fn from(value: &str) -> Self {
        Differential::NumericString(value.to_string())
    }
}

/// 一張記分卡（一輪）
///
/// 反序列化經過 [`RawRound`]：`differential` 與 `g_differential` 可同時出現，
/// 差值為 null 時若有總桿、球場難度與坡度則在此換算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRound")]
pub struct Round {
    pub player_id: PlayerId,
    pub play_date: NaiveDate,
    pub differential: Option<Differential>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slope_rating: Option<f64>,
}

impl Round {
    pub fn new(
        player_id: impl Into<String>,
        play_date: NaiveDate,
        differential: Option<Differential>,
        status: Option<&str>,
    ) -> Self {
        Self {
            player_id: PlayerId::new(player_id),
            play_date,
            differential,
            status: status.map(str::to_string),
            gross: None,
            course_rating: None,
            slope_rating: None,
        }
    }
}

/// 總桿、難度、坡度等欄位，和差值一樣可能以字串傳來
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn value(&self, field: &str) -> Result<f64> {
        let parsed = match self {
            RawNumber::Number(value) => Some(*value),
            RawNumber::Text(raw) => raw.trim().parse::<f64>().ok(),
        };

        match parsed {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(HandicapError::InvalidScore {
                message: format!("{} is not a number: '{}'", field, self.raw()),
            }),
        }
    }

    fn raw(&self) -> String {
        match self {
            RawNumber::Number(value) => value.to_string(),
            RawNumber::Text(raw) => raw.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRound {
    player_id: PlayerId,
    #[serde(deserialize_with = "deserialize_play_date")]
    play_date: NaiveDate,
    #[serde(default)]
    differential: Option<Differential>,
    #[serde(default)]
    g_differential: Option<Differential>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tarj: Option<String>,
    #[serde(default)]
    gross: Option<RawNumber>,
    #[serde(default)]
    course_rating: Option<RawNumber>,
    #[serde(default)]
    slope_rating: Option<RawNumber>,
}

impl TryFrom<RawRound> for Round {
    type Error = HandicapError;

    fn try_from(raw: RawRound) -> Result<Self> {
        let number = |value: &Option<RawNumber>, field: &str| -> Result<Option<f64>> {
            value.as_ref().map(|v| v.value(field)).transpose()
        };
        let gross = number(&raw.gross, "gross")?;
        let course_rating = number(&raw.course_rating, "course_rating")?;
        let slope_rating = number(&raw.slope_rating, "slope_rating")?;

        // 兩種欄位名稱都給時以資料庫欄位 g_differential 為準
        let differential = match raw.g_differential.or(raw.differential) {
            Some(differential) => Some(differential),
            None => match (gross, course_rating, slope_rating) {
                (Some(gross), Some(course_rating), Some(slope_rating)) => Some(Differential::Numeric(
                    score_differential(gross, course_rating, slope_rating)?,
                )),
                _ => None,
            },
        };

        Ok(Round {
            player_id: raw.player_id,
            play_date: raw.play_date,
            differential,
            status: raw.tarj.or(raw.status),
            gross,
            course_rating,
            slope_rating,
        })
    }
}

/// CSV 匯出檔的一列；所有欄位都以原始文字讀取，避免 `007` 被當成整數 7
#[derive(Debug, Deserialize)]
pub struct CsvRound {
    player_id: String,
    play_date: String,
    #[serde(default)]
    differential: Option<String>,
    #[serde(default)]
    g_differential: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tarj: Option<String>,
    #[serde(default)]
    gross: Option<String>,
    #[serde(default)]
    course_rating: Option<String>,
    #[serde(default)]
    slope_rating: Option<String>,
}

impl TryFrom<CsvRound> for Round {
    type Error = HandicapError;

    fn try_from(row: CsvRound) -> Result<Self> {
        let play_date = parse_play_date(&row.play_date)
            .map_err(|message| HandicapError::ProcessingError { message })?;

        Round::try_from(RawRound {
            player_id: PlayerId::new(row.player_id),
            play_date,
            differential: row.differential.map(Differential::NumericString),
            g_differential: row.g_differential.map(Differential::NumericString),
            status: row.status,
            tarj: row.tarj,
            gross: row.gross.map(RawNumber::Text),
            course_rating: row.course_rating.map(RawNumber::Text),
            slope_rating: row.slope_rating.map(RawNumber::Text),
        })
    }
}

/// 接受 `2024-05-01` 或 RFC 3339 時間戳（只取日期部分）
fn deserialize_play_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_play_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_play_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| format!("invalid play_date '{}', expected YYYY-MM-DD or RFC 3339", raw))
}

/// 抽取階段的輸出；`is_mock` 表示資料來源失敗後改用範例資料
#[derive(Debug, Clone, Default)]
pub struct RoundBatch {
    pub rounds: Vec<Round>,
    pub is_mock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandicapResult {
    pub avg_differential: f64,
    pub handicap_index: f64,
    pub rounds_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerHandicap {
    pub player_id: PlayerId,
    pub avg_differential: f64,
    pub handicap_index: f64,
    pub rounds_used: usize,
    pub rounds_considered: usize,
    pub latest_play_date: Option<NaiveDate>,
    pub is_mock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandicapReport {
    pub players: Vec<PlayerHandicap>,
    pub rounds_extracted: usize,
    pub rounds_skipped: usize,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_differential_matches_numeric() {
        let from_string = Differential::from("12.3").value().unwrap();
        let from_number = Differential::from(12.3).value().unwrap();
        assert_eq!(from_string, from_number);

        assert_eq!(Differential::from("  -1.5 ").value().unwrap(), -1.5);
    }

    #[test]
    fn test_non_numeric_differential_is_rejected() {
        for raw in ["abc", "", "NaN", "inf", "12,3"] {
            let err = Differential::from(raw).value().unwrap_err();
            assert!(matches!(err, HandicapError::InvalidDifferential { .. }), "{}", raw);
        }
        assert!(Differential::from(f64::NAN).value().is_err());
    }

    #[test]
    fn test_round_from_api_json() {
        let json = serde_json::json!({
            "id": 41,
            "player_id": 7,
            "play_date": "2024-05-01T00:00:00.000Z",
            "g_differential": "9.4",
            "tarj": "OK",
            "gross": 84
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.player_id.as_str(), "7");
        assert_eq!(round.play_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(round.differential.unwrap().value().unwrap(), 9.4);
        assert_eq!(round.status.as_deref(), Some("OK"));
    }

    #[test]
    fn test_round_with_null_differential() {
        let json = serde_json::json!({
            "player_id": "ana",
            "play_date": "2024-05-01",
            "differential": null
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert!(round.differential.is_none());
        assert!(round.status.is_none());
    }

    #[test]
    fn test_invalid_play_date() {
        assert!(parse_play_date("01/05/2024").is_err());
        assert_eq!(
            parse_play_date("2024-05-01T23:30:00-03:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_zero_padded_player_id_is_kept() {
        let json = serde_json::json!({
            "player_id": "007",
            "play_date": "2024-05-01",
            "differential": 9.4
        });
        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.player_id.as_str(), "007");
    }

    #[test]
    fn test_g_differential_wins_when_both_columns_present() {
        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "differential": "12.0",
            "g_differential": "9.4",
            "status": "pending",
            "tarj": "OK"
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.differential.unwrap().value().unwrap(), 9.4);
        assert_eq!(round.status.as_deref(), Some("OK"));

        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "differential": "12.0",
            "g_differential": null
        });
        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.differential.unwrap().value().unwrap(), 12.0);
    }

    #[test]
    fn test_differential_computed_from_score() {
        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "g_differential": null,
            "gross": 85,
            "course_rating": "72.0",
            "slope_rating": 113
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.differential.unwrap().value().unwrap(), 13.0);
        assert_eq!(round.gross, Some(85.0));
    }

    #[test]
    fn test_stored_differential_is_not_recomputed() {
        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "differential": 9.4,
            "gross": 85,
            "course_rating": 72.0,
            "slope_rating": 113
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert_eq!(round.differential.unwrap().value().unwrap(), 9.4);
    }

    #[test]
    fn test_partial_score_leaves_differential_empty() {
        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "gross": 85,
            "course_rating": 72.0
        });

        let round: Round = serde_json::from_value(json).unwrap();
        assert!(round.differential.is_none());
    }

    #[test]
    fn test_zero_slope_is_rejected() {
        let json = serde_json::json!({
            "player_id": 7,
            "play_date": "2024-05-01",
            "gross": 85,
            "course_rating": 72.0,
            "slope_rating": 0
        });

        let err = serde_json::from_value::<Round>(json).unwrap_err();
        assert!(err.to_string().contains("slope_rating"));
    }

    #[test]
    fn test_csv_row_keeps_text_fields() {
        let data = "player_id,play_date,differential,g_differential,status,tarj,gross,course_rating,slope_rating\n\
                    007,2024-05-01,12.0,9.4,,OK,,,\n\
                    0042,2024-05-02,,,OK,,90,71.5,130\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());

        let rounds = reader
            .deserialize::<CsvRound>()
            .map(|row| Round::try_from(row.unwrap()).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(rounds[0].player_id.as_str(), "007");
        assert_eq!(rounds[0].differential.as_ref().unwrap().value().unwrap(), 9.4);
        assert_eq!(rounds[0].status.as_deref(), Some("OK"));

        assert_eq!(rounds[1].player_id.as_str(), "0042");
        let computed = rounds[1].differential.as_ref().unwrap().value().unwrap();
        assert!((computed - 16.080769230769231).abs() < 1e-9);
    }

    #[test]
    fn test_csv_row_with_zero_slope_fails() {
        let data = "player_id,play_date,gross,course_rating,slope_rating\n7,2024-05-01,85,72,0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let row = reader.deserialize::<CsvRound>().next().unwrap().unwrap();

        let err = Round::try_from(row).unwrap_err();
        assert!(matches!(err, HandicapError::InvalidScore { .. }));
    }
}
