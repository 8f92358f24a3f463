use crate::core::{ConfigProvider, Pipeline, RoundSource, Storage};
use crate::domain::handicap::calculate_for_rounds;
use crate::domain::model::{CsvRound, HandicapReport, PlayerHandicap, Round, RoundBatch};
use crate::domain::selection::group_by_player;
use crate::utils::error::{HandicapError, Result};
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_CSV: &str = "handicaps.csv";
pub const REPORT_JSON: &str = "handicaps.json";

const SAMPLE_PLAYER: &str = "sample";

pub struct HandicapPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> HandicapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    async fn fetch_rounds(&self, source: &RoundSource) -> Result<Vec<Round>> {
        match source {
            RoundSource::Api {
                endpoint,
                headers,
                parameters,
                timeout_seconds,
            } => {
                self.fetch_api(endpoint, headers, parameters, *timeout_seconds)
                    .await
            }
            RoundSource::File { path } => self.read_export(path).await,
        }
    }

    async fn fetch_api(
        &self,
        endpoint: &str,
        headers: &HashMap<String, String>,
        parameters: &HashMap<String, String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Vec<Round>> {
        let mut request = self.client.get(endpoint);

        for (key, value) in headers {
            request = request.header(key, value);
        }
        if !parameters.is_empty() {
            request = request.query(parameters);
        }
        if let Some(timeout) = timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        tracing::debug!("Making API request to: {}", endpoint);
        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(HandicapError::ApiStatus {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let json_data: serde_json::Value = response.json().await?;
        parse_rounds_json(json_data)
    }

    async fn read_export(&self, path: &str) -> Result<Vec<Round>> {
        let data = self.storage.read_file(path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), path);

        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => parse_rounds_csv(&data),
            Some("json") => parse_rounds_json(serde_json::from_slice(&data)?),
            _ => Err(HandicapError::ProcessingError {
                message: format!("Cannot tell the format of '{}', expected .csv or .json", path),
            }),
        }
    }

    fn keep_requested_player(&self, rounds: Vec<Round>) -> Vec<Round> {
        match self.config.player_filter() {
            Some(player) => rounds
                .into_iter()
                .filter(|round| round.player_id.as_str() == player)
                .collect(),
            None => rounds,
        }
    }

    fn render_csv(report: &HandicapReport) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "player_id",
            "avg_differential",
            "handicap_index",
            "rounds_used",
            "rounds_considered",
            "latest_play_date",
            "is_mock",
        ])?;

        for player in &report.players {
            writer.write_record([
                player.player_id.to_string(),
                player.avg_differential.to_string(),
                format!("{:.1}", player.handicap_index),
                player.rounds_used.to_string(),
                player.rounds_considered.to_string(),
                player
                    .latest_play_date
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
                player.is_mock.to_string(),
            ])?;
        }

        writer.into_inner().map_err(|e| HandicapError::IoError(e.into_error()))
    }

    fn render_files(&self, report: &HandicapReport) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            match format.as_str() {
                "csv" => files.push((REPORT_CSV, Self::render_csv(report)?)),
                "json" => files.push((REPORT_JSON, serde_json::to_vec_pretty(report)?)),
                other => {
                    return Err(HandicapError::InvalidConfigValueError {
                        field: "output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format. Valid formats: csv, json".to_string(),
                    })
                }
            }
        }
        Ok(files)
    }
}

/// 接受輪次陣列，或把陣列放在 `rounds` / `data` 欄位的物件
pub fn parse_rounds_json(value: serde_json::Value) -> Result<Vec<Round>> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => {
            match obj.remove("rounds").or_else(|| obj.remove("data")) {
                Some(serde_json::Value::Array(items)) => items,
                _ => {
                    return Err(HandicapError::ProcessingError {
                        message: "JSON object has no 'rounds' or 'data' array".to_string(),
                    })
                }
            }
        }
        other => {
            return Err(HandicapError::ProcessingError {
                message: format!("Expected an array of rounds, got: {}", other),
            })
        }
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(HandicapError::from))
        .collect()
}

/// CSV 匯出檔需有標題列，欄位名稱可用 `g_differential`、`tarj`；
/// 每列先以文字讀入 [`CsvRound`]，再轉成 [`Round`]
pub fn parse_rounds_csv(data: &[u8]) -> Result<Vec<Round>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    reader
        .deserialize::<CsvRound>()
        .map(|row| Round::try_from(row?))
        .collect()
}

/// 資料來源失敗時的範例輪次，最佳 8 輪平均為 8.3
pub fn sample_rounds(player: &str) -> Vec<Round> {
    let differentials = [9.0, 8.3, 12.6, 7.2, 8.5, 11.2, 8.0, 8.9, 8.1, 8.4];
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap_or_default();

    differentials
        .iter()
        .enumerate()
        .map(|(i, differential)| {
            Round::new(
                player,
                first_day + Duration::weeks(i as i64),
                Some((*differential).into()),
                Some("OK"),
            )
        })
        .collect()
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HandicapPipeline<S, C> {
    async fn extract(&self) -> Result<RoundBatch> {
        let source = self.config.source();
        tracing::info!("🚀 Extracting rounds from: {}", source.describe());

        let batch = match self.fetch_rounds(&source).await {
            Ok(rounds) => RoundBatch {
                rounds,
                is_mock: false,
            },
            Err(e) if self.config.use_sample_on_failure() => {
                tracing::warn!("📝 Source unavailable ({}), using sample rounds", e);
                let player = self.config.player_filter().unwrap_or(SAMPLE_PLAYER);
                RoundBatch {
                    rounds: sample_rounds(player),
                    is_mock: true,
                }
            }
            Err(e) => return Err(e),
        };

        let rounds = self.keep_requested_player(batch.rounds);
        tracing::info!("📊 Extracted {} rounds", rounds.len());

        Ok(RoundBatch {
            rounds,
            is_mock: batch.is_mock,
        })
    }

    async fn transform(&self, batch: RoundBatch) -> Result<HandicapReport> {
        let rules = self.config.selection();
        let rounds_extracted = batch.rounds.len();
        tracing::info!("🔧 Calculating handicaps from {} rounds", rounds_extracted);

        let mut players = Vec::new();
        let mut rounds_considered_total = 0;

        for (player_id, rounds) in group_by_player(batch.rounds) {
            let selected = rules.select_for_player(&rounds, &player_id);
            rounds_considered_total += selected.len();

            if selected.is_empty() {
                tracing::warn!("⚠️ Player {} has no qualifying rounds", player_id);
            }

            let result = calculate_for_rounds(selected.iter().copied()).map_err(|e| {
                tracing::error!("❌ Player {}: {}", player_id, e);
                e
            })?;

            tracing::debug!(
                "Player {}: avg {:.4}, index {:.1}, {} of {} rounds used",
                player_id,
                result.avg_differential,
                result.handicap_index,
                result.rounds_used,
                selected.len()
            );

            players.push(PlayerHandicap {
                latest_play_date: selected.first().map(|round| round.play_date),
                rounds_considered: selected.len(),
                player_id,
                avg_differential: result.avg_differential,
                handicap_index: result.handicap_index,
                rounds_used: result.rounds_used,
                is_mock: batch.is_mock,
            });
        }

        tracing::info!("✅ Calculated handicaps for {} players", players.len());
        Ok(HandicapReport {
            players,
            rounds_extracted,
            rounds_skipped: rounds_extracted - rounds_considered_total,
            generated_at: Utc::now(),
        })
    }

    async fn load(&self, report: HandicapReport) -> Result<String> {
        let files = self.render_files(&report)?;
        let output_path = self.config.output_path();

        if let Some(bundle) = self.config.bundle_filename() {
            tracing::debug!("Creating ZIP bundle with {} files", files.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file::<_, ()>(*name, FileOptions::default())?;
                    zip.write_all(data)?;
                }
                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(bundle, &zip_data).await?;

            let bundle_path = format!("{}/{}", output_path, bundle);
            tracing::info!("📦 Report bundle saved: {}", bundle_path);
            return Ok(bundle_path);
        }

        let mut written = Vec::new();
        for (name, data) in &files {
            self.storage.write_file(name, data).await?;
            written.push(format!("{}/{}", output_path, name));
        }

        tracing::info!("💾 Report saved: {}", written.join(", "));
        written
            .into_iter()
            .next()
            .ok_or_else(|| HandicapError::ConfigError {
                message: "No output format configured".to_string(),
            })
    }
}
