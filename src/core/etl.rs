use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 依序執行 extract → transform → load，回傳輸出路徑
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting handicap run...");
        self.monitor.log_stats("Start");

        // Extract
        let batch = self.pipeline.extract().await?;
        if batch.is_mock {
            tracing::warn!("⚠️ Using sample rounds, results are marked as mock");
        }
        self.monitor.log_stats("Extract");

        // Transform
        let report = self.pipeline.transform(batch).await?;
        tracing::info!(
            "Calculated {} handicaps ({} rounds skipped)",
            report.players.len(),
            report.rounds_skipped
        );
        self.monitor.log_stats("Transform");

        // Load
        let output_path = self.pipeline.load(report).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HandicapReport, RoundBatch};
    use crate::domain::handicap::calculate_for_rounds;
    use crate::domain::model::PlayerHandicap;
    use crate::core::pipeline::sample_rounds;
    use std::sync::Mutex;

    struct RecordingPipeline {
        loaded: Mutex<Option<HandicapReport>>,
    }

    #[async_trait::async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<RoundBatch> {
            Ok(RoundBatch {
                rounds: sample_rounds("5"),
                is_mock: false,
            })
        }

        async fn transform(&self, batch: RoundBatch) -> Result<HandicapReport> {
            let result = calculate_for_rounds(&batch.rounds)?;
            Ok(HandicapReport {
                players: vec![PlayerHandicap {
                    player_id: batch.rounds[0].player_id.clone(),
                    avg_differential: result.avg_differential,
                    handicap_index: result.handicap_index,
                    rounds_used: result.rounds_used,
                    rounds_considered: batch.rounds.len(),
                    latest_play_date: None,
                    is_mock: batch.is_mock,
                }],
                rounds_extracted: batch.rounds.len(),
                rounds_skipped: 0,
                generated_at: chrono::Utc::now(),
            })
        }

        async fn load(&self, report: HandicapReport) -> Result<String> {
            if let Ok(mut loaded) = self.loaded.lock() {
                *loaded = Some(report);
            }
            Ok("memory".to_string())
        }
    }

    #[test]
    fn test_engine_runs_all_phases() {
        let engine = EtlEngine::new(RecordingPipeline {
            loaded: Mutex::new(None),
        });

        let output = tokio_test::block_on(engine.run()).unwrap();
        assert_eq!(output, "memory");

        let loaded = engine.pipeline().loaded.lock().unwrap();
        let report = loaded.as_ref().unwrap();
        assert_eq!(report.players[0].rounds_used, 8);
        assert_eq!(report.players[0].handicap_index, 8.0);
    }
}
