use crate::core::{MatchOutcome, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// What a finished run produced. A failed write does not fail the run; it is
/// carried in `output` for the caller to report.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: MatchOutcome,
    pub output: Result<String>,
}

impl RunReport {
    pub fn output_path(&self) -> Option<&str> {
        self.output.as_deref().ok()
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor_enabled: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor_enabled,
        }
    }

    /// Runs load, match and write in order. Load and match failures abort the
    /// run; a write failure is logged and returned inside the report.
    pub async fn run(&self) -> Result<RunReport> {
        let mut monitor = RunMonitor::new(self.monitor_enabled);
        tracing::info!("Starting sensor matching run");

        monitor.begin_stage();
        let datasets = self.pipeline.extract().await.map_err(|e| {
            tracing::error!("Loading input failed: {}", e);
            e
        })?;
        monitor.end_stage("load");

        monitor.begin_stage();
        let outcome = self.pipeline.transform(datasets).await.map_err(|e| {
            tracing::error!("Matching failed: {}", e);
            e
        })?;
        monitor.end_stage("match");

        monitor.begin_stage();
        let output = self.pipeline.load(&outcome).await;
        monitor.end_stage("write");

        match &output {
            Ok(path) => tracing::info!("Wrote {} matches to {}", outcome.result.len(), path),
            Err(e) => {
                tracing::error!("Writing output failed: {}", e);
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            }
        }

        monitor.log_final_stats();
        Ok(RunReport { outcome, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SensorDatasets, SensorRecord};
    use crate::core::matcher::Matcher;
    use crate::utils::error::SensorMatchError;
    use async_trait::async_trait;

    struct StaticPipeline {
        fail_extract: bool,
        fail_load: bool,
    }

    #[async_trait]
    impl Pipeline for StaticPipeline {
        async fn extract(&self) -> Result<SensorDatasets> {
            if self.fail_extract {
                return Err(SensorMatchError::EmptyInput {
                    input: "SensorData1.csv".to_string(),
                });
            }
            Ok(SensorDatasets::new(
                vec![SensorRecord::new(1, 0.0, 0.0)],
                vec![SensorRecord::new(10, 0.0, 0.0)],
            ))
        }

        async fn transform(&self, data: SensorDatasets) -> Result<MatchOutcome> {
            Ok(Matcher::default().run(&data.sensor_one, &data.sensor_two))
        }

        async fn load(&self, _outcome: &MatchOutcome) -> Result<String> {
            if self.fail_load {
                return Err(SensorMatchError::OutputWriteError {
                    path: "Output.json".to_string(),
                    message: "disk full".to_string(),
                });
            }
            Ok("Output.json".to_string())
        }
    }

    #[test]
    fn test_run_reports_output_path() {
        let engine = EtlEngine::new(StaticPipeline {
            fail_extract: false,
            fail_load: false,
        });
        let report = tokio_test::block_on(engine.run()).unwrap();
        assert_eq!(report.output_path(), Some("Output.json"));
        assert_eq!(report.outcome.result.len(), 1);
    }

    #[test]
    fn test_input_error_aborts_run() {
        let engine = EtlEngine::new(StaticPipeline {
            fail_extract: true,
            fail_load: false,
        });
        let err = tokio_test::block_on(engine.run()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_error_keeps_run_alive() {
        let engine = EtlEngine::new_with_monitoring(
            StaticPipeline {
                fail_extract: false,
                fail_load: true,
            },
            true,
        );
        let report = tokio_test::block_on(engine.run()).unwrap();
        assert!(report.output_path().is_none());
        assert!(matches!(
            report.output,
            Err(SensorMatchError::OutputWriteError { .. })
        ));
        assert_eq!(report.outcome.result.len(), 1);
    }
}
