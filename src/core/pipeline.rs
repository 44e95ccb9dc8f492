use crate::core::dataset::{self, InputFormat};
use crate::core::matcher::Matcher;
use crate::core::{ConfigProvider, MatchOutcome, Pipeline, SensorDatasets, SensorRecord, Storage};
use crate::utils::error::{Result, SensorMatchError};

/// Loads both sensor files through `Storage`, matches them, and writes the
/// result as JSON next to them.
pub struct MatchPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> MatchPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    async fn load_input(&self, path: &str) -> Result<Vec<SensorRecord>> {
        let format = InputFormat::from_path(path)?;

        tracing::debug!("Reading {:?} input from {}", format, path);
        let bytes = match self.storage.read_file(path).await {
            Ok(bytes) => bytes,
            Err(SensorMatchError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SensorMatchError::InputNotFound {
                    input: path.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) => {
                return Err(SensorMatchError::InputReadError {
                    input: path.to_string(),
                    message: e.to_string(),
                })
            }
        };

        dataset::decode(path, format, &bytes)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MatchPipeline<S, C> {
    async fn extract(&self) -> Result<SensorDatasets> {
        let sensor_one = self.load_input(self.config.sensor_one_path()).await?;
        let sensor_two = self.load_input(self.config.sensor_two_path()).await?;

        let data = SensorDatasets::new(sensor_one, sensor_two);
        tracing::info!(
            "Loaded {} records ({} from {}, {} from {})",
            data.len(),
            data.sensor_one.len(),
            self.config.sensor_one_path(),
            data.sensor_two.len(),
            self.config.sensor_two_path()
        );

        Ok(data)
    }

    async fn transform(&self, data: SensorDatasets) -> Result<MatchOutcome> {
        let matcher = Matcher::new(self.config.match_policy());
        let outcome = matcher.run(&data.sensor_one, &data.sensor_two);

        if !outcome.skipped.is_empty() {
            tracing::warn!(
                "{} comparisons skipped because of missing fields",
                outcome.skipped.len()
            );
        }
        tracing::info!(
            "Matched {} of {} sensor-one records ({} comparisons, {})",
            outcome.matched_records,
            data.sensor_one.len(),
            outcome.comparisons,
            matcher.policy()
        );

        Ok(outcome)
    }

    async fn load(&self, outcome: &MatchOutcome) -> Result<String> {
        let output_file = self.config.output_file();
        let json = outcome.result.to_json(self.config.pretty_output())?;

        tracing::debug!("Writing {} bytes to {}", json.len(), output_file);
        self.storage
            .write_file(output_file, json.as_bytes())
            .await
            .map_err(|e| SensorMatchError::OutputWriteError {
                path: output_file.to_string(),
                message: e.to_string(),
            })?;

        Ok(output_file.to_string())
    }
}
