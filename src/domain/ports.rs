use crate::domain::model::{MatchOutcome, MatchPolicy, SensorDatasets};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn sensor_one_path(&self) -> &str;
    fn sensor_two_path(&self) -> &str;
    fn output_file(&self) -> &str;
    fn match_policy(&self) -> MatchPolicy;
    fn pretty_output(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SensorDatasets>;
    async fn transform(&self, data: SensorDatasets) -> Result<MatchOutcome>;
    async fn load(&self, outcome: &MatchOutcome) -> Result<String>;
}
