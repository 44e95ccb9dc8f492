pub mod dataset;
pub mod etl;
pub mod geo;
pub mod matcher;
pub mod pipeline;

pub use crate::domain::model::{
    MatchOutcome, MatchPolicy, MatchResult, MatchValue, SensorDatasets, SensorRecord,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
