pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    etl::{EtlEngine, RunReport},
    geo::haversine_meters,
    matcher::{match_sensors, Matcher, MATCH_THRESHOLD_M},
    pipeline::MatchPipeline,
    MatchPolicy, MatchResult, MatchValue, SensorRecord,
};
pub use utils::error::{Result, SensorMatchError};
