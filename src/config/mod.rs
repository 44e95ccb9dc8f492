pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::core::{ConfigProvider, MatchPolicy};
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "sensor-match")]
    #[command(about = "Match records of two sensor datasets that lie within 100 m of each other")]
    pub struct CliConfig {
        #[arg(long, default_value = ".", help = "Directory the input and output paths are relative to")]
        pub data_dir: String,

        #[arg(long, default_value = "SensorData1.csv")]
        pub sensor_one: String,

        #[arg(long, default_value = "SensorData2.json")]
        pub sensor_two: String,

        #[arg(long, default_value = "Output.json")]
        pub output: String,

        #[arg(long, value_enum, default_value_t = MatchPolicy::FirstMatch)]
        pub policy: MatchPolicy,

        #[arg(long, help = "Pretty-print the output JSON")]
        pub pretty: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log stage timings and memory usage")]
        pub monitor: bool,
    }

    impl ConfigProvider for CliConfig {
        fn sensor_one_path(&self) -> &str {
            &self.sensor_one
        }

        fn sensor_two_path(&self) -> &str {
            &self.sensor_two
        }

        fn output_file(&self) -> &str {
            &self.output
        }

        fn match_policy(&self) -> MatchPolicy {
            self.policy
        }

        fn pretty_output(&self) -> bool {
            self.pretty
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("data_dir", &self.data_dir)?;
            validation::validate_path("sensor_one", &self.sensor_one)?;
            validation::validate_path("sensor_two", &self.sensor_two)?;
            validation::validate_path("output", &self.output)?;
            validation::validate_file_extension("sensor_one", &self.sensor_one, &["csv", "json"])?;
            validation::validate_file_extension("sensor_two", &self.sensor_two, &["csv", "json"])?;
            validation::validate_file_extension("output", &self.output, &["json"])?;
            validation::validate_output_distinct(
                &self.output,
                &[self.sensor_one.as_str(), self.sensor_two.as_str()],
            )
        }
    }

}
