use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorMatchError {
    #[error("Input '{input}' not found at {path}")]
    InputNotFound { input: String, path: String },

    #[error("Input '{input}' could not be read: {message}")]
    InputReadError { input: String, message: String },

    #[error("Input '{input}' contains no records")]
    EmptyInput { input: String },

    #[error("Input '{input}' could not be parsed: {message}")]
    InputParseError { input: String, message: String },

    #[error("Input '{input}' is missing required column '{column}'")]
    MissingColumn { input: String, column: String },

    #[error("Input '{input}' has unsupported format '{extension}' (expected csv or json)")]
    UnsupportedFormat { input: String, extension: String },

    #[error("Record {index} of {dataset} is missing field '{field}'")]
    MissingField {
        dataset: String,
        index: usize,
        field: &'static str,
    },

    #[error("Failed to write output to {path}: {message}")]
    OutputWriteError { path: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Field,
    Output,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status used by the binaries for a failure of this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SensorMatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SensorMatchError::InputNotFound { .. }
            | SensorMatchError::InputReadError { .. }
            | SensorMatchError::EmptyInput { .. }
            | SensorMatchError::InputParseError { .. }
            | SensorMatchError::MissingColumn { .. }
            | SensorMatchError::UnsupportedFormat { .. } => ErrorCategory::Input,
            SensorMatchError::MissingField { .. } => ErrorCategory::Field,
            SensorMatchError::OutputWriteError { .. } => ErrorCategory::Output,
            SensorMatchError::InvalidConfigValueError { .. }
            | SensorMatchError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SensorMatchError::IoError(_)
            | SensorMatchError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Field => ErrorSeverity::Low,
            ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Load and configuration failures abort the run; everything else is
    /// reported and isolated to the step that raised it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::Field | ErrorCategory::Output
        )
    }

    /// Exit status for a run that stopped on this error. Never 0, even for
    /// severities that would not stop a run on their own.
    pub fn exit_code(&self) -> i32 {
        self.severity().exit_code().max(1)
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SensorMatchError::InputNotFound { path, .. } => {
                format!("Check that {} exists or pass a different path", path)
            }
            SensorMatchError::InputReadError { input, .. } => {
                format!("Check that {} is a readable file", input)
            }
            SensorMatchError::EmptyInput { .. } => {
                "Provide a file with a header and at least one record".to_string()
            }
            SensorMatchError::InputParseError { .. } => {
                "Make sure the file is valid CSV or JSON with numeric coordinates".to_string()
            }
            SensorMatchError::MissingColumn { column, .. } => {
                format!("Add a '{}' column (required: id, latitude, longitude)", column)
            }
            SensorMatchError::UnsupportedFormat { .. } => {
                "Rename the input with a .csv or .json extension".to_string()
            }
            SensorMatchError::MissingField { .. } => {
                "Fill in the empty cell; the comparison was skipped".to_string()
            }
            SensorMatchError::OutputWriteError { .. } => {
                "Check that the output directory is writable".to_string()
            }
            SensorMatchError::InvalidConfigValueError { .. }
            | SensorMatchError::ConfigValidationError { .. } => {
                "Review the command line flags or configuration file".to_string()
            }
            SensorMatchError::IoError(_) | SensorMatchError::SerializationError(_) => {
                "Re-run with --verbose and inspect the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not load input data: {}", self),
            ErrorCategory::Field => format!("Skipped a comparison: {}", self),
            ErrorCategory::Output => format!("Could not save results: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("An unexpected error occurred: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorMatchError>;
