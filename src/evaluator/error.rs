use std::fmt::{Display, Formatter};

use super::metric::Input;
use super::sample::SampledValue;

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatorError {
    /// A required binding or parameter is missing or malformed.
    Configuration(String),
    /// Refresh was attempted without a valid configuration.
    NotConfigured,
}

impl Display for EvaluatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluatorError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            EvaluatorError::NotConfigured => write!(f, "Evaluator has no valid configuration, configure it before refreshing"),
        }
    }
}

impl std::error::Error for EvaluatorError {}

/// A source that could not be read this cycle and was counted as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedInput {
    input: Input,
    source_key: String,
    sample: SampledValue,
}

impl DegradedInput {
    pub fn new(input: Input, source_key: String, sample: SampledValue) -> Self {
        Self {
            input,
            source_key,
            sample,
        }
    }

    pub fn get_input(&self) -> Input {
        self.input
    }
}

impl Display for DegradedInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) is {}, using 0", self.input, self.source_key, self.sample)
    }
}
