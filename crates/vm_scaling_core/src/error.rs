use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A failed call against a cloud provider API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct CloudError {
    pub operation: String,
    pub message: String,
}

impl CloudError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(operation: impl Into<String>, field: &str) -> Self {
        Self::new(operation, format!("response did not include {field}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("load generator request to {endpoint} failed: {message}")]
pub struct LoadGeneratorError {
    pub endpoint: String,
    pub message: String,
}

impl LoadGeneratorError {
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScalingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error("no default VPC found")]
    NoDefaultVpc,
    #[error("application load balancer needs at least 2 subnets, found {found}")]
    InsufficientSubnets { found: usize },
    #[error("instance {instance_id} not ready after {attempts} attempts (last state: {last_state})")]
    InstanceNotReady {
        instance_id: String,
        attempts: u32,
        last_state: String,
    },
    #[error("{action} did not succeed after {attempts} attempts: {last_error}")]
    SubmitExhausted {
        action: String,
        attempts: u32,
        last_error: LoadGeneratorError,
    },
    #[error("no test id in load generator response: {response:?}")]
    MissingTestId { response: String },
    #[error("test log for {test_id} unavailable after {failures} consecutive attempts: {last_error}")]
    LogUnavailable {
        test_id: String,
        failures: u32,
        last_error: LoadGeneratorError,
    },
    #[error("teardown left {failed} resource(s) behind")]
    TeardownIncomplete { failed: usize },
}
