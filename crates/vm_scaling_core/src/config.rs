use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::wait::{RetryPolicy, WaitPolicy};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_RPS_TARGET: f64 = 50.0;
pub const DEFAULT_LAUNCH_DELAY_SECS: u64 = 100;

/// Polling, retry and drain timings shared by both exercises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub instance_ready_attempts: u32,
    pub instance_ready_interval_secs: u64,
    pub submit_retry_attempts: u32,
    pub submit_retry_delay_ms: u64,
    pub poll_interval_secs: u64,
    pub poll_failure_limit: u32,
    pub load_balancer_drain_secs: u64,
    pub instance_drain_secs: u64,
    pub security_group_delete_attempts: u32,
    pub security_group_delete_retry_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            instance_ready_attempts: 60,
            instance_ready_interval_secs: 5,
            submit_retry_attempts: 3_000,
            submit_retry_delay_ms: 100,
            poll_interval_secs: 1,
            poll_failure_limit: 300,
            load_balancer_drain_secs: 30,
            instance_drain_secs: 60,
            security_group_delete_attempts: 5,
            security_group_delete_retry_secs: 15,
        }
    }
}

impl TimingConfig {
    pub fn instance_ready(&self) -> WaitPolicy {
        WaitPolicy::new(
            self.instance_ready_attempts,
            Duration::from_secs(self.instance_ready_interval_secs),
        )
    }

    pub fn submit_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.submit_retry_attempts,
            Duration::from_millis(self.submit_retry_delay_ms),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn security_group_delete(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.security_group_delete_attempts,
            Duration::from_secs(self.security_group_delete_retry_secs),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("instance_ready_attempts", self.instance_ready_attempts),
            ("submit_retry_attempts", self.submit_retry_attempts),
            ("poll_failure_limit", self.poll_failure_limit),
            (
                "security_group_delete_attempts",
                self.security_group_delete_attempts,
            ),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(invalid(format!("timing.{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizontalConfig {
    pub load_generator_ami: String,
    pub web_service_ami: String,
    pub instance_type: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_rps_target")]
    pub rps_target: f64,
    #[serde(default = "default_launch_delay_secs")]
    pub launch_delay_secs: u64,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl HorizontalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("load_generator_ami", &self.load_generator_ami)?;
        require_non_empty("web_service_ami", &self.web_service_ami)?;
        require_non_empty("instance_type", &self.instance_type)?;
        require_non_empty("region", &self.region)?;
        if !(self.rps_target.is_finite() && self.rps_target > 0.0) {
            return Err(invalid("rps_target must be a positive number"));
        }
        self.timing.validate()
    }

    pub fn launch_delay(&self) -> Duration {
        Duration::from_secs(self.launch_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoScalingConfig {
    pub load_generator_ami: String,
    pub web_service_ami: String,
    pub instance_type: String,
    pub auto_scaling_target_group: String,
    pub load_balancer_name: String,
    pub launch_template_name: String,
    pub auto_scaling_group_name: String,
    pub asg_max_size: i32,
    pub asg_min_size: i32,
    pub health_check_grace_period: i32,
    pub cool_down_period_scale_in: i32,
    pub cool_down_period_scale_out: i32,
    pub scale_out_adjustment: i32,
    pub scale_in_adjustment: i32,
    pub asg_default_cool_down_period: i32,
    pub cpu_upper_threshold: f64,
    pub cpu_lower_threshold: f64,
    pub alarm_period: i32,
    pub alarm_evaluation_periods_scale_out: i32,
    pub alarm_evaluation_periods_scale_in: i32,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl AutoScalingConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("load_generator_ami", &self.load_generator_ami),
            ("web_service_ami", &self.web_service_ami),
            ("instance_type", &self.instance_type),
            ("auto_scaling_target_group", &self.auto_scaling_target_group),
            ("load_balancer_name", &self.load_balancer_name),
            ("launch_template_name", &self.launch_template_name),
            ("auto_scaling_group_name", &self.auto_scaling_group_name),
            ("region", &self.region),
        ];
        for (name, value) in names {
            require_non_empty(name, value)?;
        }

        if self.asg_min_size < 0 || self.asg_min_size > self.asg_max_size {
            return Err(invalid(format!(
                "asg_min_size ({}) must be between 0 and asg_max_size ({})",
                self.asg_min_size, self.asg_max_size
            )));
        }
        if self.cpu_lower_threshold >= self.cpu_upper_threshold {
            return Err(invalid(format!(
                "cpu_lower_threshold ({}) must be below cpu_upper_threshold ({})",
                self.cpu_lower_threshold, self.cpu_upper_threshold
            )));
        }
        if self.scale_out_adjustment <= 0 {
            return Err(invalid("scale_out_adjustment must be positive"));
        }
        if self.scale_in_adjustment == 0 || self.scale_in_adjustment == i32::MIN {
            return Err(invalid(format!(
                "scale_in_adjustment must be non-zero and above {}",
                i32::MIN
            )));
        }

        let positive = [
            ("alarm_period", self.alarm_period),
            (
                "alarm_evaluation_periods_scale_out",
                self.alarm_evaluation_periods_scale_out,
            ),
            (
                "alarm_evaluation_periods_scale_in",
                self.alarm_evaluation_periods_scale_in,
            ),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(invalid(format!("{name} must be positive")));
            }
        }

        let non_negative = [
            ("health_check_grace_period", self.health_check_grace_period),
            ("cool_down_period_scale_in", self.cool_down_period_scale_in),
            ("cool_down_period_scale_out", self.cool_down_period_scale_out),
            (
                "asg_default_cool_down_period",
                self.asg_default_cool_down_period,
            ),
        ];
        for (name, value) in non_negative {
            if value < 0 {
                return Err(invalid(format!("{name} must not be negative")));
            }
        }

        self.timing.validate()
    }

    /// Scale-in always removes capacity, whichever sign the file uses.
    pub fn scale_in_delta(&self) -> i32 {
        -self.scale_in_adjustment.saturating_abs()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn require_non_empty(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{name} must not be empty")));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_rps_target() -> f64 {
    DEFAULT_RPS_TARGET
}

fn default_launch_delay_secs() -> u64 {
    DEFAULT_LAUNCH_DELAY_SECS
}
