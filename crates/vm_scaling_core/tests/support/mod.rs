#![allow(dead_code)]

pub mod clock;
pub mod cloud;
pub mod load_generator;

use serde_json::json;
use vm_scaling_core::config::{AutoScalingConfig, HorizontalConfig};
use vm_scaling_core::Services;

pub use clock::ManualClock;
pub use cloud::FakeCloud;
pub use load_generator::{body, finished_log, running_log, FakeLoadGenerator, LogReply};

/// The fakes a run needs, owned together so `services()` can lend them.
#[derive(Debug, Default)]
pub struct Harness {
    pub cloud: FakeCloud,
    pub load_generator: FakeLoadGenerator,
    pub clock: ManualClock,
}

impl Harness {
    pub fn services(&self) -> Services<'_> {
        Services {
            compute: &self.cloud,
            load_balancing: &self.cloud,
            auto_scaling: &self.cloud,
            alarms: &self.cloud,
            load_generator: &self.load_generator,
            clock: &self.clock,
        }
    }
}

pub fn horizontal_config() -> HorizontalConfig {
    serde_json::from_value(json!({
        "load_generator_ami": "ami-lg",
        "web_service_ami": "ami-ws",
        "instance_type": "m5.large",
        "timing": {
            "submit_retry_attempts": 5,
            "poll_failure_limit": 3
        }
    }))
    .expect("horizontal config")
}

pub fn auto_scaling_config() -> AutoScalingConfig {
    serde_json::from_value(json!({
        "load_generator_ami": "ami-lg",
        "web_service_ami": "ami-ws",
        "instance_type": "m5.large",
        "auto_scaling_target_group": "vm-scaling-tg",
        "load_balancer_name": "vm-scaling-elb",
        "launch_template_name": "vm-scaling-lt",
        "auto_scaling_group_name": "vm-scaling-asg",
        "asg_max_size": 4,
        "asg_min_size": 1,
        "health_check_grace_period": 60,
        "cool_down_period_scale_in": 120,
        "cool_down_period_scale_out": 60,
        "scale_out_adjustment": 1,
        "scale_in_adjustment": -1,
        "asg_default_cool_down_period": 60,
        "cpu_upper_threshold": 75.0,
        "cpu_lower_threshold": 25.0,
        "alarm_period": 60,
        "alarm_evaluation_periods_scale_out": 1,
        "alarm_evaluation_periods_scale_in": 2,
        "timing": {
            "submit_retry_attempts": 5,
            "poll_failure_limit": 3
        }
    }))
    .expect("auto scaling config")
}
