//! AWS-backed implementations of the `vm_scaling_core` ports.
//!
//! The core stays synchronous; every adapter here bridges into the async
//! SDK clients, so callers must run on a multi-thread tokio runtime.

pub mod adapters;
pub mod telemetry;

use aws_config::SdkConfig;
use vm_scaling_core::ports::SystemClock;
use vm_scaling_core::Services;

use adapters::{
    AutoScalingGroups, CloudWatchAlarms, Ec2Compute, ElbLoadBalancing, HttpLoadGenerator,
};

/// Owns one client per AWS service plus the load generator client.
pub struct AwsServices {
    compute: Ec2Compute,
    load_balancing: ElbLoadBalancing,
    auto_scaling: AutoScalingGroups,
    alarms: CloudWatchAlarms,
    load_generator: HttpLoadGenerator,
    clock: SystemClock,
}

impl AwsServices {
    pub fn new(sdk_config: &SdkConfig, load_generator: HttpLoadGenerator) -> Self {
        Self {
            compute: Ec2Compute::new(aws_sdk_ec2::Client::new(sdk_config)),
            load_balancing: ElbLoadBalancing::new(aws_sdk_elasticloadbalancingv2::Client::new(
                sdk_config,
            )),
            auto_scaling: AutoScalingGroups::new(aws_sdk_autoscaling::Client::new(sdk_config)),
            alarms: CloudWatchAlarms::new(aws_sdk_cloudwatch::Client::new(sdk_config)),
            load_generator,
            clock: SystemClock::default(),
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            compute: &self.compute,
            load_balancing: &self.load_balancing,
            auto_scaling: &self.auto_scaling,
            alarms: &self.alarms,
            load_generator: &self.load_generator,
            clock: &self.clock,
        }
    }
}
