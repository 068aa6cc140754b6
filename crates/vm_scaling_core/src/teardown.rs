//! Best-effort teardown in reverse dependency order.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::TimingConfig;
use crate::error::CloudError;
use crate::ledger::{InstanceRole, ResourceLedger};
use crate::naming::LG_SECURITY_GROUP;
use crate::ports::Services;
use crate::wait::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownOptions {
    pub load_balancer_drain: Duration,
    pub instance_drain: Duration,
    pub security_group_delete: RetryPolicy,
    pub keep_load_generator: bool,
}

impl TeardownOptions {
    pub fn from_timing(timing: &TimingConfig, keep_load_generator: bool) -> Self {
        Self {
            load_balancer_drain: Duration::from_secs(timing.load_balancer_drain_secs),
            instance_drain: Duration::from_secs(timing.instance_drain_secs),
            security_group_delete: timing.security_group_delete(),
            keep_load_generator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownStep {
    pub resource: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub steps: Vec<TeardownStep>,
}

impl TeardownReport {
    pub fn failures(&self) -> impl Iterator<Item = &TeardownStep> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Failed(_)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    fn run(&mut self, resource: String, action: impl FnOnce() -> Result<(), CloudError>) -> bool {
        let outcome = match action() {
            Ok(()) => StepOutcome::Completed,
            Err(error) => StepOutcome::Failed(error.to_string()),
        };
        self.push(resource, outcome)
    }

    fn skip(&mut self, resource: String, reason: &str) {
        self.push(resource, StepOutcome::Skipped(reason.to_string()));
    }

    fn push(&mut self, resource: String, outcome: StepOutcome) -> bool {
        let completed = outcome == StepOutcome::Completed;
        match &outcome {
            StepOutcome::Completed => {
                info!(event = "teardown_step", resource = %resource, outcome = "completed");
            }
            StepOutcome::Skipped(reason) => {
                info!(
                    event = "teardown_step",
                    resource = %resource,
                    outcome = "skipped",
                    reason = %reason
                );
            }
            StepOutcome::Failed(message) => {
                warn!(
                    event = "teardown_step",
                    resource = %resource,
                    outcome = "failed",
                    error = %message
                );
            }
        }
        self.steps.push(TeardownStep { resource, outcome });
        completed
    }
}

/// Removes everything in `ledger`. Every step is attempted even when an
/// earlier one fails.
pub fn teardown(
    services: &Services<'_>,
    ledger: &ResourceLedger,
    options: &TeardownOptions,
) -> TeardownReport {
    let mut report = TeardownReport::default();
    if ledger.is_empty() {
        info!(event = "teardown_skipped", "nothing to tear down");
        return report;
    }
    info!(event = "teardown_started", "releasing resources");

    if !ledger.alarms().is_empty() {
        report.run(format!("alarms {}", ledger.alarms().join(", ")), || {
            services.alarms.delete_alarms(ledger.alarms())
        });
    }

    let mut instances_released = false;
    if let Some(group_name) = ledger.auto_scaling_group() {
        instances_released |= report.run(format!("auto scaling group {group_name}"), || {
            services.auto_scaling.delete_group(group_name)
        });
    }

    if let Some(arn) = ledger.load_balancer_arn() {
        let deleted = report.run(format!("load balancer {arn}"), || {
            services.load_balancing.delete_load_balancer(arn)
        });
        if deleted {
            services.clock.sleep(options.load_balancer_drain);
        }
    }

    if let Some(arn) = ledger.target_group_arn() {
        report.run(format!("target group {arn}"), || {
            services.load_balancing.delete_target_group(arn)
        });
    }

    if let Some(name) = ledger.launch_template() {
        report.run(format!("launch template {name}"), || {
            services.compute.delete_launch_template(name)
        });
    }

    for instance in ledger.instances() {
        let resource = format!("{} instance {}", instance.role.as_str(), instance.instance_id);
        if instance.role == InstanceRole::LoadGenerator && options.keep_load_generator {
            report.skip(resource, "load generator kept on request");
            continue;
        }
        instances_released |= report.run(resource, || {
            services.compute.terminate_instance(&instance.instance_id)
        });
    }

    if instances_released && !ledger.security_groups().is_empty() {
        services.clock.sleep(options.instance_drain);
    }

    for group in ledger.security_groups().iter().rev() {
        if group.name == LG_SECURITY_GROUP && options.keep_load_generator {
            report.skip(
                format!("security group {} ({})", group.name, group.group_id),
                "still attached to the kept load generator",
            );
            continue;
        }
        report.run(
            format!("security group {} ({})", group.name, group.group_id),
            || delete_security_group_with_retry(services, &group.group_id, options),
        );
    }

    info!(
        event = "teardown_finished",
        steps = report.steps.len(),
        failures = report.failure_count(),
        "teardown finished"
    );
    report
}

/// Groups stay "in use" until network interfaces of terminated instances
/// and deleted load balancers detach.
fn delete_security_group_with_retry(
    services: &Services<'_>,
    group_id: &str,
    options: &TeardownOptions,
) -> Result<(), CloudError> {
    let policy = options.security_group_delete;
    let mut attempt = 1;
    loop {
        match services.compute.delete_security_group(group_id) {
            Ok(()) => return Ok(()),
            Err(error) if attempt < policy.attempts => {
                info!(
                    event = "security_group_delete_retry",
                    group_id,
                    attempt,
                    %error,
                    "security group still in use"
                );
                services.clock.sleep(policy.delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
