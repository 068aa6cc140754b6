//! Finds resources an interrupted run left behind so they can be torn down.

use tracing::{info, warn};

use crate::config::AutoScalingConfig;
use crate::error::CloudError;
use crate::ledger::{GroupOrigin, InstanceRole, ResourceLedger};
use crate::naming::{
    high_cpu_alarm_name, low_cpu_alarm_name, ELB_ASG_SECURITY_GROUP, LG_SECURITY_GROUP,
    PROJECT_TAG_KEY, PROJECT_VALUE, WEB_SERVICE_SECURITY_GROUP,
};
use crate::ports::Services;
use crate::teardown::{teardown, TeardownOptions, TeardownReport};

/// Tag key the horizontal exercise puts on its instances.
const HORIZONTAL_PROJECT_TAG_KEY: &str = "project";

/// Builds a ledger from what still exists under the configured names.
///
/// Lookups are independent: one that fails is logged and the rest still
/// run, so the result may be partial but never aborts.
pub fn discover_leftovers(services: &Services<'_>, config: &AutoScalingConfig) -> ResourceLedger {
    let mut ledger = ResourceLedger::new();
    let group_name = config.auto_scaling_group_name.as_str();

    // Alarm deletion ignores names that do not exist.
    ledger.record_alarm(&high_cpu_alarm_name(group_name));
    ledger.record_alarm(&low_cpu_alarm_name(group_name));

    if lookup("auto_scaling_group", services.auto_scaling.group_exists(group_name))
        .unwrap_or(false)
    {
        ledger.record_auto_scaling_group(group_name);
    }

    if let Some(load_balancer) = lookup(
        "load_balancer",
        services
            .load_balancing
            .find_load_balancer(&config.load_balancer_name),
    )
    .flatten()
    {
        ledger.record_load_balancer(&load_balancer.arn);
    }

    if let Some(target_group) = lookup(
        "target_group",
        services
            .load_balancing
            .find_target_group(&config.auto_scaling_target_group),
    )
    .flatten()
    {
        ledger.record_target_group(&target_group.arn);
    }

    ledger.record_launch_template(&config.launch_template_name);

    for tag_key in [PROJECT_TAG_KEY, HORIZONTAL_PROJECT_TAG_KEY] {
        let instances = lookup(
            "instance",
            services.compute.find_tagged_instances(tag_key, PROJECT_VALUE),
        )
        .unwrap_or_default();
        for instance_id in instances {
            ledger.record_instance(&instance_id, InstanceRole::WebService);
        }
    }

    for group in [
        ELB_ASG_SECURITY_GROUP,
        LG_SECURITY_GROUP,
        WEB_SERVICE_SECURITY_GROUP,
    ] {
        if let Some(group_id) =
            lookup("security_group", services.compute.find_security_group(group, None)).flatten()
        {
            ledger.record_security_group(group, &group_id, GroupOrigin::Found);
        }
    }

    info!(
        event = "leftovers_discovered",
        alarms = ledger.alarms().len(),
        instances = ledger.instances().len(),
        security_groups = ledger.security_groups().len(),
        "discovered leftover resources"
    );
    ledger
}

/// Discovers and removes leftovers in one pass.
pub fn clean_up(
    services: &Services<'_>,
    config: &AutoScalingConfig,
    options: &TeardownOptions,
) -> TeardownReport {
    let ledger = discover_leftovers(services, config);
    teardown(services, &ledger, options)
}

fn lookup<T>(kind: &str, result: Result<T, CloudError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(event = "leftover_lookup_failed", kind, %error, "lookup failed");
            None
        }
    }
}
