//! Auto-scaling: an ASG behind an application load balancer, scaled by
//! CloudWatch CPU alarms, exercised by the load generator.

use tracing::{error, info};

use crate::config::AutoScalingConfig;
use crate::error::{LoadGeneratorError, ScalingError};
use crate::horizontal::RunOptions;
use crate::ledger::{InstanceRole, ResourceLedger};
use crate::loadgen::{extract_test_id, LogArchive, TestLog};
use crate::model::{
    AlarmComparison, AutoScalingGroupRequest, InstanceLaunch, LaunchTemplateRequest,
    ListenerRequest, LoadBalancer, LoadBalancerRequest, MetricAlarmRequest,
    ScalingPolicyRequest, TargetGroupRequest,
};
use crate::naming::{
    high_cpu_alarm_name, lab_tags, load_generator_tags, low_cpu_alarm_name,
    scale_in_policy_name, scale_out_policy_name, ASG_DIMENSION_NAME, CPU_METRIC_NAME,
    CPU_METRIC_NAMESPACE, ELB_ASG_SECURITY_GROUP, HTTP_PORT, LG_SECURITY_GROUP,
};
use crate::ports::Services;
use crate::provision::{
    default_vpc, get_or_create_http_security_group, launch_instance, public_dns,
};
use crate::teardown::{teardown, TeardownOptions, TeardownReport};
use crate::wait::{poll_until_finished, submit_until_accepted, LogPoller};

const MIN_LOAD_BALANCER_SUBNETS: usize = 2;

/// Addresses the test phase needs from provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedStack {
    pub load_balancer: LoadBalancer,
    pub target_group_arn: String,
    pub load_generator_id: String,
    pub load_generator_dns: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoScalingReport {
    pub load_balancer_dns: String,
    pub warmup_test_id: String,
    pub autoscaling_test_id: String,
    pub teardown: Option<TeardownReport>,
}

pub fn run_auto_scaling(
    services: &Services<'_>,
    config: &AutoScalingConfig,
    options: &RunOptions,
) -> Result<AutoScalingReport, ScalingError> {
    let mut ledger = ResourceLedger::new();
    let outcome = provision_stack(services, config, &mut ledger)
        .and_then(|stack| execute_test(services, config, options, &stack).map(|ids| (stack, ids)));

    let teardown_report = if options.keep_resources {
        info!(event = "teardown_skipped", "keeping resources on request");
        None
    } else {
        let teardown_options =
            TeardownOptions::from_timing(&config.timing, options.keep_load_generator);
        Some(teardown(services, &ledger, &teardown_options))
    };

    let (stack, (warmup_test_id, autoscaling_test_id)) = outcome.inspect_err(|failure| {
        error!(event = "autoscale_failed", error = %failure, "auto-scaling run failed");
    })?;
    Ok(AutoScalingReport {
        load_balancer_dns: stack.load_balancer.dns_name,
        warmup_test_id,
        autoscaling_test_id,
        teardown: teardown_report,
    })
}

/// Creates the scaling infrastructure and the load generator, recording
/// each resource in `ledger` as soon as it exists.
pub fn provision_stack(
    services: &Services<'_>,
    config: &AutoScalingConfig,
    ledger: &mut ResourceLedger,
) -> Result<ProvisionedStack, ScalingError> {
    let compute = services.compute;
    let vpc = default_vpc(compute)?;
    let tags = lab_tags();

    let elb_asg_group = get_or_create_http_security_group(
        compute,
        ledger,
        ELB_ASG_SECURITY_GROUP,
        &vpc.vpc_id,
        &tags,
    )?;

    compute.create_launch_template(&launch_template_request(config, &elb_asg_group))?;
    ledger.record_launch_template(&config.launch_template_name);
    log_created("launch_template", &config.launch_template_name);

    let target_group = services
        .load_balancing
        .create_target_group(&target_group_request(config, &vpc.vpc_id))?;
    ledger.record_target_group(&target_group.arn);
    log_created("target_group", &target_group.arn);

    let subnet_ids = compute.list_subnets(&vpc.vpc_id)?;
    if subnet_ids.len() < MIN_LOAD_BALANCER_SUBNETS {
        return Err(ScalingError::InsufficientSubnets {
            found: subnet_ids.len(),
        });
    }

    let load_balancer = services.load_balancing.create_load_balancer(&LoadBalancerRequest {
        name: config.load_balancer_name.clone(),
        subnet_ids: subnet_ids.clone(),
        security_group_id: elb_asg_group,
        tags: tags.clone(),
    })?;
    ledger.record_load_balancer(&load_balancer.arn);
    info!(
        event = "resource_created",
        kind = "load_balancer",
        id = %load_balancer.arn,
        dns = %load_balancer.dns_name,
        "created load balancer"
    );

    services.load_balancing.create_listener(&ListenerRequest {
        load_balancer_arn: load_balancer.arn.clone(),
        port: HTTP_PORT,
        target_group_arn: target_group.arn.clone(),
    })?;
    log_created("listener", &load_balancer.arn);

    services
        .auto_scaling
        .create_group(&auto_scaling_group_request(config, subnet_ids, &target_group.arn))?;
    ledger.record_auto_scaling_group(&config.auto_scaling_group_name);
    log_created("auto_scaling_group", &config.auto_scaling_group_name);

    let scale_out_arn = services
        .auto_scaling
        .put_scaling_policy(&scale_out_policy(config))?;
    log_created("scaling_policy", &scale_out_arn);
    let scale_in_arn = services
        .auto_scaling
        .put_scaling_policy(&scale_in_policy(config))?;
    log_created("scaling_policy", &scale_in_arn);

    for alarm in [
        high_cpu_alarm(config, &scale_out_arn),
        low_cpu_alarm(config, &scale_in_arn),
    ] {
        services.alarms.put_metric_alarm(&alarm)?;
        ledger.record_alarm(&alarm.alarm_name);
        log_created("metric_alarm", &alarm.alarm_name);
    }

    let lg_group = get_or_create_http_security_group(
        compute,
        ledger,
        LG_SECURITY_GROUP,
        &vpc.vpc_id,
        &tags,
    )?;
    let load_generator = launch_instance(
        compute,
        services.clock,
        ledger,
        &InstanceLaunch {
            image_id: config.load_generator_ami.clone(),
            instance_type: config.instance_type.clone(),
            security_group_id: lg_group,
            tags: load_generator_tags(),
        },
        InstanceRole::LoadGenerator,
        config.timing.instance_ready(),
    )?;

    Ok(ProvisionedStack {
        load_balancer,
        target_group_arn: target_group.arn,
        load_generator_dns: public_dns(&load_generator),
        load_generator_id: load_generator.instance_id,
    })
}

/// Runs the warm-up test and then the auto-scaling test, each to completion.
pub fn execute_test(
    services: &Services<'_>,
    config: &AutoScalingConfig,
    options: &RunOptions,
    stack: &ProvisionedStack,
) -> Result<(String, String), ScalingError> {
    let lg_dns = stack.load_generator_dns.as_str();
    let elb_dns = stack.load_balancer.dns_name.as_str();
    let archive = options.archive();

    let warmup_id = run_phase(services, config, archive.as_ref(), lg_dns, "warmup", || {
        services.load_generator.start_warmup(lg_dns, elb_dns)
    })?;
    let test_id = run_phase(services, config, archive.as_ref(), lg_dns, "autoscaling", || {
        services.load_generator.start_autoscaling_test(lg_dns, elb_dns)
    })?;
    Ok((warmup_id, test_id))
}

fn run_phase(
    services: &Services<'_>,
    config: &AutoScalingConfig,
    archive: Option<&LogArchive>,
    lg_dns: &str,
    phase: &str,
    submit: impl FnMut() -> Result<String, LoadGeneratorError>,
) -> Result<String, ScalingError> {
    let timing = &config.timing;
    let action = format!("start {phase} test");
    let response = submit_until_accepted(services.clock, timing.submit_retry(), &action, submit)?;
    let test_id =
        extract_test_id(&response).ok_or_else(|| ScalingError::MissingTestId { response })?;
    info!(event = "test_started", kind = phase, test_id = %test_id, "test started");

    let mut poller = LogPoller::new(
        services.load_generator,
        lg_dns,
        &test_id,
        archive,
        timing.poll_failure_limit,
    );
    let log = poll_until_finished(&mut poller, services.clock, timing.poll_interval())?;
    log_summary(phase, &test_id, &log);
    Ok(test_id)
}

fn log_summary(phase: &str, test_id: &str, log: &TestLog) {
    info!(
        event = "test_finished",
        kind = phase,
        test_id,
        rps = log.current_rps(),
        sections = log.sections().len(),
        "test finished"
    );
}

fn log_created(kind: &str, id: &str) {
    info!(event = "resource_created", kind, id, "created resource");
}

pub fn launch_template_request(
    config: &AutoScalingConfig,
    security_group_id: &str,
) -> LaunchTemplateRequest {
    LaunchTemplateRequest {
        name: config.launch_template_name.clone(),
        image_id: config.web_service_ami.clone(),
        instance_type: config.instance_type.clone(),
        security_group_id: security_group_id.to_string(),
        detailed_monitoring: true,
        tags: lab_tags(),
    }
}

pub fn target_group_request(config: &AutoScalingConfig, vpc_id: &str) -> TargetGroupRequest {
    TargetGroupRequest {
        name: config.auto_scaling_target_group.clone(),
        vpc_id: vpc_id.to_string(),
        port: HTTP_PORT,
        health_check_path: "/".to_string(),
        health_check_interval_secs: 30,
        health_check_timeout_secs: 5,
        healthy_threshold: 2,
        unhealthy_threshold: 2,
        tags: lab_tags(),
    }
}

pub fn auto_scaling_group_request(
    config: &AutoScalingConfig,
    subnet_ids: Vec<String>,
    target_group_arn: &str,
) -> AutoScalingGroupRequest {
    AutoScalingGroupRequest {
        name: config.auto_scaling_group_name.clone(),
        launch_template_name: config.launch_template_name.clone(),
        min_size: config.asg_min_size,
        max_size: config.asg_max_size,
        desired_capacity: config.asg_min_size,
        default_cooldown: config.asg_default_cool_down_period,
        health_check_grace_period: config.health_check_grace_period,
        subnet_ids,
        target_group_arn: target_group_arn.to_string(),
        tags: lab_tags(),
    }
}

pub fn scale_out_policy(config: &AutoScalingConfig) -> ScalingPolicyRequest {
    ScalingPolicyRequest {
        group_name: config.auto_scaling_group_name.clone(),
        policy_name: scale_out_policy_name(&config.auto_scaling_group_name),
        adjustment: config.scale_out_adjustment,
        cooldown: config.cool_down_period_scale_out,
    }
}

pub fn scale_in_policy(config: &AutoScalingConfig) -> ScalingPolicyRequest {
    ScalingPolicyRequest {
        group_name: config.auto_scaling_group_name.clone(),
        policy_name: scale_in_policy_name(&config.auto_scaling_group_name),
        adjustment: config.scale_in_delta(),
        cooldown: config.cool_down_period_scale_in,
    }
}

pub fn high_cpu_alarm(config: &AutoScalingConfig, policy_arn: &str) -> MetricAlarmRequest {
    cpu_alarm(
        config,
        high_cpu_alarm_name(&config.auto_scaling_group_name),
        "Trigger scale-out when CPU is high",
        config.alarm_evaluation_periods_scale_out,
        config.cpu_upper_threshold,
        AlarmComparison::GreaterThanThreshold,
        policy_arn,
    )
}

pub fn low_cpu_alarm(config: &AutoScalingConfig, policy_arn: &str) -> MetricAlarmRequest {
    cpu_alarm(
        config,
        low_cpu_alarm_name(&config.auto_scaling_group_name),
        "Trigger scale-in when CPU is low",
        config.alarm_evaluation_periods_scale_in,
        config.cpu_lower_threshold,
        AlarmComparison::LessThanThreshold,
        policy_arn,
    )
}

fn cpu_alarm(
    config: &AutoScalingConfig,
    alarm_name: String,
    description: &str,
    evaluation_periods: i32,
    threshold: f64,
    comparison: AlarmComparison,
    policy_arn: &str,
) -> MetricAlarmRequest {
    MetricAlarmRequest {
        alarm_name,
        description: description.to_string(),
        namespace: CPU_METRIC_NAMESPACE.to_string(),
        metric_name: CPU_METRIC_NAME.to_string(),
        dimension_name: ASG_DIMENSION_NAME.to_string(),
        dimension_value: config.auto_scaling_group_name.clone(),
        period: config.alarm_period,
        evaluation_periods,
        threshold,
        comparison,
        action_arn: policy_arn.to_string(),
    }
}
