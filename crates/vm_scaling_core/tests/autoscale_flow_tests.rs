mod support;

use std::time::Duration;

use support::{body, finished_log, running_log, FakeCloud, Harness};
use vm_scaling_core::autoscale::run_auto_scaling;
use vm_scaling_core::horizontal::RunOptions;
use vm_scaling_core::model::AlarmComparison;
use vm_scaling_core::ScalingError;

fn assert_in_order(cloud: &FakeCloud, prefixes: &[&str]) {
    let positions: Vec<usize> = prefixes
        .iter()
        .map(|prefix| {
            cloud
                .position(prefix)
                .unwrap_or_else(|| panic!("missing call {prefix}"))
        })
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "calls out of order: {prefixes:?} at {positions:?}"
    );
}

#[test]
fn provisions_in_dependency_order_and_runs_both_tests() {
    let harness = Harness::default();
    harness.load_generator.script(
        1_601_000_001,
        [
            body(running_log(40.0)),
            body(running_log(80.0)),
            body(finished_log(90.0)),
        ],
    );

    let report = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect("run should succeed");

    assert_eq!(report.load_balancer_dns, "vm-scaling-elb.elb.example");
    assert_eq!(report.warmup_test_id, "1601000000");
    assert_eq!(report.autoscaling_test_id, "1601000001");
    assert_eq!(
        harness.load_generator.calls_to("warmup"),
        vec!["warmup vm-scaling-elb.elb.example".to_string()]
    );
    let autoscaling_polls = harness
        .load_generator
        .calls_to("log")
        .into_iter()
        .filter(|call| call.ends_with("1601000001"))
        .count();
    assert_eq!(autoscaling_polls, 3);

    assert_in_order(
        &harness.cloud,
        &[
            "create_security_group elb-asg-security-group",
            "create_launch_template vm-scaling-lt",
            "create_target_group vm-scaling-tg",
            "create_load_balancer vm-scaling-elb",
            "create_listener",
            "create_group vm-scaling-asg",
            "put_scaling_policy vm-scaling-asg-scale-out-policy",
            "put_scaling_policy vm-scaling-asg-scale-in-policy",
            "put_metric_alarm vm-scaling-asg-high-cpu-alarm",
            "put_metric_alarm vm-scaling-asg-low-cpu-alarm",
            "create_security_group lg-security-group",
            "run_instance ami-lg",
        ],
    );
}

#[test]
fn alarms_trigger_matching_policies() {
    let harness = Harness::default();

    run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions {
            keep_resources: true,
            ..RunOptions::default()
        },
    )
    .expect("run should succeed");

    let state = harness.cloud.state();
    let high = &state.alarms[0];
    let low = &state.alarms[1];
    assert_eq!(high.comparison, AlarmComparison::GreaterThanThreshold);
    assert_eq!(high.threshold, 75.0);
    assert_eq!(high.action_arn, "arn:policy/vm-scaling-asg-scale-out-policy");
    assert_eq!(low.comparison, AlarmComparison::LessThanThreshold);
    assert_eq!(low.threshold, 25.0);
    assert_eq!(low.action_arn, "arn:policy/vm-scaling-asg-scale-in-policy");

    assert_eq!(state.policies[1].adjustment, -1);
    let group = &state.group_requests[0];
    assert_eq!(group.desired_capacity, 1);
    assert_eq!(group.target_group_arn, "arn:targetgroup/vm-scaling-tg");
    assert_eq!(group.subnet_ids, vec!["subnet-a", "subnet-b"]);
}

#[test]
fn teardown_runs_in_reverse_dependency_order() {
    let harness = Harness::default();

    let report = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect("run should succeed");

    assert!(report.teardown.expect("teardown ran").is_clean());
    assert_in_order(
        &harness.cloud,
        &[
            "delete_alarms vm-scaling-asg-high-cpu-alarm,vm-scaling-asg-low-cpu-alarm",
            "delete_group vm-scaling-asg",
            "delete_load_balancer arn:loadbalancer/vm-scaling-elb",
            "delete_target_group arn:targetgroup/vm-scaling-tg",
            "delete_launch_template vm-scaling-lt",
            "terminate_instance",
            "delete_security_group sg-2",
            "delete_security_group sg-1",
        ],
    );
    assert_eq!(harness.clock.slept_for(Duration::from_secs(30)), 1);
    assert_eq!(harness.clock.slept_for(Duration::from_secs(60)), 1);
}

#[test]
fn failed_group_creation_releases_what_was_created() {
    let harness = Harness::default();
    harness.cloud.fail("create_group");

    let error = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect_err("group creation should fail");

    assert!(matches!(error, ScalingError::Cloud(_)));
    assert!(harness.cloud.calls_to("delete_group").is_empty());
    assert!(harness.cloud.calls_to("delete_alarms").is_empty());
    assert!(harness.cloud.calls_to("run_instance").is_empty());
    assert_in_order(
        &harness.cloud,
        &[
            "delete_load_balancer",
            "delete_target_group",
            "delete_launch_template",
            "delete_security_group sg-1",
        ],
    );
    assert!(harness.load_generator.state().calls.is_empty());
}

#[test]
fn single_subnet_cannot_host_load_balancer() {
    let harness = Harness::default();
    harness.cloud.state().subnets = vec!["subnet-a".to_string()];

    let error = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect_err("one subnet should fail");

    assert!(matches!(error, ScalingError::InsufficientSubnets { found: 1 }));
    assert!(harness.cloud.calls_to("create_load_balancer").is_empty());
    assert_eq!(harness.cloud.calls_to("delete_target_group").len(), 1);
    assert_eq!(harness.cloud.calls_to("delete_launch_template").len(), 1);
}

#[test]
fn teardown_failure_does_not_stop_later_steps() {
    let harness = Harness::default();
    harness.cloud.fail("delete_load_balancer");

    let report = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect("test phase should succeed");

    let teardown = report.teardown.expect("teardown ran");
    assert_eq!(teardown.failure_count(), 1);
    assert!(teardown
        .failures()
        .all(|step| step.resource.starts_with("load balancer")));
    assert_eq!(harness.cloud.calls_to("delete_target_group").len(), 1);
    assert_eq!(harness.cloud.calls_to("delete_security_group").len(), 2);
    assert_eq!(harness.clock.slept_for(Duration::from_secs(30)), 0);
}

#[test]
fn missing_default_vpc_creates_nothing() {
    let harness = Harness::default();
    harness.cloud.state().vpc_id = None;

    let error = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect_err("no vpc should fail");

    assert!(matches!(error, ScalingError::NoDefaultVpc));
    assert_eq!(harness.cloud.calls(), vec!["default_vpc ".to_string()]);
}

#[test]
fn slow_instance_is_polled_until_running() {
    let harness = Harness::default();
    harness.cloud.state().pending_describes = 4;

    run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect("run should succeed");

    assert_eq!(harness.clock.slept_for(Duration::from_secs(5)), 4);
}

#[test]
fn instance_that_never_runs_fails_after_wait_budget() {
    let harness = Harness::default();
    harness.cloud.state().pending_describes = u32::MAX;

    let error = run_auto_scaling(
        &harness.services(),
        &support::auto_scaling_config(),
        &RunOptions::default(),
    )
    .expect_err("instance should not become ready");

    match error {
        ScalingError::InstanceNotReady {
            attempts,
            last_state,
            ..
        } => {
            assert_eq!(attempts, 60);
            assert_eq!(last_state, "pending");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.cloud.calls_to("terminate_instance").len(), 1);
}
