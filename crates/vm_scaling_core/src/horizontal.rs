//! Horizontal scaling: add web services until the load generator reports
//! enough requests per second.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::config::HorizontalConfig;
use crate::error::ScalingError;
use crate::ledger::{InstanceRole, ResourceLedger};
use crate::loadgen::{extract_test_id, LogArchive};
use crate::model::InstanceLaunch;
use crate::naming::{
    horizontal_instance_tags, LG_SECURITY_GROUP, LOAD_GENERATOR_NAME, WEB_SERVICE_NAME,
    WEB_SERVICE_SECURITY_GROUP,
};
use crate::ports::Services;
use crate::provision::{
    default_vpc, get_or_create_http_security_group, launch_instance, public_dns,
};
use crate::teardown::{teardown, TeardownOptions, TeardownReport};
use crate::wait::{submit_until_accepted, submit_with_retry, LogPoller, SubmitOutcome};

/// Operator choices that are not part of the exercise configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub keep_resources: bool,
    pub keep_load_generator: bool,
    pub log_dir: Option<PathBuf>,
}

impl RunOptions {
    pub fn archive(&self) -> Option<LogArchive> {
        self.log_dir.as_ref().map(LogArchive::new)
    }
}

/// Launch another web service only when RPS is short of the target and the
/// previous instance has had time to take load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOutGate {
    pub rps_target: f64,
    pub launch_delay: Duration,
}

impl ScaleOutGate {
    pub fn should_launch(&self, current_rps: f64, since_last_launch: Duration) -> bool {
        current_rps < self.rps_target && since_last_launch >= self.launch_delay
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalReport {
    pub test_id: String,
    pub web_services: usize,
    pub final_rps: f64,
    pub teardown: Option<TeardownReport>,
}

pub fn run_horizontal_scaling(
    services: &Services<'_>,
    config: &HorizontalConfig,
    options: &RunOptions,
) -> Result<HorizontalReport, ScalingError> {
    let mut ledger = ResourceLedger::new();
    let outcome = drive_test(services, config, options, &mut ledger);

    let teardown_report = if options.keep_resources {
        info!(event = "teardown_skipped", "keeping resources on request");
        None
    } else {
        let teardown_options =
            TeardownOptions::from_timing(&config.timing, options.keep_load_generator);
        Some(teardown(services, &ledger, &teardown_options))
    };

    let (test_id, web_services, final_rps) = outcome.inspect_err(|failure| {
        error!(event = "horizontal_failed", error = %failure, "horizontal scaling run failed");
    })?;
    Ok(HorizontalReport {
        test_id,
        web_services,
        final_rps,
        teardown: teardown_report,
    })
}

fn drive_test(
    services: &Services<'_>,
    config: &HorizontalConfig,
    options: &RunOptions,
    ledger: &mut ResourceLedger,
) -> Result<(String, usize, f64), ScalingError> {
    let timing = &config.timing;
    let vpc = default_vpc(services.compute)?;
    let lg_group = get_or_create_http_security_group(
        services.compute,
        ledger,
        LG_SECURITY_GROUP,
        &vpc.vpc_id,
        &[],
    )?;
    let ws_group = get_or_create_http_security_group(
        services.compute,
        ledger,
        WEB_SERVICE_SECURITY_GROUP,
        &vpc.vpc_id,
        &[],
    )?;

    let load_generator = launch_instance(
        services.compute,
        services.clock,
        ledger,
        &InstanceLaunch {
            image_id: config.load_generator_ami.clone(),
            instance_type: config.instance_type.clone(),
            security_group_id: lg_group,
            tags: horizontal_instance_tags(LOAD_GENERATOR_NAME),
        },
        InstanceRole::LoadGenerator,
        timing.instance_ready(),
    )?;
    let lg_dns = public_dns(&load_generator);

    let web_service_launch = InstanceLaunch {
        image_id: config.web_service_ami.clone(),
        instance_type: config.instance_type.clone(),
        security_group_id: ws_group,
        tags: horizontal_instance_tags(WEB_SERVICE_NAME),
    };
    let first_web_service = launch_instance(
        services.compute,
        services.clock,
        ledger,
        &web_service_launch,
        InstanceRole::WebService,
        timing.instance_ready(),
    )?;
    let mut web_services = 1;

    let response = submit_until_accepted(
        services.clock,
        timing.submit_retry(),
        "start horizontal test",
        || {
            services
                .load_generator
                .start_horizontal_test(&lg_dns, &public_dns(&first_web_service))
        },
    )?;
    let test_id = extract_test_id(&response)
        .ok_or_else(|| ScalingError::MissingTestId { response })?;
    info!(
        event = "test_started",
        kind = "horizontal",
        test_id = %test_id,
        "horizontal test started"
    );

    let gate = ScaleOutGate {
        rps_target: config.rps_target,
        launch_delay: config.launch_delay(),
    };
    let archive = options.archive();
    let mut poller = LogPoller::new(
        services.load_generator,
        &lg_dns,
        &test_id,
        archive.as_ref(),
        timing.poll_failure_limit,
    );
    let mut last_launch = services.clock.elapsed();

    let final_rps = loop {
        let Some(log) = poller.poll()? else {
            services.clock.sleep(timing.poll_interval());
            continue;
        };
        if log.is_finished() {
            break log.current_rps();
        }

        let current_rps = log.current_rps();
        let since_last_launch = services.clock.elapsed().saturating_sub(last_launch);
        info!(
            event = "rps_sample",
            test_id = %test_id,
            rps = current_rps,
            web_services,
            "current RPS"
        );

        if gate.should_launch(current_rps, since_last_launch) {
            let web_service = launch_instance(
                services.compute,
                services.clock,
                ledger,
                &web_service_launch,
                InstanceRole::WebService,
                timing.instance_ready(),
            )?;
            let ws_dns = public_dns(&web_service);
            let added = submit_with_retry(
                services.clock,
                timing.submit_retry(),
                "add web service",
                || services.load_generator.add_web_service(&lg_dns, &ws_dns),
                || {
                    poller
                        .poll()
                        .ok()
                        .flatten()
                        .is_some_and(|log| log.is_finished())
                },
            )?;
            match added {
                SubmitOutcome::Accepted(_) => {
                    web_services += 1;
                    info!(
                        event = "web_service_added",
                        instance_id = %web_service.instance_id,
                        dns = %ws_dns,
                        web_services,
                        "web service registered with load generator"
                    );
                }
                SubmitOutcome::Aborted => {
                    info!(
                        event = "web_service_not_added",
                        instance_id = %web_service.instance_id,
                        "test already finished"
                    );
                }
            }
            last_launch = services.clock.elapsed();
        }

        services.clock.sleep(timing.poll_interval());
    };

    info!(
        event = "test_finished",
        kind = "horizontal",
        test_id = %test_id,
        rps = final_rps,
        web_services,
        "load testing completed"
    );
    Ok((test_id, web_services, final_rps))
}
