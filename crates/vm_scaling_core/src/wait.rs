//! Bounded waits for cloud readiness and load generator submissions.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{LoadGeneratorError, ScalingError};
use crate::loadgen::{LogArchive, TestLog};
use crate::model::InstanceSnapshot;
use crate::ports::{Clock, ComputeApi, LoadGeneratorApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Describes the instance until it is running with a public DNS name.
pub fn wait_for_instance_ready(
    compute: &dyn ComputeApi,
    clock: &dyn Clock,
    instance_id: &str,
    policy: WaitPolicy,
) -> Result<InstanceSnapshot, ScalingError> {
    let mut last_state = "unknown".to_string();
    for attempt in 1..=policy.attempts {
        match compute.describe_instance(instance_id)? {
            Some(snapshot) if snapshot.is_ready() => {
                info!(
                    event = "instance_ready",
                    instance_id,
                    public_dns = snapshot.public_dns.as_deref().unwrap_or_default(),
                    attempt,
                    "instance is running"
                );
                return Ok(snapshot);
            }
            Some(snapshot) => {
                last_state = snapshot.state.as_str().to_string();
                debug!(
                    event = "instance_waiting",
                    instance_id,
                    state = %last_state,
                    attempt,
                    "waiting for instance"
                );
            }
            None => {
                debug!(
                    event = "instance_not_visible",
                    instance_id, attempt, "instance not visible yet"
                );
            }
        }

        if attempt < policy.attempts {
            clock.sleep(policy.interval);
        }
    }

    Err(ScalingError::InstanceNotReady {
        instance_id: instance_id.to_string(),
        attempts: policy.attempts,
        last_state,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(String),
    /// The abort check fired before the submission went through.
    Aborted,
}

/// Repeats a load generator call until it succeeds or attempts run out.
pub fn submit_until_accepted(
    clock: &dyn Clock,
    policy: RetryPolicy,
    action: &str,
    mut submit: impl FnMut() -> Result<String, LoadGeneratorError>,
) -> Result<String, ScalingError> {
    let mut last_error = None;
    for attempt in 1..=policy.attempts {
        match submit() {
            Ok(response) => {
                log_accepted(action, attempt);
                return Ok(response);
            }
            Err(error) => {
                debug!(event = "submission_failed", action, attempt, %error, "retrying");
                last_error = Some(error);
            }
        }
        if attempt < policy.attempts {
            clock.sleep(policy.delay);
        }
    }

    Err(exhausted(action, policy, last_error))
}

/// Like [`submit_until_accepted`], but checks `should_abort` after every
/// failed attempt and stops early once it returns true.
pub fn submit_with_retry(
    clock: &dyn Clock,
    policy: RetryPolicy,
    action: &str,
    mut submit: impl FnMut() -> Result<String, LoadGeneratorError>,
    mut should_abort: impl FnMut() -> bool,
) -> Result<SubmitOutcome, ScalingError> {
    let mut last_error = None;
    for attempt in 1..=policy.attempts {
        match submit() {
            Ok(response) => {
                log_accepted(action, attempt);
                return Ok(SubmitOutcome::Accepted(response));
            }
            Err(error) => {
                debug!(event = "submission_failed", action, attempt, %error, "retrying");
                last_error = Some(error);
            }
        }

        if should_abort() {
            info!(
                event = "submission_aborted",
                action,
                attempt,
                "abort condition reached"
            );
            return Ok(SubmitOutcome::Aborted);
        }
        if attempt < policy.attempts {
            clock.sleep(policy.delay);
        }
    }

    Err(exhausted(action, policy, last_error))
}

fn log_accepted(action: &str, attempt: u32) {
    info!(
        event = "submission_accepted",
        action,
        attempt,
        "load generator accepted request"
    );
}

fn exhausted(
    action: &str,
    policy: RetryPolicy,
    last_error: Option<LoadGeneratorError>,
) -> ScalingError {
    ScalingError::SubmitExhausted {
        action: action.to_string(),
        attempts: policy.attempts,
        last_error: last_error
            .unwrap_or_else(|| LoadGeneratorError::new(action, "no attempts were made")),
    }
}

/// Fetches, archives and parses the current test log.
pub fn fetch_test_log(
    load_generator: &dyn LoadGeneratorApi,
    load_generator_dns: &str,
    test_id: &str,
    archive: Option<&LogArchive>,
) -> Result<TestLog, LoadGeneratorError> {
    let text = load_generator.fetch_test_log(load_generator_dns, test_id)?;
    if let Some(archive) = archive {
        archive.store(test_id, &text);
    }
    Ok(TestLog::parse(&text))
}

/// Tracks consecutive log fetch failures for a polling loop.
pub struct LogPoller<'a> {
    load_generator: &'a dyn LoadGeneratorApi,
    load_generator_dns: &'a str,
    test_id: &'a str,
    archive: Option<&'a LogArchive>,
    failure_limit: u32,
    consecutive_failures: u32,
}

impl<'a> LogPoller<'a> {
    pub fn new(
        load_generator: &'a dyn LoadGeneratorApi,
        load_generator_dns: &'a str,
        test_id: &'a str,
        archive: Option<&'a LogArchive>,
        failure_limit: u32,
    ) -> Self {
        Self {
            load_generator,
            load_generator_dns,
            test_id,
            archive,
            failure_limit,
            consecutive_failures: 0,
        }
    }

    /// `Ok(None)` for a transient failure the caller should ride out.
    pub fn poll(&mut self) -> Result<Option<TestLog>, ScalingError> {
        match fetch_test_log(
            self.load_generator,
            self.load_generator_dns,
            self.test_id,
            self.archive,
        ) {
            Ok(log) => {
                self.consecutive_failures = 0;
                Ok(Some(log))
            }
            Err(error) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_limit {
                    return Err(ScalingError::LogUnavailable {
                        test_id: self.test_id.to_string(),
                        failures: self.consecutive_failures,
                        last_error: error,
                    });
                }
                warn!(
                    event = "log_fetch_failed",
                    test_id = self.test_id,
                    failures = self.consecutive_failures,
                    %error,
                    "test log unavailable, will retry"
                );
                Ok(None)
            }
        }
    }
}

/// Polls the test log every `interval` until the test reports completion.
pub fn poll_until_finished(
    poller: &mut LogPoller<'_>,
    clock: &dyn Clock,
    interval: Duration,
) -> Result<TestLog, ScalingError> {
    loop {
        if let Some(log) = poller.poll()? {
            if log.is_finished() {
                return Ok(log);
            }
        }
        clock.sleep(interval);
    }
}
