use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use vm_scaling_core::ports::LoadGeneratorApi;
use vm_scaling_core::LoadGeneratorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogReply {
    Body(String),
    Unavailable,
}

#[derive(Debug, Default)]
pub struct LoadGeneratorState {
    /// `"<endpoint> <argument>"` for every call, including failed ones.
    pub calls: Vec<String>,
    /// Submissions rejected before the next one is accepted.
    pub rejected_submissions: u32,
    /// Add-web-service calls rejected, on top of `rejected_submissions`.
    pub rejected_adds: u32,
    /// Submissions answer without a test id when set.
    pub omit_test_id: bool,
    /// Per test id; the last reply repeats once the queue drains to it.
    pub logs: BTreeMap<String, VecDeque<LogReply>>,
    pub next_test_id: u64,
}

#[derive(Debug)]
pub struct FakeLoadGenerator {
    state: Mutex<LoadGeneratorState>,
}

impl Default for FakeLoadGenerator {
    fn default() -> Self {
        Self {
            state: Mutex::new(LoadGeneratorState {
                next_test_id: 1_601_000_000,
                ..LoadGeneratorState::default()
            }),
        }
    }
}

impl FakeLoadGenerator {
    pub fn state(&self) -> MutexGuard<'_, LoadGeneratorState> {
        self.state.lock().expect("load generator state lock")
    }

    /// Scripts the log replies for the test started with id `test_id`.
    pub fn script(&self, test_id: u64, replies: impl IntoIterator<Item = LogReply>) {
        self.state()
            .logs
            .insert(test_id.to_string(), replies.into_iter().collect());
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(endpoint))
            .cloned()
            .collect()
    }

    fn submit(&self, endpoint: &str, argument: &str) -> Result<String, LoadGeneratorError> {
        let mut state = self.state();
        state.calls.push(format!("{endpoint} {argument}"));
        if state.rejected_submissions > 0 {
            state.rejected_submissions -= 1;
            return Err(LoadGeneratorError::new(endpoint, "connection refused"));
        }
        if state.omit_test_id {
            return Ok("Invalid DNS".to_string());
        }
        let test_id = state.next_test_id;
        state.next_test_id += 1;
        Ok(format!("<a href='/log?name=test.{test_id}.log'>Test</a>"))
    }

    fn add(&self, endpoint: &str, argument: &str) -> Result<String, LoadGeneratorError> {
        let mut state = self.state();
        state.calls.push(format!("{endpoint} {argument}"));
        if state.rejected_adds > 0 {
            state.rejected_adds -= 1;
            return Err(LoadGeneratorError::new(endpoint, "web service unreachable"));
        }
        if state.rejected_submissions > 0 {
            state.rejected_submissions -= 1;
            return Err(LoadGeneratorError::new(endpoint, "connection refused"));
        }
        Ok("ok".to_string())
    }
}

impl LoadGeneratorApi for FakeLoadGenerator {
    fn start_horizontal_test(
        &self,
        _load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.submit("horizontal", web_service_dns)
    }

    fn add_web_service(
        &self,
        _load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.add("add", web_service_dns)
    }

    fn start_warmup(
        &self,
        _load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.submit("warmup", load_balancer_dns)
    }

    fn start_autoscaling_test(
        &self,
        _load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.submit("autoscaling", load_balancer_dns)
    }

    fn fetch_test_log(
        &self,
        _load_generator_dns: &str,
        test_id: &str,
    ) -> Result<String, LoadGeneratorError> {
        let mut state = self.state();
        state.calls.push(format!("log {test_id}"));
        let reply = match state.logs.get_mut(test_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => Some(LogReply::Body(finished_log(0.0))),
        };
        match reply {
            Some(LogReply::Body(text)) => Ok(text),
            Some(LogReply::Unavailable) | None => {
                Err(LoadGeneratorError::new("log", "log not yet written"))
            }
        }
    }
}

/// A running test log whose latest minute reports `rps`.
pub fn running_log(rps: f64) -> String {
    format!("[Test]\ntype=test\n\n[Minute 1]\nws.example={rps}\n[Current rps={rps}]\n")
}

pub fn finished_log(rps: f64) -> String {
    format!("{}\n[Test finished]\n", running_log(rps))
}

pub fn body(text: String) -> LogReply {
    LogReply::Body(text)
}
