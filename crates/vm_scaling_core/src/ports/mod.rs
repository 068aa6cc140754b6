//! Seams between orchestration and the outside world.

pub mod alarms;
pub mod auto_scaling;
pub mod clock;
pub mod compute;
pub mod load_balancing;
pub mod load_generator;

pub use alarms::AlarmApi;
pub use auto_scaling::AutoScalingApi;
pub use clock::{Clock, SystemClock};
pub use compute::ComputeApi;
pub use load_balancing::LoadBalancingApi;
pub use load_generator::LoadGeneratorApi;

/// Everything a runner needs, borrowed for the duration of one run.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub compute: &'a dyn ComputeApi,
    pub load_balancing: &'a dyn LoadBalancingApi,
    pub auto_scaling: &'a dyn AutoScalingApi,
    pub alarms: &'a dyn AlarmApi,
    pub load_generator: &'a dyn LoadGeneratorApi,
    pub clock: &'a dyn Clock,
}
