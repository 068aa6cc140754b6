pub mod autoscaling;
pub mod bridge;
pub mod cloudwatch;
pub mod ec2;
pub mod elb;
pub mod load_generator;

pub use autoscaling::AutoScalingGroups;
pub use cloudwatch::CloudWatchAlarms;
pub use ec2::Ec2Compute;
pub use elb::ElbLoadBalancing;
pub use load_generator::HttpLoadGenerator;
