//! Provider-neutral request and response shapes exchanged through the ports.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vpc {
    pub vpc_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Other(String),
}

impl InstanceState {
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSnapshot {
    pub instance_id: String,
    pub state: InstanceState,
    pub public_dns: Option<String>,
}

impl InstanceSnapshot {
    /// Running with a public DNS name; a running instance can still lack one
    /// for a few seconds.
    pub fn is_ready(&self) -> bool {
        self.state == InstanceState::Running
            && self
                .public_dns
                .as_deref()
                .is_some_and(|dns| !dns.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLaunch {
    pub image_id: String,
    pub instance_type: String,
    pub security_group_id: String,
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRequest {
    pub name: String,
    pub description: String,
    pub vpc_id: String,
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTemplateRequest {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub security_group_id: String,
    pub detailed_monitoring: bool,
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupRequest {
    pub name: String,
    pub vpc_id: String,
    pub port: i32,
    pub health_check_path: String,
    pub health_check_interval_secs: i32,
    pub health_check_timeout_secs: i32,
    pub healthy_threshold: i32,
    pub unhealthy_threshold: i32,
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub arn: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRequest {
    pub name: String,
    pub subnet_ids: Vec<String>,
    pub security_group_id: String,
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancer {
    pub arn: String,
    pub name: String,
    pub dns_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRequest {
    pub load_balancer_arn: String,
    pub port: i32,
    pub target_group_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoScalingGroupRequest {
    pub name: String,
    pub launch_template_name: String,
    pub min_size: i32,
    pub max_size: i32,
    pub desired_capacity: i32,
    pub default_cooldown: i32,
    pub health_check_grace_period: i32,
    pub subnet_ids: Vec<String>,
    pub target_group_arn: String,
    /// Propagated to every instance the group launches.
    pub tags: Vec<ResourceTag>,
}

impl AutoScalingGroupRequest {
    pub fn vpc_zone_identifier(&self) -> String {
        self.subnet_ids.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingPolicyRequest {
    pub group_name: String,
    pub policy_name: String,
    pub adjustment: i32,
    pub cooldown: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmComparison {
    GreaterThanThreshold,
    LessThanThreshold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricAlarmRequest {
    pub alarm_name: String,
    pub description: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimension_name: String,
    pub dimension_value: String,
    pub period: i32,
    pub evaluation_periods: i32,
    pub threshold: f64,
    pub comparison: AlarmComparison,
    pub action_arn: String,
}
