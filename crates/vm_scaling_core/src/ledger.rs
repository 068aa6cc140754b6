//! Record of every cloud resource a run created or adopted.
//!
//! Runners record a resource as soon as the provider confirms it, so a
//! failure at any later step still leaves teardown a complete picture.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrigin {
    Found,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSecurityGroup {
    pub name: String,
    pub group_id: String,
    pub origin: GroupOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceRole {
    LoadGenerator,
    WebService,
}

impl InstanceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadGenerator => "load_generator",
            Self::WebService => "web_service",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedInstance {
    pub instance_id: String,
    pub role: InstanceRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    security_groups: Vec<TrackedSecurityGroup>,
    launch_template: Option<String>,
    target_group_arn: Option<String>,
    load_balancer_arn: Option<String>,
    auto_scaling_group: Option<String>,
    alarms: Vec<String>,
    instances: Vec<TrackedInstance>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-acquiring the same group id is a no-op.
    pub fn record_security_group(&mut self, name: &str, group_id: &str, origin: GroupOrigin) {
        if self
            .security_groups
            .iter()
            .any(|group| group.group_id == group_id)
        {
            return;
        }
        self.security_groups.push(TrackedSecurityGroup {
            name: name.to_string(),
            group_id: group_id.to_string(),
            origin,
        });
    }

    pub fn record_launch_template(&mut self, name: &str) {
        self.launch_template = Some(name.to_string());
    }

    pub fn record_target_group(&mut self, arn: &str) {
        self.target_group_arn = Some(arn.to_string());
    }

    pub fn record_load_balancer(&mut self, arn: &str) {
        self.load_balancer_arn = Some(arn.to_string());
    }

    pub fn record_auto_scaling_group(&mut self, name: &str) {
        self.auto_scaling_group = Some(name.to_string());
    }

    pub fn record_alarm(&mut self, name: &str) {
        if !self.alarms.iter().any(|alarm| alarm == name) {
            self.alarms.push(name.to_string());
        }
    }

    pub fn record_instance(&mut self, instance_id: &str, role: InstanceRole) {
        if self
            .instances
            .iter()
            .any(|instance| instance.instance_id == instance_id)
        {
            return;
        }
        self.instances.push(TrackedInstance {
            instance_id: instance_id.to_string(),
            role,
        });
    }

    pub fn security_groups(&self) -> &[TrackedSecurityGroup] {
        &self.security_groups
    }

    pub fn launch_template(&self) -> Option<&str> {
        self.launch_template.as_deref()
    }

    pub fn target_group_arn(&self) -> Option<&str> {
        self.target_group_arn.as_deref()
    }

    pub fn load_balancer_arn(&self) -> Option<&str> {
        self.load_balancer_arn.as_deref()
    }

    pub fn auto_scaling_group(&self) -> Option<&str> {
        self.auto_scaling_group.as_deref()
    }

    pub fn alarms(&self) -> &[String] {
        &self.alarms
    }

    pub fn instances(&self) -> &[TrackedInstance] {
        &self.instances
    }

    pub fn is_empty(&self) -> bool {
        self.security_groups.is_empty()
            && self.launch_template.is_none()
            && self.target_group_arn.is_none()
            && self.load_balancer_arn.is_none()
            && self.auto_scaling_group.is_none()
            && self.alarms.is_empty()
            && self.instances.is_empty()
    }
}
