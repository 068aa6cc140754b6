use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use vm_scaling_core::model::{
    AutoScalingGroupRequest, InstanceLaunch, InstanceSnapshot, InstanceState,
    LaunchTemplateRequest, ListenerRequest, LoadBalancer, LoadBalancerRequest,
    MetricAlarmRequest, ScalingPolicyRequest, SecurityGroupRequest, TargetGroup,
    TargetGroupRequest, Vpc,
};
use vm_scaling_core::ports::{AlarmApi, AutoScalingApi, ComputeApi, LoadBalancingApi};
use vm_scaling_core::CloudError;

/// Mutable fake state; tests seed it before a run and inspect it after.
#[derive(Debug, Default)]
pub struct CloudState {
    /// Every mutating or lookup call as `"<operation> <detail>"`.
    pub calls: Vec<String>,
    /// Operations that fail whenever they are called.
    pub failing: BTreeSet<String>,
    pub vpc_id: Option<String>,
    pub subnets: Vec<String>,
    pub security_groups: BTreeMap<String, String>,
    /// Describe calls that report `pending` before an instance is running.
    pub pending_describes: u32,
    /// Security group deletes rejected as in use before one succeeds.
    pub security_group_in_use: u32,
    pub instances: Vec<(String, InstanceLaunch)>,
    pub terminated: Vec<String>,
    pub load_balancers: BTreeMap<String, LoadBalancer>,
    pub target_groups: BTreeMap<String, TargetGroup>,
    pub groups: BTreeSet<String>,
    pub group_requests: Vec<AutoScalingGroupRequest>,
    pub policies: Vec<ScalingPolicyRequest>,
    pub alarms: Vec<MetricAlarmRequest>,
    next_id: u32,
}

/// One fake behind all four cloud ports.
#[derive(Debug)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CloudState {
                vpc_id: Some("vpc-default".to_string()),
                subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
                ..CloudState::default()
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().expect("cloud state lock")
    }

    pub fn fail(&self, operation: &str) {
        self.state().failing.insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Calls whose operation name starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Position of the first call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|call| call.starts_with(prefix))
    }

    fn record(&self, operation: &str, detail: &str) -> Result<MutexGuard<'_, CloudState>, CloudError> {
        let mut state = self.state();
        state.calls.push(format!("{operation} {detail}"));
        if state.failing.contains(operation) {
            return Err(CloudError::new(operation, "injected failure"));
        }
        Ok(state)
    }
}

impl CloudState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

impl ComputeApi for FakeCloud {
    fn default_vpc(&self) -> Result<Option<Vpc>, CloudError> {
        let state = self.record("default_vpc", "")?;
        Ok(state.vpc_id.clone().map(|vpc_id| Vpc { vpc_id }))
    }

    fn find_security_group(
        &self,
        group_name: &str,
        _vpc_id: Option<&str>,
    ) -> Result<Option<String>, CloudError> {
        let state = self.record("find_security_group", group_name)?;
        Ok(state.security_groups.get(group_name).cloned())
    }

    fn create_security_group(&self, request: &SecurityGroupRequest) -> Result<String, CloudError> {
        let mut state = self.record("create_security_group", &request.name)?;
        let group_id = state.next_id("sg");
        state
            .security_groups
            .insert(request.name.clone(), group_id.clone());
        Ok(group_id)
    }

    fn authorize_http_ingress(&self, group_id: &str, port: i32) -> Result<(), CloudError> {
        self.record("authorize_http_ingress", &format!("{group_id}:{port}"))?;
        Ok(())
    }

    fn delete_security_group(&self, group_id: &str) -> Result<(), CloudError> {
        let mut state = self.record("delete_security_group", group_id)?;
        if state.security_group_in_use > 0 {
            state.security_group_in_use -= 1;
            return Err(CloudError::new("delete_security_group", "DependencyViolation"));
        }
        state.security_groups.retain(|_, id| id != group_id);
        Ok(())
    }

    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>, CloudError> {
        let state = self.record("list_subnets", vpc_id)?;
        Ok(state.subnets.clone())
    }

    fn run_instance(&self, launch: &InstanceLaunch) -> Result<String, CloudError> {
        let mut state = self.record("run_instance", &launch.image_id)?;
        let instance_id = state.next_id("i");
        state.instances.push((instance_id.clone(), launch.clone()));
        Ok(instance_id)
    }

    fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceSnapshot>, CloudError> {
        let mut state = self.state();
        if state.failing.contains("describe_instance") {
            return Err(CloudError::new("describe_instance", "injected failure"));
        }
        if !state.instances.iter().any(|(id, _)| id == instance_id) {
            return Ok(None);
        }
        if state.pending_describes > 0 {
            state.pending_describes -= 1;
            return Ok(Some(InstanceSnapshot {
                instance_id: instance_id.to_string(),
                state: InstanceState::Pending,
                public_dns: None,
            }));
        }
        Ok(Some(InstanceSnapshot {
            instance_id: instance_id.to_string(),
            state: InstanceState::Running,
            public_dns: Some(format!("{instance_id}.compute.example")),
        }))
    }

    fn terminate_instance(&self, instance_id: &str) -> Result<(), CloudError> {
        let mut state = self.record("terminate_instance", instance_id)?;
        state.terminated.push(instance_id.to_string());
        Ok(())
    }

    fn find_tagged_instances(
        &self,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<String>, CloudError> {
        let state = self.record("find_tagged_instances", &format!("{tag_key}={tag_value}"))?;
        Ok(state
            .instances
            .iter()
            .filter(|(id, _)| !state.terminated.contains(id))
            .filter(|(_, launch)| {
                launch
                    .tags
                    .iter()
                    .any(|tag| tag.key == tag_key && tag.value == tag_value)
            })
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn create_launch_template(&self, request: &LaunchTemplateRequest) -> Result<(), CloudError> {
        self.record("create_launch_template", &request.name)?;
        Ok(())
    }

    fn delete_launch_template(&self, template_name: &str) -> Result<(), CloudError> {
        self.record("delete_launch_template", template_name)?;
        Ok(())
    }
}

impl LoadBalancingApi for FakeCloud {
    fn create_target_group(&self, request: &TargetGroupRequest) -> Result<TargetGroup, CloudError> {
        let mut state = self.record("create_target_group", &request.name)?;
        let target_group = TargetGroup {
            arn: format!("arn:targetgroup/{}", request.name),
            name: request.name.clone(),
        };
        state
            .target_groups
            .insert(request.name.clone(), target_group.clone());
        Ok(target_group)
    }

    fn create_load_balancer(
        &self,
        request: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, CloudError> {
        let mut state = self.record("create_load_balancer", &request.name)?;
        let load_balancer = LoadBalancer {
            arn: format!("arn:loadbalancer/{}", request.name),
            name: request.name.clone(),
            dns_name: format!("{}.elb.example", request.name),
        };
        state
            .load_balancers
            .insert(request.name.clone(), load_balancer.clone());
        Ok(load_balancer)
    }

    fn create_listener(&self, request: &ListenerRequest) -> Result<(), CloudError> {
        self.record(
            "create_listener",
            &format!("{}->{}", request.load_balancer_arn, request.target_group_arn),
        )?;
        Ok(())
    }

    fn find_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>, CloudError> {
        let state = self.record("find_load_balancer", name)?;
        Ok(state.load_balancers.get(name).cloned())
    }

    fn find_target_group(&self, name: &str) -> Result<Option<TargetGroup>, CloudError> {
        let state = self.record("find_target_group", name)?;
        Ok(state.target_groups.get(name).cloned())
    }

    fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), CloudError> {
        let mut state = self.record("delete_load_balancer", load_balancer_arn)?;
        state
            .load_balancers
            .retain(|_, load_balancer| load_balancer.arn != load_balancer_arn);
        Ok(())
    }

    fn delete_target_group(&self, target_group_arn: &str) -> Result<(), CloudError> {
        let mut state = self.record("delete_target_group", target_group_arn)?;
        state
            .target_groups
            .retain(|_, target_group| target_group.arn != target_group_arn);
        Ok(())
    }
}

impl AutoScalingApi for FakeCloud {
    fn create_group(&self, request: &AutoScalingGroupRequest) -> Result<(), CloudError> {
        let mut state = self.record("create_group", &request.name)?;
        state.groups.insert(request.name.clone());
        state.group_requests.push(request.clone());
        Ok(())
    }

    fn put_scaling_policy(&self, request: &ScalingPolicyRequest) -> Result<String, CloudError> {
        let mut state = self.record("put_scaling_policy", &request.policy_name)?;
        state.policies.push(request.clone());
        Ok(format!("arn:policy/{}", request.policy_name))
    }

    fn group_exists(&self, group_name: &str) -> Result<bool, CloudError> {
        let state = self.record("group_exists", group_name)?;
        Ok(state.groups.contains(group_name))
    }

    fn delete_group(&self, group_name: &str) -> Result<(), CloudError> {
        let mut state = self.record("delete_group", group_name)?;
        state.groups.remove(group_name);
        Ok(())
    }
}

impl AlarmApi for FakeCloud {
    fn put_metric_alarm(&self, request: &MetricAlarmRequest) -> Result<(), CloudError> {
        let mut state = self.record("put_metric_alarm", &request.alarm_name)?;
        state.alarms.push(request.clone());
        Ok(())
    }

    fn delete_alarms(&self, alarm_names: &[String]) -> Result<(), CloudError> {
        let mut state = self.record("delete_alarms", &alarm_names.join(","))?;
        state
            .alarms
            .retain(|alarm| !alarm_names.contains(&alarm.alarm_name));
        Ok(())
    }
}
