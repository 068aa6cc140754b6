use aws_sdk_autoscaling::types::{LaunchTemplateSpecification, Tag};
use aws_sdk_autoscaling::Client;
use vm_scaling_core::model::{AutoScalingGroupRequest, ScalingPolicyRequest};
use vm_scaling_core::ports::AutoScalingApi;
use vm_scaling_core::CloudError;

use super::bridge::{block_on, sdk_error};

const LATEST_VERSION: &str = "$Latest";

pub struct AutoScalingGroups {
    client: Client,
}

impl AutoScalingGroups {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AutoScalingApi for AutoScalingGroups {
    fn create_group(&self, request: &AutoScalingGroupRequest) -> Result<(), CloudError> {
        const OPERATION: &str = "create_auto_scaling_group";
        let tags = request
            .tags
            .iter()
            .map(|tag| {
                Tag::builder()
                    .key(&tag.key)
                    .value(&tag.value)
                    .resource_id(&request.name)
                    .resource_type("auto-scaling-group")
                    .propagate_at_launch(true)
                    .build()
                    .map_err(|error| CloudError::new(OPERATION, error.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        block_on(
            self.client
                .create_auto_scaling_group()
                .auto_scaling_group_name(&request.name)
                .launch_template(
                    LaunchTemplateSpecification::builder()
                        .launch_template_name(&request.launch_template_name)
                        .version(LATEST_VERSION)
                        .build(),
                )
                .min_size(request.min_size)
                .max_size(request.max_size)
                .desired_capacity(request.desired_capacity)
                .default_cooldown(request.default_cooldown)
                .health_check_type("ELB")
                .health_check_grace_period(request.health_check_grace_period)
                .vpc_zone_identifier(request.vpc_zone_identifier())
                .target_group_arns(&request.target_group_arn)
                .set_tags(Some(tags))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error(OPERATION, error))
    }

    fn put_scaling_policy(&self, request: &ScalingPolicyRequest) -> Result<String, CloudError> {
        const OPERATION: &str = "put_scaling_policy";
        let output = block_on(
            self.client
                .put_scaling_policy()
                .auto_scaling_group_name(&request.group_name)
                .policy_name(&request.policy_name)
                .policy_type("SimpleScaling")
                .adjustment_type("ChangeInCapacity")
                .scaling_adjustment(request.adjustment)
                .cooldown(request.cooldown)
                .send(),
        )
        .map_err(|error| sdk_error(OPERATION, error))?;
        output
            .policy_arn()
            .map(str::to_string)
            .ok_or_else(|| CloudError::missing_field(OPERATION, "PolicyARN"))
    }

    fn group_exists(&self, group_name: &str) -> Result<bool, CloudError> {
        let output = block_on(
            self.client
                .describe_auto_scaling_groups()
                .auto_scaling_group_names(group_name)
                .send(),
        )
        .map_err(|error| sdk_error("describe_auto_scaling_groups", error))?;
        Ok(!output.auto_scaling_groups().is_empty())
    }

    fn delete_group(&self, group_name: &str) -> Result<(), CloudError> {
        block_on(
            self.client
                .delete_auto_scaling_group()
                .auto_scaling_group_name(group_name)
                .force_delete(true)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("delete_auto_scaling_group", error))
    }
}
