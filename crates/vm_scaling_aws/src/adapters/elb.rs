use aws_sdk_elasticloadbalancingv2::types::{
    Action, ActionTypeEnum, LoadBalancerSchemeEnum, LoadBalancerTypeEnum, ProtocolEnum, Tag,
    TargetTypeEnum,
};
use aws_sdk_elasticloadbalancingv2::Client;
use vm_scaling_core::model::{
    ListenerRequest, LoadBalancer, LoadBalancerRequest, ResourceTag, TargetGroup,
    TargetGroupRequest,
};
use vm_scaling_core::ports::LoadBalancingApi;
use vm_scaling_core::CloudError;

use super::bridge::{block_on, sdk_error};

pub struct ElbLoadBalancing {
    client: Client,
}

impl ElbLoadBalancing {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn tags(operation: &str, tags: &[ResourceTag]) -> Result<Vec<Tag>, CloudError> {
    tags.iter()
        .map(|tag| {
            Tag::builder()
                .key(&tag.key)
                .value(&tag.value)
                .build()
                .map_err(|error| CloudError::new(operation, error.to_string()))
        })
        .collect()
}

fn load_balancer(
    operation: &str,
    load_balancer: &aws_sdk_elasticloadbalancingv2::types::LoadBalancer,
) -> Result<LoadBalancer, CloudError> {
    Ok(LoadBalancer {
        arn: load_balancer
            .load_balancer_arn()
            .ok_or_else(|| CloudError::missing_field(operation, "LoadBalancerArn"))?
            .to_string(),
        name: load_balancer
            .load_balancer_name()
            .unwrap_or_default()
            .to_string(),
        dns_name: load_balancer
            .dns_name()
            .ok_or_else(|| CloudError::missing_field(operation, "DNSName"))?
            .to_string(),
    })
}

fn target_group(
    operation: &str,
    target_group: &aws_sdk_elasticloadbalancingv2::types::TargetGroup,
) -> Result<TargetGroup, CloudError> {
    Ok(TargetGroup {
        arn: target_group
            .target_group_arn()
            .ok_or_else(|| CloudError::missing_field(operation, "TargetGroupArn"))?
            .to_string(),
        name: target_group
            .target_group_name()
            .unwrap_or_default()
            .to_string(),
    })
}

impl LoadBalancingApi for ElbLoadBalancing {
    fn create_target_group(&self, request: &TargetGroupRequest) -> Result<TargetGroup, CloudError> {
        const OPERATION: &str = "create_target_group";
        let output = block_on(
            self.client
                .create_target_group()
                .name(&request.name)
                .protocol(ProtocolEnum::Http)
                .port(request.port)
                .vpc_id(&request.vpc_id)
                .target_type(TargetTypeEnum::Instance)
                .health_check_protocol(ProtocolEnum::Http)
                .health_check_path(&request.health_check_path)
                .health_check_interval_seconds(request.health_check_interval_secs)
                .health_check_timeout_seconds(request.health_check_timeout_secs)
                .healthy_threshold_count(request.healthy_threshold)
                .unhealthy_threshold_count(request.unhealthy_threshold)
                .set_tags(Some(tags(OPERATION, &request.tags)?))
                .send(),
        )
        .map_err(|error| sdk_error(OPERATION, error))?;
        let created = output
            .target_groups()
            .first()
            .ok_or_else(|| CloudError::missing_field(OPERATION, "TargetGroups"))?;
        target_group(OPERATION, created)
    }

    fn create_load_balancer(
        &self,
        request: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, CloudError> {
        const OPERATION: &str = "create_load_balancer";
        let output = block_on(
            self.client
                .create_load_balancer()
                .name(&request.name)
                .r#type(LoadBalancerTypeEnum::Application)
                .scheme(LoadBalancerSchemeEnum::InternetFacing)
                .set_subnets(Some(request.subnet_ids.clone()))
                .security_groups(&request.security_group_id)
                .set_tags(Some(tags(OPERATION, &request.tags)?))
                .send(),
        )
        .map_err(|error| sdk_error(OPERATION, error))?;
        let created = output
            .load_balancers()
            .first()
            .ok_or_else(|| CloudError::missing_field(OPERATION, "LoadBalancers"))?;
        load_balancer(OPERATION, created)
    }

    fn create_listener(&self, request: &ListenerRequest) -> Result<(), CloudError> {
        const OPERATION: &str = "create_listener";
        let forward = Action::builder()
            .r#type(ActionTypeEnum::Forward)
            .target_group_arn(&request.target_group_arn)
            .build()
            .map_err(|error| CloudError::new(OPERATION, error.to_string()))?;
        block_on(
            self.client
                .create_listener()
                .load_balancer_arn(&request.load_balancer_arn)
                .protocol(ProtocolEnum::Http)
                .port(request.port)
                .default_actions(forward)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error(OPERATION, error))
    }

    fn find_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>, CloudError> {
        const OPERATION: &str = "describe_load_balancers";
        let output = match block_on(self.client.describe_load_balancers().names(name).send()) {
            Ok(output) => output,
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_load_balancer_not_found_exception()) =>
            {
                return Ok(None)
            }
            Err(error) => return Err(sdk_error(OPERATION, error)),
        };
        output
            .load_balancers()
            .first()
            .map(|found| load_balancer(OPERATION, found))
            .transpose()
    }

    fn find_target_group(&self, name: &str) -> Result<Option<TargetGroup>, CloudError> {
        const OPERATION: &str = "describe_target_groups";
        let output = match block_on(self.client.describe_target_groups().names(name).send()) {
            Ok(output) => output,
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_target_group_not_found_exception()) =>
            {
                return Ok(None)
            }
            Err(error) => return Err(sdk_error(OPERATION, error)),
        };
        output
            .target_groups()
            .first()
            .map(|found| target_group(OPERATION, found))
            .transpose()
    }

    fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), CloudError> {
        block_on(
            self.client
                .delete_load_balancer()
                .load_balancer_arn(load_balancer_arn)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("delete_load_balancer", error))
    }

    fn delete_target_group(&self, target_group_arn: &str) -> Result<(), CloudError> {
        block_on(
            self.client
                .delete_target_group()
                .target_group_arn(target_group_arn)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("delete_target_group", error))
    }
}
