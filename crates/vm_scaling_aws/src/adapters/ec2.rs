use aws_sdk_ec2::error::ProvideErrorMetadata;
use aws_sdk_ec2::types::{
    Filter, InstanceType, IpPermission, IpRange,
    LaunchTemplateInstanceNetworkInterfaceSpecificationRequest,
    LaunchTemplateTagSpecificationRequest, LaunchTemplatesMonitoringRequest,
    RequestLaunchTemplateData, ResourceType, Tag, TagSpecification,
};
use aws_sdk_ec2::Client;
use vm_scaling_core::model::{
    InstanceLaunch, InstanceSnapshot, InstanceState, LaunchTemplateRequest, ResourceTag,
    SecurityGroupRequest, Vpc,
};
use vm_scaling_core::ports::ComputeApi;
use vm_scaling_core::CloudError;

use super::bridge::{block_on, sdk_error};

const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";
const DUPLICATE_PERMISSION: &str = "InvalidPermission.Duplicate";
const LAUNCH_TEMPLATE_NOT_FOUND: &str = "InvalidLaunchTemplateName.NotFoundException";
const ANYWHERE: &str = "0.0.0.0/0";

pub struct Ec2Compute {
    client: Client,
}

impl Ec2Compute {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn filter(name: &str, values: &[&str]) -> Filter {
    values
        .iter()
        .fold(Filter::builder().name(name), |builder, value| {
            builder.values(*value)
        })
        .build()
}

fn tags(tags: &[ResourceTag]) -> Vec<Tag> {
    tags.iter()
        .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
        .collect()
}

fn tag_specification(
    resource_type: ResourceType,
    resource_tags: &[ResourceTag],
) -> TagSpecification {
    TagSpecification::builder()
        .resource_type(resource_type)
        .set_tags(Some(tags(resource_tags)))
        .build()
}

impl ComputeApi for Ec2Compute {
    fn default_vpc(&self) -> Result<Option<Vpc>, CloudError> {
        let output = block_on(
            self.client
                .describe_vpcs()
                .filters(filter("is-default", &["true"]))
                .send(),
        )
        .map_err(|error| sdk_error("describe_vpcs", error))?;
        Ok(output
            .vpcs()
            .iter()
            .find_map(|vpc| vpc.vpc_id())
            .map(|vpc_id| Vpc {
                vpc_id: vpc_id.to_string(),
            }))
    }

    fn find_security_group(
        &self,
        group_name: &str,
        vpc_id: Option<&str>,
    ) -> Result<Option<String>, CloudError> {
        let mut request = self
            .client
            .describe_security_groups()
            .filters(filter("group-name", &[group_name]));
        if let Some(vpc_id) = vpc_id {
            request = request.filters(filter("vpc-id", &[vpc_id]));
        }
        let output = block_on(request.send())
            .map_err(|error| sdk_error("describe_security_groups", error))?;
        Ok(output
            .security_groups()
            .iter()
            .find_map(|group| group.group_id())
            .map(str::to_string))
    }

    fn create_security_group(&self, request: &SecurityGroupRequest) -> Result<String, CloudError> {
        let mut call = self
            .client
            .create_security_group()
            .group_name(&request.name)
            .description(&request.description)
            .vpc_id(&request.vpc_id);
        if !request.tags.is_empty() {
            call = call.tag_specifications(tag_specification(
                ResourceType::SecurityGroup,
                &request.tags,
            ));
        }
        let output =
            block_on(call.send()).map_err(|error| sdk_error("create_security_group", error))?;
        output
            .group_id()
            .map(str::to_string)
            .ok_or_else(|| CloudError::missing_field("create_security_group", "GroupId"))
    }

    fn authorize_http_ingress(&self, group_id: &str, port: i32) -> Result<(), CloudError> {
        let permission = IpPermission::builder()
            .ip_protocol("tcp")
            .from_port(port)
            .to_port(port)
            .ip_ranges(IpRange::builder().cidr_ip(ANYWHERE).build())
            .build();
        let result = block_on(
            self.client
                .authorize_security_group_ingress()
                .group_id(group_id)
                .ip_permissions(permission)
                .send(),
        );
        match result {
            Ok(_) => Ok(()),
            Err(error) if error.code() == Some(DUPLICATE_PERMISSION) => Ok(()),
            Err(error) => Err(sdk_error("authorize_security_group_ingress", error)),
        }
    }

    fn delete_security_group(&self, group_id: &str) -> Result<(), CloudError> {
        block_on(
            self.client
                .delete_security_group()
                .group_id(group_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("delete_security_group", error))
    }

    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>, CloudError> {
        let output = block_on(
            self.client
                .describe_subnets()
                .filters(filter("vpc-id", &[vpc_id]))
                .send(),
        )
        .map_err(|error| sdk_error("describe_subnets", error))?;
        Ok(output
            .subnets()
            .iter()
            .filter_map(|subnet| subnet.subnet_id())
            .map(str::to_string)
            .collect())
    }

    fn run_instance(&self, launch: &InstanceLaunch) -> Result<String, CloudError> {
        let output = block_on(
            self.client
                .run_instances()
                .image_id(&launch.image_id)
                .instance_type(InstanceType::from(launch.instance_type.as_str()))
                .min_count(1)
                .max_count(1)
                .security_group_ids(&launch.security_group_id)
                .tag_specifications(tag_specification(ResourceType::Instance, &launch.tags))
                .send(),
        )
        .map_err(|error| sdk_error("run_instances", error))?;
        output
            .instances()
            .iter()
            .find_map(|instance| instance.instance_id())
            .map(str::to_string)
            .ok_or_else(|| CloudError::missing_field("run_instances", "InstanceId"))
    }

    fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceSnapshot>, CloudError> {
        let output = match block_on(
            self.client
                .describe_instances()
                .instance_ids(instance_id)
                .send(),
        ) {
            Ok(output) => output,
            // Freshly launched ids take a moment to become visible.
            Err(error) if error.code() == Some(INSTANCE_NOT_FOUND) => return Ok(None),
            Err(error) => return Err(sdk_error("describe_instances", error)),
        };

        let Some(instance) = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .next()
        else {
            return Ok(None);
        };
        let state = instance
            .state()
            .and_then(|state| state.name())
            .map(|name| InstanceState::from_name(name.as_str()))
            .unwrap_or_else(|| InstanceState::Other("unknown".to_string()));
        Ok(Some(InstanceSnapshot {
            instance_id: instance_id.to_string(),
            state,
            public_dns: instance
                .public_dns_name()
                .filter(|dns| !dns.is_empty())
                .map(str::to_string),
        }))
    }

    fn terminate_instance(&self, instance_id: &str) -> Result<(), CloudError> {
        block_on(
            self.client
                .terminate_instances()
                .instance_ids(instance_id)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("terminate_instances", error))
    }

    fn find_tagged_instances(
        &self,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<String>, CloudError> {
        let output = block_on(
            self.client
                .describe_instances()
                .filters(filter(&format!("tag:{tag_key}"), &[tag_value]))
                .filters(filter("instance-state-name", &["pending", "running"]))
                .send(),
        )
        .map_err(|error| sdk_error("describe_instances", error))?;
        Ok(output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter_map(|instance| instance.instance_id())
            .map(str::to_string)
            .collect())
    }

    fn create_launch_template(&self, request: &LaunchTemplateRequest) -> Result<(), CloudError> {
        // Groups go on the interface; EC2 rejects them at both levels.
        let interface = LaunchTemplateInstanceNetworkInterfaceSpecificationRequest::builder()
            .device_index(0)
            .associate_public_ip_address(true)
            .groups(&request.security_group_id)
            .build();
        let data = RequestLaunchTemplateData::builder()
            .image_id(&request.image_id)
            .instance_type(InstanceType::from(request.instance_type.as_str()))
            .network_interfaces(interface)
            .monitoring(
                LaunchTemplatesMonitoringRequest::builder()
                    .enabled(request.detailed_monitoring)
                    .build(),
            )
            .tag_specifications(
                LaunchTemplateTagSpecificationRequest::builder()
                    .resource_type(ResourceType::Instance)
                    .set_tags(Some(tags(&request.tags)))
                    .build(),
            )
            .build();
        block_on(
            self.client
                .create_launch_template()
                .launch_template_name(&request.name)
                .launch_template_data(data)
                .tag_specifications(tag_specification(
                    ResourceType::LaunchTemplate,
                    &request.tags,
                ))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("create_launch_template", error))
    }

    fn delete_launch_template(&self, template_name: &str) -> Result<(), CloudError> {
        let result = block_on(
            self.client
                .delete_launch_template()
                .launch_template_name(template_name)
                .send(),
        );
        match result {
            Ok(_) => Ok(()),
            Err(error) if error.code() == Some(LAUNCH_TEMPLATE_NOT_FOUND) => Ok(()),
            Err(error) => Err(sdk_error("delete_launch_template", error)),
        }
    }
}
