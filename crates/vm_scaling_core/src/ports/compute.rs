use crate::error::CloudError;
use crate::model::{
    InstanceLaunch, InstanceSnapshot, LaunchTemplateRequest, SecurityGroupRequest, Vpc,
};

pub trait ComputeApi {
    fn default_vpc(&self) -> Result<Option<Vpc>, CloudError>;
    /// Looks a group up by name, optionally restricted to one VPC.
    fn find_security_group(
        &self,
        group_name: &str,
        vpc_id: Option<&str>,
    ) -> Result<Option<String>, CloudError>;
    fn create_security_group(&self, request: &SecurityGroupRequest) -> Result<String, CloudError>;
    fn authorize_http_ingress(&self, group_id: &str, port: i32) -> Result<(), CloudError>;
    fn delete_security_group(&self, group_id: &str) -> Result<(), CloudError>;
    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>, CloudError>;
    /// Launches exactly one instance and returns its id.
    fn run_instance(&self, launch: &InstanceLaunch) -> Result<String, CloudError>;
    /// `None` while the instance is not yet visible to describe calls.
    fn describe_instance(&self, instance_id: &str)
        -> Result<Option<InstanceSnapshot>, CloudError>;
    fn terminate_instance(&self, instance_id: &str) -> Result<(), CloudError>;
    /// Pending or running instances carrying `tag_key=tag_value`.
    fn find_tagged_instances(
        &self,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<String>, CloudError>;
    fn create_launch_template(&self, request: &LaunchTemplateRequest) -> Result<(), CloudError>;
    fn delete_launch_template(&self, template_name: &str) -> Result<(), CloudError>;
}
