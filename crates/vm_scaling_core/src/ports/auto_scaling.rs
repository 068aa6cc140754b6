use crate::error::CloudError;
use crate::model::{AutoScalingGroupRequest, ScalingPolicyRequest};

pub trait AutoScalingApi {
    fn create_group(&self, request: &AutoScalingGroupRequest) -> Result<(), CloudError>;
    /// Returns the policy ARN used as an alarm action.
    fn put_scaling_policy(&self, request: &ScalingPolicyRequest) -> Result<String, CloudError>;
    fn group_exists(&self, group_name: &str) -> Result<bool, CloudError>;
    /// Force-deletes the group, terminating its instances.
    fn delete_group(&self, group_name: &str) -> Result<(), CloudError>;
}
